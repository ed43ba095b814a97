//! Cron expressions for the externally triggered jobs.
//!
//! The service never schedules anything itself; it validates the configured
//! expressions and renders them as crontab lines for the host scheduler.

use crate::error::{CrmError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// (name, min, max) per field, in crontab order.
const FIELDS: [(&str, u32, u32); 5] = [
    ("minute", 0, 59),
    ("hour", 0, 23),
    ("day of month", 1, 31),
    ("month", 1, 12),
    ("day of week", 0, 7),
];

/// A validated five-field cron expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct CronExpr(String);

impl CronExpr {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CronExpr {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != FIELDS.len() {
            return Err(CrmError::Schedule(format!(
                "'{s}' has {} fields, expected 5",
                fields.len()
            )));
        }
        for (value, (name, min, max)) in fields.iter().zip(FIELDS) {
            for item in value.split(',') {
                check_item(item, min, max)
                    .map_err(|msg| CrmError::Schedule(format!("'{s}': {name} {msg}")))?;
            }
        }
        Ok(Self(fields.join(" ")))
    }
}

fn parse_bound(raw: &str, min: u32, max: u32) -> std::result::Result<u32, String> {
    let n: u32 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if n < min || n > max {
        return Err(format!("{n} is outside {min}-{max}"));
    }
    Ok(n)
}

fn check_item(item: &str, min: u32, max: u32) -> std::result::Result<(), String> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step)),
        None => (item, None),
    };
    if let Some(step) = step {
        let n: u32 = step
            .parse()
            .map_err(|_| format!("step '{step}' is not a number"))?;
        if n == 0 {
            return Err("step must be positive".into());
        }
    }
    if range == "*" {
        return Ok(());
    }
    match range.split_once('-') {
        Some((lo, hi)) => {
            let lo = parse_bound(lo, min, max)?;
            let hi = parse_bound(hi, min, max)?;
            if lo > hi {
                return Err(format!("range {lo}-{hi} is reversed"));
            }
        }
        None => {
            parse_bound(range, min, max)?;
        }
    }
    Ok(())
}

impl fmt::Display for CronExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CronExpr> for String {
    fn from(expr: CronExpr) -> Self {
        expr.0
    }
}

impl<'de> Deserialize<'de> for CronExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A job the host scheduler triggers through a CLI subcommand.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub subcommand: &'static str,
    pub schedule: CronExpr,
}

/// One crontab line per job, e.g. `0 6 * * 1 /usr/local/bin/crm report`.
pub fn crontab_lines(jobs: &[ScheduledJob], binary: &Path, config: Option<&Path>) -> Vec<String> {
    let config_arg = config
        .map(|p| format!(" --config {}", p.display()))
        .unwrap_or_default();
    jobs.iter()
        .map(|job| {
            format!(
                "{} {}{} {}",
                job.schedule,
                binary.display(),
                config_arg,
                job.subcommand
            )
        })
        .collect()
}
