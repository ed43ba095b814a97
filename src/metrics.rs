//! Prometheus counters for the CRM jobs.
//!
//! Counters follow `crm_{job}_{name}_total`. The HTTP server installs the
//! recorder and renders it on `/metrics`; one-shot CLI jobs record into the
//! default no-op recorder.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

macro_rules! job_counter {
    ($job:literal, $name:literal) => {
        concat!("crm_", $job, "_", $name, "_total")
    };
}

/// Install the Prometheus recorder. Idempotent.
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_ok() {
                info!("Prometheus recorder installed");
            }
        }
        Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Render the current snapshot in Prometheus text format.
pub fn render() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

pub struct JobMetrics;

impl JobMetrics {
    pub fn report_generated() {
        ::metrics::counter!(job_counter!("report", "runs")).increment(1);
    }

    pub fn report_failed() {
        ::metrics::counter!(job_counter!("report", "failures")).increment(1);
    }

    pub fn customers_deleted(count: u64) {
        ::metrics::counter!(job_counter!("cleanup", "runs")).increment(1);
        ::metrics::counter!(job_counter!("cleanup", "deleted_customers")).increment(count);
    }

    pub fn heartbeat(probe_ok: Option<bool>) {
        ::metrics::counter!(job_counter!("heartbeat", "beats")).increment(1);
        if probe_ok == Some(false) {
            ::metrics::counter!(job_counter!("heartbeat", "probe_failures")).increment(1);
        }
    }

    pub fn products_restocked(count: u64) {
        ::metrics::counter!(job_counter!("restock", "runs")).increment(1);
        ::metrics::counter!(job_counter!("restock", "products")).increment(count);
    }

    pub fn reminders_logged(count: u64) {
        ::metrics::counter!(job_counter!("reminders", "orders")).increment(count);
    }
}
