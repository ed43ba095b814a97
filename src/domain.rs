//! Domain data shapes shared by the store, the jobs and the GraphQL layer.

use crate::error::{CrmError, Result};
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

pub type CustomerId = i64;
pub type ProductId = i64;
pub type OrderId = i64;

/// Stock strictly below this is "low" for the `lowStock` filter and the
/// default restock threshold.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Prices carry at most 12 digits, two of them after the point.
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\+\d{7,15}|\d{3}-\d{3}-\d{4})$").expect("valid phone regex")
});

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl NewCustomer {
    /// Trims the fields and checks name, email and phone formats.
    /// Email uniqueness is enforced by the store.
    pub fn validate(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        if self.name.is_empty() {
            return Err(CrmError::Validation("name must not be empty".into()));
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(CrmError::Validation(format!(
                "invalid email '{}'",
                self.email
            )));
        }
        if let Some(phone) = &self.phone {
            if !PHONE_RE.is_match(phone) {
                return Err(CrmError::Validation(format!(
                    "invalid phone '{phone}', expected +1234567890 or 123-456-7890"
                )));
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub stock: i64,
}

impl NewProduct {
    pub fn validate(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(CrmError::Validation("name must not be empty".into()));
        }
        if self.price <= Decimal::ZERO {
            return Err(CrmError::Validation("price must be positive".into()));
        }
        if self.price > MAX_PRICE {
            return Err(CrmError::Validation(format!(
                "price must not exceed {MAX_PRICE}"
            )));
        }
        if self.price.normalize().scale() > 2 {
            return Err(CrmError::Validation(format!(
                "price {} has more than two decimal places",
                self.price
            )));
        }
        if self.stock < 0 {
            return Err(CrmError::Validation("stock must not be negative".into()));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub product_ids: Vec<ProductId>,
    /// Defaults to the creation instant.
    pub order_date: Option<DateTime<Utc>>,
}

impl NewOrder {
    pub fn validate(mut self) -> Result<Self> {
        self.product_ids.sort_unstable();
        self.product_ids.dedup();
        if self.product_ids.is_empty() {
            return Err(CrmError::Validation(
                "an order needs at least one product".into(),
            ));
        }
        Ok(self)
    }
}

/// An order together with the email of the customer who placed it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderContact {
    pub order_id: OrderId,
    pub customer_email: String,
    pub order_date: DateTime<Utc>,
}

/// Offset/limit window over an id-ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub name_contains: Option<String>,
    pub email_contains: Option<String>,
    /// Inclusive lower bound.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub created_before: Option<DateTime<Utc>>,
    pub phone_prefix: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub name_contains: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub stock_min: Option<i64>,
    pub stock_max: Option<i64>,
    pub low_stock: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub total_min: Option<Decimal>,
    pub total_max: Option<Decimal>,
    /// Inclusive lower bound.
    pub ordered_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub ordered_before: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub product_name: Option<String>,
    pub product_id: Option<ProductId>,
}

/// The instant `retention_days` before `now`.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(retention_days))
}

/// A customer is stale when it never ordered, or its latest order is strictly
/// older than `cutoff`. An order placed exactly at the cutoff keeps the
/// customer.
pub fn is_stale(last_order: Option<DateTime<Utc>>, cutoff: DateTime<Utc>) -> bool {
    match last_order {
        None => true,
        Some(at) => at < cutoff,
    }
}

/// Money is persisted as integer cents, half a cent rounding away from zero.
pub fn to_cents(amount: Decimal) -> Result<i64> {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    i64::try_from(rounded.mantissa())
        .map_err(|_| CrmError::Validation(format!("amount {amount} is out of range")))
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| CrmError::Storage(format!("timestamp {millis}ms is out of range")))
}
