//! Filter inputs for the connection queries. Date bounds are whole days:
//! `...Gte` starts at midnight UTC, `...Lte` includes the entire day.

use crate::domain::{CustomerFilter, OrderFilter, ProductFilter};
use crate::graphql::types::parse_id;
use async_graphql::{InputObject, Result, ID};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn day_end_exclusive(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.succ_opt().map(day_start)
}

#[derive(InputObject, Clone, Default)]
pub struct CustomerFilterInput {
    /// Case-insensitive substring of the name
    pub name_icontains: Option<String>,
    /// Case-insensitive substring of the email
    pub email_icontains: Option<String>,
    pub created_at_gte: Option<NaiveDate>,
    pub created_at_lte: Option<NaiveDate>,
    /// Phone starts with this pattern, e.g. `+1`
    pub phone_pattern: Option<String>,
}

impl From<CustomerFilterInput> for CustomerFilter {
    fn from(input: CustomerFilterInput) -> Self {
        Self {
            name_contains: input.name_icontains,
            email_contains: input.email_icontains,
            created_from: input.created_at_gte.map(day_start),
            created_before: input.created_at_lte.and_then(day_end_exclusive),
            phone_prefix: input.phone_pattern,
        }
    }
}

#[derive(InputObject, Clone, Default)]
pub struct ProductFilterInput {
    pub name_icontains: Option<String>,
    pub price_gte: Option<Decimal>,
    pub price_lte: Option<Decimal>,
    pub stock_gte: Option<i64>,
    pub stock_lte: Option<i64>,
    /// Only products with stock below 10
    pub low_stock: Option<bool>,
}

impl From<ProductFilterInput> for ProductFilter {
    fn from(input: ProductFilterInput) -> Self {
        Self {
            name_contains: input.name_icontains,
            price_min: input.price_gte,
            price_max: input.price_lte,
            stock_min: input.stock_gte,
            stock_max: input.stock_lte,
            low_stock: input.low_stock.unwrap_or(false),
        }
    }
}

#[derive(InputObject, Clone, Default)]
pub struct OrderFilterInput {
    pub total_amount_gte: Option<Decimal>,
    pub total_amount_lte: Option<Decimal>,
    pub order_date_gte: Option<NaiveDate>,
    pub order_date_lte: Option<NaiveDate>,
    /// Case-insensitive substring of the customer's name
    pub customer_name: Option<String>,
    /// Case-insensitive substring of any ordered product's name
    pub product_name: Option<String>,
    pub product_id: Option<ID>,
}

impl OrderFilterInput {
    pub fn into_filter(self) -> Result<OrderFilter> {
        Ok(OrderFilter {
            total_min: self.total_amount_gte,
            total_max: self.total_amount_lte,
            ordered_from: self.order_date_gte.map(day_start),
            ordered_before: self.order_date_lte.and_then(day_end_exclusive),
            customer_name: self.customer_name,
            product_name: self.product_name,
            product_id: self.product_id.as_ref().map(parse_id).transpose()?,
        })
    }
}
