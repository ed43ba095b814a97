use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    Customer, CustomerFilter, CustomerId, NewCustomer, NewOrder, NewProduct, Order, OrderContact,
    OrderFilter, OrderId, Page, Product, ProductFilter, ProductId,
};
use crate::error::Result;

// Job-side ports

#[async_trait]
pub trait ReportingRepository: Send + Sync {
    async fn count_customers(&self) -> Result<u64>;
    async fn count_orders(&self) -> Result<u64>;
    async fn sum_revenue(&self) -> Result<Decimal>;
}

#[async_trait]
pub trait RetentionRepository: Send + Sync {
    /// Customers with no order at or after `cutoff`, ascending by id.
    async fn find_stale_customers(&self, cutoff: DateTime<Utc>) -> Result<Vec<CustomerId>>;
    /// Deletes the given customers (their orders cascade) and returns how many
    /// rows were actually removed.
    async fn delete_customers(&self, ids: &[CustomerId]) -> Result<u64>;
}

#[async_trait]
pub trait JobLogPort: Send + Sync {
    /// Appends all lines in one write, or nothing on failure.
    async fn append(&self, lines: &[String]) -> Result<()>;
}

#[async_trait]
pub trait HealthProbePort: Send + Sync {
    /// Returns the greeting the GraphQL endpoint answered with.
    async fn probe(&self) -> Result<String>;
}

// GraphQL-side ports

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer>;
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>>;
    async fn list_customers(&self, filter: &CustomerFilter, page: Page)
        -> Result<(Vec<Customer>, u64)>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create_product(&self, product: NewProduct) -> Result<Product>;
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;
    async fn list_products(&self, filter: &ProductFilter, page: Page)
        -> Result<(Vec<Product>, u64)>;
    /// Adds `amount` to every product whose stock is below `threshold` and
    /// returns the updated rows.
    async fn restock_below(&self, threshold: i64, amount: i64) -> Result<Vec<Product>>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: NewOrder) -> Result<Order>;
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;
    async fn list_orders(&self, filter: &OrderFilter, page: Page) -> Result<(Vec<Order>, u64)>;
    async fn orders_for_customer(&self, id: CustomerId) -> Result<Vec<Order>>;
    async fn products_for_order(&self, id: OrderId) -> Result<Vec<Product>>;
    /// Orders placed at or after `since`, oldest first.
    async fn order_contacts_since(&self, since: DateTime<Utc>) -> Result<Vec<OrderContact>>;
}

/// Everything the HTTP server needs from one store.
pub trait CrmRepository:
    ReportingRepository
    + RetentionRepository
    + CustomerRepository
    + ProductRepository
    + OrderRepository
{
}

impl<T> CrmRepository for T where
    T: ReportingRepository
        + RetentionRepository
        + CustomerRepository
        + ProductRepository
        + OrderRepository
{
}
