use crate::domain::Order as DomainOrder;
use crate::graphql::schema::GraphQLContext;
use async_graphql::{Context, Object, Result, ID};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// GraphQL representation of an Order
#[derive(Clone)]
pub struct Order {
    pub inner: DomainOrder,
}

impl From<DomainOrder> for Order {
    fn from(order: DomainOrder) -> Self {
        Self { inner: order }
    }
}

#[Object]
impl Order {
    /// The unique identifier for the order
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    /// When the order was placed
    async fn order_date(&self) -> DateTime<Utc> {
        self.inner.order_date
    }

    /// Sum of the ordered products' prices
    async fn total_amount(&self) -> Decimal {
        self.inner.total_amount
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// The customer who placed the order
    async fn customer(&self, ctx: &Context<'_>) -> Result<super::Customer> {
        let context = ctx.data::<GraphQLContext>()?;
        let customer = context
            .repo
            .get_customer(self.inner.customer_id)
            .await?
            .ok_or("Customer not available")?;
        Ok(customer.into())
    }

    /// Products included in the order
    async fn products(&self, ctx: &Context<'_>) -> Result<Vec<super::Product>> {
        let context = ctx.data::<GraphQLContext>()?;
        let products = context.repo.products_for_order(self.inner.id).await?;
        Ok(products.into_iter().map(Into::into).collect())
    }
}
