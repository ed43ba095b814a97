use crate::app::collect_summary;
use crate::domain::{CustomerFilter, Page, ProductFilter};
use crate::graphql::filters::{CustomerFilterInput, OrderFilterInput, ProductFilterInput};
use crate::graphql::pagination::{paginate, CountedConnection};
use crate::graphql::schema::GraphQLContext;
use crate::graphql::types::{parse_id, Customer, Order, Product};
use async_graphql::{Context, Object, Result, SimpleObject, ID};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Aggregate counts, as written by the weekly report
#[derive(SimpleObject)]
pub struct CrmSummary {
    pub total_customers: u64,
    pub total_orders: u64,
    pub total_revenue: Decimal,
    pub generated_at: DateTime<Utc>,
}

/// Root query object for GraphQL
pub struct Query;

#[Object]
impl Query {
    /// Greeting with the server time
    async fn hello(&self) -> String {
        format!(
            "Hello, GraphQL! Time: {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// Get a customer by ID
    async fn customer(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Customer>> {
        let context = ctx.data::<GraphQLContext>()?;
        let customer = context.repo.get_customer(parse_id(&id)?).await?;
        Ok(customer.map(Into::into))
    }

    /// Get a product by ID
    async fn product(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Product>> {
        let context = ctx.data::<GraphQLContext>()?;
        let product = context.repo.get_product(parse_id(&id)?).await?;
        Ok(product.map(Into::into))
    }

    /// Get an order by ID
    async fn order(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Order>> {
        let context = ctx.data::<GraphQLContext>()?;
        let order = context.repo.get_order(parse_id(&id)?).await?;
        Ok(order.map(Into::into))
    }

    /// Customers, filtered and paged
    async fn all_customers(
        &self,
        ctx: &Context<'_>,
        filter: Option<CustomerFilterInput>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<CountedConnection<Customer>> {
        let repo = ctx.data::<GraphQLContext>()?.repo.clone();
        let filter: CustomerFilter = filter.unwrap_or_default().into();
        paginate(after, before, first, last, move |page: Page| {
            let repo = repo.clone();
            let filter = filter.clone();
            async move { repo.list_customers(&filter, page).await }
        })
        .await
    }

    /// Products, filtered and paged
    async fn all_products(
        &self,
        ctx: &Context<'_>,
        filter: Option<ProductFilterInput>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<CountedConnection<Product>> {
        let repo = ctx.data::<GraphQLContext>()?.repo.clone();
        let filter: ProductFilter = filter.unwrap_or_default().into();
        paginate(after, before, first, last, move |page: Page| {
            let repo = repo.clone();
            let filter = filter.clone();
            async move { repo.list_products(&filter, page).await }
        })
        .await
    }

    /// Orders, filtered and paged
    async fn all_orders(
        &self,
        ctx: &Context<'_>,
        filter: Option<OrderFilterInput>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<CountedConnection<Order>> {
        let repo = ctx.data::<GraphQLContext>()?.repo.clone();
        let filter = filter.unwrap_or_default().into_filter()?;
        paginate(after, before, first, last, move |page: Page| {
            let repo = repo.clone();
            let filter = filter.clone();
            async move { repo.list_orders(&filter, page).await }
        })
        .await
    }

    /// Current customer, order and revenue totals
    async fn summary(&self, ctx: &Context<'_>) -> Result<CrmSummary> {
        let context = ctx.data::<GraphQLContext>()?;
        let summary = collect_summary(context.repo.as_ref(), Utc::now()).await?;
        Ok(CrmSummary {
            total_customers: summary.customers,
            total_orders: summary.orders,
            total_revenue: summary.revenue,
            generated_at: summary.generated_at,
        })
    }
}
