use crate::app::ports::{CustomerRepository, OrderRepository, ProductRepository};
use crate::app::restock_low_stock;
use crate::app::restock_use_case::DEFAULT_RESTOCK_AMOUNT;
use crate::domain::{NewCustomer, NewOrder, NewProduct, LOW_STOCK_THRESHOLD};
use crate::graphql::schema::GraphQLContext;
use crate::graphql::types::{parse_id, Customer, Order, Product};
use async_graphql::{Context, InputObject, Object, Result, SimpleObject, ID};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

#[derive(InputObject, Clone)]
pub struct CreateCustomerInput {
    pub name: String,
    pub email: String,
    /// `+1234567890` or `123-456-7890`
    pub phone: Option<String>,
}

impl From<CreateCustomerInput> for NewCustomer {
    fn from(input: CreateCustomerInput) -> Self {
        Self {
            name: input.name,
            email: input.email,
            phone: input.phone,
        }
    }
}

#[derive(SimpleObject)]
pub struct CreateCustomerPayload {
    pub customer: Customer,
    pub message: String,
}

#[derive(SimpleObject)]
pub struct BulkCreateCustomersPayload {
    pub customers: Vec<Customer>,
    /// One entry per rejected input, prefixed with its position
    pub errors: Vec<String>,
}

#[derive(InputObject)]
pub struct CreateProductInput {
    pub name: String,
    pub price: Decimal,
    #[graphql(default)]
    pub stock: i64,
}

#[derive(InputObject)]
pub struct CreateOrderInput {
    pub customer_id: ID,
    pub product_ids: Vec<ID>,
    /// Defaults to now
    pub order_date: Option<DateTime<Utc>>,
}

#[derive(SimpleObject)]
pub struct UpdateLowStockProductsPayload {
    pub success: bool,
    pub message: String,
    pub updated_count: i32,
    pub updated_products: Vec<Product>,
}

/// Root mutation object for GraphQL
pub struct Mutation;

#[Object]
impl Mutation {
    /// Create a single customer
    async fn create_customer(
        &self,
        ctx: &Context<'_>,
        input: CreateCustomerInput,
    ) -> Result<CreateCustomerPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let customer = context.repo.create_customer(input.into()).await?;
        Ok(CreateCustomerPayload {
            message: format!("Customer '{}' created", customer.name),
            customer: customer.into(),
        })
    }

    /// Create many customers; valid entries are saved even if others fail
    async fn bulk_create_customers(
        &self,
        ctx: &Context<'_>,
        input: Vec<CreateCustomerInput>,
    ) -> Result<BulkCreateCustomersPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let mut customers = Vec::new();
        let mut errors = Vec::new();
        for (index, entry) in input.into_iter().enumerate() {
            match context.repo.create_customer(entry.into()).await {
                Ok(customer) => customers.push(customer.into()),
                Err(e) => errors.push(format!("#{index}: {e}")),
            }
        }
        info!(created = customers.len(), rejected = errors.len(), "Bulk customer import");
        Ok(BulkCreateCustomersPayload { customers, errors })
    }

    async fn create_product(
        &self,
        ctx: &Context<'_>,
        input: CreateProductInput,
    ) -> Result<Product> {
        let context = ctx.data::<GraphQLContext>()?;
        let product = context
            .repo
            .create_product(NewProduct {
                name: input.name,
                price: input.price,
                stock: input.stock,
            })
            .await?;
        Ok(product.into())
    }

    /// Place an order; the total is the sum of the product prices
    async fn create_order(&self, ctx: &Context<'_>, input: CreateOrderInput) -> Result<Order> {
        let context = ctx.data::<GraphQLContext>()?;
        let product_ids = input
            .product_ids
            .iter()
            .map(parse_id)
            .collect::<Result<Vec<_>>>()?;
        let order = context
            .repo
            .create_order(NewOrder {
                customer_id: parse_id(&input.customer_id)?,
                product_ids,
                order_date: input.order_date,
            })
            .await?;
        Ok(order.into())
    }

    /// Restock every product whose stock is below `threshold`
    async fn update_low_stock_products(
        &self,
        ctx: &Context<'_>,
        #[graphql(default_with = "LOW_STOCK_THRESHOLD")] threshold: i64,
        #[graphql(default_with = "DEFAULT_RESTOCK_AMOUNT")] restock_amount: i64,
    ) -> Result<UpdateLowStockProductsPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let outcome = restock_low_stock(context.repo.as_ref(), threshold, restock_amount).await?;
        Ok(UpdateLowStockProductsPayload {
            success: outcome.success,
            message: outcome.message,
            updated_count: outcome.updated.len() as i32,
            updated_products: outcome.updated.into_iter().map(Into::into).collect(),
        })
    }
}
