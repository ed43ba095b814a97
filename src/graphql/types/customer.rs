use crate::domain::Customer as DomainCustomer;
use crate::graphql::schema::GraphQLContext;
use async_graphql::{Context, Object, Result, ID};
use chrono::{DateTime, Utc};

/// GraphQL representation of a Customer
#[derive(Clone)]
pub struct Customer {
    pub inner: DomainCustomer,
}

impl From<DomainCustomer> for Customer {
    fn from(customer: DomainCustomer) -> Self {
        Self { inner: customer }
    }
}

#[Object]
impl Customer {
    /// The unique identifier for the customer
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    /// The customer's name
    async fn name(&self) -> &str {
        &self.inner.name
    }

    /// The customer's email address (unique)
    async fn email(&self) -> &str {
        &self.inner.email
    }

    /// The customer's phone number
    async fn phone(&self) -> Option<&str> {
        self.inner.phone.as_deref()
    }

    /// When the customer registered
    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Orders placed by this customer, oldest first
    async fn orders(&self, ctx: &Context<'_>) -> Result<Vec<super::Order>> {
        let context = ctx.data::<GraphQLContext>()?;
        let orders = context.repo.orders_for_customer(self.inner.id).await?;
        Ok(orders.into_iter().map(Into::into).collect())
    }
}
