pub mod customer;
pub mod order;
pub mod product;

pub use customer::Customer;
pub use order::Order;
pub use product::Product;

use async_graphql::{Result, ID};

/// Parse a GraphQL `ID` into a numeric row id.
pub fn parse_id(id: &ID) -> Result<i64> {
    id.parse::<i64>()
        .map_err(|_| format!("invalid id '{}'", id.as_str()).into())
}
