use anyhow::Result;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use crm_service::graphql::{create_schema, GraphQLSchema};
use crm_service::infra::SqliteRepository;

fn schema() -> Result<GraphQLSchema> {
    Ok(create_schema(Arc::new(SqliteRepository::open_in_memory()?)))
}

async fn run(schema: &GraphQLSchema, query: &str) -> Value {
    let response = schema.execute(query).await;
    assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
    response.data.into_json().unwrap()
}

async fn seed(schema: &GraphQLSchema) -> (String, String, String) {
    let data = run(
        schema,
        r#"mutation {
            alice: createCustomer(input: { name: "Alice", email: "alice@example.com", phone: "+1234567890" }) {
                customer { id }
            }
            laptop: createProduct(input: { name: "Laptop", price: "19.99", stock: 3 }) { id }
            mouse: createProduct(input: { name: "Mouse", price: "5.01", stock: 40 }) { id }
        }"#,
    )
    .await;
    (
        data["alice"]["customer"]["id"].as_str().unwrap().to_string(),
        data["laptop"]["id"].as_str().unwrap().to_string(),
        data["mouse"]["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_hello_query() -> Result<()> {
    let schema = schema()?;
    let data = run(&schema, "{ hello }").await;
    assert!(data["hello"].as_str().unwrap().starts_with("Hello, GraphQL!"));
    Ok(())
}

#[tokio::test]
async fn test_create_customer_returns_message() -> Result<()> {
    let schema = schema()?;
    let data = run(
        &schema,
        r#"mutation {
            createCustomer(input: { name: "Bob", email: "Bob@Example.com" }) {
                customer { name email phone }
                message
            }
        }"#,
    )
    .await;

    assert_eq!(
        data["createCustomer"]["customer"],
        json!({ "name": "Bob", "email": "bob@example.com", "phone": null })
    );
    assert_eq!(data["createCustomer"]["message"], "Customer 'Bob' created");
    Ok(())
}

#[tokio::test]
async fn test_invalid_customer_is_rejected() -> Result<()> {
    let schema = schema()?;
    let response = schema
        .execute(r#"mutation { createCustomer(input: { name: "Eve", email: "not-an-email" }) { message } }"#)
        .await;
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].message.contains("invalid email"));

    let response = schema
        .execute(r#"mutation { createCustomer(input: { name: "Eve", email: "eve@example.com", phone: "12345" }) { message } }"#)
        .await;
    assert!(response.errors[0].message.contains("invalid phone"));
    Ok(())
}

#[tokio::test]
async fn test_bulk_create_keeps_valid_entries() -> Result<()> {
    let schema = schema()?;
    let data = run(
        &schema,
        r#"mutation {
            bulkCreateCustomers(input: [
                { name: "Ann", email: "ann@example.com" },
                { name: "Ann Again", email: "ann@example.com" },
                { name: "Ben", email: "ben@example.com", phone: "123-456-7890" }
            ]) {
                customers { name }
                errors
            }
        }"#,
    )
    .await;

    let payload = &data["bulkCreateCustomers"];
    assert_eq!(payload["customers"], json!([{ "name": "Ann" }, { "name": "Ben" }]));
    let errors = payload["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].as_str().unwrap().starts_with("#1:"));
    Ok(())
}

#[tokio::test]
async fn test_create_order_totals_product_prices() -> Result<()> {
    let schema = schema()?;
    let (alice, laptop, mouse) = seed(&schema).await;

    let data = run(
        &schema,
        &format!(
            r#"mutation {{
                createOrder(input: {{ customerId: "{alice}", productIds: ["{laptop}", "{mouse}"] }}) {{
                    totalAmount
                    customer {{ name }}
                    products {{ name }}
                }}
            }}"#
        ),
    )
    .await;

    let order = &data["createOrder"];
    assert_eq!(order["totalAmount"], "25.00");
    assert_eq!(order["customer"]["name"], "Alice");
    assert_eq!(order["products"], json!([{ "name": "Laptop" }, { "name": "Mouse" }]));
    Ok(())
}

#[tokio::test]
async fn test_order_for_missing_customer_fails() -> Result<()> {
    let schema = schema()?;
    let (_, laptop, _) = seed(&schema).await;
    let response = schema
        .execute(format!(
            r#"mutation {{ createOrder(input: {{ customerId: "999", productIds: ["{laptop}"] }}) {{ id }} }}"#
        ))
        .await;
    assert_eq!(response.errors.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_all_orders_filters_and_counts() -> Result<()> {
    let schema = schema()?;
    let (alice, laptop, mouse) = seed(&schema).await;
    for products in [format!(r#""{laptop}""#), format!(r#""{mouse}""#), format!(r#""{mouse}""#)] {
        run(
            &schema,
            &format!(
                r#"mutation {{ createOrder(input: {{ customerId: "{alice}", productIds: [{products}] }}) {{ id }} }}"#
            ),
        )
        .await;
    }

    let data = run(
        &schema,
        r#"{
            allOrders(filter: { customerName: "ali", productName: "mou" }, first: 1) {
                totalCount
                pageInfo { hasNextPage hasPreviousPage }
                edges { node { totalAmount } }
            }
        }"#,
    )
    .await;

    let orders = &data["allOrders"];
    assert_eq!(orders["totalCount"], 2);
    assert_eq!(orders["pageInfo"], json!({ "hasNextPage": true, "hasPreviousPage": false }));
    assert_eq!(orders["edges"], json!([{ "node": { "totalAmount": "5.01" } }]));

    let data = run(
        &schema,
        r#"{ allOrders(filter: { totalAmountGte: "10" }) { totalCount } }"#,
    )
    .await;
    assert_eq!(data["allOrders"]["totalCount"], 1);
    Ok(())
}

#[tokio::test]
async fn test_all_products_low_stock_filter() -> Result<()> {
    let schema = schema()?;
    seed(&schema).await;
    let data = run(
        &schema,
        r#"{ allProducts(filter: { lowStock: true }) { totalCount edges { node { name stock } } } }"#,
    )
    .await;
    assert_eq!(data["allProducts"]["totalCount"], 1);
    assert_eq!(
        data["allProducts"]["edges"],
        json!([{ "node": { "name": "Laptop", "stock": 3 } }])
    );
    Ok(())
}

#[tokio::test]
async fn test_update_low_stock_products_uses_defaults() -> Result<()> {
    let schema = schema()?;
    seed(&schema).await;
    let data = run(
        &schema,
        r#"mutation {
            updateLowStockProducts {
                success
                message
                updatedCount
                updatedProducts { name stock }
            }
        }"#,
    )
    .await;

    let payload = &data["updateLowStockProducts"];
    assert_eq!(payload["success"], true);
    assert_eq!(payload["updatedCount"], 1);
    assert_eq!(payload["updatedProducts"], json!([{ "name": "Laptop", "stock": 53 }]));
    assert_eq!(
        payload["message"],
        "Restocked 1 product(s) below stock threshold 10 by 50."
    );
    Ok(())
}

#[tokio::test]
async fn test_summary_matches_store() -> Result<()> {
    let schema = schema()?;
    let (alice, laptop, _) = seed(&schema).await;
    run(
        &schema,
        &format!(
            r#"mutation {{ createOrder(input: {{ customerId: "{alice}", productIds: ["{laptop}"] }}) {{ id }} }}"#
        ),
    )
    .await;

    let data = run(&schema, "{ summary { totalCustomers totalOrders totalRevenue } }").await;
    assert_eq!(
        data["summary"],
        json!({ "totalCustomers": 1, "totalOrders": 1, "totalRevenue": "19.99" })
    );
    Ok(())
}

async fn seed_customers(schema: &GraphQLSchema, names: &[&str]) {
    for name in names {
        run(
            schema,
            &format!(
                r#"mutation {{ createCustomer(input: {{ name: "{name}", email: "{}@example.com" }}) {{ message }} }}"#,
                name.to_lowercase()
            ),
        )
        .await;
    }
}

#[tokio::test]
async fn test_customer_connection_paging() -> Result<()> {
    let schema = schema()?;
    seed_customers(&schema, &["A", "B", "C", "D", "E"]).await;

    let data = run(
        &schema,
        r#"{
            tail: allCustomers(last: 2) {
                edges { cursor node { name } }
                pageInfo { hasPreviousPage hasNextPage }
            }
            beforeTwo: allCustomers(before: "2", last: 1) {
                edges { node { name } }
                pageInfo { hasPreviousPage hasNextPage }
            }
            afterOne: allCustomers(after: "1", first: 2) {
                totalCount
                edges { node { name } }
            }
        }"#,
    )
    .await;

    assert_eq!(
        data["tail"]["edges"],
        json!([
            { "cursor": "3", "node": { "name": "D" } },
            { "cursor": "4", "node": { "name": "E" } }
        ])
    );
    assert_eq!(
        data["tail"]["pageInfo"],
        json!({ "hasPreviousPage": true, "hasNextPage": false })
    );
    assert_eq!(data["beforeTwo"]["edges"], json!([{ "node": { "name": "B" } }]));
    assert_eq!(
        data["beforeTwo"]["pageInfo"],
        json!({ "hasPreviousPage": true, "hasNextPage": true })
    );
    assert_eq!(data["afterOne"]["totalCount"], 5);
    assert_eq!(
        data["afterOne"]["edges"],
        json!([{ "node": { "name": "C" } }, { "node": { "name": "D" } }])
    );
    Ok(())
}

#[tokio::test]
async fn test_out_of_range_cursors_are_errors() -> Result<()> {
    let schema = schema()?;
    seed_customers(&schema, &["A"]).await;

    for query in [
        r#"{ allCustomers(after: "18446744073709551615", first: 1) { edges { node { name } } } }"#,
        r#"{ allCustomers(after: "9223372036854775807") { edges { node { name } } } }"#,
        r#"{ allCustomers(before: "9223372036854775807", last: 1) { edges { node { name } } } }"#,
    ] {
        let response = schema.execute(query).await;
        assert_eq!(response.errors.len(), 1, "{query} should be rejected");
    }
    Ok(())
}

#[tokio::test]
async fn test_customer_created_at_filter() -> Result<()> {
    let schema = schema()?;
    seed_customers(&schema, &["Dana"]).await;
    let today = Utc::now().date_naive();
    let yesterday = today - Duration::days(1);
    let tomorrow = today + Duration::days(1);

    let data = run(
        &schema,
        &format!(
            r#"{{
                around: allCustomers(filter: {{ createdAtGte: "{yesterday}", createdAtLte: "{tomorrow}" }}) {{ totalCount }}
                before: allCustomers(filter: {{ createdAtLte: "{yesterday}" }}) {{ totalCount }}
                after: allCustomers(filter: {{ createdAtGte: "{tomorrow}" }}) {{ totalCount }}
            }}"#
        ),
    )
    .await;

    assert_eq!(data["around"]["totalCount"], 1);
    assert_eq!(data["before"]["totalCount"], 0);
    assert_eq!(data["after"]["totalCount"], 0);
    Ok(())
}

#[tokio::test]
async fn test_order_date_filter_covers_whole_days() -> Result<()> {
    let schema = schema()?;
    let (alice, laptop, _) = seed(&schema).await;
    for at in ["2025-03-09T23:30:00Z", "2025-03-10T00:00:00Z"] {
        run(
            &schema,
            &format!(
                r#"mutation {{ createOrder(input: {{ customerId: "{alice}", productIds: ["{laptop}"], orderDate: "{at}" }}) {{ id }} }}"#
            ),
        )
        .await;
    }

    let data = run(
        &schema,
        r#"{
            ninth: allOrders(filter: { orderDateLte: "2025-03-09" }) { totalCount }
            tenth: allOrders(filter: { orderDateGte: "2025-03-10" }) { totalCount }
            both: allOrders(filter: { orderDateGte: "2025-03-09", orderDateLte: "2025-03-10" }) { totalCount }
        }"#,
    )
    .await;

    assert_eq!(data["ninth"]["totalCount"], 1);
    assert_eq!(data["tenth"]["totalCount"], 1);
    assert_eq!(data["both"]["totalCount"], 2);
    Ok(())
}
