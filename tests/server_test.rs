use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

use crm_service::app::ports::CustomerRepository;
use crm_service::config::Config;
use crm_service::domain::NewCustomer;
use crm_service::infra::SqliteRepository;
use crm_service::server::create_server;

async fn body_json(response: axum::response::Response) -> Result<Value> {
    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let repo = Arc::new(SqliteRepository::open_in_memory()?);
    let app = create_server(repo, Arc::new(Config::default()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["status"], "healthy");
    Ok(())
}

#[tokio::test]
async fn test_graphql_over_http() -> Result<()> {
    let repo = Arc::new(SqliteRepository::open_in_memory()?);
    let app = create_server(repo, Arc::new(Config::default()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/graphql")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"query":"{ hello }"}"#))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert!(body["data"]["hello"]
        .as_str()
        .unwrap()
        .starts_with("Hello, GraphQL!"));
    Ok(())
}

#[tokio::test]
async fn test_admin_cleanup_dry_run() -> Result<()> {
    let dir = tempdir()?;
    let mut config = Config::default();
    config.cleanup.log_path = dir.path().join("cleanup.txt");

    let repo = Arc::new(SqliteRepository::open_in_memory()?);
    repo.create_customer(NewCustomer {
        name: "Idle".into(),
        email: "idle@example.com".into(),
        phone: None,
    })
    .await?;
    let app = create_server(repo.clone(), Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/cleanup?dry_run=true")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["dry_run"], true);
    assert_eq!(body["deleted"], 0);
    assert_eq!(body["stale_customers"].as_array().map(Vec::len), Some(1));
    assert!(repo.get_customer(1).await?.is_some());
    assert!(dir.path().join("cleanup.txt").exists());
    Ok(())
}

#[tokio::test]
async fn test_admin_report_returns_summary() -> Result<()> {
    let dir = tempdir()?;
    let mut config = Config::default();
    config.report.log_path = dir.path().join("report.txt");

    let repo = Arc::new(SqliteRepository::open_in_memory()?);
    let app = create_server(repo, Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/report")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["customers"], 0);
    assert_eq!(body["orders"], 0);
    Ok(())
}
