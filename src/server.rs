use crate::app::{CleanupOutcome, CleanupUseCase, ReportSummary, ReportUseCase};
use crate::config::Config;
use crate::graphql::{create_schema, GraphQLSchema};
use crate::infra::{FileJobLog, SqliteRepository};
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::Query,
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Extension, Router,
};
use chrono::Utc;
use hyper::Server;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "crm-graphql",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GraphQL handler (supports GET and POST)
async fn graphql_handler(
    Extension(schema): Extension<GraphQLSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

/// GraphiQL UI
async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

/// Prometheus text exposition
async fn metrics() -> impl IntoResponse {
    crate::metrics::render().unwrap_or_default()
}

#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    pub dry_run: Option<bool>,
}

/// Create the HTTP server with all routes, including GraphQL
pub fn create_server(repo: Arc<SqliteRepository>, config: Arc<Config>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let schema: GraphQLSchema = create_schema(repo.clone());

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        // GraphQL endpoints
        .route("/graphql", post(graphql_handler).get(graphql_handler))
        .route("/graphiql", get(graphiql))
        .layer(Extension(schema))
        // Job trigger endpoints for external schedulers
        .route(
            "/admin/report",
            post({
                let repo = repo.clone();
                let config = config.clone();
                move || {
                    let repo = repo.clone();
                    let config = config.clone();
                    async move {
                        let job = ReportUseCase::new(
                            repo,
                            Box::new(FileJobLog::new(config.report.log_path.clone())),
                        );
                        match job.execute(Utc::now()).await {
                            Ok(summary) => Json::<ReportSummary>(summary).into_response(),
                            Err(e) => {
                                error!("Report trigger failed: {}", e);
                                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
                            }
                        }
                    }
                }
            }),
        )
        .route(
            "/admin/cleanup",
            post({
                let repo = repo.clone();
                let config = config.clone();
                move |Query(params): Query<CleanupParams>| {
                    let repo = repo.clone();
                    let config = config.clone();
                    async move {
                        let job = CleanupUseCase::new(
                            repo,
                            Box::new(FileJobLog::new(config.cleanup.log_path.clone())),
                            config.cleanup.retention_days,
                        );
                        match job
                            .execute(Utc::now(), params.dry_run.unwrap_or(false))
                            .await
                        {
                            Ok(outcome) => Json::<CleanupOutcome>(outcome).into_response(),
                            Err(e) => {
                                error!("Cleanup trigger failed: {}", e);
                                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
                            }
                        }
                    }
                }
            }),
        )
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the configured address
pub async fn start_server(repo: Arc<SqliteRepository>, config: Arc<Config>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = create_server(repo, config);

    info!("HTTP server running on http://{addr}");
    info!("GraphQL:     http://{addr}/graphql");
    info!("GraphiQL UI: http://{addr}/graphiql");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
