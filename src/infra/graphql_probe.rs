use crate::app::ports::HealthProbePort;
use crate::error::{CrmError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize)]
struct HelloResponse {
    data: Option<HelloData>,
}

#[derive(Deserialize)]
struct HelloData {
    hello: String,
}

/// Asks a running GraphQL endpoint for `{ hello }`.
pub struct GraphqlHelloProbe {
    endpoint: String,
    client: reqwest::Client,
}

impl GraphqlHelloProbe {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl HealthProbePort for GraphqlHelloProbe {
    async fn probe(&self) -> Result<String> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": "{ hello }" }))
            .send()
            .await?
            .error_for_status()?;
        let body: HelloResponse = resp.json().await?;
        body.data
            .map(|d| d.hello)
            .ok_or_else(|| CrmError::NotFound("data.hello in GraphQL response".into()))
    }
}
