use crate::config::ServiceConfig;
use anyhow::{Context as AnyhowContext, Result};
use async_trait::async_trait;
use qualstat_engine::{EngineError, NumericService};
use qualstat_protocol::ServicePayload;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

/// Numeric service reached over HTTP: one JSON POST per test.
pub struct HttpNumericService {
    client: Client,
    endpoint: String,
}

impl HttpNumericService {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl NumericService for HttpNumericService {
    async fn compute(&self, payload: &ServicePayload) -> qualstat_engine::Result<serde_json::Value> {
        let body = serde_json::to_vec(payload)?;
        log::debug!(
            "POST {} ({} bytes, subtype {})",
            self.endpoint,
            body.len(),
            payload.subtype
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| {
                EngineError::upstream(
                    err.status().map(|s| s.as_u16()),
                    format!("request to {} failed: {err}", self.endpoint),
                )
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|err| {
            EngineError::upstream(Some(status.as_u16()), format!("failed to read body: {err}"))
        })?;

        if !status.is_success() {
            return Err(EngineError::upstream(
                Some(status.as_u16()),
                upstream_message(&text),
            ));
        }

        serde_json::from_str(&text).map_err(|err| {
            EngineError::upstream(
                Some(status.as_u16()),
                format!("malformed response body: {err}"),
            )
        })
    }
}

/// The service reports failures as `{"message": "..."}`; fall back to the raw body.
fn upstream_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    if let Some(message) = parsed
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(|value| value.as_str())
    {
        return message.to_string();
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response".to_string()
    } else {
        trimmed.to_string()
    }
}
