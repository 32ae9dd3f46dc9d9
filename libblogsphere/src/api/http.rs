//! `reqwest`-backed transport
//!
//! Compiles for native targets and for `wasm32`, where `reqwest` issues
//! requests through the browser's `fetch`. On `wasm32` every URL must be
//! absolute, so the browser host fills `api.base_url` with the page origin.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::api::{ApiTransport, HttpResponse};
use crate::error::ApiError;

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait(?Send)]
impl ApiTransport for HttpTransport {
    async fn post(&self, url: &str, body: Option<&Value>) -> Result<HttpResponse, ApiError> {
        let mut request = self.client.post(url).header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to read response body: {}", e)))?;

        debug!(status, bytes = body.len(), "HTTP response");
        Ok(HttpResponse { status, body })
    }
}
