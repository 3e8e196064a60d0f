//! Adapter backed by a live JSON-over-HTTP backend.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::adapter::{
    error_response, success_response, with_retry_if, with_timeout, Adapter, Headers,
    RequestContext, DEFAULT_RETRY_DELAY,
};
use crate::config::{AdapterKind, ApiConfig, ConfigPatch};
use crate::error::AdapterError;
use crate::query::Params;
use crate::types::ApiResponse;

/// HTTP adapter with the same contract as the mock adapter.
///
/// Every call is bounded by the configured timeout. Non-2xx answers become
/// `HTTP <status>: <reason>` failures without reading the body as JSON.
/// GET requests are retried with exponential backoff on transport errors,
/// timeouts, 429 and 5xx; mutations are sent once.
pub struct HttpAdapter {
    context: RequestContext,
    client: reqwest::Client,
}

impl HttpAdapter {
    pub fn new(config: ApiConfig) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            tracing::error!("Failed to build HTTP client: {}", e);
            AdapterError::Network(e.to_string())
        })?;
        Ok(Self {
            context: RequestContext::new(config),
            client,
        })
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<Value, AdapterError> {
        let url = self.context.build_url(endpoint, params)?;
        let headers = self.context.build_headers(None);
        let timeout = self.context.config().timeout_duration();
        with_timeout(self.execute(method, url, headers, body), timeout).await
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        headers: Headers,
        body: Option<&Value>,
    ) -> Result<Value, AdapterError> {
        let mut request = self.client.request(method.clone(), url.clone());
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let resp = request.send().await.map_err(|e| {
            tracing::error!("{} {} failed: {}", method, url, e);
            AdapterError::Network(e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::error!("{} {} returned {}", method, url, status);
            return Err(AdapterError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            AdapterError::Network(e.to_string())
        })?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse response: {} | body: {}", e, truncate_body(&body));
            AdapterError::Serialization(e)
        })
    }

    async fn mutate(&self, method: Method, endpoint: &str, body: Option<Value>) -> ApiResponse<Value> {
        let result = self
            .send(method, endpoint, &Params::new(), body.as_ref())
            .await;
        into_response(result)
    }
}

fn into_response(result: Result<Value, AdapterError>) -> ApiResponse<Value> {
    match result {
        Ok(data) => success_response(data, None),
        Err(err) => error_response(&err, None),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 500;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}

#[async_trait]
impl Adapter for HttpAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Http
    }

    async fn get(&self, endpoint: &str, params: &Params) -> ApiResponse<Value> {
        let retries = self.context.config().retries;
        let label = format!("GET {}", endpoint);
        let result = with_retry_if(
            &label,
            retries,
            DEFAULT_RETRY_DELAY,
            AdapterError::is_retryable,
            move || self.send(Method::GET, endpoint, params, None),
        )
        .await;
        into_response(result)
    }

    async fn post(&self, endpoint: &str, body: Option<Value>) -> ApiResponse<Value> {
        self.mutate(Method::POST, endpoint, body).await
    }

    async fn put(&self, endpoint: &str, body: Option<Value>) -> ApiResponse<Value> {
        self.mutate(Method::PUT, endpoint, body).await
    }

    async fn patch(&self, endpoint: &str, body: Option<Value>) -> ApiResponse<Value> {
        self.mutate(Method::PATCH, endpoint, body).await
    }

    async fn delete(&self, endpoint: &str) -> ApiResponse<Value> {
        self.mutate(Method::DELETE, endpoint, None).await
    }

    fn config(&self) -> ApiConfig {
        self.context.config()
    }

    fn headers(&self) -> Headers {
        self.context.headers()
    }

    fn update_config(&self, patch: &ConfigPatch) {
        self.context.update(patch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "é".repeat(400);
        let out = truncate_body(&body);
        assert!(out.ends_with("...[truncated]"));
        assert_eq!(truncate_body("short"), "short");
    }
}
