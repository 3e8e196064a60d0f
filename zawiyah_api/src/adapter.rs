//! The adapter contract and the request helpers shared by every adapter.
//!
//! An [`Adapter`] answers the five REST verbs for an endpoint path and always
//! resolves to an [`ApiResponse`]: failures are folded into the envelope
//! instead of being returned as `Err`. Concrete adapters keep their
//! connection settings in a [`RequestContext`] and build on the free
//! functions here for URLs, headers, retries, timeouts and response wrapping.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::config::{AdapterConfig, AdapterKind, ApiConfig, ConfigPatch};
use crate::error::AdapterError;
use crate::http::HttpAdapter;
use crate::mock::MockAdapter;
use crate::query::Params;
use crate::types::{ApiResponse, Pagination};

/// Request headers by name.
pub type Headers = BTreeMap<String, String>;

/// Base delay of the first retry; each further attempt doubles it.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

pub const AUTHORIZATION: &str = "Authorization";

/// A backend, real or simulated, addressed by endpoint path.
#[async_trait]
pub trait Adapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    async fn get(&self, endpoint: &str, params: &Params) -> ApiResponse<Value>;

    async fn post(&self, endpoint: &str, body: Option<Value>) -> ApiResponse<Value>;

    async fn put(&self, endpoint: &str, body: Option<Value>) -> ApiResponse<Value>;

    async fn patch(&self, endpoint: &str, body: Option<Value>) -> ApiResponse<Value>;

    async fn delete(&self, endpoint: &str) -> ApiResponse<Value>;

    /// Issues `GET /health` and reports whether it succeeded.
    async fn health_check(&self) -> bool {
        self.get("/health", &Params::new()).await.success
    }

    fn config(&self) -> ApiConfig;

    /// Headers sent with every request, before per-call overrides.
    fn headers(&self) -> Headers;

    fn update_config(&self, patch: &ConfigPatch);
}

/// Builds the adapter described by `config`.
pub fn create_adapter(config: &AdapterConfig) -> Result<Arc<dyn Adapter>, AdapterError> {
    tracing::debug!("Creating {} adapter for {}", config.kind, config.config.base_url);
    Ok(match config.kind {
        AdapterKind::Mock => Arc::new(MockAdapter::new(config.config.clone())),
        AdapterKind::Http => Arc::new(HttpAdapter::new(config.config.clone())?),
    })
}

struct ContextState {
    config: ApiConfig,
    headers: Headers,
}

/// Connection settings plus the headers derived from them.
///
/// Lives behind a lock so that a shared adapter can be reconfigured through
/// `&self`; the `Authorization` header is kept in step with `api_key`.
pub struct RequestContext {
    state: RwLock<ContextState>,
}

impl RequestContext {
    pub fn new(config: ApiConfig) -> Self {
        let headers = default_headers(config.api_key.as_deref());
        Self {
            state: RwLock::new(ContextState { config, headers }),
        }
    }

    pub fn config(&self) -> ApiConfig {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .config
            .clone()
    }

    pub fn headers(&self) -> Headers {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .headers
            .clone()
    }

    /// Merges `patch` into the stored config and reconciles the bearer header
    /// when the patch carries an `api_key`.
    pub fn update(&self, patch: &ConfigPatch) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.config.apply(patch);
        if let Some(ref api_key) = patch.api_key {
            match api_key.as_deref().filter(|k| !k.is_empty()) {
                Some(key) => {
                    state
                        .headers
                        .insert(AUTHORIZATION.to_string(), format!("Bearer {}", key));
                }
                None => {
                    state.headers.remove(AUTHORIZATION);
                }
            }
        }
    }

    pub fn build_url(&self, endpoint: &str, params: &Params) -> Result<Url, AdapterError> {
        let base_url = self
            .state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .config
            .base_url
            .clone();
        build_url(&base_url, endpoint, params)
    }

    pub fn build_headers(&self, custom: Option<&Headers>) -> Headers {
        build_headers(&self.headers(), custom)
    }
}

fn default_headers(api_key: Option<&str>) -> Headers {
    let mut headers = Headers::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert("Accept".to_string(), "application/json".to_string());
    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        headers.insert(AUTHORIZATION.to_string(), format!("Bearer {}", key));
    }
    headers
}

/// Joins `endpoint` onto `base_url` and appends the defined `params`.
///
/// The base path is preserved: `http://host/api` + `/users` gives
/// `http://host/api/users`.
pub fn build_url(base_url: &str, endpoint: &str, params: &Params) -> Result<Url, AdapterError> {
    let base = base_url.trim_end_matches('/');
    let url = if endpoint.starts_with('/') {
        format!("{}{}", base, endpoint)
    } else {
        format!("{}/{}", base, endpoint)
    };
    let url = Url::parse(&url).map_err(|e| {
        tracing::error!("Invalid URL constructed from {}: {}", base_url, e);
        AdapterError::InvalidUrl(e.to_string())
    })?;
    Ok(params.add_to_url(&url))
}

/// Layers `custom` over `base`; custom values win on conflict.
pub fn build_headers(base: &Headers, custom: Option<&Headers>) -> Headers {
    let mut headers = base.clone();
    if let Some(custom) = custom {
        for (name, value) in custom {
            headers.insert(name.clone(), value.clone());
        }
    }
    headers
}

/// Delay before retry number `attempt + 1`: `base * 2^attempt`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32 << attempt.min(20);
    base.saturating_mul(factor)
}

/// Runs `op`, retrying every `Err` with exponential backoff.
///
/// The last error is returned once `max_retries` retries have failed. An
/// `Ok` value is never retried, even when it is a failed [`ApiResponse`].
pub async fn with_retry<T, F, Fut>(
    label: &str,
    max_retries: u32,
    base_delay: Duration,
    op: F,
) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    with_retry_if(label, max_retries, base_delay, |_| true, op).await
}

/// Like [`with_retry`], but gives up immediately on errors rejected by `should_retry`.
pub async fn with_retry_if<T, F, Fut, P>(
    label: &str,
    max_retries: u32,
    base_delay: Duration,
    should_retry: P,
    mut op: F,
) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
    P: Fn(&AdapterError) -> bool,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_retries || !should_retry(&err) {
                    return Err(err);
                }
                let delay = backoff_delay(base_delay, attempt);
                attempt += 1;
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}, retrying in {:.1}s",
                    label,
                    attempt,
                    max_retries,
                    err,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Fails with [`AdapterError::Timeout`] if `fut` has not finished after `timeout`.
///
/// The unfinished future is dropped, which abandons the wait; any side
/// effects it already performed stay in place.
pub async fn with_timeout<T, Fut>(fut: Fut, timeout: Duration) -> Result<T, AdapterError>
where
    Fut: Future<Output = Result<T, AdapterError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout {
            ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

pub fn success_response(data: Value, message: Option<String>) -> ApiResponse<Value> {
    ApiResponse::success(data, message)
}

pub fn error_response(error: &AdapterError, message: Option<String>) -> ApiResponse<Value> {
    ApiResponse::failure(error, message)
}

/// A successful response carrying one page of a collection.
pub fn paginated_response(items: Value, pagination: Pagination) -> ApiResponse<Value> {
    ApiResponse::success(items, None).with_pagination(pagination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn context(api_key: Option<&str>) -> RequestContext {
        RequestContext::new(ApiConfig {
            api_key: api_key.map(str::to_string),
            ..ApiConfig::default()
        })
    }

    #[test]
    fn build_url_keeps_base_path() {
        let url = build_url("http://localhost:3001/api/", "/users/user_1", &Params::new()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/api/users/user_1");
        let url = build_url("http://localhost:3001/api", "donations", &Params::new()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/api/donations");
    }

    #[test]
    fn build_url_appends_defined_params() {
        let params = Params::new()
            .with("userId", "user 1")
            .with("campaign", Value::Null);
        let url = build_url("http://localhost/api", "/donations", &params).unwrap();
        assert_eq!(url.as_str(), "http://localhost/api/donations?userId=user+1");
    }

    #[test]
    fn build_url_rejects_garbage_base() {
        let err = build_url("not a url", "/users", &Params::new()).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidUrl(_)));
    }

    #[test]
    fn headers_include_bearer_when_keyed() {
        let headers = context(Some("secret")).headers();
        assert_eq!(headers.get("Content-Type").unwrap(), "application/json");
        assert_eq!(headers.get("Accept").unwrap(), "application/json");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer secret");
        assert!(context(None).headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn custom_headers_win() {
        let ctx = context(None);
        let mut custom = Headers::new();
        custom.insert("Accept".to_string(), "text/plain".to_string());
        custom.insert("X-Trace".to_string(), "1".to_string());
        let headers = ctx.build_headers(Some(&custom));
        assert_eq!(headers.get("Accept").unwrap(), "text/plain");
        assert_eq!(headers.get("X-Trace").unwrap(), "1");
        assert_eq!(headers.get("Content-Type").unwrap(), "application/json");
    }

    #[test]
    fn update_config_reconciles_authorization() {
        let ctx = context(None);
        ctx.update(&ConfigPatch::default().with_api_key(Some("abc")));
        assert_eq!(ctx.headers().get(AUTHORIZATION).unwrap(), "Bearer abc");
        assert_eq!(ctx.config().api_key.as_deref(), Some("abc"));

        ctx.update(&ConfigPatch::default().with_api_key(None));
        assert!(ctx.headers().get(AUTHORIZATION).is_none());
        assert_eq!(ctx.config().api_key, None);

        ctx.update(&ConfigPatch::default().with_api_key(Some("")));
        assert!(ctx.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn empty_update_is_a_no_op() {
        let ctx = context(Some("abc"));
        let config = ctx.config();
        let headers = ctx.headers();
        ctx.update(&ConfigPatch::default());
        assert_eq!(ctx.config(), config);
        assert_eq!(ctx.headers(), headers);
    }

    #[test]
    fn update_without_key_keeps_header() {
        let ctx = context(Some("abc"));
        ctx.update(&ConfigPatch::default().with_timeout(50));
        assert_eq!(ctx.config().timeout, 50);
        assert_eq!(ctx.headers().get(AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[test]
    fn backoff_doubles() {
        let base = Duration::from_millis(1000);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(1000));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(8000));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_recovers_after_two_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let start = tokio::time::Instant::now();
        let result = with_retry("op", 3, DEFAULT_RETRY_DELAY, move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(AdapterError::Network("flaky".to_string()))
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_returns_last_error_when_exhausted() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry("op", 2, Duration::from_millis(10), move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Err(AdapterError::Validation(format!("failure {}", n)))
        })
        .await;
        assert_eq!(result.unwrap_err().to_string(), "failure 2");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_does_not_retry_failed_envelopes() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry("op", 3, DEFAULT_RETRY_DELAY, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(error_response(
                &AdapterError::Validation("rejected".to_string()),
                None,
            ))
        })
        .await;
        assert!(!result.unwrap().success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_if_stops_on_rejected_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry_if(
            "op",
            3,
            DEFAULT_RETRY_DELAY,
            AdapterError::is_retryable,
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AdapterError::HttpStatus {
                    status: 404,
                    reason: "Not Found".to_string(),
                })
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fires() {
        let result: Result<(), _> = with_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            Duration::from_millis(100),
        )
        .await;
        assert!(matches!(result, Err(AdapterError::Timeout { ms: 100 })));
    }

    #[tokio::test]
    async fn timeout_passes_through_fast_results() {
        let result = with_timeout(async { Ok(7) }, Duration::from_secs(1)).await;
        assert_eq!(result.unwrap(), 7);
    }
}
