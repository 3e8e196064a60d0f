//! Simulated backend serving the fixture store with artificial latency.

mod store;

pub use self::store::{FixtureStore, ResourceKind, Route};

use std::ops::Range;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;

use crate::adapter::{
    error_response, paginated_response, success_response, Adapter, Headers, RequestContext,
};
use crate::config::{AdapterKind, ApiConfig, ConfigPatch};
use crate::error::AdapterError;
use crate::query::Params;
use crate::types::ApiResponse;

/// Latency range applied before every mock call, in milliseconds.
pub const DEFAULT_LATENCY_MS: Range<u64> = 100..500;

/// Adapter that answers from an in-memory [`FixtureStore`].
///
/// Each instance owns its own store, so two mock adapters never observe
/// each other's writes. Handler failures come back as failed responses.
pub struct MockAdapter {
    context: RequestContext,
    store: Mutex<FixtureStore>,
    latency_ms: Range<u64>,
}

impl MockAdapter {
    /// Creates a mock adapter over the bundled demo data.
    pub fn new(config: ApiConfig) -> Self {
        let store = FixtureStore::seeded().unwrap_or_else(|e| {
            tracing::error!("Failed to load mock fixtures, starting empty: {}", e);
            FixtureStore::empty()
        });
        Self::with_store(config, store)
    }

    pub fn with_store(config: ApiConfig, store: FixtureStore) -> Self {
        Self {
            context: RequestContext::new(config),
            store: Mutex::new(store),
            latency_ms: DEFAULT_LATENCY_MS,
        }
    }

    /// Overrides the simulated latency range. An empty range means a fixed delay of `start`.
    pub fn with_latency(mut self, latency_ms: Range<u64>) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    async fn simulate_latency(&self) {
        let ms = if self.latency_ms.is_empty() {
            self.latency_ms.start
        } else {
            rand::thread_rng().gen_range(self.latency_ms.clone())
        };
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn with_store_mut<T>(
        &self,
        f: impl FnOnce(&mut FixtureStore) -> Result<T, AdapterError>,
    ) -> Result<T, AdapterError> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut store)
    }

    async fn mutate(&self, verb: &str, endpoint: &str, body: Option<Value>) -> ApiResponse<Value> {
        self.simulate_latency().await;
        tracing::debug!("mock {} {}", verb, endpoint);
        let result = self.with_store_mut(|store| match verb {
            "POST" => store.create(endpoint, body),
            "DELETE" => store.remove(endpoint),
            _ => store.update(endpoint, body),
        });
        respond(verb, endpoint, result)
    }
}

fn respond(verb: &str, endpoint: &str, result: Result<Value, AdapterError>) -> ApiResponse<Value> {
    match result {
        Ok(data) => success_response(data, None),
        Err(err) => {
            tracing::debug!("mock {} {} failed: {}", verb, endpoint, err);
            error_response(&err, None)
        }
    }
}

#[async_trait]
impl Adapter for MockAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Mock
    }

    async fn get(&self, endpoint: &str, params: &Params) -> ApiResponse<Value> {
        self.simulate_latency().await;
        tracing::debug!("mock GET {}", endpoint);
        let result = self.with_store_mut(|store| store.read(endpoint, params));
        match result {
            Ok((data, Some(pagination))) => paginated_response(data, pagination),
            Ok((data, None)) => success_response(data, None),
            Err(err) => respond("GET", endpoint, Err(err)),
        }
    }

    async fn post(&self, endpoint: &str, body: Option<Value>) -> ApiResponse<Value> {
        self.mutate("POST", endpoint, body).await
    }

    async fn put(&self, endpoint: &str, body: Option<Value>) -> ApiResponse<Value> {
        self.mutate("PUT", endpoint, body).await
    }

    async fn patch(&self, endpoint: &str, body: Option<Value>) -> ApiResponse<Value> {
        self.mutate("PATCH", endpoint, body).await
    }

    async fn delete(&self, endpoint: &str) -> ApiResponse<Value> {
        self.mutate("DELETE", endpoint, None).await
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
