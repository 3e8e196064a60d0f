//! Caching orchestration layer in front of the active adapter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use zawiyah_api::types::{ApiResponse, Pagination};
use zawiyah_api::{
    create_adapter, Adapter, AdapterConfig, AdapterKind, ApiConfig, ConfigPatch, ErrorKind, Params,
};

use crate::cache::{CacheConfig, CacheStats, ResponseCache};
use crate::error::ServiceError;

/// One page of a collection together with its page metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Clone, Debug)]
struct CachedPayload {
    data: Value,
    pagination: Option<Pagination>,
}

/// Failure of a shared GET, handed to every caller waiting on it.
#[derive(Clone, Debug)]
struct SharedFailure {
    kind: Option<ErrorKind>,
    message: String,
}

impl From<ServiceError> for SharedFailure {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Request { kind, message } => Self { kind, message },
            other => Self {
                kind: other.kind(),
                message: other.to_string(),
            },
        }
    }
}

impl From<SharedFailure> for ServiceError {
    fn from(failure: SharedFailure) -> Self {
        ServiceError::Request {
            kind: failure.kind,
            message: failure.message,
        }
    }
}

/// Outcome of one adapter GET, set once by whichever caller leads it.
type Flight = Arc<OnceCell<Result<CachedPayload, SharedFailure>>>;

/// A caller's membership in the flight for one key.
///
/// Dropping it (normally or by cancellation) removes the map entry once the
/// flight has finished or no other caller is left on it.
struct FlightGuard<'a> {
    flights: &'a DashMap<String, Flight>,
    key: String,
    flight: Flight,
}

impl<'a> FlightGuard<'a> {
    fn join(flights: &'a DashMap<String, Flight>, key: String) -> Self {
        let flight = flights.entry(key.clone()).or_default().clone();
        Self { flights, key, flight }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        // map + this guard
        self.flights.remove_if(&self.key, |_, flight| {
            Arc::ptr_eq(flight, &self.flight)
                && (flight.initialized() || Arc::strong_count(flight) == 2)
        });
    }
}

/// Single entry point for backend calls.
///
/// Owns exactly one adapter at a time and an optional [`ResponseCache`] for
/// GET requests. Cache hits bypass the adapter entirely; successful
/// mutations drop every cached key containing the mutated endpoint.
/// Concurrent cached GETs for the same key share one adapter call.
pub struct ApiService {
    adapter: RwLock<Arc<dyn Adapter>>,
    cache: Option<ResponseCache<CachedPayload>>,
    /// Cached GETs currently waiting on the adapter, by cache key.
    in_flight: DashMap<String, Flight>,
    /// Bumped on every adapter switch; responses from an older adapter are not cached.
    generation: AtomicU64,
}

#[derive(Clone, Copy, Debug)]
enum Mutation {
    Post,
    Put,
    Patch,
    Delete,
}

impl ApiService {
    /// Wraps `adapter`. Passing `None` for `cache` disables caching.
    pub fn new(adapter: Arc<dyn Adapter>, cache: Option<CacheConfig>) -> Self {
        Self {
            adapter: RwLock::new(adapter),
            cache: cache.map(ResponseCache::new),
            in_flight: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &AdapterConfig, cache: Option<CacheConfig>) -> Result<Self, ServiceError> {
        Ok(Self::new(create_adapter(config)?, cache))
    }

    fn adapter(&self) -> Arc<dyn Adapter> {
        self.adapter
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn adapter_kind(&self) -> AdapterKind {
        self.adapter().kind()
    }

    /// Fetches `endpoint` and decodes the payload as `T`.
    ///
    /// A missing record decodes from JSON `null`, so `Option<_>` targets
    /// observe it as `None`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &Params,
        use_cache: bool,
    ) -> Result<T, ServiceError> {
        let payload = self.fetch(endpoint, params, use_cache).await?;
        decode(payload.data)
    }

    /// Fetches one page of a collection. Unpaged responses are reported as a single page.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &Params,
        use_cache: bool,
    ) -> Result<Page<T>, ServiceError> {
        let payload = self.fetch(endpoint, params, use_cache).await?;
        let items: Vec<T> = decode(payload.data)?;
        let pagination = payload.pagination.unwrap_or_else(|| {
            let count = items.len() as u64;
            Pagination::new(1, count, count)
        });
        Ok(Page { items, pagination })
    }

    async fn fetch(
        &self,
        endpoint: &str,
        params: &Params,
        use_cache: bool,
    ) -> Result<CachedPayload, ServiceError> {
        let cache = match self.cache.as_ref() {
            Some(cache) if use_cache => cache,
            _ => return self.fetch_uncached(endpoint, params).await,
        };

        let key = cache_key(endpoint, params);
        if let Some(hit) = cache.peek(&key) {
            cache.record_hit();
            tracing::debug!("Cache hit for {}", key);
            return Ok(hit);
        }

        let guard = FlightGuard::join(&self.in_flight, key);
        let mut led = false;
        let outcome = guard
            .flight
            .get_or_init(|| {
                led = true;
                self.lead(cache, &guard.key, endpoint, params)
            })
            .await;
        if !led {
            tracing::debug!("Joined in-flight request for {}", guard.key);
            match outcome {
                Ok(_) => cache.record_hit(),
                Err(_) => cache.record_miss(),
            }
        }
        outcome.clone().map_err(ServiceError::from)
    }

    /// Performs the adapter call for a flight and fills the cache.
    async fn lead(
        &self,
        cache: &ResponseCache<CachedPayload>,
        key: &str,
        endpoint: &str,
        params: &Params,
    ) -> Result<CachedPayload, SharedFailure> {
        if let Some(hit) = cache.peek(key) {
            cache.record_hit();
            tracing::debug!("Cache filled while waiting for {}", key);
            return Ok(hit);
        }
        cache.record_miss();
        tracing::debug!("Cache miss for {}", key);
        let generation = self.generation.load(Ordering::Acquire);
        let payload = self.fetch_uncached(endpoint, params).await?;
        if !payload.data.is_null() && generation == self.generation.load(Ordering::Acquire) {
            cache.set(key.to_string(), payload.clone());
        }
        Ok(payload)
    }

    async fn fetch_uncached(&self, endpoint: &str, params: &Params) -> Result<CachedPayload, ServiceError> {
        let response = self.adapter().get(endpoint, params).await;
        let pagination = response.pagination;
        let data = unwrap_response(response)?;
        Ok(CachedPayload { data, pagination })
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T, ServiceError> {
        self.mutate(Mutation::Post, endpoint, body).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T, ServiceError> {
        self.mutate(Mutation::Put, endpoint, body).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T, ServiceError> {
        self.mutate(Mutation::Patch, endpoint, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ServiceError> {
        self.mutate(Mutation::Delete, endpoint, None).await
    }

    async fn mutate<T: DeserializeOwned>(
        &self,
        verb: Mutation,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T, ServiceError> {
        let adapter = self.adapter();
        let response = match verb {
            Mutation::Post => adapter.post(endpoint, body).await,
            Mutation::Put => adapter.put(endpoint, body).await,
            Mutation::Patch => adapter.patch(endpoint, body).await,
            Mutation::Delete => adapter.delete(endpoint).await,
        };
        let data = unwrap_response(response)?;
        let removed = self.invalidate_cache(endpoint);
        tracing::debug!("{:?} {} invalidated {} cache entries", verb, endpoint, removed);
        decode(data)
    }

    /// Drops every cached key containing `pattern`. Returns how many were removed.
    pub fn invalidate_cache(&self, pattern: &str) -> usize {
        self.cache
            .as_ref()
            .map_or(0, |cache| cache.invalidate_matching(pattern))
    }

    pub fn clear_cache(&self) {
        if let Some(ref cache) = self.cache {
            cache.clear();
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache
            .as_ref()
            .map(ResponseCache::stats)
            .unwrap_or_default()
    }

    /// Builds the adapter described by `config` and makes it the active one.
    pub fn switch_adapter(&self, config: &AdapterConfig) -> Result<(), ServiceError> {
        let adapter = create_adapter(config)?;
        self.switch_to(adapter);
        Ok(())
    }

    /// Replaces the active adapter and clears the cache in one step.
    pub fn switch_to(&self, adapter: Arc<dyn Adapter>) {
        let mut active = self.adapter.write().unwrap_or_else(|e| e.into_inner());
        tracing::info!("Switching adapter from {} to {}", active.kind(), adapter.kind());
        *active = adapter;
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.clear_cache();
    }

    pub async fn health_check(&self) -> bool {
        self.adapter().health_check().await
    }

    pub fn config(&self) -> ApiConfig {
        self.adapter().config()
    }

    pub fn update_config(&self, patch: &ConfigPatch) {
        self.adapter().update_config(patch);
    }
}

/// Cache key for a GET: `GET:<endpoint>:<params as JSON>`.
pub fn cache_key(endpoint: &str, params: &Params) -> String {
    format!("GET:{}:{}", endpoint, params.cache_fragment())
}

/// Encodes a typed payload as a request body.
pub fn json_body<B: Serialize + ?Sized>(body: &B) -> Result<Option<Value>, ServiceError> {
    serde_json::to_value(body)
        .map(Some)
        .map_err(ServiceError::Serialization)
}

fn unwrap_response(response: ApiResponse<Value>) -> Result<Value, ServiceError> {
    if !response.success {
        let message = response
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| ServiceError::DEFAULT_MESSAGE.to_string());
        return Err(ServiceError::Request {
            kind: response.error_kind,
            message,
        });
    }
    Ok(response.data.unwrap_or(Value::Null))
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T, ServiceError> {
    serde_json::from_value(data).map_err(ServiceError::Deserialization)
}
