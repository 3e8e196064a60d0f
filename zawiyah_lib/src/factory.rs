//! Composition root wiring the service layer and domain services together.

use std::sync::{Arc, Mutex};

use zawiyah_api::{AdapterConfig, AdapterKind, ApiConfig, ConfigPatch};

use crate::cache::{CacheConfig, CacheStats};
use crate::domain::{DonationService, EventService, LessonService, UserService};
use crate::error::ServiceError;
use crate::service::ApiService;
use crate::settings::Settings;

static INSTANCE: Mutex<Option<Arc<ServiceFactory>>> = Mutex::new(None);

/// Owns one [`ApiService`] and the domain services built on it.
///
/// Domain services share the same `Arc<ApiService>`, so
/// [`switch_adapter`](Self::switch_adapter) takes effect for all of them.
pub struct ServiceFactory {
    api: Arc<ApiService>,
    users: UserService,
    donations: DonationService,
    events: EventService,
    lessons: LessonService,
    /// Base settings used when switching to the HTTP adapter.
    http_defaults: ApiConfig,
}

impl ServiceFactory {
    pub fn new(adapter: AdapterConfig, cache: Option<CacheConfig>) -> Result<Self, ServiceError> {
        let http_defaults = match adapter.kind {
            AdapterKind::Http => adapter.config.clone(),
            AdapterKind::Mock => ApiConfig::default(),
        };
        let api = ApiService::from_config(&adapter, Some(cache.unwrap_or_default()))?;
        Ok(Self::assemble(Arc::new(api), http_defaults))
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ServiceError> {
        let mut factory = Self::new(settings.adapter_config(), Some(settings.cache.clone()))?;
        factory.http_defaults = settings.api_config();
        Ok(factory)
    }

    /// Builds the domain services around an existing service layer.
    pub fn with_api(api: Arc<ApiService>) -> Self {
        Self::assemble(api, ApiConfig::default())
    }

    fn assemble(api: Arc<ApiService>, http_defaults: ApiConfig) -> Self {
        Self {
            users: UserService::new(Arc::clone(&api)),
            donations: DonationService::new(Arc::clone(&api)),
            events: EventService::new(Arc::clone(&api)),
            lessons: LessonService::new(Arc::clone(&api)),
            api,
            http_defaults,
        }
    }

    pub fn api(&self) -> &Arc<ApiService> {
        &self.api
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn donations(&self) -> &DonationService {
        &self.donations
    }

    pub fn events(&self) -> &EventService {
        &self.events
    }

    pub fn lessons(&self) -> &LessonService {
        &self.lessons
    }

    /// Switches every service to a fresh adapter of `kind`.
    ///
    /// The kind's defaults are used as the base and `patch` is applied on
    /// top. The response cache is cleared.
    pub fn switch_adapter(&self, kind: AdapterKind, patch: Option<ConfigPatch>) -> Result<(), ServiceError> {
        let mut config = match kind {
            AdapterKind::Mock => AdapterConfig::mock(),
            AdapterKind::Http => AdapterConfig::http(self.http_defaults.clone()),
        };
        if let Some(patch) = patch {
            config.config.apply(&patch);
        }
        self.api.switch_adapter(&config)
    }

    pub async fn health_check(&self) -> bool {
        self.api.health_check().await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.api.cache_stats()
    }

    pub fn clear_cache(&self) {
        self.api.clear_cache();
    }

    pub fn adapter_kind(&self) -> AdapterKind {
        self.api.adapter_kind()
    }
}

/// Returns the process-wide factory, creating it on first use.
///
/// Only the first call's `config` is honoured; later calls get the existing
/// instance. With no config the mock adapter is used.
pub fn get_instance(config: Option<AdapterConfig>) -> Result<Arc<ServiceFactory>, ServiceError> {
    let mut slot = INSTANCE.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(factory) = slot.as_ref() {
        return Ok(Arc::clone(factory));
    }
    let factory = Arc::new(ServiceFactory::new(
        config.unwrap_or_else(AdapterConfig::mock),
        None,
    )?);
    *slot = Some(Arc::clone(&factory));
    Ok(factory)
}

/// Drops the process-wide factory so the next [`get_instance`] builds a new one.
pub fn reset_instance() {
    INSTANCE.lock().unwrap_or_else(|e| e.into_inner()).take();
}

/// Builds a factory from `settings` and installs it as the process instance,
/// replacing any existing one.
pub fn initialize_services(settings: &Settings) -> Result<Arc<ServiceFactory>, ServiceError> {
    let factory = Arc::new(ServiceFactory::from_settings(settings)?);
    tracing::info!(
        "Initialized services with {} adapter ({})",
        factory.adapter_kind(),
        settings.environment
    );
    *INSTANCE.lock().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&factory));
    Ok(factory)
}
