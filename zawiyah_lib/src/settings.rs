//! Process settings read from `ZAWIYAH_*` environment variables.

use std::time::Duration;

use zawiyah_api::{AdapterConfig, ApiConfig, Environment};

use crate::cache::{CacheConfig, EvictionStrategy};
use crate::error::ServiceError;

pub const ENV_ENVIRONMENT: &str = "ZAWIYAH_ENV";
pub const ENV_API_URL: &str = "ZAWIYAH_API_URL";
pub const ENV_API_KEY: &str = "ZAWIYAH_API_KEY";
pub const ENV_API_TIMEOUT_MS: &str = "ZAWIYAH_API_TIMEOUT_MS";
pub const ENV_API_RETRIES: &str = "ZAWIYAH_API_RETRIES";
pub const ENV_CACHE_TTL_SECS: &str = "ZAWIYAH_CACHE_TTL_SECS";
pub const ENV_CACHE_MAX_SIZE: &str = "ZAWIYAH_CACHE_MAX_SIZE";
pub const ENV_CACHE_STRATEGY: &str = "ZAWIYAH_CACHE_STRATEGY";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub environment: Environment,
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub retries: u32,
    pub cache: CacheConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let api = ApiConfig::default();
        Self {
            environment: api.environment,
            api_url: api.base_url,
            api_key: api.api_key,
            timeout_ms: api.timeout,
            retries: api.retries,
            cache: CacheConfig::default(),
        }
    }
}

impl Settings {
    /// Reads the process environment. Call after `.env` has been loaded.
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable source.
    ///
    /// Numbers that fail to parse fall back to their defaults; an unknown
    /// environment name or cache strategy is rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match var(ENV_ENVIRONMENT) {
            Some(raw) => raw.parse::<Environment>().map_err(ServiceError::Config)?,
            None => defaults.environment,
        };
        let strategy = match var(ENV_CACHE_STRATEGY) {
            Some(raw) => raw.parse::<EvictionStrategy>().map_err(ServiceError::Config)?,
            None => defaults.cache.strategy,
        };

        let ttl_secs = parse_or(var(ENV_CACHE_TTL_SECS), defaults.cache.ttl.as_secs());
        let settings = Self {
            environment,
            api_url: var(ENV_API_URL).unwrap_or(defaults.api_url),
            api_key: var(ENV_API_KEY),
            timeout_ms: parse_or(var(ENV_API_TIMEOUT_MS), defaults.timeout_ms),
            retries: parse_or(var(ENV_API_RETRIES), defaults.retries),
            cache: CacheConfig {
                ttl: Duration::from_secs(ttl_secs),
                max_size: parse_or(var(ENV_CACHE_MAX_SIZE), defaults.cache.max_size),
                strategy,
            },
        };
        tracing::debug!(
            "Loaded settings: environment={}, api_url={}, cache_ttl={}s",
            settings.environment,
            settings.api_url,
            ttl_secs
        );
        Ok(settings)
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_url.clone(),
            timeout: self.timeout_ms,
            retries: self.retries,
            api_key: self.api_key.clone(),
            environment: self.environment,
        }
    }

    /// Live environments get the HTTP adapter; everything else runs on fixtures.
    pub fn adapter_config(&self) -> AdapterConfig {
        if self.environment.is_live() {
            AdapterConfig::http(self.api_config())
        } else {
            let mut config = AdapterConfig::mock();
            config.config.environment = self.environment;
            config
        }
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|val| val.parse::<T>().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use zawiyah_api::AdapterKind;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.api_url, "http://localhost:3001/api");
        assert_eq!(settings.timeout_ms, 10_000);
        assert_eq!(settings.retries, 3);
        assert_eq!(settings.cache.ttl, Duration::from_secs(300));
        assert_eq!(settings.cache.max_size, 100);
        assert_eq!(settings.cache.strategy, EvictionStrategy::Lru);
    }

    #[test]
    fn reads_every_variable() {
        let settings = Settings::from_lookup(lookup(&[
            (ENV_ENVIRONMENT, "production"),
            (ENV_API_URL, "https://api.example.org/v1"),
            (ENV_API_KEY, "secret"),
            (ENV_API_TIMEOUT_MS, "2500"),
            (ENV_API_RETRIES, "1"),
            (ENV_CACHE_TTL_SECS, "60"),
            (ENV_CACHE_MAX_SIZE, "10"),
            (ENV_CACHE_STRATEGY, "fifo"),
        ]))
        .unwrap();
        assert_eq!(settings.environment, Environment::Production);
        assert_eq!(settings.api_url, "https://api.example.org/v1");
        assert_eq!(settings.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.timeout_ms, 2500);
        assert_eq!(settings.retries, 1);
        assert_eq!(settings.cache.ttl, Duration::from_secs(60));
        assert_eq!(settings.cache.max_size, 10);
        assert_eq!(settings.cache.strategy, EvictionStrategy::Fifo);
    }

    #[test]
    fn unparseable_numbers_fall_back() {
        let settings = Settings::from_lookup(lookup(&[
            (ENV_API_TIMEOUT_MS, "soon"),
            (ENV_API_RETRIES, "-1"),
            (ENV_CACHE_MAX_SIZE, ""),
        ]))
        .unwrap();
        assert_eq!(settings.timeout_ms, 10_000);
        assert_eq!(settings.retries, 3);
        assert_eq!(settings.cache.max_size, 100);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = Settings::from_lookup(lookup(&[(ENV_ENVIRONMENT, "qa")])).unwrap_err();
        assert!(matches!(err, ServiceError::Config(_)));
        assert!(err.to_string().contains("unknown environment: qa"));

        let err = Settings::from_lookup(lookup(&[(ENV_CACHE_STRATEGY, "random")])).unwrap_err();
        assert!(matches!(err, ServiceError::Config(_)));
    }

    #[test]
    fn adapter_selection_follows_environment() {
        let dev = Settings::default();
        assert_eq!(dev.adapter_config().kind, AdapterKind::Mock);

        let staging = Settings {
            environment: Environment::Staging,
            api_key: Some("k".to_string()),
            ..Settings::default()
        };
        let config = staging.adapter_config();
        assert_eq!(config.kind, AdapterKind::Http);
        assert_eq!(config.config.api_key.as_deref(), Some("k"));
        assert_eq!(config.config.environment, Environment::Staging);
    }
}
