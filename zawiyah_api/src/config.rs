//! Adapter configuration: endpoint, timeout, retries, credentials and environment.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deployment environment the adapter talks to.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Whether this environment should be served by a live backend.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Staging | Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "staging" | "stage" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

/// Connection settings owned by an adapter instance.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout: u64,
    pub retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub environment: Environment,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api".to_string(),
            timeout: 10_000,
            retries: 3,
            api_key: None,
            environment: Environment::Development,
        }
    }
}

impl ApiConfig {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Shallow-merges `patch` into this config. Fields absent from the patch are kept.
    pub fn apply(&mut self, patch: &ConfigPatch) {
        if let Some(ref base_url) = patch.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(timeout) = patch.timeout {
            self.timeout = timeout;
        }
        if let Some(retries) = patch.retries {
            self.retries = retries;
        }
        if let Some(ref api_key) = patch.api_key {
            self.api_key = api_key.clone();
        }
        if let Some(environment) = patch.environment {
            self.environment = environment;
        }
    }
}

/// A partial [`ApiConfig`] update.
///
/// `api_key` is doubly optional: `None` leaves the key untouched while
/// `Some(None)` clears it (and with it the `Authorization` header).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    pub base_url: Option<String>,
    pub timeout: Option<u64>,
    pub retries: Option<u32>,
    pub api_key: Option<Option<String>>,
    pub environment: Option<Environment>,
}

impl ConfigPatch {
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn with_api_key(mut self, api_key: Option<&str>) -> Self {
        self.api_key = Some(api_key.map(str::to_string));
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Which adapter implementation serves requests.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    Mock,
    Http,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mock => write!(f, "mock"),
            Self::Http => write!(f, "http"),
        }
    }
}

impl FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "http" => Ok(Self::Http),
            other => Err(format!("unknown adapter: {}", other)),
        }
    }
}

/// Adapter selection plus the connection settings it is built with.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AdapterConfig {
    #[serde(rename = "type")]
    pub kind: AdapterKind,
    pub config: ApiConfig,
}

impl AdapterConfig {
    pub fn mock() -> Self {
        Self {
            kind: AdapterKind::Mock,
            config: ApiConfig {
                base_url: "http://localhost:3001/api".to_string(),
                timeout: 5_000,
                retries: 0,
                api_key: None,
                environment: Environment::Development,
            },
        }
    }

    pub fn http(config: ApiConfig) -> Self {
        Self {
            kind: AdapterKind::Http,
            config,
        }
    }
}
