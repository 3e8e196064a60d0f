//! Service contracts and backend adapters for the Grand Zawiyah community app.
//!
//! Every backend is an [`Adapter`]: the in-memory [`MockAdapter`] used in
//! development and tests, or the [`HttpAdapter`] that talks to the live API.
//! Both resolve every call to an [`ApiResponse`](types::ApiResponse) envelope.

pub mod adapter;
pub mod config;
mod error;
mod http;
pub mod mock;
mod query;
pub mod types;

pub use self::adapter::{create_adapter, Adapter, Headers, RequestContext};
pub use self::config::{AdapterConfig, AdapterKind, ApiConfig, ConfigPatch, Environment};
pub use self::error::{AdapterError, ErrorKind};
pub use self::http::HttpAdapter;
pub use self::mock::{FixtureStore, MockAdapter, ResourceKind};
pub use self::query::Params;
