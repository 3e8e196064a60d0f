//! Service layer for Grand Zawiyah: cached API access and typed domain services.
//!
//! Sits on top of the `zawiyah_api` adapters. [`ApiService`] adds a TTL
//! response cache, request coalescing and invalidation on writes;
//! [`ServiceFactory`] wires it to the user, donation, event and lesson services.

pub mod cache;
pub mod domain;
pub mod error;
pub mod factory;
pub mod service;
pub mod settings;

pub use zawiyah_api;
pub use zawiyah_api::types;
pub use zawiyah_api::{AdapterConfig, AdapterKind, ApiConfig, ConfigPatch, Environment, Params};

pub use cache::{CacheConfig, CacheStats, EvictionStrategy, ResponseCache};
pub use domain::{DonationFilter, DonationService, EventService, LessonService, UserService};
pub use error::ServiceError;
pub use factory::{get_instance, initialize_services, reset_instance, ServiceFactory};
pub use service::{ApiService, Page};
pub use settings::Settings;
