//! Typed domain services built on a shared [`ApiService`](crate::ApiService).
//!
//! Each service holds a live `Arc` to the service layer, so an adapter
//! switch on the `ApiService` is picked up without rebuilding them.

mod donations;
mod events;
mod lessons;
mod users;

pub use self::donations::{DonationFilter, DonationService};
pub use self::events::EventService;
pub use self::lessons::LessonService;
pub use self::users::UserService;
