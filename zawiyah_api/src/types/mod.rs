//! Wire contracts: the response envelope and the domain records it carries.

mod analytics;
mod donation;
mod event;
mod lesson;
mod response;
mod user;

pub use self::analytics::{AnalyticsSummary, HealthStatus};
pub use self::donation::{
    DonationCampaign, Donation, DonationFrequency, DonationStatus, DonationUpdate, NewCampaign,
    NewDonation,
};
pub use self::event::{Event, NewEvent};
pub use self::lesson::{Lesson, LessonLevel, NewLesson};
pub use self::response::{ApiResponse, PaginatedResponse, Pagination};
pub use self::user::{NewUser, User, UserRole, UserUpdate};
