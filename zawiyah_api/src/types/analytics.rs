use serde::{Deserialize, Serialize};

/// Aggregate figures for the dashboard.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_users: u64,
    pub total_donations: u64,
    /// Sum of completed donation amounts.
    pub total_raised: f64,
    pub average_donation: f64,
    pub active_campaigns: u64,
    pub upcoming_events: u64,
    pub total_lessons: u64,
}

/// Body of `GET /health`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}
