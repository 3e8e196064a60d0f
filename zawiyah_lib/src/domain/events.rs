use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use zawiyah_api::types::{Event, NewEvent};
use zawiyah_api::Params;

use crate::error::ServiceError;
use crate::service::{json_body, ApiService};

#[derive(Clone)]
pub struct EventService {
    api: Arc<ApiService>,
}

impl EventService {
    pub fn new(api: Arc<ApiService>) -> Self {
        Self { api }
    }

    pub async fn list_events(&self, category: Option<&str>) -> Result<Vec<Event>, ServiceError> {
        let params = Params::new().with_opt("category", category);
        self.api.get("/events", &params, true).await
    }

    /// Events that have not started yet, soonest first.
    pub async fn upcoming_events(&self) -> Result<Vec<Event>, ServiceError> {
        let now = Utc::now();
        let mut events: Vec<Event> = self
            .list_events(None)
            .await?
            .into_iter()
            .filter(|e| e.starts_at > now)
            .collect();
        events.sort_by_key(|e| e.starts_at);
        Ok(events)
    }

    pub async fn get_event(&self, id: &str) -> Result<Option<Event>, ServiceError> {
        self.api.get(&format!("/events/{}", id), &Params::new(), true).await
    }

    pub async fn create_event(&self, event: &NewEvent) -> Result<Event, ServiceError> {
        self.api.post("/events", json_body(event)?).await
    }

    pub async fn delete_event(&self, id: &str) -> Result<(), ServiceError> {
        let _: Value = self.api.delete(&format!("/events/{}", id)).await?;
        Ok(())
    }
}
