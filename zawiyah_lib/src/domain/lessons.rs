use std::sync::Arc;

use serde_json::Value;
use zawiyah_api::types::{Lesson, NewLesson};
use zawiyah_api::Params;

use crate::error::ServiceError;
use crate::service::{json_body, ApiService};

#[derive(Clone)]
pub struct LessonService {
    api: Arc<ApiService>,
}

impl LessonService {
    pub fn new(api: Arc<ApiService>) -> Self {
        Self { api }
    }

    pub async fn list_lessons(&self, category: Option<&str>) -> Result<Vec<Lesson>, ServiceError> {
        let params = Params::new().with_opt("category", category);
        self.api.get("/lessons", &params, true).await
    }

    pub async fn get_lesson(&self, id: &str) -> Result<Option<Lesson>, ServiceError> {
        self.api.get(&format!("/lessons/{}", id), &Params::new(), true).await
    }

    pub async fn create_lesson(&self, lesson: &NewLesson) -> Result<Lesson, ServiceError> {
        self.api.post("/lessons", json_body(lesson)?).await
    }

    pub async fn delete_lesson(&self, id: &str) -> Result<(), ServiceError> {
        let _: Value = self.api.delete(&format!("/lessons/{}", id)).await?;
        Ok(())
    }
}
