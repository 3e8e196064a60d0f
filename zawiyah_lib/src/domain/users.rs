use std::sync::Arc;

use serde_json::Value;
use zawiyah_api::types::{Donation, NewUser, User, UserUpdate};
use zawiyah_api::Params;

use crate::error::ServiceError;
use crate::service::{json_body, ApiService};

/// Account lookups and profile management.
#[derive(Clone)]
pub struct UserService {
    api: Arc<ApiService>,
}

impl UserService {
    pub fn new(api: Arc<ApiService>) -> Self {
        Self { api }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        self.api.get("/users", &Params::new(), true).await
    }

    /// Returns `None` when no user has this id.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, ServiceError> {
        self.api.get(&format!("/users/{}", id), &Params::new(), true).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ServiceError> {
        self.api.post("/users", json_body(user)?).await
    }

    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User, ServiceError> {
        self.api
            .patch(&format!("/users/{}", id), json_body(update)?)
            .await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ServiceError> {
        let _: Value = self.api.delete(&format!("/users/{}", id)).await?;
        Ok(())
    }

    pub async fn user_donations(&self, id: &str) -> Result<Vec<Donation>, ServiceError> {
        self.api
            .get(&format!("/users/{}/donations", id), &Params::new(), true)
            .await
    }
}
