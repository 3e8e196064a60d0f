use std::sync::Arc;

use serde_json::Value;
use zawiyah_api::types::{
    AnalyticsSummary, Donation, DonationCampaign, DonationStatus, DonationUpdate, NewCampaign,
    NewDonation,
};
use zawiyah_api::{ErrorKind, Params};

use crate::error::ServiceError;
use crate::service::{json_body, ApiService, Page};

/// Optional narrowing for donation listings.
#[derive(Clone, Debug, Default)]
pub struct DonationFilter {
    pub user_id: Option<String>,
    pub campaign_id: Option<String>,
}

impl DonationFilter {
    pub fn with_user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn with_campaign(mut self, campaign_id: &str) -> Self {
        self.campaign_id = Some(campaign_id.to_string());
        self
    }

    fn to_params(&self) -> Params {
        Params::new()
            .with_opt("userId", self.user_id.clone())
            .with_opt("campaign", self.campaign_id.clone())
    }
}

/// Donations, campaigns and the dashboard summary.
#[derive(Clone)]
pub struct DonationService {
    api: Arc<ApiService>,
}

impl DonationService {
    pub fn new(api: Arc<ApiService>) -> Self {
        Self { api }
    }

    pub async fn list_donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>, ServiceError> {
        self.api.get("/donations", &filter.to_params(), true).await
    }

    pub async fn donations_page(
        &self,
        filter: &DonationFilter,
        page: u64,
        limit: u64,
    ) -> Result<Page<Donation>, ServiceError> {
        let params = filter.to_params().with_page(page, limit);
        self.api.get_page("/donations", &params, true).await
    }

    pub async fn get_donation(&self, id: &str) -> Result<Option<Donation>, ServiceError> {
        self.api
            .get(&format!("/donations/{}", id), &Params::new(), true)
            .await
    }

    pub async fn create_donation(&self, donation: &NewDonation) -> Result<Donation, ServiceError> {
        if donation.amount.is_nan() || donation.amount <= 0.0 {
            return Err(ServiceError::Request {
                kind: Some(ErrorKind::Validation),
                message: "Donation amount must be positive".to_string(),
            });
        }
        self.api.post("/donations", json_body(donation)?).await
    }

    pub async fn update_donation(
        &self,
        id: &str,
        update: &DonationUpdate,
    ) -> Result<Donation, ServiceError> {
        self.api
            .patch(&format!("/donations/{}", id), json_body(update)?)
            .await
    }

    pub async fn set_status(&self, id: &str, status: DonationStatus) -> Result<Donation, ServiceError> {
        let update = DonationUpdate {
            status: Some(status),
            ..DonationUpdate::default()
        };
        self.update_donation(id, &update).await
    }

    pub async fn delete_donation(&self, id: &str) -> Result<(), ServiceError> {
        let _: Value = self.api.delete(&format!("/donations/{}", id)).await?;
        Ok(())
    }

    pub async fn list_campaigns(&self) -> Result<Vec<DonationCampaign>, ServiceError> {
        self.api.get("/campaigns", &Params::new(), true).await
    }

    pub async fn get_campaign(&self, id: &str) -> Result<Option<DonationCampaign>, ServiceError> {
        self.api
            .get(&format!("/campaigns/{}", id), &Params::new(), true)
            .await
    }

    pub async fn create_campaign(&self, campaign: &NewCampaign) -> Result<DonationCampaign, ServiceError> {
        self.api.post("/campaigns", json_body(campaign)?).await
    }

    pub async fn campaign_donations(&self, id: &str) -> Result<Vec<Donation>, ServiceError> {
        self.api
            .get(&format!("/campaigns/{}/donations", id), &Params::new(), true)
            .await
    }

    /// Dashboard figures. Always fetched fresh.
    pub async fn analytics(&self) -> Result<AnalyticsSummary, ServiceError> {
        self.api.get("/analytics", &Params::new(), false).await
    }
}
