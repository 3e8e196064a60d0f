use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use zawiyah_api::{Adapter, ApiConfig, ConfigPatch, ErrorKind, FixtureStore, MockAdapter, Params, ResourceKind};

fn demo_adapter() -> MockAdapter {
    let store = FixtureStore::empty().with_record(
        ResourceKind::Users,
        json!({"id": "user_1", "email": "demo@example.com"}),
    );
    MockAdapter::with_store(ApiConfig::default(), store)
}

#[tokio::test(start_paused = true)]
async fn get_user_after_simulated_latency() {
    let adapter = demo_adapter();
    let start = Instant::now();
    let resp = adapter.get("/users/user_1", &Params::new()).await;
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert!(start.elapsed() < Duration::from_millis(500));
    assert!(resp.success);
    let user = resp.data.unwrap();
    assert_eq!(user["email"], "demo@example.com");
}

#[tokio::test(start_paused = true)]
async fn missing_user_is_a_successful_null() {
    let adapter = demo_adapter();
    let resp = adapter.get("/users/does_not_exist", &Params::new()).await;
    assert!(resp.success);
    assert_eq!(resp.data, Some(serde_json::Value::Null));
    assert!(resp.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn delete_then_get_then_delete_again() {
    let adapter = demo_adapter();

    let resp = adapter.delete("/users/user_1").await;
    assert!(resp.success);
    assert_eq!(resp.data, Some(json!({"success": true})));

    let resp = adapter.get("/users/user_1", &Params::new()).await;
    assert!(resp.success);
    assert_eq!(resp.data, Some(serde_json::Value::Null));

    let resp = adapter.delete("/users/user_1").await;
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("User not found"));
    assert_eq!(resp.error_kind, Some(ErrorKind::NotFound));
}

#[tokio::test(start_paused = true)]
async fn unknown_endpoint_is_reported_not_thrown() {
    let adapter = demo_adapter();
    let resp = adapter.get("/payments/intent", &Params::new()).await;
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("Unknown endpoint: /payments/intent"));
    assert_eq!(resp.error_kind, Some(ErrorKind::UnknownEndpoint));
}

#[tokio::test(start_paused = true)]
async fn post_then_patch_round_trip() {
    let adapter = demo_adapter();
    let created = adapter
        .post(
            "/donations",
            Some(json!({"userId": "user_1", "amount": 40, "currency": "USD"})),
        )
        .await;
    assert!(created.success);
    let created = created.data.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("donation_"));

    let patched = adapter
        .patch(&format!("/donations/{}", id), Some(json!({"status": "completed"})))
        .await;
    assert!(patched.success);
    let patched = patched.data.unwrap();
    assert_eq!(patched["status"], "completed");
    assert_eq!(patched["amount"], 40);

    let listed = adapter
        .get("/donations", &Params::new().with("userId", "user_1"))
        .await;
    assert_eq!(listed.data.unwrap().as_array().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn put_on_missing_record_fails() {
    let adapter = demo_adapter();
    let resp = adapter.put("/lessons/lesson_9", Some(json!({"title": "x"}))).await;
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("Lesson not found"));
}

#[tokio::test(start_paused = true)]
async fn instances_do_not_share_state() {
    let a = demo_adapter();
    let b = demo_adapter();
    assert!(a.delete("/users/user_1").await.success);
    let resp = b.get("/users/user_1", &Params::new()).await;
    assert_eq!(resp.data.unwrap()["id"], "user_1");
}

#[tokio::test(start_paused = true)]
async fn health_check_succeeds() {
    let adapter = demo_adapter().with_latency(0..0);
    assert!(adapter.health_check().await);
    let resp = adapter.get("/health", &Params::new()).await;
    assert_eq!(resp.data.unwrap()["status"], "ok");
}

#[tokio::test(start_paused = true)]
async fn paged_reads_carry_pagination() {
    let adapter = MockAdapter::new(ApiConfig::default()).with_latency(0..0);
    let resp = adapter
        .get("/donations", &Params::new().with_page(1, 3))
        .await;
    let pagination = resp.pagination.unwrap();
    assert_eq!(pagination.limit, 3);
    assert_eq!(pagination.total, 4);
    assert_eq!(pagination.total_pages, 2);
    assert!(pagination.has_next);
    assert_eq!(resp.data.unwrap().as_array().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn seeded_analytics() {
    let adapter = MockAdapter::new(ApiConfig::default()).with_latency(0..0);
    let resp = adapter.get("/analytics", &Params::new()).await;
    let summary = resp.data.unwrap();
    assert_eq!(summary["totalUsers"], 3);
    assert_eq!(summary["totalDonations"], 4);
    assert_eq!(summary["totalRaised"], 800.0);
    assert_eq!(summary["activeCampaigns"], 2);
    assert_eq!(summary["upcomingEvents"], 2);
}

#[test]
fn update_config_touches_headers_only_for_api_key() {
    let adapter = demo_adapter();
    let headers = adapter.headers();
    adapter.update_config(&ConfigPatch::default());
    assert_eq!(adapter.headers(), headers);
    assert_eq!(adapter.config(), ApiConfig::default());

    adapter.update_config(&ConfigPatch::default().with_api_key(Some("k1")));
    assert_eq!(adapter.headers().get("Authorization").unwrap(), "Bearer k1");
}
