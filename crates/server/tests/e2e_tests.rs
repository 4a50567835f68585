//! End-to-end tests with mocked machine dependencies.
//!
//! These tests run the full server stack in-process with mock implementations
//! for the motor drivers, home sensor, camera and recognition service.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::{TestConfig, TestFixture, SECRET_KEY};

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("ok"));
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["machine"]["magazine_size"], 3);
    assert_eq!(response.body["recognizer"]["backend"], "gemini");
    assert_eq!(
        response.body["recognizer"]["gemini"]["api_key_configured"],
        true
    );
    assert!(response.body["recognizer"]["gemini"]["api_key"].is_null());
    assert!(!response.body.to_string().contains(SECRET_KEY));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("cardsort_http_requests_total"));
    assert!(body.contains("cardsort_run_active"));
}

// =============================================================================
// Run Control
// =============================================================================

#[tokio::test]
async fn test_full_run_over_http() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/process/start", json!({ "label": "A" }))
        .await;
    assert_status!(response, StatusCode::ACCEPTED);
    assert_json_path!(response.body, "status", json!("started"));
    assert_json_path!(response.body, "start_slot", json!(1));
    assert_json_path!(response.body, "homed", json!(true));
    assert!(response.body["run_id"].is_string());

    fixture.wait_idle().await;

    let status = fixture.get("/api/v1/process/status").await;
    assert_status!(status, StatusCode::OK);
    assert_eq!(status.body["running"], false);
    assert_eq!(status.body["current_position"], 3);
    assert_eq!(status.body["current_run_recorded"], 3);
    assert_eq!(status.body["active_label"], "A");
    assert_eq!(status.body["last_outcome"]["result"], "completed");
    assert_eq!(status.body["notification"], "run_finished");

    // The notification is handed out once
    let status = fixture.get("/api/v1/process/status").await;
    assert!(status.body.get("notification").is_none());
}

#[tokio::test]
async fn test_start_while_running_conflicts() {
    let fixture = TestFixture::new().await;
    fixture.recognizer.set_delay(Duration::from_millis(100)).await;

    let response = fixture
        .post("/api/v1/process/start", json!({ "label": "A" }))
        .await;
    assert_status!(response, StatusCode::ACCEPTED);

    let response = fixture
        .post("/api/v1/process/start", json!({ "label": "B" }))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert!(response.body["error"].is_string());

    fixture.post_empty("/api/v1/process/stop").await;
    fixture.wait_idle().await;

    // The rejected start left no trace
    let cards = fixture.get("/api/v1/cards?label=B").await;
    assert_eq!(cards.body["total"], 0);
}

#[tokio::test]
async fn test_start_with_blank_label_is_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/process/start", json!({ "label": "   " }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let status = fixture.get("/api/v1/process/status").await;
    assert_eq!(status.body["running"], false);
}

#[tokio::test]
async fn test_start_with_malformed_body() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post_raw("/api/v1/process/start", "{not json")
        .await;
    assert!(response.status.is_client_error());
}

#[tokio::test]
async fn test_homing_timeout_is_service_unavailable() {
    let fixture = TestFixture::with_config(TestConfig::never_homes()).await;

    let response = fixture
        .post("/api/v1/process/start", json!({ "label": "A" }))
        .await;
    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("homing timed out"));

    let status = fixture.get("/api/v1/process/status").await;
    assert_eq!(status.body["running"], false);
}

#[tokio::test]
async fn test_stop_then_resume() {
    let fixture = TestFixture::new().await;
    fixture.recognizer.set_delay(Duration::from_millis(50)).await;

    let response = fixture
        .post("/api/v1/process/start", json!({ "label": "A" }))
        .await;
    assert_status!(response, StatusCode::ACCEPTED);

    let response = fixture
        .post("/api/v1/process/stop", json!({ "emergency": false }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("stopping"));
    assert_json_path!(response.body, "emergency", json!(false));

    fixture.wait_idle().await;

    let status = fixture.get("/api/v1/process/status").await;
    assert_eq!(status.body["last_outcome"]["result"], "stopped");
    let recorded = status.body["current_run_recorded"].as_u64().unwrap();
    assert!(recorded < 3);

    fixture.recognizer.set_delay(Duration::ZERO).await;
    let response = fixture
        .post("/api/v1/process/start", json!({ "label": "A" }))
        .await;
    assert_status!(response, StatusCode::ACCEPTED);
    assert_json_path!(response.body, "homed", json!(false));

    fixture.wait_idle().await;

    let cards = fixture.get("/api/v1/cards?label=A").await;
    let slots: Vec<u64> = cards.body["cards"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["slot"].as_u64().unwrap())
        .collect();
    assert_eq!(slots, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_emergency_stop_disables_motors() {
    let fixture = TestFixture::new().await;
    fixture.recognizer.set_delay(Duration::from_millis(100)).await;

    fixture
        .post("/api/v1/process/start", json!({ "label": "A" }))
        .await;

    let response = fixture
        .post("/api/v1/process/stop", json!({ "emergency": true }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "emergency", json!(true));

    use cardsort_core::MotorDriver;
    assert!(!fixture.motor.is_enabled());

    fixture.wait_idle().await;
    assert!(!fixture.motor.is_enabled());
}

#[tokio::test]
async fn test_stop_with_invalid_body() {
    let fixture = TestFixture::new().await;
    let response = fixture.post_raw("/api/v1/process/stop", "{\"emergency\": 3").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

// =============================================================================
// History and Export
// =============================================================================

#[tokio::test]
async fn test_cards_filtered_by_label() {
    let fixture = TestFixture::new().await;

    fixture
        .post("/api/v1/process/start", json!({ "label": "A" }))
        .await;
    fixture.wait_idle().await;
    fixture
        .post("/api/v1/process/start", json!({ "label": "B" }))
        .await;
    fixture.wait_idle().await;

    let all = fixture.get("/api/v1/cards").await;
    assert_status!(all, StatusCode::OK);
    assert_eq!(all.body["total"], 6);

    let b = fixture.get("/api/v1/cards?label=B").await;
    assert_eq!(b.body["total"], 3);
    assert!(b.body["cards"]
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["label"] == "B"));
}

#[tokio::test]
async fn test_export_writes_csv() {
    let fixture = TestFixture::new().await;

    fixture
        .post("/api/v1/process/start", json!({ "label": "A" }))
        .await;
    fixture.wait_idle().await;

    let target = fixture.temp_dir.path().join("out").join("cards.csv");
    let response = fixture
        .post(
            "/api/v1/export",
            json!({ "path": target.display().to_string() }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "records", json!(3));

    let content = std::fs::read_to_string(&target).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("A;1;"));
    assert!(lines[3].starts_with("A;3;"));
}

#[tokio::test]
async fn test_export_default_path() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_empty("/api/v1/export").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "records", json!(0));

    let csv_path = response.body["csv_path"].as_str().unwrap();
    assert!(csv_path.contains("all_cards_"));
    assert!(std::path::Path::new(csv_path).exists());
}

#[tokio::test]
async fn test_export_failure_is_server_error() {
    let fixture = TestFixture::with_config(TestConfig::with_mock_exporter()).await;
    fixture
        .exporter
        .as_ref()
        .unwrap()
        .set_next_error("disk full");

    let response = fixture.post("/api/v1/export", json!({})).await;
    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body["error"].as_str().unwrap().contains("disk full"));
}

// =============================================================================
// Live Updates
// =============================================================================

#[tokio::test]
async fn test_records_are_broadcast() {
    let fixture = TestFixture::new().await;
    let mut rx = fixture.broadcaster.subscribe();

    fixture
        .post("/api/v1/process/start", json!({ "label": "A" }))
        .await;
    fixture.wait_idle().await;

    let mut kinds = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        let json = serde_json::to_value(&msg).unwrap();
        kinds.push(json["type"].as_str().unwrap().to_string());
    }

    assert_eq!(
        kinds.iter().filter(|k| k.as_str() == "card_recorded").count(),
        3
    );
    assert!(kinds.contains(&"run_started".to_string()));
}
