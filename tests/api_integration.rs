//! Integration tests for Homeguard API endpoints.
//!
//! These tests verify the full request/response cycle through the HTTP API.

use std::io;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::FixedOffset;
use serde_json::{Value, json};
use tracing_subscriber::fmt::MakeWriter;

use homeguard::ThreatClassifier;
use homeguard::api::{AppState, router};

fn create_test_server() -> TestServer {
    let state = AppState::new(ThreatClassifier::new(), FixedOffset::east_opt(0).unwrap());
    TestServer::new(router(state)).unwrap()
}

fn assert_distribution_sums_to_one(body: &Value) {
    let dist = &body["threatAssessment"]["probabilityDistribution"];
    let total: f64 = ["ignore", "standard", "elevated", "critical"]
        .iter()
        .map(|level| dist[level].as_f64().unwrap())
        .sum();
    assert!((total - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_assess_envelope_entry_while_away() {
    let server = create_test_server();

    let response = server
        .post("/assess")
        .json(&json!({
            "systemMode": "away",
            "events": [{
                "type": "door",
                "confidence": 0.5,
                "timestamp": "2026-04-01T14:00:00Z",
                "metadata": {"motion_type": "opening"}
            }]
        }))
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["threatAssessment"]["level"], "critical");
    assert_eq!(body["reasoning"]["primaryFactors"][0], "entry_while_away");
    assert!(body["requestId"].is_string());
    assert!(body["processingTimeMs"].as_f64().unwrap() >= 0.0);
    assert_distribution_sums_to_one(&body);
}

#[tokio::test]
async fn test_assess_night_access_with_and_without_occupants() {
    let server = create_test_server();

    let empty = server
        .post("/assess")
        .json(&json!({
            "systemMode": "night",
            "events": [{"type": "window", "confidence": 0.6, "timestamp": "2026-04-01T23:15:00Z"}]
        }))
        .await;
    empty.assert_status_ok();
    let body: Value = empty.json();
    assert_eq!(body["threatAssessment"]["level"], "critical");
    assert_eq!(
        body["reasoning"]["primaryFactors"][0],
        "access_point_unoccupied_night"
    );

    let occupied = server
        .post("/assess")
        .json(&json!({
            "systemMode": "night",
            "familyMembersHome": ["alice"],
            "events": [{"type": "window", "confidence": 0.6, "timestamp": "2026-04-01T23:15:00Z"}]
        }))
        .await;
    occupied.assert_status_ok();
    let body: Value = occupied.json();
    assert_eq!(body["threatAssessment"]["level"], "elevated");
}

#[tokio::test]
async fn test_assess_simplified_shape() {
    let server = create_test_server();

    let response = server
        .post("/assess")
        .json(&json!({
            "type": "smoke_detector",
            "confidence": 0.2,
            "timestamp": 1_767_225_600,
            "metadata": {"home_mode": "home"}
        }))
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["threatAssessment"]["level"], "critical");
    assert_eq!(body["threatAssessment"]["confidence"], 1.0);
    assert_eq!(
        body["reasoning"]["primaryFactors"][0],
        "emergency_fire_override"
    );
}

#[tokio::test]
async fn test_assess_unknown_type_is_ignored() {
    let server = create_test_server();

    let response = server
        .post("/assess")
        .json(&json!({"type": "toaster", "confidence": 0.9}))
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["threatAssessment"]["level"], "ignore");
    assert_eq!(body["threatAssessment"]["confidence"], 0.1);
    assert_eq!(body["reasoning"]["primaryFactors"][0], "unknown_event_type");
}

#[tokio::test]
async fn test_assess_missing_type_is_bad_request() {
    let server = create_test_server();

    let response = server
        .post("/assess")
        .json(&json!({"systemMode": "home", "events": [{"confidence": 0.5}]}))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], true);
    assert_eq!(body["kind"], "malformed_input");
    assert!(body["message"].as_str().unwrap().contains("event type"));
}

#[tokio::test]
async fn test_assess_unparsable_body_is_bad_request() {
    let server = create_test_server();

    let response = server
        .post("/assess")
        .text("{\"type\": \"door\"")
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["kind"], "malformed_input");
}

#[tokio::test]
async fn test_assess_motion_shortcut() {
    let server = create_test_server();

    let response = server
        .post("/assess/motion")
        .json(&json!({"confidence": 0.85}))
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    // Motion requests run in home mode, so the detector confidence is dampened
    assert_eq!(body["threatAssessment"]["level"], "standard");
    let confidence = body["threatAssessment"]["confidence"].as_f64().unwrap();
    assert!((confidence - 0.68).abs() < 1e-9);
}

#[tokio::test]
async fn test_assess_face_shortcut() {
    let server = create_test_server();

    let unknown = server
        .post("/assess/face")
        .json(&json!({"confidence": 0.7, "location": {"lat": 51.5, "lon": -0.1}}))
        .await;
    unknown.assert_status_ok();
    let body: Value = unknown.json();
    let level = body["threatAssessment"]["level"].as_str().unwrap().to_string();
    // Away mode: elevated by day, critical at night
    assert!(level == "elevated" || level == "critical", "got {level}");

    let known = server
        .post("/assess/face")
        .json(&json!({"confidence": 0.7, "isKnown": true}))
        .await;
    known.assert_status_ok();
    let body: Value = known.json();
    assert_eq!(body["threatAssessment"]["level"], "standard");
    assert_eq!(body["reasoning"]["primaryFactors"][0], "known_occupant");
}

#[tokio::test]
async fn test_request_ids_differ_between_calls() {
    let server = create_test_server();
    let request = json!({"type": "audio", "confidence": 0.5});

    let first: Value = server.post("/assess").json(&request).await.json();
    let second: Value = server.post("/assess").json(&request).await.json();

    assert_ne!(first["requestId"], second["requestId"]);
    assert_eq!(
        first["threatAssessment"]["confidence"],
        second["threatAssessment"]["confidence"]
    );
}

#[tokio::test]
async fn test_shortcut_bad_body_is_structured_bad_request() {
    let server = create_test_server();

    for path in ["/assess/motion", "/assess/face"] {
        let response = server
            .post(path)
            .json(&json!({"confidence": "high"}))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["error"], true, "{path}");
        assert_eq!(body["kind"], "malformed_input", "{path}");
        assert!(body["timestamp"].is_string(), "{path}");
    }
}

/// In-memory log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_face_shortcut_logs_omit_location_and_identity() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = create_test_server();
    server
        .post("/assess/face")
        .json(&json!({
            "confidence": 0.7,
            "isKnown": true,
            "location": {"lat": 51.5, "lon": -0.1}
        }))
        .await
        .assert_status_ok();

    let output = logs.contents();
    assert!(output.contains("Threat assessed"), "{output}");
    assert!(output.contains("confidence=0.7"), "{output}");
    assert!(!output.contains("51.5"), "{output}");
    assert!(!output.contains("Location"), "{output}");
    assert!(!output.contains("is_known"), "{output}");
}
