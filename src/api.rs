//! HTTP API handlers for Homeguard.
//!
//! - **POST /assess**: Classify a request in either accepted shape.
//! - **POST /assess/motion**: Quick motion check built from a template.
//! - **POST /assess/face**: Quick face-detection check built from a template.
//! - **GET /health**: Liveness probe.
//!
//! Logs carry the event kind, mode and verdict only. Metadata values and
//! occupant identifiers are never logged.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::classifier::ThreatClassifier;
use crate::error::AssessError;
use crate::model::{AssessmentResponse, FaceRequest, MotionRequest};
use crate::response::assess;
use crate::templates::{face_request, motion_request};
use crate::validation::{ValidatedRequest, validate, validate_json};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<ThreatClassifier>,
    /// Local offset used to decide night hours.
    pub utc_offset: FixedOffset,
}

impl AppState {
    pub fn new(classifier: ThreatClassifier, utc_offset: FixedOffset) -> Self {
        Self {
            classifier: Arc::new(classifier),
            utc_offset,
        }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/assess", post(post_assess))
        .route("/assess/motion", post(post_assess_motion))
        .route("/assess/face", post(post_assess_face))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Structured body returned for rejected requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: bool,
    pub kind: &'static str,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for AssessError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: true,
            kind: self.kind(),
            message: self.to_string(),
            timestamp: Utc::now(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AssessError {
    fn from(rejection: JsonRejection) -> Self {
        AssessError::malformed(rejection.body_text())
    }
}

fn log_rejection(rejection: &JsonRejection) {
    warn!(error = %rejection.body_text(), "Rejected assessment request");
}

/// POST /assess - Classify a security event.
///
/// The body is read as raw text so that unparsable JSON gets the same
/// structured error as any other malformed request.
///
/// # Request Body
///
/// ```json
/// {
///     "systemMode": "away",
///     "events": [{
///         "type": "door",
///         "confidence": 0.7,
///         "timestamp": "2026-01-10T23:30:00Z",
///         "metadata": {"motion_type": "opening"}
///     }]
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///     "requestId": "6f1c...",
///     "timestamp": "2026-01-10T23:30:00.012Z",
///     "processingTimeMs": 0.004,
///     "threatAssessment": {
///         "level": "critical",
///         "confidence": 0.99,
///         "probabilityDistribution": {
///             "ignore": 0.0, "standard": 0.0, "elevated": 0.1, "critical": 0.9
///         }
///     },
///     "reasoning": {"primaryFactors": ["entry_while_away"], "summary": "..."}
/// }
/// ```
#[instrument(skip(state, body))]
pub async fn post_assess(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<AssessmentResponse>, AssessError> {
    let request = validate_json(&body, &state.utc_offset).inspect_err(|e| {
        warn!(error = %e, "Rejected assessment request");
    })?;

    Ok(Json(respond(&state, &request)))
}

/// POST /assess/motion - Assess a home-mode motion event.
#[instrument(skip_all, fields(confidence))]
pub async fn post_assess_motion(
    State(state): State<AppState>,
    payload: Result<Json<MotionRequest>, JsonRejection>,
) -> Result<Json<AssessmentResponse>, AssessError> {
    let Json(request) = payload.inspect_err(log_rejection)?;
    // Log only the confidence, never the location
    tracing::Span::current().record("confidence", request.confidence);

    let raw = motion_request(request.confidence, request.location, Utc::now());
    let request = validate(&raw, &state.utc_offset)?;

    Ok(Json(respond(&state, &request)))
}

/// POST /assess/face - Assess an away-mode face detection.
#[instrument(skip_all, fields(confidence))]
pub async fn post_assess_face(
    State(state): State<AppState>,
    payload: Result<Json<FaceRequest>, JsonRejection>,
) -> Result<Json<AssessmentResponse>, AssessError> {
    let Json(request) = payload.inspect_err(log_rejection)?;
    // Log only the confidence, never the location or known-face flag
    tracing::Span::current().record("confidence", request.confidence);

    let raw = face_request(
        request.confidence,
        request.is_known,
        request.location,
        Utc::now(),
    );
    let request = validate(&raw, &state.utc_offset)?;

    Ok(Json(respond(&state, &request)))
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

fn respond(state: &AppState, request: &ValidatedRequest) -> AssessmentResponse {
    let response = assess(&state.classifier, request);

    info!(
        request_id = %response.request_id,
        kind = %request.event.kind,
        level = %response.threat_assessment.level,
        confidence = response.threat_assessment.confidence,
        processing_ms = response.processing_time_ms,
        "Threat assessed"
    );

    response
}
