//! Response building.
//!
//! Wraps a [`Verdict`] with request metadata: a fresh request identifier,
//! the response timestamp and the measured time spent classifying.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::classifier::ThreatClassifier;
use crate::model::{AssessmentResponse, ReasoningReport, ThreatAssessment, Verdict};
use crate::validation::ValidatedRequest;

/// Classify a validated request and build its response.
///
/// The reported processing time covers only the classification call.
pub fn assess(classifier: &ThreatClassifier, request: &ValidatedRequest) -> AssessmentResponse {
    let started = Instant::now();
    let verdict = classifier.classify(&request.event, &request.context);
    let elapsed = started.elapsed();

    debug!(
        kind = %request.event.kind,
        mode = %request.context.mode,
        night = request.context.is_night,
        level = %verdict.level,
        tag = %verdict.reasoning.tag,
        elapsed_us = elapsed.as_micros() as u64,
        "Event classified"
    );

    build_response(verdict, elapsed)
}

/// Wrap a verdict with a new request id and the current time.
pub fn build_response(verdict: Verdict, elapsed: Duration) -> AssessmentResponse {
    AssessmentResponse {
        request_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        processing_time_ms: elapsed.as_secs_f64() * 1000.0,
        threat_assessment: ThreatAssessment {
            level: verdict.level,
            confidence: verdict.confidence,
            probability_distribution: verdict.distribution,
        },
        reasoning: ReasoningReport {
            primary_factors: vec![verdict.reasoning.tag],
            summary: verdict.reasoning.summary,
        },
    }
}
