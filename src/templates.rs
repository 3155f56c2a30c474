//! Convenience request templates.
//!
//! Builds complete envelope-shaped requests for the two common quick checks:
//! a home-mode motion event and an away-mode face detection.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::model::Location;

/// Device id stamped on motion requests built here.
pub const MOTION_DEVICE_ID: &str = "convenience_motion";

/// Device id stamped on face requests built here.
pub const FACE_DEVICE_ID: &str = "convenience_face";

/// A home-mode motion request.
pub fn motion_request(confidence: f64, location: Option<Location>, at: DateTime<Utc>) -> Value {
    json!({
        "systemMode": "home",
        "location": location,
        "deviceInfo": {"battery": 85},
        "events": [{
            "type": "motion",
            "confidence": confidence,
            "timestamp": at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "metadata": {"deviceId": MOTION_DEVICE_ID}
        }]
    })
}

/// An away-mode face-detection request.
pub fn face_request(
    confidence: f64,
    is_known: bool,
    location: Option<Location>,
    at: DateTime<Utc>,
) -> Value {
    json!({
        "systemMode": "away",
        "location": location,
        "deviceInfo": {"battery": 90},
        "events": [{
            "type": "face",
            "confidence": confidence,
            "timestamp": at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "metadata": {"is_known": is_known.to_string(), "deviceId": FACE_DEVICE_ID}
        }]
    })
}
