//! Request validation.
//!
//! Accepts the two request shapes callers send and normalizes them into an
//! [`Event`] and its [`Context`]:
//!
//! - the envelope shape, with `systemMode` and an `events` array whose first
//!   element is judged, and
//! - the simplified single-event shape (`type`, `confidence`, `timestamp`,
//!   `metadata`), where mode and occupancy may ride in the metadata.
//!
//! Missing or unparsable required fields yield [`AssessError::MalformedInput`].
//! The event type is never defaulted.

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{AssessError, AssessResult};
use crate::model::{Context, Event, EventKind, Metadata, MetadataValue, SystemMode};

/// Confidence assumed when a request omits it.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Metadata key that carries the system mode in simplified requests.
pub const META_HOME_MODE: &str = "home_mode";

/// Metadata key that carries the occupancy list in simplified requests.
pub const META_FAMILY_MEMBERS_HOME: &str = "family_members_home";

/// Top-level key carrying the system mode.
pub const SYSTEM_MODE_KEY: &str = "systemMode";

/// Top-level key carrying the occupancy list.
pub const FAMILY_MEMBERS_KEY: &str = "familyMembersHome";

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub event: Event,
    pub context: Context,
}

/// Validate a raw JSON request body.
pub fn validate_json(body: &str, offset: &FixedOffset) -> AssessResult<ValidatedRequest> {
    let value: Value = serde_json::from_str(body)?;
    validate(&value, offset)
}

/// Validate an already-parsed request.
///
/// `offset` is the home's local offset from UTC; it decides whether the
/// event happened during night hours.
pub fn validate(request: &Value, offset: &FixedOffset) -> AssessResult<ValidatedRequest> {
    validate_at(request, offset, Utc::now())
}

/// Validate with an explicit "now" for requests that omit a timestamp.
pub fn validate_at(
    request: &Value,
    offset: &FixedOffset,
    now: DateTime<Utc>,
) -> AssessResult<ValidatedRequest> {
    let root = request
        .as_object()
        .ok_or_else(|| AssessError::malformed("request must be a JSON object"))?;

    let raw_event = match root.get("events") {
        Some(Value::Array(events)) => {
            if events.len() > 1 {
                debug!(count = events.len(), "Multiple events supplied, judging the first");
            }
            events
                .first()
                .ok_or_else(|| AssessError::malformed("events array is empty"))?
                .as_object()
                .ok_or_else(|| AssessError::malformed("event must be a JSON object"))?
        }
        Some(_) => return Err(AssessError::malformed("events must be an array")),
        None => root,
    };

    let kind = parse_kind(raw_event.get("type"))?;
    let confidence = parse_confidence(raw_event.get("confidence"))?;
    let timestamp = parse_timestamp(raw_event.get("timestamp"), now)?;
    let raw_metadata = match raw_event.get("metadata") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(_) => return Err(AssessError::malformed("metadata must be a JSON object")),
    };

    let mode = parse_mode(
        root.get(SYSTEM_MODE_KEY)
            .or_else(|| raw_metadata.and_then(|m| m.get(META_HOME_MODE))),
    )?;
    let occupancy = parse_occupancy(
        root.get(FAMILY_MEMBERS_KEY)
            .or_else(|| raw_metadata.and_then(|m| m.get(META_FAMILY_MEMBERS_HOME))),
    )?;

    let event = Event {
        kind,
        confidence,
        timestamp,
        metadata: raw_metadata.map(scalar_metadata).unwrap_or_default(),
    };
    let context = Context::new(mode)
        .at(&event.timestamp, offset)
        .with_occupants(occupancy);

    Ok(ValidatedRequest { event, context })
}

fn parse_kind(value: Option<&Value>) -> AssessResult<EventKind> {
    match value {
        Some(Value::String(label)) if !label.trim().is_empty() => Ok(EventKind::from_label(label)),
        Some(Value::String(_)) => Err(AssessError::malformed("event type is empty")),
        Some(Value::Null) | None => Err(AssessError::malformed("event type is missing")),
        Some(_) => Err(AssessError::malformed("event type must be a string")),
    }
}

/// Numbers or numeric strings, clamped into [0.0, 1.0].
fn parse_confidence(value: Option<&Value>) -> AssessResult<f64> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(DEFAULT_CONFIDENCE),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match raw {
        Some(c) if c.is_finite() => Ok(c.clamp(0.0, 1.0)),
        _ => Err(AssessError::malformed("confidence must be a finite number")),
    }
}

/// RFC 3339 strings or Unix seconds; missing means now.
fn parse_timestamp(value: Option<&Value>, now: DateTime<Utc>) -> AssessResult<DateTime<Utc>> {
    match value {
        None | Some(Value::Null) => Ok(now),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| AssessError::malformed(format!("timestamp is not RFC 3339: {e}"))),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|secs| secs.is_finite())
            .and_then(from_unix_seconds)
            .ok_or_else(|| AssessError::malformed("timestamp is out of range")),
        Some(_) => Err(AssessError::malformed(
            "timestamp must be a string or a number",
        )),
    }
}

fn from_unix_seconds(secs: f64) -> Option<DateTime<Utc>> {
    let whole = secs.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

fn parse_mode(value: Option<&Value>) -> AssessResult<SystemMode> {
    match value {
        None | Some(Value::Null) => Ok(SystemMode::default()),
        Some(Value::String(label)) => SystemMode::from_label(label)
            .ok_or_else(|| AssessError::malformed(format!("unknown system mode: {label:?}"))),
        Some(_) => Err(AssessError::malformed("system mode must be a string")),
    }
}

fn parse_occupancy(value: Option<&Value>) -> AssessResult<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(members)) => members
            .iter()
            .map(|m| {
                m.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| AssessError::malformed("occupants must be strings"))
            })
            .collect(),
        Some(_) => Err(AssessError::malformed("occupancy must be an array")),
    }
}

/// Keep scalar entries; drop nulls and nested values.
fn scalar_metadata(raw: &Map<String, Value>) -> Metadata {
    raw.iter()
        .filter_map(|(key, value)| {
            let scalar = match value {
                Value::Bool(b) => MetadataValue::Bool(*b),
                Value::Number(n) => MetadataValue::Number(n.as_f64()?),
                Value::String(s) => MetadataValue::Text(s.clone()),
                _ => {
                    debug!(key = %key, "Dropping non-scalar metadata entry");
                    return None;
                }
            };
            Some((key.clone(), scalar))
        })
        .collect()
}
