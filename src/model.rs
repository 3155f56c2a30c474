//! Data models for Homeguard.
//!
//! Every type in this module is an immutable per-call value. Nothing here
//! outlives the classification that produced it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata key carrying the motion sub-type of an access-point event.
pub const META_MOTION_TYPE: &str = "motion_type";

/// Metadata key carrying the object label reported by a camera.
pub const META_OBJECT_DETECTED: &str = "object_detected";

/// Metadata key carrying the known-occupant flag reported by a camera.
pub const META_KNOWN_FACE: &str = "known_face";

/// Alternative known-occupant key used by face-detection requests.
pub const META_IS_KNOWN: &str = "is_known";

/// First hour (inclusive, local time) of the night window.
pub const NIGHT_START_HOUR: u32 = 22;

/// Hour (exclusive, local time) at which the night window ends.
pub const NIGHT_END_HOUR: u32 = 6;

// ============================================================================
// THREAT LEVEL
// ============================================================================

/// Severity ladder for a verdict.
///
/// The ordering is meaningful: `Ignore < Standard < Elevated < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Ignore,
    Standard,
    Elevated,
    Critical,
}

impl ThreatLevel {
    /// All levels, lowest first.
    pub const ALL: [ThreatLevel; 4] = [
        ThreatLevel::Ignore,
        ThreatLevel::Standard,
        ThreatLevel::Elevated,
        ThreatLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Ignore => "ignore",
            ThreatLevel::Standard => "standard",
            ThreatLevel::Elevated => "elevated",
            ThreatLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// EVENT
// ============================================================================

/// The sensor family an event came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Motion,
    Door,
    Window,
    Camera,
    Face,
    Audio,
    Fire,
    Smoke,
    /// A label no rule knows about. The raw label is kept for logging.
    Unknown(String),
}

impl EventKind {
    /// Map a raw sensor label onto a sensor family.
    ///
    /// Matching is case-insensitive and works on whole words, so compound
    /// labels such as `front_door` or `camera backyard` map to their family
    /// while `firewall` or `promotion` stay unknown. Words are separated by
    /// `_`, `-` or whitespace. Hazard sensors are checked first so that a
    /// label like `smoke_door_sensor` can never be downgraded.
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_ascii_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
            .filter(|word| !word.is_empty())
            .collect();
        let has = |family: &str| words.contains(&family);

        if has("fire") {
            EventKind::Fire
        } else if has("smoke") {
            EventKind::Smoke
        } else if has("door") {
            EventKind::Door
        } else if has("window") {
            EventKind::Window
        } else if has("camera") {
            EventKind::Camera
        } else if has("face") {
            EventKind::Face
        } else if has("motion") {
            EventKind::Motion
        } else if has("audio") {
            EventKind::Audio
        } else {
            EventKind::Unknown(label.trim().to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Motion => "motion",
            EventKind::Door => "door",
            EventKind::Window => "window",
            EventKind::Camera => "camera",
            EventKind::Face => "face",
            EventKind::Audio => "audio",
            EventKind::Fire => "fire",
            EventKind::Smoke => "smoke",
            EventKind::Unknown(label) => label,
        }
    }

    /// Door and window sensors.
    pub fn is_access_point(&self) -> bool {
        matches!(self, EventKind::Door | EventKind::Window)
    }

    /// Camera and face-recognition sensors.
    pub fn is_visual(&self) -> bool {
        matches!(self, EventKind::Camera | EventKind::Face)
    }

    /// Fire and smoke detectors.
    pub fn is_hazard(&self) -> bool {
        matches!(self, EventKind::Fire | EventKind::Smoke)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Booleans, plus the strings `"true"` / `"false"` that some clients send.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(b) => Some(*b),
            MetadataValue::Text(s) if s.eq_ignore_ascii_case("true") => Some(true),
            MetadataValue::Text(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }
}

/// Open extension fields attached to an event.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A single sensor observation to be judged.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    /// Detector confidence in [0.0, 1.0].
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub metadata: Metadata,
}

impl Event {
    pub fn new(kind: EventKind, confidence: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            confidence,
            timestamp,
            metadata: Metadata::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: MetadataValue) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Motion sub-type of an access-point event (e.g. `"opening"`).
    pub fn motion_type(&self) -> Option<&str> {
        self.metadata.get(META_MOTION_TYPE).and_then(MetadataValue::as_str)
    }

    /// Object label reported by a camera (e.g. `"person"`).
    pub fn object_detected(&self) -> Option<&str> {
        self.metadata
            .get(META_OBJECT_DETECTED)
            .and_then(MetadataValue::as_str)
    }

    /// Whether the detected face belongs to a known occupant.
    ///
    /// Absent or unreadable flags count as unknown.
    pub fn known_face(&self) -> bool {
        self.metadata
            .get(META_KNOWN_FACE)
            .or_else(|| self.metadata.get(META_IS_KNOWN))
            .and_then(MetadataValue::as_bool)
            .unwrap_or(false)
    }

    /// Whether this observation is of a person.
    ///
    /// Face events always are; camera events only when the detector labelled
    /// the object as a person.
    pub fn shows_person(&self) -> bool {
        match self.kind {
            EventKind::Face => true,
            EventKind::Camera => self
                .object_detected()
                .is_some_and(|o| o.eq_ignore_ascii_case("person")),
            _ => false,
        }
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// The home's operating posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemMode {
    #[default]
    Home,
    Away,
    Night,
}

impl SystemMode {
    /// Parse a mode label case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "home" => Some(SystemMode::Home),
            "away" => Some(SystemMode::Away),
            "night" => Some(SystemMode::Night),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemMode::Home => "home",
            SystemMode::Away => "away",
            SystemMode::Night => "night",
        }
    }
}

impl fmt::Display for SystemMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Situational state that modifies how an event is judged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Context {
    pub mode: SystemMode,
    /// True when the event happened in [22:00, 06:00) local time.
    pub is_night: bool,
    /// Family members currently home.
    pub occupancy: BTreeSet<String>,
}

impl Context {
    pub fn new(mode: SystemMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Derive the night flag from an event timestamp at the given offset.
    pub fn at(mut self, timestamp: &DateTime<Utc>, offset: &FixedOffset) -> Self {
        self.is_night = is_night_time(timestamp, offset);
        self
    }

    pub fn with_night(mut self, is_night: bool) -> Self {
        self.is_night = is_night;
        self
    }

    pub fn with_occupants<I, S>(mut self, occupants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.occupancy = occupants.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_unoccupied(&self) -> bool {
        self.occupancy.is_empty()
    }
}

/// Whether a local hour falls in the night window.
pub fn is_night_hour(hour: u32) -> bool {
    hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
}

/// Whether an instant falls in the night window at the given UTC offset.
pub fn is_night_time(timestamp: &DateTime<Utc>, offset: &FixedOffset) -> bool {
    is_night_hour(timestamp.with_timezone(offset).hour())
}

// ============================================================================
// VERDICT
// ============================================================================

/// Machine-readable reason a verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonTag {
    EmergencyFireOverride,
    EntryWhileAway,
    AccessPointUnoccupiedNight,
    AccessPointNight,
    AccessPointActivity,
    UnknownPersonModeMatch,
    UnknownPersonNight,
    UnknownFaceAway,
    KnownOccupant,
    CameraActivity,
    MotionWhileAway,
    RoutineMotion,
    LoudAudio,
    RoutineAudio,
    UnknownEventType,
}

impl ReasonTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonTag::EmergencyFireOverride => "emergency_fire_override",
            ReasonTag::EntryWhileAway => "entry_while_away",
            ReasonTag::AccessPointUnoccupiedNight => "access_point_unoccupied_night",
            ReasonTag::AccessPointNight => "access_point_night",
            ReasonTag::AccessPointActivity => "access_point_activity",
            ReasonTag::UnknownPersonModeMatch => "unknown_person_mode_match",
            ReasonTag::UnknownPersonNight => "unknown_person_night",
            ReasonTag::UnknownFaceAway => "unknown_face_away",
            ReasonTag::KnownOccupant => "known_occupant",
            ReasonTag::CameraActivity => "camera_activity",
            ReasonTag::MotionWhileAway => "motion_while_away",
            ReasonTag::RoutineMotion => "routine_motion",
            ReasonTag::LoudAudio => "loud_audio",
            ReasonTag::RoutineAudio => "routine_audio",
            ReasonTag::UnknownEventType => "unknown_event_type",
        }
    }

    /// Human-readable sentence for this tag.
    pub fn sentence(&self, mode: SystemMode) -> String {
        let text = match self {
            ReasonTag::EmergencyFireOverride => {
                "Fire or smoke detected. Emergency override applied."
            }
            ReasonTag::EntryWhileAway => "Door/window opened while home is in away mode.",
            ReasonTag::AccessPointUnoccupiedNight => {
                "Access point triggered while no family members are home."
            }
            ReasonTag::AccessPointNight => "Unusual access point activity during night mode.",
            ReasonTag::AccessPointActivity => "Access point activity consistent with normal use.",
            ReasonTag::UnknownPersonModeMatch => {
                return format!("Unidentified person detected while home in {mode} mode.");
            }
            ReasonTag::UnknownPersonNight => {
                "Unidentified person detected by camera during night hours."
            }
            ReasonTag::UnknownFaceAway => "Unrecognized face detected while home is in away mode.",
            ReasonTag::KnownOccupant => "Recognized occupant detected.",
            ReasonTag::CameraActivity => "Normal home activity pattern detected.",
            ReasonTag::MotionWhileAway => {
                "High-confidence motion detected while home is in away mode."
            }
            ReasonTag::RoutineMotion => "Routine motion detected.",
            ReasonTag::LoudAudio => "High-confidence audio event detected.",
            ReasonTag::RoutineAudio => "Ambient audio activity detected.",
            ReasonTag::UnknownEventType => "Event type not recognized. Ignored.",
        };
        text.to_string()
    }
}

impl fmt::Display for ReasonTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a verdict was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reasoning {
    pub tag: ReasonTag,
    pub summary: String,
}

impl Reasoning {
    pub fn new(tag: ReasonTag, context: &Context) -> Self {
        Self {
            tag,
            summary: tag.sentence(context.mode),
        }
    }
}

/// Probability assigned to each threat level.
///
/// Values are non-negative and sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityDistribution {
    pub ignore: f64,
    pub standard: f64,
    pub elevated: f64,
    pub critical: f64,
}

impl ProbabilityDistribution {
    /// Fixed distribution for a verdict level.
    pub fn for_level(level: ThreatLevel) -> Self {
        let (ignore, standard, elevated, critical) = match level {
            ThreatLevel::Ignore => (0.85, 0.15, 0.0, 0.0),
            ThreatLevel::Standard => (0.10, 0.75, 0.15, 0.0),
            ThreatLevel::Elevated => (0.0, 0.15, 0.70, 0.15),
            ThreatLevel::Critical => (0.0, 0.0, 0.10, 0.90),
        };
        Self {
            ignore,
            standard,
            elevated,
            critical,
        }
    }

    pub fn get(&self, level: ThreatLevel) -> f64 {
        match level {
            ThreatLevel::Ignore => self.ignore,
            ThreatLevel::Standard => self.standard,
            ThreatLevel::Elevated => self.elevated,
            ThreatLevel::Critical => self.critical,
        }
    }

    pub fn total(&self) -> f64 {
        ThreatLevel::ALL.iter().map(|l| self.get(*l)).sum()
    }
}

/// The classifier's output for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub level: ThreatLevel,
    /// Confidence in [0.0, 1.0].
    pub confidence: f64,
    pub reasoning: Reasoning,
    pub distribution: ProbabilityDistribution,
}

// ============================================================================
// RESPONSE (wire format)
// ============================================================================

/// Level, confidence and distribution as reported to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatAssessment {
    pub level: ThreatLevel,
    pub confidence: f64,
    pub probability_distribution: ProbabilityDistribution,
}

/// Reasoning as reported to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningReport {
    pub primary_factors: Vec<ReasonTag>,
    pub summary: String,
}

/// Response for the assess endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Measured wall-clock time spent classifying.
    pub processing_time_ms: f64,
    pub threat_assessment: ThreatAssessment,
    pub reasoning: ReasoningReport,
}

/// Request body for `POST /assess/motion`.
#[derive(Debug, Clone, Deserialize)]
pub struct MotionRequest {
    pub confidence: f64,
    #[serde(default)]
    pub location: Option<Location>,
}

/// Request body for `POST /assess/face`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceRequest {
    pub confidence: f64,
    #[serde(default)]
    pub is_known: bool,
    #[serde(default)]
    pub location: Option<Location>,
}

/// Coarse device location attached to convenience requests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_threat_level_ordering() {
        assert!(ThreatLevel::Ignore < ThreatLevel::Standard);
        assert!(ThreatLevel::Standard < ThreatLevel::Elevated);
        assert!(ThreatLevel::Elevated < ThreatLevel::Critical);
        assert_eq!(ThreatLevel::ALL.iter().max(), Some(&ThreatLevel::Critical));
    }

    #[test]
    fn test_event_kind_from_label() {
        assert_eq!(EventKind::from_label("motion"), EventKind::Motion);
        assert_eq!(EventKind::from_label("Front_Door"), EventKind::Door);
        assert_eq!(EventKind::from_label("window_sensor"), EventKind::Window);
        assert_eq!(EventKind::from_label("camera_backyard"), EventKind::Camera);
        assert_eq!(EventKind::from_label("face"), EventKind::Face);
        assert_eq!(EventKind::from_label("SMOKE"), EventKind::Smoke);
        assert_eq!(EventKind::from_label("smoke_door_sensor"), EventKind::Smoke);
        assert_eq!(EventKind::from_label("fire-alarm"), EventKind::Fire);
        assert_eq!(EventKind::from_label("hallway motion"), EventKind::Motion);
        assert_eq!(
            EventKind::from_label("toaster"),
            EventKind::Unknown("toaster".to_string())
        );
    }

    #[test]
    fn test_event_kind_ignores_partial_words() {
        for label in ["firewall_alert", "emotion_meter", "promotion", "surface_temp", "doorbell"] {
            assert_eq!(
                EventKind::from_label(label),
                EventKind::Unknown(label.to_string()),
                "{label}"
            );
        }
    }

    #[test]
    fn test_known_face_accepts_string_flags() {
        let now = Utc::now();
        let event = Event::new(EventKind::Face, 0.9, now)
            .with_meta(META_IS_KNOWN, MetadataValue::Text("true".to_string()));
        assert!(event.known_face());

        let event = Event::new(EventKind::Face, 0.9, now)
            .with_meta(META_IS_KNOWN, MetadataValue::Text("false".to_string()));
        assert!(!event.known_face());

        let event = Event::new(EventKind::Camera, 0.9, now);
        assert!(!event.known_face());
    }

    #[test]
    fn test_shows_person() {
        let now = Utc::now();
        assert!(Event::new(EventKind::Face, 0.5, now).shows_person());
        assert!(
            Event::new(EventKind::Camera, 0.5, now)
                .with_meta(META_OBJECT_DETECTED, MetadataValue::Text("Person".to_string()))
                .shows_person()
        );
        assert!(
            !Event::new(EventKind::Camera, 0.5, now)
                .with_meta(META_OBJECT_DETECTED, MetadataValue::Text("cat".to_string()))
                .shows_person()
        );
        assert!(!Event::new(EventKind::Motion, 0.5, now).shows_person());
    }

    #[test]
    fn test_night_window_boundaries() {
        assert!(is_night_hour(22));
        assert!(is_night_hour(23));
        assert!(is_night_hour(0));
        assert!(is_night_hour(5));
        assert!(!is_night_hour(6));
        assert!(!is_night_hour(12));
        assert!(!is_night_hour(21));
    }

    #[test]
    fn test_night_time_respects_offset() {
        // 20:00 UTC is 23:00 at UTC+3 but 15:00 at UTC-5
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap();
        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        assert!(is_night_time(&ts, &plus_three));
        assert!(!is_night_time(&ts, &minus_five));
    }

    #[test]
    fn test_distributions_sum_to_one() {
        for level in ThreatLevel::ALL {
            let dist = ProbabilityDistribution::for_level(level);
            assert!((dist.total() - 1.0).abs() < 1e-9, "{level} does not sum to 1");
            for other in ThreatLevel::ALL {
                assert!(dist.get(level) >= dist.get(other));
            }
        }
    }

    #[test]
    fn test_mode_match_sentence_names_mode() {
        let sentence = ReasonTag::UnknownPersonModeMatch.sentence(SystemMode::Away);
        assert!(sentence.contains("away mode"));
    }

    #[test]
    fn test_reason_tag_serializes_snake_case() {
        let json = serde_json::to_string(&ReasonTag::AccessPointUnoccupiedNight).unwrap();
        assert_eq!(json, "\"access_point_unoccupied_night\"");
    }
}
