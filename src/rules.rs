//! Threat rule table.
//!
//! Each rule pairs a pure predicate over `(Event, Context)` with an action:
//! the threat level, how to adjust the detector confidence, and the reason
//! tag. Rules are evaluated in order and the first match wins, so precedence
//! is exactly the position in [`default_rules`].
//!
//! The constants below are the tuning knobs for the table. They are kept in
//! one place so they can be retuned without touching predicate logic.

use std::fmt;

use crate::model::{Context, Event, EventKind, ReasonTag, SystemMode, ThreatLevel};

// ============================================================================
// CONFIDENCE LIMITS
// ============================================================================

/// Highest confidence any escalation may report.
pub const ESCALATION_CONFIDENCE_CAP: f64 = 0.99;

/// Confidence reported for events no rule recognizes.
pub const UNKNOWN_EVENT_CONFIDENCE: f64 = 0.1;

// ============================================================================
// ESCALATION BOOSTS (additive)
// ============================================================================

pub const ENTRY_WHILE_AWAY_BOOST: f64 = 0.4;
pub const UNOCCUPIED_NIGHT_BOOST: f64 = 0.3;
pub const ACCESS_NIGHT_BOOST: f64 = 0.2;
pub const UNKNOWN_PERSON_MODE_BOOST: f64 = 0.4;
pub const UNKNOWN_PERSON_NIGHT_BOOST: f64 = 0.25;
pub const UNKNOWN_FACE_AWAY_BOOST: f64 = 0.15;
pub const MOTION_AWAY_BOOST: f64 = 0.1;
pub const LOUD_AUDIO_BOOST: f64 = 0.05;

// ============================================================================
// DAMPENING FACTORS (multiplicative)
// ============================================================================

pub const MOTION_DAMPENING: f64 = 0.8;
pub const AUDIO_DAMPENING: f64 = 0.7;

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Motion confidence above which an away-mode motion event escalates.
pub const MOTION_AWAY_THRESHOLD: f64 = 0.8;

/// Audio confidence above which an audio event escalates.
pub const LOUD_AUDIO_THRESHOLD: f64 = 0.9;

/// Motion sub-type reported when a door or window opens.
pub const OPENING_MOTION: &str = "opening";

// ============================================================================
// RULE TYPES
// ============================================================================

/// How a rule turns the detector confidence into verdict confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfidenceAdjustment {
    /// Report absolute certainty (1.0).
    Absolute,
    /// Add a delta, capped at [`ESCALATION_CONFIDENCE_CAP`].
    Boost(f64),
    /// Multiply by a factor below 1.
    Dampen(f64),
    /// Keep the detector confidence.
    Unchanged,
    /// Ignore the detector and report a fixed value.
    Fixed(f64),
}

impl ConfidenceAdjustment {
    /// Apply the adjustment. The result is always within [0.0, 1.0].
    pub fn apply(&self, confidence: f64) -> f64 {
        let adjusted = match *self {
            ConfidenceAdjustment::Absolute => 1.0,
            ConfidenceAdjustment::Boost(delta) => {
                (confidence + delta).min(ESCALATION_CONFIDENCE_CAP)
            }
            ConfidenceAdjustment::Dampen(factor) => confidence * factor,
            ConfidenceAdjustment::Unchanged => confidence,
            ConfidenceAdjustment::Fixed(value) => value,
        };
        clamp_confidence(adjusted)
    }
}

/// Clamp into [0.0, 1.0]; NaN becomes 0.0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Predicate deciding whether a rule applies.
pub type Condition = fn(&Event, &Context) -> bool;

/// One row of the rule table.
#[derive(Clone, Copy)]
pub struct Rule {
    pub tag: ReasonTag,
    pub level: ThreatLevel,
    pub adjustment: ConfidenceAdjustment,
    pub condition: Condition,
}

impl Rule {
    pub const fn new(
        tag: ReasonTag,
        level: ThreatLevel,
        adjustment: ConfidenceAdjustment,
        condition: Condition,
    ) -> Self {
        Self {
            tag,
            level,
            adjustment,
            condition,
        }
    }

    pub fn matches(&self, event: &Event, context: &Context) -> bool {
        (self.condition)(event, context)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("tag", &self.tag)
            .field("level", &self.level)
            .field("adjustment", &self.adjustment)
            .finish_non_exhaustive()
    }
}

/// Applied when no rule in the table matches.
pub const FALLBACK_RULE: Rule = Rule::new(
    ReasonTag::UnknownEventType,
    ThreatLevel::Ignore,
    ConfidenceAdjustment::Fixed(UNKNOWN_EVENT_CONFIDENCE),
    always,
);

/// The standard rule table, highest priority first.
pub fn default_rules() -> Vec<Rule> {
    use ConfidenceAdjustment::*;
    use ThreatLevel::*;

    vec![
        // Emergency override: nothing below can soften a fire or smoke alarm.
        Rule::new(ReasonTag::EmergencyFireOverride, Critical, Absolute, is_hazard),
        // Access points
        Rule::new(
            ReasonTag::EntryWhileAway,
            Critical,
            Boost(ENTRY_WHILE_AWAY_BOOST),
            is_entry_while_away,
        ),
        Rule::new(
            ReasonTag::AccessPointUnoccupiedNight,
            Critical,
            Boost(UNOCCUPIED_NIGHT_BOOST),
            is_unoccupied_night_access,
        ),
        Rule::new(
            ReasonTag::AccessPointNight,
            Elevated,
            Boost(ACCESS_NIGHT_BOOST),
            is_night_mode_access,
        ),
        Rule::new(ReasonTag::AccessPointActivity, Standard, Unchanged, is_access_point),
        // Cameras and face recognition
        Rule::new(
            ReasonTag::UnknownPersonModeMatch,
            Critical,
            Boost(UNKNOWN_PERSON_MODE_BOOST),
            is_unknown_person_mode_match,
        ),
        Rule::new(
            ReasonTag::UnknownPersonNight,
            Elevated,
            Boost(UNKNOWN_PERSON_NIGHT_BOOST),
            is_unknown_person_night,
        ),
        Rule::new(
            ReasonTag::UnknownFaceAway,
            Elevated,
            Boost(UNKNOWN_FACE_AWAY_BOOST),
            is_unknown_face_away,
        ),
        Rule::new(ReasonTag::KnownOccupant, Standard, Unchanged, is_known_occupant),
        Rule::new(ReasonTag::CameraActivity, Standard, Unchanged, is_visual),
        // Motion
        Rule::new(
            ReasonTag::MotionWhileAway,
            Elevated,
            Boost(MOTION_AWAY_BOOST),
            is_motion_while_away,
        ),
        Rule::new(ReasonTag::RoutineMotion, Standard, Dampen(MOTION_DAMPENING), is_motion),
        // Audio
        Rule::new(ReasonTag::LoudAudio, Elevated, Boost(LOUD_AUDIO_BOOST), is_loud_audio),
        Rule::new(ReasonTag::RoutineAudio, Standard, Dampen(AUDIO_DAMPENING), is_audio),
    ]
}

// ============================================================================
// PREDICATES
// ============================================================================

fn always(_: &Event, _: &Context) -> bool {
    true
}

pub fn is_hazard(event: &Event, _: &Context) -> bool {
    event.kind.is_hazard()
}

pub fn is_entry_while_away(event: &Event, context: &Context) -> bool {
    event.kind.is_access_point()
        && context.mode == SystemMode::Away
        && event
            .motion_type()
            .is_some_and(|m| m.eq_ignore_ascii_case(OPENING_MOTION))
}

pub fn is_night_mode_access(event: &Event, context: &Context) -> bool {
    event.kind.is_access_point() && context.mode == SystemMode::Night && context.is_night
}

pub fn is_unoccupied_night_access(event: &Event, context: &Context) -> bool {
    is_night_mode_access(event, context) && context.is_unoccupied()
}

pub fn is_access_point(event: &Event, _: &Context) -> bool {
    event.kind.is_access_point()
}

fn is_unknown_person(event: &Event) -> bool {
    event.shows_person() && !event.known_face()
}

pub fn is_unknown_person_night(event: &Event, context: &Context) -> bool {
    is_unknown_person(event) && context.is_night
}

pub fn is_unknown_person_mode_match(event: &Event, context: &Context) -> bool {
    is_unknown_person_night(event, context)
        && matches!(context.mode, SystemMode::Away | SystemMode::Night)
}

pub fn is_unknown_face_away(event: &Event, context: &Context) -> bool {
    is_unknown_person(event) && context.mode == SystemMode::Away
}

pub fn is_known_occupant(event: &Event, _: &Context) -> bool {
    event.kind.is_visual() && event.known_face()
}

pub fn is_visual(event: &Event, _: &Context) -> bool {
    event.kind.is_visual()
}

pub fn is_motion_while_away(event: &Event, context: &Context) -> bool {
    event.kind == EventKind::Motion
        && context.mode == SystemMode::Away
        && event.confidence > MOTION_AWAY_THRESHOLD
}

pub fn is_motion(event: &Event, _: &Context) -> bool {
    event.kind == EventKind::Motion
}

pub fn is_loud_audio(event: &Event, _: &Context) -> bool {
    event.kind == EventKind::Audio && event.confidence > LOUD_AUDIO_THRESHOLD
}

pub fn is_audio(event: &Event, _: &Context) -> bool {
    event.kind == EventKind::Audio
}
