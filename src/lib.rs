//! Homeguard - a deterministic threat classifier for home security sensors.
//!
//! # Overview
//!
//! Homeguard judges a single sensor event (motion, door/window, camera/face,
//! audio, fire/smoke) in its situational context (system mode, night hours,
//! occupancy) and returns a graded verdict: a threat level, a confidence, a
//! reason, and a probability distribution over levels.
//!
//! The pipeline is:
//!
//! ```text
//! request -> validation -> classifier (rule table) -> response
//! ```
//!
//! The classifier is a pure function of its input. It holds no state between
//! calls and never fails; events it cannot recognize are ignored rather than
//! rejected.
//!
//! # Modules
//!
//! - [`model`]: Events, context, verdicts and wire types
//! - [`rules`]: The ordered rule table and its tuning constants
//! - [`classifier`]: First-match evaluation of the rule table
//! - [`validation`]: Normalization of raw requests
//! - [`response`]: Assessment responses with timing and request ids
//! - [`templates`]: Convenience motion and face requests
//! - [`api`]: HTTP API handlers
//! - [`config`]: Environment configuration
//! - [`error`]: Error types

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod model;
pub mod response;
pub mod rules;
pub mod templates;
pub mod validation;

pub use classifier::ThreatClassifier;
pub use error::AssessError;
