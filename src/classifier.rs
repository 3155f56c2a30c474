//! Threat classifier.
//!
//! Turns an `(Event, Context)` pair into a [`Verdict`] by walking the rule
//! table in order. Classification never fails: input no rule recognizes
//! falls through to [`FALLBACK_RULE`].

use crate::model::{Context, Event, ProbabilityDistribution, Reasoning, Verdict};
use crate::rules::{FALLBACK_RULE, Rule, default_rules};

/// Deterministic, stateless rule evaluator.
///
/// Holds only its rule table, which never changes after construction, so a
/// single instance can be shared across threads by reference or `Arc`.
#[derive(Debug, Clone)]
pub struct ThreatClassifier {
    rules: Vec<Rule>,
}

impl Default for ThreatClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreatClassifier {
    /// Classifier using the standard rule table.
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    /// Classifier using a custom rule table, highest priority first.
    ///
    /// The fallback rule is always evaluated last and need not be included.
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The rule that decides this pair.
    pub fn matching_rule(&self, event: &Event, context: &Context) -> &Rule {
        self.rules
            .iter()
            .find(|rule| rule.matches(event, context))
            .unwrap_or(&FALLBACK_RULE)
    }

    /// Classify one event in its context.
    pub fn classify(&self, event: &Event, context: &Context) -> Verdict {
        let rule = self.matching_rule(event, context);
        verdict_for(rule, event, context)
    }
}

/// Apply a rule's action to an event.
pub fn verdict_for(rule: &Rule, event: &Event, context: &Context) -> Verdict {
    Verdict {
        level: rule.level,
        confidence: rule.adjustment.apply(event.confidence),
        reasoning: Reasoning::new(rule.tag, context),
        distribution: ProbabilityDistribution::for_level(rule.level),
    }
}
