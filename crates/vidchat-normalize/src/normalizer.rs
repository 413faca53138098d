//! Record-level entry point.

use serde_json::Value;
use vidchat_model::ChatMessage;

use crate::diagnostics::Diagnostics;
use crate::engine::{DEFAULT_MAX_DEPTH, NormalizeContext};
use crate::error::{RecordError, Result};
use crate::normalization::{message, replay};
use crate::registry::TransformRegistry;
use crate::types::RuleSet;

/// Outcome of normalizing one raw record.
pub type RecordOutcome = std::result::Result<ChatMessage, RecordError>;

/// Rule set plus registry, validated once and reused for every record.
#[derive(Debug, Clone)]
pub struct Normalizer {
    rules: RuleSet,
    registry: TransformRegistry,
    max_depth: usize,
}

impl Normalizer {
    /// Build a normalizer over `rules` with the standard registry.
    ///
    /// Fails if a rule names a transform the registry does not provide.
    pub fn new(rules: RuleSet) -> Result<Self> {
        Self::with_registry(rules, TransformRegistry::standard())
    }

    pub fn with_registry(rules: RuleSet, registry: TransformRegistry) -> Result<Self> {
        registry.validate(&rules)?;
        Ok(Self {
            rules,
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// Built-in rules and the standard registry.
    pub fn builtin() -> Self {
        Self {
            rules: RuleSet::builtin(),
            registry: TransformRegistry::standard(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Normalize one raw message node.
    ///
    /// Failures are counted in `diagnostics` and returned; they never affect
    /// other records.
    pub fn normalize(&self, raw: &Value, diagnostics: &mut Diagnostics) -> RecordOutcome {
        let outcome = {
            let mut ctx = NormalizeContext::new(&self.rules, &self.registry, diagnostics)
                .with_max_depth(self.max_depth);
            message::normalize_message(raw, &mut ctx)
        };
        match &outcome {
            Ok(_) => diagnostics.record_success(),
            Err(err) => {
                diagnostics.record_failure();
                tracing::debug!(error = %err, "record normalization failed");
            }
        }
        outcome
    }

    /// Normalize every comment of one replay entry.
    pub fn normalize_replay_entry(
        &self,
        entry: &Value,
        diagnostics: &mut Diagnostics,
    ) -> Vec<RecordOutcome> {
        match replay::expand_replay_entry(entry) {
            Ok(nodes) => nodes
                .iter()
                .map(|node| self.normalize(node, diagnostics))
                .collect(),
            Err(err) => {
                diagnostics.record_failure();
                tracing::debug!(error = %err, "replay entry skipped");
                vec![Err(err)]
            }
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::builtin()
    }
}
