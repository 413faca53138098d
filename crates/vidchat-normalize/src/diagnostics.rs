//! Counters for schema drift and recovered failures.
//!
//! Unknown keys and variants are dropped on purpose; these counters keep the
//! drift observable. The first occurrence of each distinct item is logged at
//! `warn`, repeats at `trace`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{Entity, TransformId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Raw keys with no rule, as `entity.key`.
    pub unknown_keys: BTreeMap<String, u64>,
    /// Attachment type tags outside the known set.
    pub unknown_variants: BTreeMap<String, u64>,
    /// Failed field transforms, as `transform@entity.key`.
    pub transform_failures: BTreeMap<String, u64>,
    /// Sub-containers a normalizer expected but did not find.
    pub missing_fields: BTreeMap<String, u64>,
    pub records_normalized: u64,
    pub records_failed: u64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_unknown_key(&mut self, entity: Entity, key: &str) {
        let name = format!("{entity}.{key}");
        if bump(&mut self.unknown_keys, &name) == 1 {
            tracing::debug!(field = %name, "dropping unmapped field");
        } else {
            tracing::trace!(field = %name, "dropping unmapped field");
        }
    }

    pub fn record_unknown_variant(&mut self, type_name: &str) {
        if bump(&mut self.unknown_variants, type_name) == 1 {
            tracing::warn!(type_name, "unknown attachment type, keeping partial record");
        } else {
            tracing::trace!(type_name, "unknown attachment type");
        }
    }

    pub fn record_transform_failure(
        &mut self,
        transform: TransformId,
        entity: Entity,
        key: &str,
        reason: &dyn std::fmt::Display,
    ) {
        let name = format!("{transform}@{entity}.{key}");
        if bump(&mut self.transform_failures, &name) == 1 {
            tracing::warn!(transform = %name, %reason, "field transform failed, skipping field");
        } else {
            tracing::trace!(transform = %name, %reason, "field transform failed");
        }
    }

    pub fn record_missing_field(&mut self, context: &str, field: &str) {
        let name = format!("{context}.{field}");
        if bump(&mut self.missing_fields, &name) == 1 {
            tracing::debug!(field = %name, "expected field missing");
        }
    }

    pub fn record_success(&mut self) {
        self.records_normalized += 1;
    }

    pub fn record_failure(&mut self) {
        self.records_failed += 1;
    }

    pub fn unknown_key_count(&self) -> u64 {
        self.unknown_keys.values().sum()
    }

    pub fn unknown_variant_count(&self) -> u64 {
        self.unknown_variants.values().sum()
    }

    pub fn transform_failure_count(&self) -> u64 {
        self.transform_failures.values().sum()
    }

    /// True when nothing was dropped or recovered.
    pub fn is_clean(&self) -> bool {
        self.unknown_keys.is_empty()
            && self.unknown_variants.is_empty()
            && self.transform_failures.is_empty()
            && self.missing_fields.is_empty()
            && self.records_failed == 0
    }
}

fn bump(counters: &mut BTreeMap<String, u64>, name: &str) -> u64 {
    let count = counters.entry(name.to_string()).or_insert(0);
    *count += 1;
    *count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_repeated_unknown_keys() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record_unknown_key(Entity::Message, "tracking");
        diagnostics.record_unknown_key(Entity::Message, "tracking");
        diagnostics.record_unknown_key(Entity::Author, "tracking");
        assert_eq!(diagnostics.unknown_keys["message.tracking"], 2);
        assert_eq!(diagnostics.unknown_keys["author.tracking"], 1);
        assert_eq!(diagnostics.unknown_key_count(), 3);
        assert!(!diagnostics.is_clean());
    }

    #[test]
    fn repeated_variants_are_summed() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record_unknown_variant("ExternalUrl");
        diagnostics.record_unknown_variant("ExternalUrl");
        diagnostics.record_unknown_variant("Poll");
        assert_eq!(diagnostics.unknown_variants["ExternalUrl"], 2);
        assert_eq!(diagnostics.unknown_variant_count(), 3);
        assert_eq!(diagnostics.unknown_key_count(), 0);
    }
}
