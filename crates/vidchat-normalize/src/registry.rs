//! Transform registry: a static map from [`TransformId`] to function.
//!
//! The registry is built once and validated against the rule set before any
//! record is processed, so a rule naming a missing transform fails at
//! startup instead of mid-stream.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::engine::NormalizeContext;
use crate::error::{Result, RuleError, TransformError};
use crate::normalization::{attachment, author, message, reaction, scalar};
use crate::types::{RuleSet, TransformId};

/// A value transform. `Ok(None)` means "nothing to store".
pub type TransformFn =
    fn(&Value, &mut NormalizeContext<'_>) -> std::result::Result<Option<Value>, TransformError>;

#[derive(Debug, Clone)]
pub struct TransformRegistry {
    functions: BTreeMap<TransformId, TransformFn>,
}

impl TransformRegistry {
    /// An empty registry. Mostly useful for tests.
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    /// Registry with every built-in transform.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(TransformId::Feedback, reaction::parse_feedback);
        registry.register(TransformId::MultiplyByMillion, scalar::multiply_by_million);
        registry.register(TransformId::EditCount, scalar::edit_count);
        registry.register(TransformId::Reply, message::parse_reply);
        registry.register(TransformId::DialectName, scalar::dialect_name);
        registry.register(TransformId::BodyText, scalar::body_text);
        registry.register(TransformId::Author, author::parse_author);
        registry.register(TransformId::AuthorBadges, author::parse_badges);
        registry.register(TransformId::AttachmentStyles, attachment::parse_attachment_styles);
        registry.register(TransformId::AttachmentInfo, attachment::parse_attachment_info);
        registry.register(TransformId::Lowercase, scalar::lowercase);
        registry.register(TransformId::CamelCaseSplit, scalar::camel_case_split);
        registry.register(TransformId::Image, scalar::image);
        registry.register(TransformId::Uri, scalar::uri);
        registry.register(TransformId::LegacyTimestamp, scalar::legacy_timestamp);
        registry.register(TransformId::Thumbnail, scalar::thumbnail);
        registry
    }

    pub fn register(&mut self, id: TransformId, function: TransformFn) {
        self.functions.insert(id, function);
    }

    pub fn get(&self, id: TransformId) -> Option<TransformFn> {
        self.functions.get(&id).copied()
    }

    pub fn contains(&self, id: TransformId) -> bool {
        self.functions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Check that every transform named by `rules` resolves.
    pub fn validate(&self, rules: &RuleSet) -> Result<()> {
        for table in rules.tables() {
            for (key, rule) in table.iter() {
                let Some(transform) = rule.transform() else {
                    continue;
                };
                if !self.contains(transform) {
                    return Err(RuleError::Unregistered {
                        entity: table.entity(),
                        key: key.to_string(),
                        transform,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
