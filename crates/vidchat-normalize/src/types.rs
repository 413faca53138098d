//! Core types for the rule-driven normalization system.
//!
//! A [`RuleTable`] maps raw field names to output field names, optionally
//! piping the value through a named [`TransformId`]. One table exists per
//! entity shape; together they form a [`RuleSet`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Entity shape a rule table applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Message,
    Author,
    Attachment,
    AttachmentTarget,
}

impl Entity {
    pub const ALL: [Entity; 4] = [
        Entity::Message,
        Entity::Author,
        Entity::Attachment,
        Entity::AttachmentTarget,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Author => "author",
            Self::Attachment => "attachment",
            Self::AttachmentTarget => "attachment_target",
        }
    }

    /// Output fields removed by the cleanup pass when they end up as empty
    /// containers.
    pub const fn prunable_fields(self) -> &'static [&'static str] {
        match self {
            Self::Message => &["reactions", "attachments", "in_reply_to"],
            Self::Author => &["badges", "images"],
            Self::Attachment => &["target", "media"],
            Self::AttachmentTarget => &["image"],
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of value transforms available to rule tables.
///
/// Names are the snake_case identifiers used in rule override files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TransformId {
    /// Reaction edges and totals from a feedback node.
    Feedback,
    /// Seconds to microseconds.
    MultiplyByMillion,
    /// `{count}` of an edit-history node.
    EditCount,
    /// Recursively normalize a reply parent.
    Reply,
    /// `source_dialect_name` of a translatability node.
    DialectName,
    /// `text` of a body node.
    BodyText,
    /// Author node through the author rule table.
    Author,
    /// Identity badge list with synthesized icons.
    AuthorBadges,
    /// Attachment style wrappers.
    AttachmentStyles,
    /// Attachment target or media node.
    AttachmentInfo,
    /// ASCII lower case.
    Lowercase,
    /// `CamelCase` type names to `snake_case`.
    CamelCaseSplit,
    /// `{uri, width, height}` to an image descriptor.
    Image,
    /// `uri` of a picture node.
    Uri,
    /// `{time}` node or bare seconds to microseconds.
    LegacyTimestamp,
    /// Single thumbnail URL to a one-element image list.
    Thumbnail,
}

impl TransformId {
    pub const ALL: [TransformId; 16] = [
        TransformId::Feedback,
        TransformId::MultiplyByMillion,
        TransformId::EditCount,
        TransformId::Reply,
        TransformId::DialectName,
        TransformId::BodyText,
        TransformId::Author,
        TransformId::AuthorBadges,
        TransformId::AttachmentStyles,
        TransformId::AttachmentInfo,
        TransformId::Lowercase,
        TransformId::CamelCaseSplit,
        TransformId::Image,
        TransformId::Uri,
        TransformId::LegacyTimestamp,
        TransformId::Thumbnail,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feedback => "feedback",
            Self::MultiplyByMillion => "multiply_by_million",
            Self::EditCount => "edit_count",
            Self::Reply => "reply",
            Self::DialectName => "dialect_name",
            Self::BodyText => "body_text",
            Self::Author => "author",
            Self::AuthorBadges => "author_badges",
            Self::AttachmentStyles => "attachment_styles",
            Self::AttachmentInfo => "attachment_info",
            Self::Lowercase => "lowercase",
            Self::CamelCaseSplit => "camel_case_split",
            Self::Image => "image",
            Self::Uri => "uri",
            Self::LegacyTimestamp => "legacy_timestamp",
            Self::Thumbnail => "thumbnail",
        }
    }
}

impl fmt::Display for TransformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == name)
            .ok_or_else(|| name.to_string())
    }
}

/// How a single raw field is carried into the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemapRule {
    /// Copy the value under a new key.
    Rename(String),
    /// Pipe the value through a transform, then store it under `target`.
    Transform { target: String, transform: TransformId },
}

impl RemapRule {
    /// Output key this rule writes.
    pub fn target(&self) -> &str {
        match self {
            Self::Rename(target) | Self::Transform { target, .. } => target,
        }
    }

    pub fn transform(&self) -> Option<TransformId> {
        match self {
            Self::Rename(_) => None,
            Self::Transform { transform, .. } => Some(*transform),
        }
    }
}

/// Rules for one entity shape, keyed by raw field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    entity: Entity,
    rules: BTreeMap<String, RemapRule>,
}

impl RuleTable {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            rules: BTreeMap::new(),
        }
    }

    /// Add a direct rename rule.
    #[must_use]
    pub fn rename(mut self, source: &str, target: &str) -> Self {
        self.insert(source, RemapRule::Rename(target.to_string()));
        self
    }

    /// Add a transform rule.
    #[must_use]
    pub fn transform(mut self, source: &str, target: &str, transform: TransformId) -> Self {
        self.insert(
            source,
            RemapRule::Transform {
                target: target.to_string(),
                transform,
            },
        );
        self
    }

    /// Insert or replace the rule for a raw field.
    pub fn insert(&mut self, source: impl Into<String>, rule: RemapRule) {
        self.rules.insert(source.into(), rule);
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn get(&self, source: &str) -> Option<&RemapRule> {
        self.rules.get(source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RemapRule)> {
        self.rules.iter().map(|(key, rule)| (key.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The complete set of rule tables, one per entity shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub message: RuleTable,
    pub author: RuleTable,
    pub attachment: RuleTable,
    pub attachment_target: RuleTable,
}

impl RuleSet {
    pub fn table(&self, entity: Entity) -> &RuleTable {
        match entity {
            Entity::Message => &self.message,
            Entity::Author => &self.author,
            Entity::Attachment => &self.attachment,
            Entity::AttachmentTarget => &self.attachment_target,
        }
    }

    pub fn table_mut(&mut self, entity: Entity) -> &mut RuleTable {
        match entity {
            Entity::Message => &mut self.message,
            Entity::Author => &mut self.author,
            Entity::Attachment => &mut self.attachment,
            Entity::AttachmentTarget => &mut self.attachment_target,
        }
    }

    /// Every table in a fixed order.
    pub fn tables(&self) -> [&RuleTable; 4] {
        [
            &self.message,
            &self.author,
            &self.attachment,
            &self.attachment_target,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_names_round_trip() {
        for id in TransformId::ALL {
            assert_eq!(id.as_str().parse::<TransformId>(), Ok(id));
        }
        assert_eq!(
            "parse_everything".parse::<TransformId>(),
            Err("parse_everything".to_string())
        );
    }

    #[test]
    fn rule_table_builder_replaces_existing_rules() {
        let table = RuleTable::new(Entity::Author)
            .rename("name", "name")
            .transform("name", "name", TransformId::Lowercase);
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get("name").and_then(RemapRule::transform),
            Some(TransformId::Lowercase)
        );
    }
}
