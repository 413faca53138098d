//! Built-in rule tables and TOML overrides.
//!
//! Raw keys with no rule are dropped. When the platform renames a field, an
//! override file can patch the affected table without a rebuild:
//!
//! ```toml
//! [message]
//! body_text = { target = "message", transform = "body_text" }
//! comment_id = "message_id"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, RuleError};
use crate::types::{Entity, RemapRule, RuleSet, RuleTable, TransformId};

impl RuleSet {
    /// Rule tables matching the platform's current wire format.
    pub fn builtin() -> Self {
        Self {
            message: message_rules(),
            author: author_rules(),
            attachment: attachment_rules(),
            attachment_target: attachment_target_rules(),
        }
    }

    /// Overlay rules parsed from TOML on top of this set.
    ///
    /// Unknown transform names fail here rather than at record time.
    pub fn with_overrides_toml(mut self, text: &str) -> Result<Self> {
        let raw: RawRuleSet = toml::from_str(text)?;
        for (entity, rules) in raw.into_tables() {
            let table = self.table_mut(entity);
            for (key, rule) in rules {
                let rule = match rule {
                    RawRule::Rename(target) => RemapRule::Rename(target),
                    RawRule::Transform { target, transform } => {
                        let transform = transform.parse::<TransformId>().map_err(|name| {
                            RuleError::UnknownTransform {
                                entity,
                                key: key.clone(),
                                name,
                            }
                        })?;
                        RemapRule::Transform { target, transform }
                    }
                };
                table.insert(key, rule);
            }
        }
        Ok(self)
    }

    /// Overlay rules from a TOML file.
    pub fn with_overrides_file(self, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RuleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.with_overrides_toml(&text)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

fn message_rules() -> RuleTable {
    RuleTable::new(Entity::Message)
        .rename("id", "message_id")
        .rename("community_moderation_state", "community_moderation_state")
        .transform("author", "author", TransformId::Author)
        .transform("feedback", "reactions", TransformId::Feedback)
        .transform("created_time", "timestamp", TransformId::MultiplyByMillion)
        .rename("upvote_downvote_total", "upvote_downvote_total")
        .rename("is_author_banned_by_content_owner", "is_author_banned")
        .rename("is_author_original_poster", "is_author_original_poster")
        .rename("is_author_bot", "is_author_bot")
        .rename("is_author_non_coworker", "is_author_non_coworker")
        .transform("comment_parent", "in_reply_to", TransformId::Reply)
        .transform("edit_history", "number_of_edits", TransformId::EditCount)
        .rename("timestamp_in_video", "time_in_seconds")
        .rename("written_while_video_was_live", "written_while_video_was_live")
        .transform(
            "translatability_for_viewer",
            "message_dialect",
            TransformId::DialectName,
        )
        .rename("url", "message_url")
        .transform("body", "message", TransformId::BodyText)
        .transform("identity_badges_web", "author_badges", TransformId::AuthorBadges)
        .transform("attachments", "attachments", TransformId::AttachmentStyles)
        // Replay payloads
        .transform("timestamp", "timestamp", TransformId::LegacyTimestamp)
}

fn author_rules() -> RuleTable {
    RuleTable::new(Entity::Author)
        .rename("id", "id")
        .rename("name", "name")
        .transform("__typename", "type", TransformId::CamelCaseSplit)
        .rename("url", "url")
        .rename("is_verified", "is_verified")
        .transform("gender", "gender", TransformId::Lowercase)
        .rename("short_name", "short_name")
        // Replay profiles
        .rename("firstName", "short_name")
        .rename("uri", "url")
        .transform("type", "type", TransformId::Lowercase)
        .transform("thumbSrc", "images", TransformId::Thumbnail)
}

fn attachment_rules() -> RuleTable {
    RuleTable::new(Entity::Attachment)
        .rename("url", "url")
        .transform("source", "source", TransformId::BodyText)
        .transform("title_with_entities", "title", TransformId::BodyText)
        .transform("target", "target", TransformId::AttachmentInfo)
        .transform("media", "media", TransformId::AttachmentInfo)
}

fn attachment_target_rules() -> RuleTable {
    RuleTable::new(Entity::AttachmentTarget)
        .rename("id", "id")
        .transform("__typename", "type", TransformId::CamelCaseSplit)
        .transform("fallback_image", "image", TransformId::Image)
        .rename("is_playable", "is_playable")
        .rename("url", "url")
        // Sticker
        .rename("pack", "pack")
        .rename("label", "label")
        .transform("image", "image", TransformId::Image)
        // Star gift
        .rename("stars_image_on_star_quantity", "icon")
        .rename("spark_quantity", "quantity")
        // Page
        .rename("name", "name")
        .rename("category_name", "category")
        .rename("address", "address")
        .rename("overall_star_rating", "overall_star_rating")
        .transform("profile_picture", "profile_picture", TransformId::Uri)
        // Chat command results
        .transform("attachment_text", "text", TransformId::BodyText)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRule {
    Rename(String),
    Transform { target: String, transform: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRuleSet {
    #[serde(default)]
    message: BTreeMap<String, RawRule>,
    #[serde(default)]
    author: BTreeMap<String, RawRule>,
    #[serde(default)]
    attachment: BTreeMap<String, RawRule>,
    #[serde(default)]
    attachment_target: BTreeMap<String, RawRule>,
}

impl RawRuleSet {
    fn into_tables(self) -> [(Entity, BTreeMap<String, RawRule>); 4] {
        [
            (Entity::Message, self.message),
            (Entity::Author, self.author),
            (Entity::Attachment, self.attachment),
            (Entity::AttachmentTarget, self.attachment_target),
        ]
    }
}
