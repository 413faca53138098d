//! Rule-driven normalization of raw video chat records.
//!
//! The platform's wire format is deeply nested and drifts without notice.
//! This crate rebuilds raw records into the stable [`vidchat_model`] shape
//! using declarative rule tables instead of hand-written field access.
//!
//! # Overview
//!
//! - **Rule tables** ([`RuleSet`]): per-entity maps from raw key to output
//!   key, optionally through a named [`TransformId`]. Built in, with TOML
//!   overrides for patching drift without a rebuild.
//! - **Transform registry** ([`TransformRegistry`]): the functions behind
//!   each [`TransformId`], validated against the rules at startup.
//! - **Engine** ([`remap`], [`remap_node`], [`prune_empty`]): applies rules,
//!   drops unknown keys, skips failed fields, prunes empty containers.
//! - **Normalizer** ([`Normalizer`]): record-level entry point for live
//!   comment nodes and replay payload entries.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use vidchat_normalize::{Diagnostics, Normalizer};
//!
//! let normalizer = Normalizer::builtin();
//! let mut diagnostics = Diagnostics::new();
//! let raw = json!({"id": "1", "body": {"text": "hello"}, "created_time": 1_600_000_000});
//! let message = normalizer.normalize(&raw, &mut diagnostics).unwrap();
//! assert_eq!(message.message.as_deref(), Some("hello"));
//! assert_eq!(message.timestamp, Some(1_600_000_000_000_000));
//! ```
//!
//! # Failure isolation
//!
//! - Unknown keys and attachment types are dropped and counted in
//!   [`Diagnostics`].
//! - A failed transform skips one field.
//! - A malformed record yields a [`RecordError`] without touching its
//!   siblings.

mod diagnostics;
mod engine;
mod error;
mod normalizer;
mod registry;
mod rules;
mod types;

pub mod normalization;

// Core types
pub use types::{Entity, RemapRule, RuleSet, RuleTable, TransformId};

// Errors
pub use error::{RecordError, Result, RuleError, TransformError};

// Engine
pub use engine::{DEFAULT_MAX_DEPTH, NormalizeContext, prune_empty, remap, remap_node};
pub use registry::{TransformFn, TransformRegistry};

// Record normalization
pub use diagnostics::Diagnostics;
pub use normalizer::{Normalizer, RecordOutcome};

// Text helpers
pub use normalization::text::{camel_case_split, seconds_to_time, star_gift_text};
