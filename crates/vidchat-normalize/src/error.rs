//! Error types for chat record normalization.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Entity, TransformId};

/// Rule-table errors. These surface at startup, before any record is read.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A rule names a transform that does not exist.
    #[error("unknown transform '{name}' for {entity} field '{key}'")]
    UnknownTransform {
        entity: Entity,
        key: String,
        name: String,
    },

    /// A rule names a transform the registry has no function for.
    #[error("transform '{transform}' used by {entity} field '{key}' is not registered")]
    Unregistered {
        entity: Entity,
        key: String,
        transform: TransformId,
    },

    /// Failed to parse a rule override file.
    #[error("invalid rule overrides: {0}")]
    Toml(#[from] toml::de::Error),

    /// Failed to read a rule override file.
    #[error("failed to read rule overrides {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single field transform failed. The engine skips the field and records
/// a diagnostic; the rest of the record is still produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The raw value has a different JSON type than the transform expects.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A sub-container the transform needs is missing.
    #[error("missing '{0}'")]
    MissingField(&'static str),

    /// Reply nesting went past the configured limit.
    #[error("reply chain deeper than {0} levels")]
    DepthExceeded(usize),

    /// A reply parent refers back to the record itself or one of its ancestors.
    #[error("reply cycle at record {0}")]
    Cycle(String),

    /// Numeric value out of range after conversion.
    #[error("numeric overflow")]
    Overflow,

    /// The registry has no function for this transform.
    #[error("transform '{0}' is not registered")]
    Unregistered(TransformId),
}

/// A whole record could not be normalized. Recovered at record granularity
/// by the caller; sibling records are unaffected.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The raw node is not a JSON object.
    #[error("record is {0}, not an object")]
    NotAnObject(&'static str),

    /// The record carries no identifier.
    #[error("record has no id")]
    MissingId,

    /// An expected payload container is missing.
    #[error("missing '{0}' container")]
    MissingContainer(&'static str),

    /// The normalized map does not fit the output model.
    #[error("normalized record {id} does not fit the output model: {source}")]
    Model {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias for rule-table operations.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Short JSON type name for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
