//! The remap engine.
//!
//! For every key of a raw node the engine looks up a rule in the entity's
//! table. Keys without a rule are dropped and counted. Rename rules copy the
//! value; transform rules pipe it through the registry first. A failed
//! transform skips only that field.

use serde_json::{Map, Value};

use crate::diagnostics::Diagnostics;
use crate::error::TransformError;
use crate::registry::TransformRegistry;
use crate::types::{Entity, RemapRule, RuleSet, RuleTable, TransformId};

/// Hard cap on reply nesting.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// State threaded through one normalization pass.
pub struct NormalizeContext<'a> {
    rules: &'a RuleSet,
    registry: &'a TransformRegistry,
    diagnostics: &'a mut Diagnostics,
    /// Ids of the records currently being normalized, outermost first.
    ancestors: Vec<String>,
    max_depth: usize,
}

impl<'a> NormalizeContext<'a> {
    pub fn new(
        rules: &'a RuleSet,
        registry: &'a TransformRegistry,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            rules,
            registry,
            diagnostics,
            ancestors: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn rules(&self) -> &'a RuleSet {
        self.rules
    }

    pub fn table(&self, entity: Entity) -> &'a RuleTable {
        self.rules.table(entity)
    }

    pub fn diagnostics(&mut self) -> &mut Diagnostics {
        self.diagnostics
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Current reply nesting depth.
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    pub fn is_ancestor(&self, id: &str) -> bool {
        self.ancestors.iter().any(|ancestor| ancestor == id)
    }

    pub(crate) fn enter(&mut self, id: String) {
        self.ancestors.push(id);
    }

    pub(crate) fn leave(&mut self) {
        self.ancestors.pop();
    }

    /// Run a registered transform.
    pub fn apply(
        &mut self,
        transform: TransformId,
        value: &Value,
    ) -> Result<Option<Value>, TransformError> {
        let registry = self.registry;
        let function = registry
            .get(transform)
            .ok_or(TransformError::Unregistered(transform))?;
        function(value, self)
    }
}

/// Apply the rule for `key` to `value`, writing into `target`.
///
/// `null` values are treated as absent.
pub fn remap(
    target: &mut Map<String, Value>,
    table: &RuleTable,
    key: &str,
    value: &Value,
    ctx: &mut NormalizeContext<'_>,
) {
    let Some(rule) = table.get(key) else {
        ctx.diagnostics().record_unknown_key(table.entity(), key);
        return;
    };
    if value.is_null() {
        return;
    }
    match rule {
        RemapRule::Rename(target_key) => {
            target.insert(target_key.clone(), value.clone());
        }
        RemapRule::Transform {
            target: target_key,
            transform,
        } => match ctx.apply(*transform, value) {
            Ok(Some(result)) => {
                target.insert(target_key.clone(), result);
            }
            Ok(None) => {}
            Err(err) => {
                ctx.diagnostics()
                    .record_transform_failure(*transform, table.entity(), key, &err);
            }
        },
    }
}

/// Remap every key of `node` into a fresh object.
///
/// Keys listed in `handled` are left to the caller's own post-processing and
/// are neither mapped nor counted as unknown. The cleanup pass is not run
/// here; see [`prune_empty`].
pub fn remap_node(
    node: &Map<String, Value>,
    table: &RuleTable,
    handled: &[&str],
    ctx: &mut NormalizeContext<'_>,
) -> Map<String, Value> {
    let mut target = Map::new();
    for (key, value) in node {
        if handled.contains(&key.as_str()) {
            continue;
        }
        remap(&mut target, table, key, value, ctx);
    }
    target
}

/// Remove the entity's prunable fields that are empty containers.
pub fn prune_empty(target: &mut Map<String, Value>, entity: Entity) {
    for field in entity.prunable_fields() {
        if target.get(*field).is_some_and(is_empty_container) {
            target.remove(*field);
        }
    }
}

pub(crate) fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Null => true,
        _ => false,
    }
}
