//! Config and rule loading with command-line overrides.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use vidchat_client::RetrievalConfig;
use vidchat_normalize::{Normalizer, RuleSet};

/// Values given on the command line. Each one replaces the file value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub max_messages: Option<usize>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut RetrievalConfig) {
        if let Some(start) = self.start_time {
            config.start_time = Some(start);
        }
        if let Some(end) = self.end_time {
            config.end_time = Some(end);
        }
        if let Some(max) = self.max_messages {
            config.max_messages = Some(max);
        }
    }
}

/// Defaults, then the optional TOML file, then the overrides.
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<RetrievalConfig> {
    let mut config = match path {
        Some(path) => RetrievalConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RetrievalConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate().context("invalid retrieval settings")?;
    debug!(?config, "retrieval config");
    Ok(config)
}

/// Built-in rule tables with an optional TOML overlay.
pub fn load_rules(path: Option<&Path>) -> Result<RuleSet> {
    let rules = RuleSet::builtin();
    match path {
        Some(path) => rules
            .with_overrides_file(path)
            .with_context(|| format!("failed to load rule overrides {}", path.display())),
        None => Ok(rules),
    }
}

pub fn load_normalizer(rules: Option<&Path>) -> Result<Normalizer> {
    Normalizer::new(load_rules(rules)?).context("rule tables reference unknown transforms")
}
