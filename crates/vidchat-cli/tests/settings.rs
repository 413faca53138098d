//! Integration tests for config and rule loading.

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use vidchat_cli::settings::{ConfigOverrides, load_config, load_normalizer, load_rules};
use vidchat_normalize::{RemapRule, TransformId};

fn toml_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_without_a_file() {
    let config = load_config(None, &ConfigOverrides::default()).unwrap();
    assert_eq!(config.poll_interval, Duration::from_secs(2));
    assert_eq!(config.dedup_capacity, 25);
    assert!(!config.has_time_range());
}

#[test]
fn flags_override_file_values() {
    let file = toml_file("poll_interval = 5\nend_time = 600\nmax_messages = 100\n");
    let overrides = ConfigOverrides {
        start_time: Some(30.0),
        max_messages: Some(10),
        ..ConfigOverrides::default()
    };

    let config = load_config(Some(file.path()), &overrides).unwrap();

    assert_eq!(config.poll_interval, Duration::from_secs(5));
    assert_eq!(config.start_time, Some(30.0));
    assert_eq!(config.end_time, Some(600.0));
    assert_eq!(config.max_messages, Some(10));
}

#[test]
fn inverted_range_is_rejected_after_overrides() {
    let file = toml_file("end_time = 60\n");
    let overrides = ConfigOverrides {
        start_time: Some(120.0),
        ..ConfigOverrides::default()
    };

    let err = load_config(Some(file.path()), &overrides).unwrap_err();

    assert!(format!("{err:#}").contains("before start_time"));
}

#[test]
fn unknown_config_keys_fail() {
    let file = toml_file("poll_intreval = 5\n");
    let err = load_config(Some(file.path()), &ConfigOverrides::default()).unwrap_err();
    assert!(format!("{err:#}").contains("failed to load config"));
}

#[test]
fn rule_overrides_patch_the_builtin_tables() {
    let file = toml_file(
        "[message]\ncomment_body = { target = \"message\", transform = \"body_text\" }\n",
    );

    let rules = load_rules(Some(file.path())).unwrap();

    assert_eq!(
        rules.message.get("comment_body"),
        Some(&RemapRule::Transform {
            target: "message".to_string(),
            transform: TransformId::BodyText,
        })
    );
    assert!(load_normalizer(Some(file.path())).is_ok());
}

#[test]
fn unknown_transform_names_fail_at_startup() {
    let file = toml_file("[author]\nnick = { target = \"name\", transform = \"shout\" }\n");
    let err = load_normalizer(Some(file.path())).unwrap_err();
    assert!(format!("{err:#}").contains("failed to load rule overrides"));
}
