//! Settings loading with deep merge and environment variable overrides.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::IrisSettings;

/// Resolve the path to the settings file (`~/.iris/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".iris").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<IrisSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON or an invalid resulting
/// value is an error.
pub fn load_settings_from_path(path: &Path) -> Result<IrisSettings> {
    let defaults = serde_json::to_value(IrisSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: IrisSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `IRIS_*` environment variable overrides.
///
/// Invalid values are ignored with a warning, keeping the file/default value.
pub fn apply_env_overrides(settings: &mut IrisSettings) {
    if let Some(v) = read_env_string("IRIS_ADAPTER_NAME") {
        settings.adapter.name = v;
    }
    if let Some(v) = read_env_string("IRIS_ENDPOINT") {
        settings.adapter.endpoint = v;
    }
    if let Some(v) = read_env_u64("IRIS_ACCEPT_TIMEOUT_MS", 1, 3_600_000) {
        settings.transport.accept_timeout_ms = v;
    }
    if let Some(v) = read_env_u64("IRIS_SHUTDOWN_TIMEOUT_MS", 0, 3_600_000) {
        settings.transport.shutdown_timeout_ms = v;
    }
    if let Some(v) = read_env_string("IRIS_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"transport": {"acceptTimeoutMs": 1000, "errorBackoffMs": 100}});
        let source = serde_json::json!({"transport": {"acceptTimeoutMs": 250}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["transport"]["acceptTimeoutMs"], 250);
        assert_eq!(merged["transport"]["errorBackoffMs"], 100);
    }

    #[test]
    fn merge_null_preserves_target() {
        let merged = deep_merge(serde_json::json!({"a": 1}), serde_json::json!({"a": null}));
        assert_eq!(merged["a"], 1);
    }

    #[test]
    fn merge_array_replaces() {
        let merged = deep_merge(
            serde_json::json!({"items": [1, 2, 3]}),
            serde_json::json!({"items": [4]}),
        );
        assert_eq!(merged["items"], serde_json::json!([4]));
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let merged = deep_merge(
            serde_json::json!({"a": {"nested": true}}),
            serde_json::json!({"a": 42}),
        );
        assert_eq!(merged["a"], 42);
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = load_settings_from_path(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings.transport.error_backoff_ms, 100);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"adapter": {"endpoint": "unix -f /tmp/iris.sock"}, "transport": {"errorBackoffMs": 5}}"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.adapter.endpoint, "unix -f /tmp/iris.sock");
        assert_eq!(settings.transport.error_backoff_ms, 5);
        assert_eq!(settings.transport.shutdown_timeout_ms, 30_000);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result, Err(SettingsError::Json(_))));
    }

    #[test]
    fn load_rejects_invalid_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"transport": {"acceptTimeoutMs": 0}}"#).unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result, Err(SettingsError::InvalidValue(_))));
    }

    #[test]
    fn load_rejects_zero_error_backoff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"transport": {"errorBackoffMs": 0}}"#).unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result, Err(SettingsError::InvalidValue(_))));
    }

    #[test]
    fn parse_u64_range_bounds() {
        assert_eq!(parse_u64_range("250", 1, 1000), Some(250));
        assert_eq!(parse_u64_range("1", 1, 1000), Some(1));
        assert_eq!(parse_u64_range("0", 1, 1000), None);
        assert_eq!(parse_u64_range("1001", 1, 1000), None);
        assert_eq!(parse_u64_range("abc", 1, 1000), None);
    }
}
