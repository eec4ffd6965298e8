//! Environment variable fallbacks.
//!
//! Environment values fill a field only when no configuration file set it.

use std::collections::{HashMap, HashSet};

use tracing::debug;

/// Environment variables consulted as fallbacks, with the config field each
/// one maps to.
pub const ENV_FALLBACKS: &[(&str, &str)] = &[
    ("WARDEN_LOG_LEVEL", "logging.level"),
    ("WARDEN_LOG_FORMAT", "logging.format"),
    ("WARDEN_STRATEGY", "security.strategy"),
];

/// Snapshot the `WARDEN_*` environment variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with("WARDEN_"))
        .collect()
}

/// Apply environment fallbacks to every field not present in `file_fields`.
///
/// Returns the number of fields set from the environment.
pub fn apply_env_fallbacks(
    merged: &mut toml::Value,
    file_fields: &HashSet<String>,
    env: &HashMap<String, String>,
) -> usize {
    let mut applied = 0_usize;

    for (var, field) in ENV_FALLBACKS {
        if file_fields.contains(*field) {
            continue;
        }
        let Some(value) = env.get(*var) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if set_path(merged, field, toml::Value::String(value.to_ascii_lowercase())) {
            debug!(var, field, "applied environment fallback");
            applied = applied.saturating_add(1);
        }
    }

    applied
}

/// Set a dotted `path` in a table tree, creating intermediate tables.
fn set_path(root: &mut toml::Value, path: &str, value: toml::Value) -> bool {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return false;
    };

    let mut current = root;
    for segment in segments {
        let toml::Value::Table(table) = current else {
            return false;
        };
        current = table
            .entry(segment)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    match current {
        toml::Value::Table(table) => {
            table.insert(leaf.to_owned(), value);
            true
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn base() -> toml::Value {
        toml::from_str("[logging]\nlevel = \"info\"\n[security]\nstrategy = \"at_least_one\"\n")
            .unwrap()
    }

    #[test]
    fn test_env_fills_unset_fields() {
        let mut merged = base();
        let applied = apply_env_fallbacks(
            &mut merged,
            &HashSet::new(),
            &env(&[("WARDEN_LOG_LEVEL", "DEBUG"), ("WARDEN_STRATEGY", "all")]),
        );

        assert_eq!(applied, 2);
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(merged["security"]["strategy"].as_str(), Some("all"));
    }

    #[test]
    fn test_file_values_win_over_env() {
        let mut merged = base();
        let file_fields: HashSet<String> = ["logging.level".to_owned()].into();
        let applied = apply_env_fallbacks(
            &mut merged,
            &file_fields,
            &env(&[("WARDEN_LOG_LEVEL", "trace")]),
        );

        assert_eq!(applied, 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("info"));
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let mut merged = base();
        let applied =
            apply_env_fallbacks(&mut merged, &HashSet::new(), &env(&[("WARDEN_STRATEGY", "  ")]));
        assert_eq!(applied, 0);
    }

    #[test]
    fn test_missing_tables_are_created() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        assert!(set_path(
            &mut merged,
            "logging.format",
            toml::Value::String("json".to_owned())
        ));
        assert_eq!(merged["logging"]["format"].as_str(), Some("json"));
    }
}
