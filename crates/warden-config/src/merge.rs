//! Deep merge of TOML layers.
//!
//! Merging works on raw [`toml::Value`] trees, so a key missing from an
//! upper layer never overrides the layer below it.

use std::collections::HashSet;

/// Recursively deep-merge `overlay` into `base`, recording every leaf path
/// the overlay sets in `sources`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    sources: &mut HashSet<String>,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join(prefix, key);
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val, &path, sources);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, sources);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            sources.insert(prefix.to_owned());
        },
    }
}

fn record_leaves(val: &toml::Value, prefix: &str, sources: &mut HashSet<String>) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join(prefix, key), sources);
        }
    } else {
        sources.insert(prefix.to_owned());
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_overlay_replaces_scalars_and_keeps_missing_keys() {
        let mut base = parse("[cache]\nenabled = true\nsweep_interval_secs = 60\n");
        let overlay = parse("[cache]\nsweep_interval_secs = 5\n");
        let mut sources = HashSet::new();

        deep_merge(&mut base, &overlay, "", &mut sources);

        assert_eq!(base["cache"]["enabled"].as_bool(), Some(true));
        assert_eq!(base["cache"]["sweep_interval_secs"].as_integer(), Some(5));
        assert!(sources.contains("cache.sweep_interval_secs"));
        assert!(!sources.contains("cache.enabled"));
    }

    #[test]
    fn test_arrays_are_replaced() {
        let mut base = parse("realms = []\n");
        let overlay = parse("[[realms]]\nname = \"a\"\n[[realms]]\nname = \"b\"\n");
        let mut sources = HashSet::new();

        deep_merge(&mut base, &overlay, "", &mut sources);

        assert_eq!(base["realms"].as_array().map(Vec::len), Some(2));
        assert!(sources.contains("realms"));
    }

    #[test]
    fn test_new_tables_record_all_leaves() {
        let mut base = parse("[security]\nstrategy = \"all\"\n");
        let overlay = parse("[logging]\nlevel = \"debug\"\nformat = \"json\"\n");
        let mut sources = HashSet::new();

        deep_merge(&mut base, &overlay, "", &mut sources);

        assert!(sources.contains("logging.level"));
        assert!(sources.contains("logging.format"));
    }
}
