//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge the user config (`{config_dir}/warden/config.toml`)
//! 3. Merge the explicitly requested file, if any
//! 4. Apply env var fallbacks for fields no file set
//! 5. Deserialize merged tree → `Config`
//! 6. Resolve relative realm paths
//! 7. Validate

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::deep_merge;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load the configuration with layered file precedence.
///
/// `explicit` is a file the host asked for by name; unlike the user
/// config it must exist.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is unreadable or malformed,
/// or if the final merged configuration fails validation.
pub fn load(explicit: Option<&Path>) -> ConfigResult<Config> {
    let user_path = user_config_path();
    load_with(explicit, user_path.as_deref(), &collect_env_vars())
}

/// [`load`] with the user config location and environment supplied by the
/// caller.
///
/// # Errors
///
/// See [`load`].
pub fn load_with(
    explicit: Option<&Path>,
    user_path: Option<&Path>,
    env: &HashMap<String, String>,
) -> ConfigResult<Config> {
    // 1. Embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut file_fields = HashSet::new();
    let mut base_dir: Option<PathBuf> = None;

    // 2. User config.
    if let Some(path) = user_path
        && let Some(overlay) = try_load_file(path)?
    {
        deep_merge(&mut merged, &overlay, "", &mut file_fields);
        base_dir = path.parent().map(Path::to_path_buf);
        info!(path = %path.display(), "loaded user config");
    }

    // 3. Explicit config.
    if let Some(path) = explicit {
        let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        deep_merge(&mut merged, &overlay, "", &mut file_fields);
        base_dir = path.parent().map(Path::to_path_buf);
        info!(path = %path.display(), "loaded config");
    }

    // 4. Env var fallbacks for unset fields.
    let env_count = apply_env_fallbacks(&mut merged, &file_fields, env);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    // 5. Deserialize.
    let mut config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    // 6. Relative realm paths.
    if let Some(dir) = base_dir {
        resolve_realm_paths(&mut config, &dir);
    }

    // 7. Validate.
    validate::validate(&config)?;
    Ok(config)
}

/// Load a config from a specific file path (no layering, no environment).
///
/// Relative realm paths resolve against the file's directory.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or validated.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })?;

    let mut config: Config =
        overlay
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: path.display().to_string(),
                source: e,
            })?;

    if let Some(dir) = path.parent() {
        resolve_realm_paths(&mut config, dir);
    }

    validate::validate(&config)?;
    Ok(config)
}

/// Parse and validate configuration text.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the text is malformed or fails validation.
pub fn from_toml_str(content: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: "<string>".to_owned(),
        source: e,
    })?;
    validate::validate(&config)?;
    Ok(config)
}

/// Location of the per-user config file, if the platform has one.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "warden").map(|d| d.config_dir().join("config.toml"))
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

fn resolve_realm_paths(config: &mut Config, dir: &Path) {
    for realm in &mut config.realms {
        if let Some(path) = realm.path.as_mut()
            && path.is_relative()
        {
            *path = dir.join(&*path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StrategyKind;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_deserialize_to_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config.security.strategy, StrategyKind::AtLeastOne);
        assert_eq!(config.cache.sweep_interval_secs, 60);
        assert_eq!(config.sessions.default_ttl_secs, 1_800);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_without_files() {
        let config = load_with(None, None, &HashMap::new()).unwrap();
        assert!(config.realms.is_empty());
        assert!(config.sessions.enabled);
    }

    #[test]
    fn test_explicit_file_overrides_user_file() {
        let dir = tempfile::tempdir().unwrap();
        let user = write(
            dir.path(),
            "user.toml",
            "[security]\nstrategy = \"all\"\n[cache]\nsweep_interval_secs = 5\n",
        );
        let explicit = write(dir.path(), "app.toml", "[security]\nstrategy = \"at_least_one\"\n");

        let config = load_with(Some(&explicit), Some(&user), &HashMap::new()).unwrap();
        assert_eq!(config.security.strategy, StrategyKind::AtLeastOne);
        assert_eq!(config.cache.sweep_interval_secs, 5);
    }

    #[test]
    fn test_env_applies_only_to_unset_fields() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = write(dir.path(), "app.toml", "[logging]\nlevel = \"warn\"\n");
        let env: HashMap<String, String> = [
            ("WARDEN_LOG_LEVEL".to_owned(), "trace".to_owned()),
            ("WARDEN_STRATEGY".to_owned(), "all".to_owned()),
        ]
        .into();

        let config = load_with(Some(&explicit), None, &env).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.security.strategy, StrategyKind::All);
    }

    #[test]
    fn test_missing_user_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_with(None, Some(&missing), &HashMap::new()).is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_with(Some(&missing), None, &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_relative_realm_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = write(
            dir.path(),
            "app.toml",
            "[[realms]]\nname = \"users\"\npath = \"users.ini\"\n",
        );

        let config = load_file(&explicit).unwrap();
        assert_eq!(
            config.realms[0].path.as_deref(),
            Some(dir.path().join("users.ini").as_path())
        );
    }

    #[test]
    fn test_oversized_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let padding = "#".repeat(1_048_577);
        let path = write(dir.path(), "big.toml", &padding);
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_invalid_merged_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = write(dir.path(), "app.toml", "[sessions]\nreap_interval_secs = 0\n");
        let err = load_with(Some(&explicit), None, &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_from_toml_str() {
        let config = from_toml_str("[security]\nstrategy = \"all\"\n").unwrap();
        assert_eq!(config.security.strategy, StrategyKind::All);
        assert!(from_toml_str("[security\n").is_err());
    }
}
