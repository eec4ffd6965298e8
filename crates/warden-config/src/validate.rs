//! Post-merge configuration validation.

use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Config, MatcherKind};

/// Digest algorithms accepted by the `hashed` matcher.
pub const KNOWN_ALGORITHMS: &[&str] = &["sha1", "sha256", "sha384", "sha512"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_cache(config)?;
    validate_sessions(config)?;
    validate_realms(config)?;
    validate_logging(config)?;
    Ok(())
}

fn positive(field: &str, value: u64) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::ValidationError {
            field: field.to_owned(),
            message: "must be greater than zero".to_owned(),
        });
    }
    Ok(())
}

fn validate_cache(config: &Config) -> ConfigResult<()> {
    let c = &config.cache;
    positive("cache.default_max_age_secs", c.default_max_age_secs)?;
    positive("cache.sweep_interval_secs", c.sweep_interval_secs)?;
    positive("cache.authentication_ttl_secs", c.authentication_ttl_secs)?;
    positive("cache.authorization_ttl_secs", c.authorization_ttl_secs)?;
    Ok(())
}

fn validate_sessions(config: &Config) -> ConfigResult<()> {
    let s = &config.sessions;
    positive("sessions.default_ttl_secs", s.default_ttl_secs)?;
    positive("sessions.reap_interval_secs", s.reap_interval_secs)?;
    Ok(())
}

fn validate_realms(config: &Config) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for (i, realm) in config.realms.iter().enumerate() {
        let field = |name: &str| format!("realms[{i}].{name}");

        if realm.name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: field("name"),
                message: "realm name must not be empty".to_owned(),
            });
        }
        if !seen.insert(realm.name.as_str()) {
            return Err(ConfigError::ValidationError {
                field: field("name"),
                message: format!("duplicate realm name '{}'", realm.name),
            });
        }

        match (&realm.path, &realm.content) {
            (Some(_), None) | (None, Some(_)) => {},
            (Some(_), Some(_)) => {
                return Err(ConfigError::ValidationError {
                    field: field("content"),
                    message: "set either path or content, not both".to_owned(),
                });
            },
            (None, None) => {
                return Err(ConfigError::ValidationError {
                    field: field("path"),
                    message: "one of path or content is required".to_owned(),
                });
            },
        }

        let creds = &realm.credentials;
        if creds.matcher == MatcherKind::Hashed {
            let algorithm = creds.algorithm.to_ascii_lowercase();
            if !KNOWN_ALGORITHMS.contains(&algorithm.as_str()) {
                return Err(ConfigError::ValidationError {
                    field: field("credentials.algorithm"),
                    message: format!(
                        "unsupported algorithm '{}'; expected one of: {}",
                        creds.algorithm,
                        KNOWN_ALGORITHMS.join(", ")
                    ),
                });
            }
            if creds.iterations == 0 {
                return Err(ConfigError::ValidationError {
                    field: field("credentials.iterations"),
                    message: "iterations must be at least 1".to_owned(),
                });
            }
        }
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    Ok(())
}
