// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as window ordering, hour ranges, and parseable cron expressions.

use std::str::FromStr;

use croner::Cron;

use crate::diagnostic::ConfigError;
use crate::model::AlertmailConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &AlertmailConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    require_non_empty(&mut errors, "server.host", &config.server.host);
    require_non_empty(
        &mut errors,
        "storage.database_path",
        &config.storage.database_path,
    );
    require_non_empty(&mut errors, "email.api_url", &config.email.api_url);
    require_non_empty(
        &mut errors,
        "email.fallback_address",
        &config.email.fallback_address,
    );

    let fallback = config.email.fallback_address.trim();
    if !fallback.is_empty() && !fallback.contains('@') {
        errors.push(ConfigError::Validation {
            message: format!("email.fallback_address `{fallback}` is not an email address"),
        });
    }

    if config.email.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "email.timeout_secs must be greater than 0".to_string(),
        });
    }

    validate_cron(&mut errors, config);

    let format = config.log.format.as_str();
    if format != "text" && format != "json" {
        errors.push(ConfigError::Validation {
            message: format!("log.format must be `text` or `json`, got `{format}`"),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn require_non_empty(errors: &mut Vec<ConfigError>, key: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: format!("{key} must not be empty"),
        });
    }
}

fn validate_cron(errors: &mut Vec<ConfigError>, config: &AlertmailConfig) {
    let cron = &config.cron;

    for (key, value) in [("cron.start_hour", cron.start_hour), ("cron.end_hour", cron.end_hour)] {
        if value > 23 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be between 0 and 23, got {value}"),
            });
        }
    }
    for (key, value) in [
        ("cron.start_minute", cron.start_minute),
        ("cron.end_minute", cron.end_minute),
    ] {
        if value > 59 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be between 0 and 59, got {value}"),
            });
        }
    }

    if (cron.start_hour, cron.start_minute) > (cron.end_hour, cron.end_minute) {
        errors.push(ConfigError::Validation {
            message: format!(
                "cron window start {:02}:{:02} is after end {:02}:{:02}",
                cron.start_hour, cron.start_minute, cron.end_hour, cron.end_minute
            ),
        });
    }

    // A disabled job never parses its schedule, but a typo is still worth reporting.
    if let Err(e) = Cron::from_str(&cron.schedule) {
        errors.push(ConfigError::Validation {
            message: format!("cron.schedule `{}` is invalid: {e}", cron.schedule),
        });
    }
}
