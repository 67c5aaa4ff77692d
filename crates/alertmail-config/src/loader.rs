// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./alertmail.toml` > `~/.config/alertmail/alertmail.toml`
//! > `/etc/alertmail/alertmail.toml` with environment variable overrides via the
//! `ALERTMAIL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::diagnostic::ENV_PREFIX;
use crate::model::{AlertmailConfig, SECTION_KEYS};

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/alertmail/alertmail.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "alertmail.toml";

/// `~/.config/alertmail/alertmail.toml`, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("alertmail/alertmail.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/alertmail/alertmail.toml`
/// 3. `~/.config/alertmail/alertmail.toml`
/// 4. `./alertmail.toml`
/// 5. `ALERTMAIL_*` environment variables
pub fn load_config() -> Result<AlertmailConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<AlertmailConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AlertmailConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AlertmailConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AlertmailConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the XDG hierarchy, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AlertmailConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Maps `ALERTMAIL_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after the section name becomes a dot, so
/// `ALERTMAIL_EMAIL_APP_SECRET` maps to `email.app_secret`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for (section, _) in SECTION_KEYS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
