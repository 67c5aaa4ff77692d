// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for alertmail.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Keys accepted in each section, in file order.
///
/// Env keys are matched against these section names, and unknown-key
/// diagnostics suggest from the matching list.
pub const SECTION_KEYS: &[(&str, &[&str])] = &[
    ("server", &["host", "port"]),
    ("storage", &["database_path", "wal_mode"]),
    (
        "email",
        &[
            "api_url",
            "app_id",
            "app_secret",
            "from",
            "debug_mode",
            "debug_api_url",
            "timeout_secs",
            "fallback_address",
        ],
    ),
    ("directory", &["path"]),
    (
        "cron",
        &[
            "enabled",
            "schedule",
            "start_hour",
            "start_minute",
            "end_hour",
            "end_minute",
        ],
    ),
    ("log", &["level", "format"]),
];

/// Keys accepted in `section`, or `None` for an unknown section.
pub fn section_keys(section: &str) -> Option<&'static [&'static str]> {
    SECTION_KEYS
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, keys)| *keys)
}

/// Top-level alertmail configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AlertmailConfig {
    /// HTTP listener settings for the ingestion and query API.
    #[serde(default)]
    pub server: ServerConfig,

    /// Alert store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound notification endpoint settings.
    #[serde(default)]
    pub email: EmailConfig,

    /// Recipient directory source.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Scheduled digest job settings.
    #[serde(default)]
    pub cron: CronConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Alert store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("alertmail").join("alertmail.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("alertmail.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Outbound notification endpoint configuration.
///
/// The endpoint accepts form-encoded requests and answers with a JSON
/// `{code, message}` status.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    /// Notification endpoint URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Application id sent with every request.
    #[serde(default)]
    pub app_id: String,

    /// Application secret sent with every request. Never logged.
    #[serde(default)]
    pub app_secret: Option<String>,

    /// Sender address shown by the config endpoint.
    #[serde(default = "default_from")]
    pub from: String,

    /// Route all sends to `debug_api_url` instead of `api_url`.
    #[serde(default)]
    pub debug_mode: bool,

    /// Alternate endpoint used when `debug_mode` is on.
    #[serde(default)]
    pub debug_api_url: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Operator mailbox that receives notifications for unresolvable recipients.
    #[serde(default = "default_fallback_address")]
    pub fallback_address: String,
}

impl EmailConfig {
    /// The endpoint sends actually go to, honoring debug mode.
    pub fn effective_api_url(&self) -> &str {
        match (self.debug_mode, self.debug_api_url.as_deref()) {
            (true, Some(url)) if !url.trim().is_empty() => url,
            _ => &self.api_url,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            app_id: String::new(),
            app_secret: None,
            from: default_from(),
            debug_mode: false,
            debug_api_url: None,
            timeout_secs: default_timeout_secs(),
            fallback_address: default_fallback_address(),
        }
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_url", &self.api_url)
            .field("app_id", &self.app_id)
            .field("app_secret", &self.app_secret.as_ref().map(|_| "[redacted]"))
            .field("from", &self.from)
            .field("debug_mode", &self.debug_mode)
            .field("debug_api_url", &self.debug_api_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("fallback_address", &self.fallback_address)
            .finish()
    }
}

fn default_api_url() -> String {
    "http://localhost:6709/mail/email/send_email.php".to_string()
}

fn default_from() -> String {
    "alertmail@localhost".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_fallback_address() -> String {
    "operator@localhost".to_string()
}

/// Recipient directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryConfig {
    /// JSON file of `{name, e_name, email}` entries.
    #[serde(default = "default_directory_path")]
    pub path: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            path: default_directory_path(),
        }
    }
}

fn default_directory_path() -> String {
    "userlist.json".to_string()
}

/// Scheduled digest job configuration.
///
/// On each fire, the job covers `[start_hour:start_minute, end_hour:end_minute]`
/// of the fire date.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CronConfig {
    /// Run the scheduled job. Ingestion and queries are unaffected.
    #[serde(default = "default_cron_enabled")]
    pub enabled: bool,

    /// Cron expression, local time.
    #[serde(default = "default_schedule")]
    pub schedule: String,

    #[serde(default = "default_start_hour")]
    pub start_hour: u32,

    #[serde(default)]
    pub start_minute: u32,

    #[serde(default = "default_end_hour")]
    pub end_hour: u32,

    #[serde(default)]
    pub end_minute: u32,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            enabled: default_cron_enabled(),
            schedule: default_schedule(),
            start_hour: default_start_hour(),
            start_minute: 0,
            end_hour: default_end_hour(),
            end_minute: 0,
        }
    }
}

fn default_cron_enabled() -> bool {
    true
}

fn default_schedule() -> String {
    "0 22 * * *".to_string()
}

fn default_start_hour() -> u32 {
    19
}

fn default_end_hour() -> u32 {
    22
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `text` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}
