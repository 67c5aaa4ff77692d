// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment extraction errors into miette diagnostics.
//!
//! Unknown keys are checked against the key list of their own section
//! (`[server]`, `[storage]`, `[email]`, `[directory]`, `[cron]`, `[log]`),
//! so a typo in `[cron]` is never "corrected" to a key from `[email]`.
//! When the bad value came from an `ALERTMAIL_*` variable the diagnostic
//! names the variable; when it came from a TOML file it points at the line.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::model::{SECTION_KEYS, section_keys};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "ALERTMAIL_";

/// Jaro-Winkler score a candidate must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, ready for miette to render.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A top-level table that alertmail does not have, e.g. `[smtp]`.
    #[error("unknown configuration section `[{section}]`")]
    #[diagnostic(
        code(alertmail::config::unknown_section),
        help("{}", unknown_section_help(suggestion.as_deref()))
    )]
    UnknownSection {
        section: String,
        suggestion: Option<String>,
        #[label("not an alertmail section")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A key that its section does not accept.
    #[error("unknown key `{key}` in [{section}]")]
    #[diagnostic(
        code(alertmail::config::unknown_key),
        help("{}", unknown_key_help(section, suggestion.as_deref(), valid_keys, env_var.as_deref()))
    )]
    UnknownKey {
        section: String,
        key: String,
        /// Closest key of the same section, if any is close enough.
        suggestion: Option<String>,
        /// Comma-separated keys the section accepts.
        valid_keys: String,
        /// `ALERTMAIL_*` variable that introduced the key.
        env_var: Option<String>,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that does not deserialize into the key's type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(
        code(alertmail::config::invalid_type),
        help("{}", invalid_type_help(expected, env_var.as_deref()))
    )]
    InvalidType {
        /// Dotted key, e.g. `server.port`.
        key: String,
        detail: String,
        expected: String,
        env_var: Option<String>,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A required key with no default.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(alertmail::config::missing_key),
        help("{}", missing_key_help(section.as_deref(), key))
    )]
    MissingKey {
        section: Option<String>,
        key: String,
    },

    /// A value that parsed but failed a semantic check.
    #[error("validation error: {message}")]
    #[diagnostic(code(alertmail::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(alertmail::config::other))]
    Other(String),
}

fn unknown_section_help(suggestion: Option<&str>) -> String {
    let sections = SECTION_KEYS
        .iter()
        .map(|(name, _)| format!("[{name}]"))
        .collect::<Vec<_>>()
        .join(", ");
    match suggestion {
        Some(s) => format!("did you mean `[{s}]`? alertmail reads {sections}"),
        None => format!("alertmail reads {sections}"),
    }
}

fn unknown_key_help(
    section: &str,
    suggestion: Option<&str>,
    valid_keys: &str,
    env_var: Option<&str>,
) -> String {
    let mut help = match suggestion {
        Some(s) => format!("did you mean `{s}`? [{section}] accepts: {valid_keys}"),
        None => format!("[{section}] accepts: {valid_keys}"),
    };
    if let Some(var) = env_var {
        help.push_str(&format!("; the key comes from environment variable `{var}`"));
    }
    help
}

fn invalid_type_help(expected: &str, env_var: Option<&str>) -> String {
    match env_var {
        Some(var) => format!("expected {expected}; check environment variable `{var}`"),
        None => format!("expected {expected}"),
    }
}

fn missing_key_help(section: Option<&str>, key: &str) -> String {
    match section {
        Some(section) => format!(
            "add `{key} = <value>` under [{section}] in alertmail.toml, or set {}",
            env_var_name(&[section], key)
        ),
        None => format!("add `{key} = <value>` at the top of alertmail.toml"),
    }
}

/// The `ALERTMAIL_*` variable that maps to `section.key`.
pub fn env_var_name<S: AsRef<str>>(section: &[S], key: &str) -> String {
    let mut name = ENV_PREFIX.to_string();
    for part in section {
        name.push_str(&part.as_ref().to_ascii_uppercase());
        name.push('_');
    }
    name.push_str(&key.to_ascii_uppercase());
    name
}

/// Convert every error in a figment error chain into a `ConfigError`.
///
/// `toml_sources` holds `(path, content)` pairs of the TOML layers that
/// were merged, so errors from a file can carry a labelled span.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| convert(&error, toml_sources))
        .collect()
}

fn convert(error: &figment::Error, toml_sources: &[(String, String)]) -> ConfigError {
    let from_env = is_env_layer(error);
    let source = if from_env {
        None
    } else {
        source_for(error, toml_sources)
    };

    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let parents = parent_path(&error.path, field);
            if parents.is_empty() {
                let names: Vec<&str> = SECTION_KEYS.iter().map(|(name, _)| *name).collect();
                let (span, src) =
                    labelled(source, |content| find_section_offset(content, field), field);
                return ConfigError::UnknownSection {
                    section: field.clone(),
                    suggestion: suggest_key(field, &names),
                    span,
                    src,
                };
            }

            let section = parents.join(".");
            let valid: Vec<&str> = match section_keys(&section) {
                Some(keys) => keys.to_vec(),
                None => expected.to_vec(),
            };
            let (span, src) = labelled(
                source,
                |content| find_key_offset(content, Some(section.as_str()), field),
                field,
            );
            ConfigError::UnknownKey {
                suggestion: suggest_key(field, &valid),
                valid_keys: valid.join(", "),
                env_var: from_env.then(|| env_var_name(parents, field)),
                section,
                key: field.clone(),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            section: (!error.path.is_empty()).then(|| error.path.join(".")),
            key: field.to_string(),
        },
        Kind::InvalidType(actual, expected) => {
            let (parents, leaf) = match error.path.split_last() {
                Some((leaf, parents)) => (parents, leaf.as_str()),
                None => (&[] as &[String], ""),
            };
            let section = (!parents.is_empty()).then(|| parents.join("."));
            let (span, src) = labelled(
                source,
                |content| find_key_offset(content, section.as_deref(), leaf),
                leaf,
            );
            ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.clone(),
                env_var: from_env.then(|| env_var_name(parents, leaf)),
                span,
                src,
            }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Figment reports unknown fields with the field itself as the last path
/// element; strip it to get the enclosing table.
fn parent_path<'a>(path: &'a [String], field: &str) -> &'a [String] {
    match path.split_last() {
        Some((last, parents)) if last == field => parents,
        _ => path,
    }
}

/// Whether figment attributes the failing value to the env provider.
fn is_env_layer(error: &figment::Error) -> bool {
    error
        .metadata
        .as_ref()
        .is_some_and(|md| md.source.is_none() && md.name.contains("environment variable"))
}

/// Pick the TOML text the error refers to.
///
/// File layers are matched by path. With a single source it is used as-is,
/// since figment tags string providers with a code location and may
/// report file paths in a different form than the caller passed.
fn source_for<'a>(
    error: &figment::Error,
    toml_sources: &'a [(String, String)],
) -> Option<(&'a str, &'a str)> {
    let file = error
        .metadata
        .as_ref()
        .and_then(|md| md.source.as_ref())
        .and_then(|source| source.file_path())
        .map(|path| path.display().to_string());

    let found = file
        .and_then(|path| toml_sources.iter().find(|(p, _)| *p == path))
        .or_else(|| toml_sources.first().filter(|_| toml_sources.len() == 1));
    found.map(|(path, content)| (path.as_str(), content.as_str()))
}

fn labelled(
    source: Option<(&str, &str)>,
    locate: impl FnOnce(&str) -> Option<usize>,
    text: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some((path, content)) = source else {
        return (None, None);
    };
    match locate(content) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), text.len())),
            Some(NamedSource::new(path, content.to_string())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `key` inside `[section]`, or among the top-level keys
/// when `section` is `None`.
///
/// Dotted sections match their full header, e.g. `Some("cron")` matches
/// `[cron]` but not `[cronjob]`.
pub fn find_key_offset(content: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let mut current: Option<&str> = None;
    for (offset, line) in lines_with_offsets(content) {
        let trimmed = line.trim_start();
        if let Some(header) = table_header(trimmed) {
            current = Some(header);
            continue;
        }
        if current != section {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix(key) {
            if rest.trim_start().starts_with('=') {
                return Some(offset + (line.len() - trimmed.len()));
            }
        }
    }
    None
}

/// Byte offset of the name inside a `[section]` header, falling back to a
/// top-level `section = ...` assignment.
fn find_section_offset(content: &str, section: &str) -> Option<usize> {
    for (offset, line) in lines_with_offsets(content) {
        let trimmed = line.trim_start();
        if table_header(trimmed) == Some(section) {
            let name_at = trimmed.find(section)?;
            return Some(offset + (line.len() - trimmed.len()) + name_at);
        }
    }
    find_key_offset(content, None, section)
}

fn table_header(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('[')?;
    if inner.starts_with('[') {
        return None;
    }
    let end = inner.find(']')?;
    Some(inner[..end].trim())
}

fn lines_with_offsets(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content.split_inclusive('\n').scan(0usize, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line.trim_end_matches(['\n', '\r'])))
    })
}

/// Closest entry of `candidates` to `unknown` by Jaro-Winkler similarity,
/// if any clears the suggestion threshold.
pub fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|candidate| (strsim::jaro_winkler(unknown, candidate), *candidate))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}

/// Render each error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}
