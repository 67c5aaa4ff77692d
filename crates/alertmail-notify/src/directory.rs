// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only recipient directory loaded once at startup.

use std::collections::HashMap;
use std::path::Path;

use alertmail_core::AlertmailError;
use serde::Deserialize;
use tracing::{info, warn};

/// One entry of the directory file.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryEntry {
    /// Display name. Not used for lookup.
    #[serde(default)]
    pub name: String,
    /// Short identifier matched against recipient tokens.
    pub e_name: String,
    #[serde(default)]
    pub email: String,
}

/// Short identifier to deliverable address, exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct RecipientDirectory {
    entries: HashMap<String, String>,
}

impl RecipientDirectory {
    /// Builds the lookup table. The first entry with a given `e_name` and a
    /// non-empty email wins; entries with an empty email are skipped.
    pub fn from_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            let email = entry.email.trim();
            if email.is_empty() {
                continue;
            }
            map.entry(entry.e_name).or_insert_with(|| email.to_string());
        }
        Self { entries: map }
    }

    /// Parses a JSON array of `{name, e_name, email}` objects.
    pub fn from_json(json: &str) -> Result<Self, AlertmailError> {
        let entries: Vec<DirectoryEntry> = serde_json::from_str(json)
            .map_err(|e| AlertmailError::Config(format!("invalid directory file: {e}")))?;
        Ok(Self::from_entries(entries))
    }

    pub fn load(path: &Path) -> Result<Self, AlertmailError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AlertmailError::Config(format!("cannot read directory {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Like [`load`](Self::load), but a missing or malformed file yields an
    /// empty directory so every token falls back to the operator address.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(directory) => {
                info!(path = %path.display(), entries = directory.len(), "recipient directory loaded");
                directory
            }
            Err(e) => {
                warn!(error = %e, "recipient directory unavailable, all tokens will use the fallback address");
                Self::default()
            }
        }
    }

    pub fn lookup(&self, e_name: &str) -> Option<&str> {
        self.entries.get(e_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"name": "Alice", "e_name": "alice", "email": "alice@co.com"},
        {"name": "Bob", "e_name": "bob", "email": ""},
        {"name": "Bob Two", "e_name": "bob", "email": "bob@co.com"},
        {"name": "Alice Dup", "e_name": "alice", "email": "other@co.com"}
    ]"#;

    #[test]
    fn first_non_empty_email_wins() {
        let dir = RecipientDirectory::from_json(SAMPLE).unwrap();
        assert_eq!(dir.lookup("alice"), Some("alice@co.com"));
        assert_eq!(dir.lookup("bob"), Some("bob@co.com"));
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let dir = RecipientDirectory::from_json(SAMPLE).unwrap();
        assert_eq!(dir.lookup("Alice"), None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(RecipientDirectory::from_json("{not json").is_err());
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let directory = RecipientDirectory::load_or_empty(&dir.path().join("absent.json"));
        assert!(directory.is_empty());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("userlist.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let directory = RecipientDirectory::load(&path).unwrap();
        assert_eq!(directory.lookup("alice"), Some("alice@co.com"));
    }
}
