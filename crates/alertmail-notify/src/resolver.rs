// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps recipient tokens to deliverable addresses.

use std::sync::Arc;

use alertmail_core::ResolvedRecipient;
use tracing::debug;

use crate::directory::RecipientDirectory;

/// Resolves tokens against the directory, substituting the operator
/// address when a token cannot be mapped. Never fails.
#[derive(Debug, Clone)]
pub struct RecipientResolver {
    directory: Arc<RecipientDirectory>,
    fallback_address: String,
}

impl RecipientResolver {
    pub fn new(directory: Arc<RecipientDirectory>, fallback_address: impl Into<String>) -> Self {
        Self {
            directory,
            fallback_address: fallback_address.into(),
        }
    }

    /// The operator mailbox used for unresolvable tokens.
    pub fn fallback_address(&self) -> &str {
        &self.fallback_address
    }

    pub fn resolve(&self, token: &str) -> ResolvedRecipient {
        if token.contains('@') {
            return ResolvedRecipient::resolved(token);
        }
        match self.directory.lookup(token) {
            Some(address) => {
                debug!(token, address, "recipient resolved from directory");
                ResolvedRecipient::resolved(address)
            }
            None => {
                debug!(token, fallback = %self.fallback_address, "recipient not found in directory");
                ResolvedRecipient::fallback(self.fallback_address.clone())
            }
        }
    }
}
