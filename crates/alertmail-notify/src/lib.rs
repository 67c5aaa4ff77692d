// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipient resolution and batched notification pipeline for alertmail.
//!
//! Data flows one way: the [`DigestBuilder`] groups a window's alerts per
//! recipient, the [`Dispatcher`] resolves each recipient, renders it through
//! the [`NotificationRenderer`], and sends it over a
//! [`NotificationTransport`](alertmail_core::NotificationTransport).

pub mod digest;
pub mod directory;
pub mod dispatch;
pub mod pipeline;
pub mod render;
pub mod resolver;
pub mod templates;
pub mod transport;

pub use digest::{DigestBuilder, group_into_digests};
pub use directory::{DirectoryEntry, RecipientDirectory};
pub use dispatch::Dispatcher;
pub use pipeline::DigestPipeline;
pub use render::NotificationRenderer;
pub use resolver::RecipientResolver;
pub use transport::HttpFormTransport;
