// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley support-chat stack.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Parley workspace: session and message
//! identities, the push-event vocabulary, and the adapter traits the relay
//! and presence backends implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ParleyError;
pub use traits::adapter::HealthStatus;
pub use traits::{PluginAdapter, PresenceProbe, RelayAdapter};
pub use types::{AuthorKind, ChannelGrant, ChatMessage, SessionId, SessionStatus};
