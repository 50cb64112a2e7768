// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley support-chat stack.

use thiserror::Error;

/// The primary error type used across all Parley crates.
///
/// Duplicate suppression is deliberately absent: discarding a redelivered
/// message is a normal outcome of reconciliation, not a failure, and is
/// reported through [`crate::types`]-level outcome enums instead.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Visitor input failed validation (bad phone, bad name, empty text).
    /// Shown inline; never advances flow state.
    #[error("validation error: {0}")]
    Validation(String),

    /// Network or request failure between client and server.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid TOML, missing required fields,
    /// relay credentials absent). The realtime layer degrades to offline
    /// rather than failing the whole service.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Push relay errors (publish rejected, relay unreachable).
    #[error("relay error: {message}")]
    Relay {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The flow engine loaded an unknown or inconsistent step. Callers
    /// reset to the initial step; this variant never crosses an API boundary.
    #[error("flow state corruption: {0}")]
    StateCorruption(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Short visitor-facing text for this error.
    ///
    /// Internal detail never leaks to the widget; everything that is not a
    /// validation or timeout maps to a generic line.
    pub fn user_message(&self) -> String {
        match self {
            ParleyError::Validation(msg) => msg.clone(),
            ParleyError::Timeout { .. } => "The request took too long. Please try again.".into(),
            ParleyError::Transport { .. } => "Could not reach the server. Please try again.".into(),
            _ => "Something went wrong. Please try again.".into(),
        }
    }
}
