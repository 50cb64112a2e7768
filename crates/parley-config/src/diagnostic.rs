// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge.
//!
//! Converts Figment deserialization errors and post-deserialization
//! validation failures into miette diagnostics rendered at startup.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration error carrying enough context for a readable startup
/// failure message.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The TOML failed to parse or deserialize.
    #[error("could not load configuration: {message}")]
    #[diagnostic(
        code(parley::config::parse),
        help("check parley.toml against the documented keys; unknown keys are rejected")
    )]
    Parse {
        /// Figment's description of the failure.
        message: String,
    },

    /// A value parsed but violates a semantic constraint.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(parley::config::validation))]
    Validation {
        /// Description of the violated constraint.
        message: String,
    },
}

/// Convert a figment error chain into one [`ConfigError`] per failure.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| ConfigError::Parse {
            message: e.to_string(),
        })
        .collect()
}

/// Render all collected errors to stderr via miette's fancy reporter.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        let report = miette::Report::msg(format!("{error}"));
        eprintln!("{report:?}");
        if let Some(help) = error.help() {
            eprintln!("  help: {help}");
        }
    }
}
