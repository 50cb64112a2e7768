// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side view of the guided conversation flow.
//!
//! The server owns the flow state machine; the client only remembers the
//! last step it was told about and surfaces input hints for the composer.

use serde::{Deserialize, Serialize};

/// Flow outcome attached to a send acknowledgement or returned by the
/// dedicated flow endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSummary {
    pub step: String,
    pub prompt: Option<String>,
    pub placeholder: Option<String>,
    /// Server id of the persisted prompt message, when the prompt was
    /// stored; lets the reconciler suppress its push echo.
    pub prompt_message_id: Option<i64>,
    /// Validation feedback for the rejected input, if any.
    pub error: Option<String>,
}

/// Hints the composer renders between sends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiHints {
    pub placeholder: Option<String>,
}

/// Tracks flow progression as reported by the server.
pub trait FlowProvider: Send + Sync {
    /// Step to attach to the next outgoing message, if flow is active.
    fn current_step(&self) -> Option<String>;

    fn hints(&self) -> UiHints;

    /// Absorb the server's view after a send or an explicit flow call.
    fn absorb(&mut self, summary: &FlowSummary);
}

/// Standard provider: mirrors whatever step the server last reported.
#[derive(Debug, Default)]
pub struct StagedFlow {
    step: Option<String>,
    placeholder: Option<String>,
}

impl StagedFlow {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlowProvider for StagedFlow {
    fn current_step(&self) -> Option<String> {
        self.step.clone()
    }

    fn hints(&self) -> UiHints {
        UiHints {
            placeholder: self.placeholder.clone(),
        }
    }

    fn absorb(&mut self, summary: &FlowSummary) {
        self.step = Some(summary.step.clone());
        self.placeholder = summary.placeholder.clone();
    }
}

/// Provider used when the deployment runs without guided flow; plain chat.
#[derive(Debug, Default)]
pub struct NullFlow;

impl FlowProvider for NullFlow {
    fn current_step(&self) -> Option<String> {
        None
    }

    fn hints(&self) -> UiHints {
        UiHints::default()
    }

    fn absorb(&mut self, _summary: &FlowSummary) {}
}
