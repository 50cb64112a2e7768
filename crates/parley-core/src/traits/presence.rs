// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator presence probe consumed by the conversation flow engine.

use async_trait::async_trait;

/// Answers "is any human operator online right now?".
///
/// Implementations look at heartbeat timestamps or a presence table with a
/// fixed freshness window. The trait is infallible on purpose: any backend
/// failure must resolve to `false`. Overstating availability breaks the
/// visitor's expectation; understating it only delays the handoff.
#[async_trait]
pub trait PresenceProbe: Send + Sync + 'static {
    /// Returns true when at least one operator showed activity within the
    /// probe's freshness window.
    async fn operator_online(&self) -> bool;
}
