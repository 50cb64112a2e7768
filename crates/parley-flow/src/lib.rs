// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session conversation flow engine for Parley.
//!
//! Walks a visitor through a fixed data-collection sequence (first message,
//! phone, name) before free-form chat, with a router step whose destination
//! depends on whether a human operator is currently online. State is
//! ephemeral and cache-backed with TTL expiry; transitions are forward-only
//! and advance solely on validated input.

pub mod engine;
pub mod presence;
pub mod state;
pub mod step;
pub mod validate;

pub use engine::{FlowEngine, FlowResult, OperatorNotifier};
pub use presence::StoragePresence;
pub use state::{FlowState, FlowStore};
pub use step::{step_spec, FlowStep, InputKind, StepSpec};
