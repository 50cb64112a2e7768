// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embeddable chat client engine.
//!
//! Holds the visitor-side conversation state: an optimistic transcript, the
//! duplicate-suppression index that keeps pushed, fetched, and locally-sent
//! messages from rendering twice, scroll anchoring, and the client's view of
//! the guided flow. Rendering and the concrete HTTP/push plumbing live in
//! the embedding host behind the [`transport::ChatTransport`] seam.

pub mod client;
pub mod dedup;
pub mod flow_provider;
pub mod reconcile;
pub mod scroll;
pub mod transcript;
pub mod transport;

pub use client::{ChatClient, ClientConfig, PushEffect, SendReport};
pub use dedup::DedupIndex;
pub use flow_provider::{FlowProvider, FlowSummary, NullFlow, StagedFlow, UiHints};
pub use reconcile::{IncomingMessage, Reconciler, ResolveOutcome};
pub use scroll::ScrollState;
pub use transcript::{EntryStatus, Lane, Transcript, TranscriptEntry};
pub use transport::{ChatTransport, SendAck, SendRequest};
