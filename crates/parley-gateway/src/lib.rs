// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the support chat system.
//!
//! Serves two surfaces from one listener: the public widget API (send,
//! history, flow, typing, channel authorization) and the bearer-protected
//! operator console API (session list, replies, read receipts, presence
//! heartbeats). Persistence goes through `parley-storage`, conversation
//! flow through `parley-flow`, and realtime fan-out through `parley-relay`
//! on a fire-and-forget basis.

pub mod auth;
pub mod envelope;
pub mod handlers;
pub mod publish;
pub mod server;

pub use auth::AuthConfig;
pub use publish::RelayNotifier;
pub use server::{build_router, start_server, GatewayState, ServerConfig};
