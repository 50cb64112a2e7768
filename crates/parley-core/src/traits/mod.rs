// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for pluggable Parley backends.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod presence;
pub mod relay;

pub use adapter::PluginAdapter;
pub use presence::PresenceProbe;
pub use relay::RelayAdapter;
