// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime channel gateway for Parley.
//!
//! The server is a thin publisher against a hosted channel-based pub/sub
//! broker: it fans persisted messages and typing events out to per-session
//! private channels, and signs the grants subscribers need to join them.
//! When the relay is unconfigured the [`NullRelay`] takes its place and the
//! rest of the system degrades to polling.

pub mod channels;
pub mod hosted;
pub mod null;

use std::sync::Arc;

use parley_config::model::RelayConfig;
use parley_core::RelayAdapter;

pub use channels::ChannelNames;
pub use hosted::{HostedRelay, HostedRelayConfig};
pub use null::NullRelay;

/// Select the relay implementation once, at construction.
///
/// Fully configured credentials produce a [`HostedRelay`]; anything less
/// produces a [`NullRelay`]. Partial credentials are caught earlier by
/// config validation.
pub fn from_config(config: &RelayConfig) -> Arc<dyn RelayAdapter> {
    if config.is_configured() {
        Arc::new(HostedRelay::new(HostedRelayConfig {
            base_url: config.base_url.clone().expect("checked by is_configured"),
            app_key: config.app_key.clone().expect("checked by is_configured"),
            secret: config.secret.clone().expect("checked by is_configured"),
            channel_prefix: config.channel_prefix.clone(),
        }))
    } else {
        tracing::warn!("relay credentials missing; realtime fan-out disabled");
        Arc::new(NullRelay)
    }
}
