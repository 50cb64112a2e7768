// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley serve` command implementation.
//!
//! Wires storage, the flow engine, and the relay into the gateway, starts a
//! background sweeper for expired flow state, and serves until the process
//! is stopped.

use std::sync::Arc;
use std::time::Duration;

use parley_config::ParleyConfig;
use parley_core::error::ParleyError;
use parley_flow::{FlowEngine, StoragePresence};
use parley_gateway::{AuthConfig, GatewayState, RelayNotifier, ServerConfig};
use parley_relay::channels::ChannelNames;
use parley_storage::database::Database;
use tracing::{info, warn};

/// How often the in-process sweeper drops expired flow state.
const FLOW_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Runs the `parley serve` command.
pub async fn run_serve(config: ParleyConfig) -> Result<(), ParleyError> {
    init_tracing(&config.server.log_level);

    info!("starting parley serve");

    let db = Arc::new(
        Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?,
    );

    let relay = parley_relay::from_config(&config.relay);
    let channels = ChannelNames::new(config.relay.channel_prefix.clone());

    let presence = StoragePresence::new(
        db.clone(),
        Duration::from_secs(config.flow.operator_window_secs),
    );
    let engine = Arc::new(
        FlowEngine::new(
            Duration::from_secs(config.flow.state_ttl_days * 24 * 3600),
            Arc::new(presence),
        )
        .with_notifier(Arc::new(RelayNotifier::new(
            relay.clone(),
            channels.clone(),
        ))),
    );

    spawn_flow_sweeper(engine.clone());

    if config.server.operator_token.is_none() {
        warn!("no operator token configured; operator routes will reject every request");
    }

    let state = GatewayState {
        db,
        engine,
        relay,
        channels,
        auth: AuthConfig {
            operator_token: config.server.operator_token.clone(),
        },
        flow_enabled: config.flow.enabled,
        start_time: std::time::Instant::now(),
    };

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    parley_gateway::start_server(&server_config, state).await
}

/// Periodically drop flow records whose TTL lapsed. Session rows are not
/// touched here; `parley sweep` owns durable retention.
fn spawn_flow_sweeper(engine: Arc<FlowEngine>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(FLOW_SWEEP_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let removed = engine.sweep_expired();
            if removed > 0 {
                info!(removed, "swept expired flow state");
            }
        }
    });
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
