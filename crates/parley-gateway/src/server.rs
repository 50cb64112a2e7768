// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Two route groups: the public widget surface the embedded client talks
//! to, and the operator surface behind bearer auth.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use parley_core::error::ParleyError;
use parley_core::traits::relay::RelayAdapter;
use parley_flow::FlowEngine;
use parley_relay::channels::ChannelNames;
use parley_storage::database::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub db: Arc<Database>,
    pub engine: Arc<FlowEngine>,
    pub relay: Arc<dyn RelayAdapter>,
    pub channels: ChannelNames,
    pub auth: AuthConfig,
    /// When false, messages skip flow processing entirely (plain chat).
    pub flow_enabled: bool,
    pub start_time: std::time::Instant,
}

/// Network configuration for the listener.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the full application router.
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    // Widget surface: unauthenticated, session-scoped.
    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .route("/v1/messages", post(handlers::post_message))
        .route(
            "/v1/sessions/{id}/messages",
            get(handlers::get_session_messages),
        )
        .route("/v1/sessions/{id}/user-info", post(handlers::post_user_info))
        .route("/v1/sessions/{id}/flow", post(handlers::post_flow))
        .route("/v1/sessions/{id}/typing", post(handlers::post_typing))
        .route(
            "/v1/channels/authorize",
            post(handlers::post_channel_authorize),
        )
        .with_state(state.clone());

    // Operator surface: bearer token required, fail-closed.
    let operator_routes = Router::new()
        .route("/v1/sessions", get(handlers::get_sessions))
        .route(
            "/v1/operator/sessions/{id}/messages",
            get(handlers::get_operator_messages),
        )
        .route("/v1/operator/messages", post(handlers::post_operator_message))
        .route("/v1/sessions/{id}/read", post(handlers::post_mark_read))
        .route("/v1/operator/heartbeat", post(handlers::post_heartbeat))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(operator_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until the process exits.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), ParleyError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ParleyError::Transport {
                message: format!("failed to bind gateway to {addr}: {e}"),
                source: Some(Box::new(e)),
            })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| ParleyError::Transport {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
