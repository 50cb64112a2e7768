// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end test harness.
//!
//! `TestHarness` assembles the full server stack on a temp SQLite database
//! with a mock relay and a controllable presence probe, then serves the
//! real axum router in-process via `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use parley_core::error::ParleyError;
use parley_flow::FlowEngine;
use parley_gateway::{build_router, AuthConfig, GatewayState, RelayNotifier};
use parley_relay::channels::ChannelNames;
use parley_storage::database::Database;
use tower::util::ServiceExt;

use crate::mock_presence::FixedPresence;
use crate::mock_relay::MockRelay;

pub const TEST_OPERATOR_TOKEN: &str = "test-operator-token";
pub const TEST_CHANNEL_PREFIX: &str = "private-chat";

/// Builder for the harness, mirroring the config surface tests care about.
pub struct TestHarnessBuilder {
    operator_online: bool,
    flow_enabled: bool,
    operator_token: Option<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            operator_online: false,
            flow_enabled: true,
            operator_token: Some(TEST_OPERATOR_TOKEN.to_string()),
        }
    }

    pub fn with_operator_online(mut self, online: bool) -> Self {
        self.operator_online = online;
        self
    }

    pub fn with_flow_disabled(mut self) -> Self {
        self.flow_enabled = false;
        self
    }

    pub fn without_operator_token(mut self) -> Self {
        self.operator_token = None;
        self
    }

    pub async fn build(self) -> Result<TestHarness, ParleyError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| ParleyError::Storage {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::open(&db_path.to_string_lossy()).await?);

        let relay = Arc::new(MockRelay::new(TEST_CHANNEL_PREFIX));
        let channels = ChannelNames::new(TEST_CHANNEL_PREFIX);
        let presence = FixedPresence::new(self.operator_online);

        let engine = Arc::new(
            FlowEngine::new(Duration::from_secs(7 * 24 * 3600), Arc::new(presence.clone()))
                .with_notifier(Arc::new(RelayNotifier::new(
                    relay.clone(),
                    channels.clone(),
                ))),
        );

        let state = GatewayState {
            db: db.clone(),
            engine: engine.clone(),
            relay: relay.clone(),
            channels,
            auth: AuthConfig {
                operator_token: self.operator_token,
            },
            flow_enabled: self.flow_enabled,
            start_time: std::time::Instant::now(),
        };

        Ok(TestHarness {
            _temp_dir: temp_dir,
            db,
            engine,
            relay,
            presence,
            router: build_router(state),
        })
    }
}

/// Fully wired in-process server plus handles to its seams.
pub struct TestHarness {
    _temp_dir: tempfile::TempDir,
    pub db: Arc<Database>,
    pub engine: Arc<FlowEngine>,
    pub relay: Arc<MockRelay>,
    pub presence: FixedPresence,
    router: Router,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub async fn new() -> TestHarness {
        Self::builder().build().await.expect("harness build")
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, value)
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request build");
        self.dispatch(request).await
    }

    pub async fn post_json_auth(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(
                header::AUTHORIZATION,
                format!("Bearer {TEST_OPERATOR_TOKEN}"),
            )
            .body(Body::from(body.to_string()))
            .expect("request build");
        self.dispatch(request).await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::get(path).body(Body::empty()).expect("request build");
        self.dispatch(request).await
    }

    pub async fn get_auth(&self, path: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::get(path)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {TEST_OPERATOR_TOKEN}"),
            )
            .body(Body::empty())
            .expect("request build");
        self.dispatch(request).await
    }
}
