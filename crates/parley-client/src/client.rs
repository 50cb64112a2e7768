// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The embeddable chat client: optimistic sends, push ingestion, history
//! loading, and flow progression, stitched over the transport seam.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_core::error::ParleyError;
use parley_core::types::{AuthorKind, ChatMessage, NewMessagePayload, SessionId};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::flow_provider::{FlowProvider, FlowSummary, UiHints};
use crate::reconcile::{IncomingMessage, Reconciler, ResolveOutcome};
use crate::scroll::ScrollState;
use crate::transcript::{Transcript, TEMP_ID_PREFIX};
use crate::transport::{ChatTransport, SendRequest};

/// Tuning knobs; the defaults match the hosted widget.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Hard ceiling on one send round-trip.
    pub send_timeout: Duration,
    /// Separate guard for flow processing, which can stall independently
    /// of the message write.
    pub flow_guard_timeout: Duration,
    /// Pause between marking an optimistic entry sent and splicing the
    /// canonical node over it, so the status change stays perceptible.
    pub confirm_delay: Duration,
    /// Display name attached to optimistic entries.
    pub visitor_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(12),
            flow_guard_timeout: Duration::from_secs(8),
            confirm_delay: Duration::from_millis(400),
            visitor_name: "You".to_string(),
        }
    }
}

/// What a completed send left behind.
#[derive(Debug)]
pub struct SendReport {
    pub local_id: String,
    pub server_id: i64,
    /// Validation feedback from the flow engine; the message itself was
    /// still persisted.
    pub flow_error: Option<String>,
}

/// Effect of one ingested push, for the rendering layer.
#[derive(Debug, PartialEq, Eq)]
pub enum PushEffect {
    Suppressed,
    Rendered { autoscroll: bool },
}

pub struct ChatClient {
    session_id: SessionId,
    transport: std::sync::Arc<dyn ChatTransport>,
    flow: Box<dyn FlowProvider>,
    reconciler: Reconciler,
    scroll: ScrollState,
    config: ClientConfig,
    send_in_flight: bool,
    history_loaded: bool,
}

impl ChatClient {
    pub fn new(
        session_id: SessionId,
        transport: std::sync::Arc<dyn ChatTransport>,
        flow: Box<dyn FlowProvider>,
        config: ClientConfig,
    ) -> Self {
        Self {
            session_id,
            transport,
            flow,
            reconciler: Reconciler::new(),
            scroll: ScrollState::new(),
            config,
            send_in_flight: false,
            history_loaded: false,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        self.reconciler.transcript()
    }

    pub fn hints(&self) -> UiHints {
        self.flow.hints()
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollState {
        &mut self.scroll
    }

    /// Fetch the initial flow prompt (greeting) for a fresh session.
    pub async fn bootstrap(&mut self) -> Result<(), ParleyError> {
        let summary = tokio::time::timeout(
            self.config.flow_guard_timeout,
            self.transport.process_flow(&self.session_id),
        )
        .await
        .map_err(|_| ParleyError::Internal("Processing took too long".to_string()))??;
        self.absorb_flow(&summary);
        Ok(())
    }

    /// Send one visitor message. Sends are serialized: a second call while
    /// one is in flight fails immediately rather than queueing.
    pub async fn send(&mut self, text: &str) -> Result<SendReport, ParleyError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParleyError::Validation("message is empty".to_string()));
        }
        if self.send_in_flight {
            return Err(ParleyError::Validation(
                "another message is still sending".to_string(),
            ));
        }

        let temp_id = format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4());
        let visitor_name = self.config.visitor_name.clone();
        self.reconciler
            .register_optimistic(&temp_id, text, &visitor_name, Utc::now());
        self.scroll.should_autoscroll(true);
        self.send_in_flight = true;

        let result = self.dispatch(&temp_id, text).await;

        // The flag clears on every path, success or not.
        self.send_in_flight = false;
        match result {
            Ok(report) => Ok(report),
            Err(err) => {
                self.reconciler.mark_error(&temp_id, &err.user_message());
                Err(err)
            }
        }
    }

    async fn dispatch(&mut self, temp_id: &str, text: &str) -> Result<SendReport, ParleyError> {
        let request = SendRequest {
            session_id: self.session_id.clone(),
            text: text.to_string(),
            temp_id: temp_id.to_string(),
            current_step: self.flow.current_step(),
        };
        let mid_flow = request.current_step.is_some();

        // Flow processing rides the same round trip as the persist. While
        // the session is mid-flow the tighter flow guard races the
        // transport ceiling and carries its own message.
        let send = self.transport.send_message(request);
        let ack = if mid_flow {
            match tokio::time::timeout(
                self.config.flow_guard_timeout,
                tokio::time::timeout(self.config.send_timeout, send),
            )
            .await
            {
                Err(_) => {
                    return Err(ParleyError::Internal("Processing took too long".to_string()))
                }
                Ok(Err(_)) => {
                    return Err(ParleyError::Timeout {
                        duration: self.config.send_timeout,
                    })
                }
                Ok(Ok(result)) => result?,
            }
        } else {
            tokio::time::timeout(self.config.send_timeout, send)
                .await
                .map_err(|_| ParleyError::Timeout {
                    duration: self.config.send_timeout,
                })??
        };

        self.reconciler
            .confirm_ack(temp_id, ack.message_id, Utc::now());

        let flow_error = match &ack.flow {
            Some(summary) => {
                self.absorb_flow(summary);
                summary.error.clone()
            }
            None => None,
        };

        Ok(SendReport {
            local_id: temp_id.to_string(),
            server_id: ack.message_id,
            flow_error,
        })
    }

    /// Absorb a flow summary and render its prompt, if any, as a system
    /// message. Rendering goes through resolution so the push echo of the
    /// same prompt is suppressed.
    fn absorb_flow(&mut self, summary: &FlowSummary) {
        self.flow.absorb(summary);
        if let Some(prompt) = &summary.prompt {
            let outcome = self.reconciler.resolve(IncomingMessage {
                id: summary.prompt_message_id,
                text: prompt.clone(),
                author_kind: AuthorKind::System,
                author_name: String::new(),
                timestamp: Utc::now(),
            });
            debug!(step = %summary.step, ?outcome, "absorbed flow prompt");
        }
    }

    /// Ingest one push event. Confirmation of an optimistic entry pauses
    /// for `confirm_delay` before the node swap.
    pub async fn on_push(&mut self, payload: NewMessagePayload) -> PushEffect {
        let timestamp = parse_timestamp(&payload.timestamp);
        let outcome = self.reconciler.resolve(IncomingMessage {
            id: payload.id,
            text: payload.text,
            author_kind: payload.author_kind,
            author_name: payload.author_name,
            timestamp,
        });
        match outcome {
            ResolveOutcome::Suppressed => PushEffect::Suppressed,
            ResolveOutcome::Confirmed {
                local_id,
                canonical,
            } => {
                tokio::time::sleep(self.config.confirm_delay).await;
                self.reconciler.apply_splice(&local_id, canonical);
                PushEffect::Rendered {
                    autoscroll: self.scroll.should_autoscroll(true),
                }
            }
            ResolveOutcome::Appended { .. } => PushEffect::Rendered {
                autoscroll: self.scroll.should_autoscroll(false),
            },
        }
    }

    /// Load history and merge it into the transcript. Already-rendered
    /// messages are suppressed by resolution, so calling this after pushes
    /// have arrived is safe.
    pub async fn load_history(&mut self, force: bool) -> Result<usize, ParleyError> {
        if self.history_loaded && !force {
            return Ok(0);
        }
        let messages = self.transport.fetch_history(&self.session_id).await?;
        let mut appended = 0;
        for message in messages {
            if self.ingest_historical(message) {
                appended += 1;
            }
        }
        self.history_loaded = true;
        Ok(appended)
    }

    fn ingest_historical(&mut self, message: ChatMessage) -> bool {
        let timestamp = parse_timestamp(&message.created_at);
        let outcome = self.reconciler.resolve(IncomingMessage {
            id: Some(message.id),
            text: message.body,
            author_kind: message.author_kind,
            author_name: message.author_name,
            timestamp,
        });
        match outcome {
            ResolveOutcome::Suppressed => false,
            ResolveOutcome::Appended { .. } => true,
            // A history row confirming an optimistic entry splices
            // immediately; the delay only matters for live pushes.
            ResolveOutcome::Confirmed {
                local_id,
                canonical,
            } => {
                self.reconciler.apply_splice(&local_id, canonical);
                true
            }
        }
    }

    /// Best-effort typing signal.
    pub async fn typing(&mut self, active: bool) {
        crate::transport::typing_with_retry(self.transport.as_ref(), &self.session_id, active)
            .await;
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(err) => {
            warn!(raw, error = %err, "unparseable message timestamp, using now");
            Utc::now()
        }
    }
}
