// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation flow engine.
//!
//! Gates what input a visitor is currently asked for, validates it, and
//! decides the next step. The engine never raises to its caller: internal
//! failures degrade to the initial step and a generic greeting.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parley_core::{ParleyError, PresenceProbe};
use serde::Serialize;
use tracing::warn;

use crate::state::{FlowState, FlowStore};
use crate::step::{step_spec, FlowStep, InputKind, OPERATOR_CONNECTED_PROMPT};
use crate::validate::validate_input;

/// Outcome of one flow interaction, shipped back to the widget.
#[derive(Debug, Clone, Serialize)]
pub struct FlowResult {
    pub success: bool,
    /// The step the session is in after this interaction, already resolved
    /// through the admin-status router where applicable.
    pub step: FlowStep,
    /// Automated response to render, if the new step carries one.
    pub prompt: Option<String>,
    /// Input hint for the widget's text box.
    pub placeholder: Option<String>,
    /// Values collected so far, keyed by input kind.
    pub collected: HashMap<InputKind, String>,
    /// Inline validation error when `success` is false.
    pub error: Option<String>,
}

impl FlowResult {
    fn for_step(step: FlowStep, routed_online: bool, state: &FlowState) -> Self {
        let spec = step_spec(step);
        let prompt = if routed_online {
            Some(OPERATOR_CONNECTED_PROMPT.to_string())
        } else {
            spec.prompt.map(String::from)
        };
        Self {
            success: true,
            step,
            prompt,
            placeholder: spec.placeholder.map(String::from),
            collected: state.collected.clone(),
            error: None,
        }
    }
}

/// One-time side effect fired when a visitor finishes handing over both
/// contact fields. Failures are swallowed by the engine.
#[async_trait]
pub trait OperatorNotifier: Send + Sync + 'static {
    async fn lead_captured(
        &self,
        session_id: &str,
        phone: &str,
        name: &str,
    ) -> Result<(), ParleyError>;
}

/// Per-session finite-state machine walking visitors through data
/// collection before free-form chat.
pub struct FlowEngine {
    store: FlowStore,
    presence: Arc<dyn PresenceProbe>,
    notifier: Option<Arc<dyn OperatorNotifier>>,
}

impl FlowEngine {
    pub fn new(state_ttl: Duration, presence: Arc<dyn PresenceProbe>) -> Self {
        Self {
            store: FlowStore::new(state_ttl),
            presence,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn OperatorNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Process one piece of visitor input against the session's flow.
    ///
    /// Never returns an error: any internal failure resets the session to
    /// the initial step and answers with the generic greeting.
    pub async fn process_input(&self, session_id: &str, raw: &str) -> FlowResult {
        match self.try_process(session_id, raw).await {
            Ok(result) => result,
            Err(e) => {
                warn!(session_id, "flow engine degraded to welcome: {e}");
                self.store.reset(session_id);
                let entry = self.store.entry(session_id, Utc::now());
                let state = entry.lock().await;
                FlowResult::for_step(FlowStep::Welcome, false, &state)
            }
        }
    }

    /// Resolve the session's current step without consuming input, e.g. on
    /// widget open. Applies lazy promotion and the admin-status router.
    pub async fn current(&self, session_id: &str) -> FlowResult {
        let entry = self.store.entry(session_id, Utc::now());
        let mut state = entry.lock().await;
        let (effective, routed_online) = self.resolve_effective(&mut state).await;
        FlowResult::for_step(effective, routed_online, &state)
    }

    /// Flip a session waiting on an operator to `admin_connected`. Called
    /// when an operator posts into the session.
    pub async fn operator_joined(&self, session_id: &str) {
        let entry = self.store.entry(session_id, Utc::now());
        let mut state = entry.lock().await;
        if state.current_step == FlowStep::WaitingForAdmin {
            state.current_step = FlowStep::AdminConnected;
        }
    }

    /// Explicitly reset a session's flow.
    pub fn reset(&self, session_id: &str) {
        self.store.reset(session_id);
    }

    /// Drop expired flow records. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.store.sweep(Utc::now())
    }

    async fn try_process(&self, session_id: &str, raw: &str) -> Result<FlowResult, ParleyError> {
        let now = Utc::now();
        let entry = self.store.entry(session_id, now);
        let mut state = entry.lock().await;
        state.updated_at = now;

        let (effective, mut routed_online) = self.resolve_effective(&mut state).await;
        let spec = step_spec(effective);

        // Steps without input respond immediately; no validator runs.
        if !spec.requires_input {
            return Ok(FlowResult::for_step(effective, routed_online, &state));
        }

        let value = match validate_input(spec.input_kind, raw) {
            Ok(v) => v,
            Err(e) => {
                // Validation failure never advances state.
                return Ok(FlowResult {
                    success: false,
                    step: effective,
                    prompt: None,
                    placeholder: spec.placeholder.map(String::from),
                    collected: state.collected.clone(),
                    error: Some(e.user_message()),
                });
            }
        };

        let had_contact_info = state.has_contact_info();
        if matches!(spec.input_kind, InputKind::Phone | InputKind::Name) {
            state.collected.insert(spec.input_kind, value);
        }

        // Static successor, overridden when a just-filled field completes a
        // requirement early. Forward-only: the override is a max, never a
        // rollback.
        let mut next = spec.next;
        if state.collected.contains_key(&InputKind::Phone) {
            next = next.max(FlowStep::NameReceived);
        }
        if state.has_contact_info() {
            next = next.max(FlowStep::CheckAdminStatus);
        }

        if !had_contact_info && state.has_contact_info() {
            self.notify_lead(session_id, &state);
        }

        if next == FlowStep::CheckAdminStatus {
            if self.presence.operator_online().await {
                routed_online = true;
                next = FlowStep::ChatActive;
            } else {
                next = FlowStep::WaitingForAdmin;
            }
        }

        state.current_step = next;
        Ok(FlowResult::for_step(next, routed_online, &state))
    }

    /// Resolve the *effective* current step: lazy promotion of a completed
    /// `name_received`, then the admin-status router. Router resolutions are
    /// persisted immediately.
    async fn resolve_effective(&self, state: &mut FlowState) -> (FlowStep, bool) {
        let mut step = state.current_step;
        if step == FlowStep::NameReceived && state.has_contact_info() {
            step = FlowStep::CheckAdminStatus;
        }
        let mut routed_online = false;
        if step == FlowStep::CheckAdminStatus {
            if self.presence.operator_online().await {
                routed_online = true;
                step = FlowStep::ChatActive;
            } else {
                step = FlowStep::WaitingForAdmin;
            }
            state.current_step = step;
        }
        (step, routed_online)
    }

    fn notify_lead(&self, session_id: &str, state: &FlowState) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        let session_id = session_id.to_string();
        let phone = state
            .collected
            .get(&InputKind::Phone)
            .cloned()
            .unwrap_or_default();
        let name = state
            .collected
            .get(&InputKind::Name)
            .cloned()
            .unwrap_or_default();
        // Fire-and-forget: a failed notification must never surface to the
        // visitor mid-flow.
        tokio::spawn(async move {
            if let Err(e) = notifier.lead_captured(&session_id, &phone, &name).await {
                warn!(session_id, "operator notify failed: {e}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FixedPresence(AtomicBool);

    #[async_trait]
    impl PresenceProbe for FixedPresence {
        async fn operator_online(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn engine(online: bool) -> FlowEngine {
        FlowEngine::new(
            Duration::from_secs(7 * 24 * 3600),
            Arc::new(FixedPresence(AtomicBool::new(online))),
        )
    }

    #[tokio::test]
    async fn full_flow_with_no_operator_parks_in_waiting() {
        let engine = engine(false);

        let start = engine.current("s1").await;
        assert_eq!(start.step, FlowStep::Welcome);
        assert!(start.prompt.unwrap().contains("How can we help"));

        let r = engine.process_input("s1", "my printer is haunted").await;
        assert!(r.success);
        assert_eq!(r.step, FlowStep::FirstMessageReceived);
        assert!(r.prompt.unwrap().contains("mobile number"));

        let r = engine.process_input("s1", "09123456789").await;
        assert!(r.success);
        assert_eq!(r.step, FlowStep::NameReceived);

        let r = engine.process_input("s1", "Acme Co").await;
        assert!(r.success);
        assert_eq!(r.step, FlowStep::WaitingForAdmin);
        assert!(r.prompt.unwrap().contains("away right now"));
        assert_eq!(r.collected.len(), 2);
    }

    #[tokio::test]
    async fn full_flow_with_operator_online_goes_straight_to_chat() {
        let engine = engine(true);

        engine.process_input("s1", "hello").await;
        engine.process_input("s1", "09123456789").await;
        let r = engine.process_input("s1", "Acme Co").await;

        assert_eq!(r.step, FlowStep::ChatActive);
        assert_eq!(r.prompt.as_deref(), Some(OPERATOR_CONNECTED_PROMPT));
    }

    #[tokio::test]
    async fn invalid_phone_does_not_advance() {
        let engine = engine(false);
        engine.process_input("s1", "hello").await;

        let r = engine.process_input("s1", "123").await;
        assert!(!r.success);
        assert_eq!(r.step, FlowStep::FirstMessageReceived);
        assert!(r.error.unwrap().contains("valid mobile number"));

        // Still waiting on the phone.
        let r = engine.process_input("s1", "09123456789").await;
        assert!(r.success);
        assert_eq!(r.step, FlowStep::NameReceived);
    }

    #[tokio::test]
    async fn lazy_promotion_resolves_completed_name_received() {
        let engine = engine(false);
        engine.process_input("s1", "hello").await;
        engine.process_input("s1", "09123456789").await;
        engine.process_input("s1", "Acme Co").await;

        // Stored step is past the router now; asking again must not regress.
        let r = engine.current("s1").await;
        assert_eq!(r.step, FlowStep::WaitingForAdmin);
    }

    #[tokio::test]
    async fn operator_joining_flips_waiting_to_connected() {
        let engine = engine(false);
        engine.process_input("s1", "hello").await;
        engine.process_input("s1", "09123456789").await;
        engine.process_input("s1", "Acme Co").await;

        engine.operator_joined("s1").await;
        let r = engine.current("s1").await;
        assert_eq!(r.step, FlowStep::AdminConnected);

        // Next visitor message lands in free chat.
        let r = engine.process_input("s1", "great, thanks").await;
        assert_eq!(r.step, FlowStep::ChatActive);
    }

    #[tokio::test]
    async fn notifier_fires_once_when_both_fields_complete() {
        struct CountingNotifier(AtomicUsize);

        #[async_trait]
        impl OperatorNotifier for CountingNotifier {
            async fn lead_captured(
                &self,
                _session_id: &str,
                phone: &str,
                name: &str,
            ) -> Result<(), ParleyError> {
                assert_eq!(phone, "09123456789");
                assert_eq!(name, "Acme Co");
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let notifier = Arc::new(CountingNotifier(AtomicUsize::new(0)));
        let engine = engine(false).with_notifier(Arc::clone(&notifier) as Arc<dyn OperatorNotifier>);

        engine.process_input("s1", "hello").await;
        engine.process_input("s1", "09123456789").await;
        engine.process_input("s1", "Acme Co").await;
        engine.process_input("s1", "another message").await;

        // Let the fire-and-forget task run.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn notifier_failure_never_surfaces() {
        struct FailingNotifier;

        #[async_trait]
        impl OperatorNotifier for FailingNotifier {
            async fn lead_captured(
                &self,
                _session_id: &str,
                _phone: &str,
                _name: &str,
            ) -> Result<(), ParleyError> {
                Err(ParleyError::Relay {
                    message: "relay down".into(),
                    source: None,
                })
            }
        }

        let engine = engine(false).with_notifier(Arc::new(FailingNotifier));
        engine.process_input("s1", "hello").await;
        engine.process_input("s1", "09123456789").await;
        let r = engine.process_input("s1", "Acme Co").await;
        assert!(r.success);
        assert_eq!(r.step, FlowStep::WaitingForAdmin);
    }

    #[tokio::test]
    async fn message_that_routes_online_mid_call_gets_connected_notice() {
        let engine = engine(true);
        // Park a session at name_received with both fields already in hand,
        // so the router fires inside the same call that consumes input.
        {
            let entry = engine.store.entry("s1", Utc::now());
            let mut state = entry.lock().await;
            state.current_step = FlowStep::NameReceived;
            state.collected.insert(InputKind::Phone, "09123456789".into());
            state.collected.insert(InputKind::Name, "Acme Co".into());
        }

        let r = engine.process_input("s1", "anyone there?").await;
        assert!(r.success);
        assert_eq!(r.step, FlowStep::ChatActive);
        assert_eq!(r.prompt.as_deref(), Some(OPERATOR_CONNECTED_PROMPT));
    }

    #[tokio::test]
    async fn chat_active_self_loops_on_further_messages() {
        let engine = engine(true);
        engine.process_input("s1", "hello").await;
        engine.process_input("s1", "09123456789").await;
        engine.process_input("s1", "Acme Co").await;

        let r = engine.process_input("s1", "are you there?").await;
        assert!(r.success);
        assert_eq!(r.step, FlowStep::ChatActive);
        assert!(r.prompt.is_none());
    }
}
