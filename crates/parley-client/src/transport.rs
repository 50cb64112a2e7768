// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport seam between the chat client and the gateway.
//!
//! Kept as a trait so tests drive the client with an in-memory fake and the
//! widget embeds whatever HTTP stack its host provides.

use async_trait::async_trait;
use parley_core::error::ParleyError;
use parley_core::types::{ChatMessage, SessionId};
use tracing::debug;

use crate::flow_provider::FlowSummary;

/// Outgoing visitor message.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub session_id: SessionId,
    pub text: String,
    /// Client-assigned temporary id, sent along for server-side log
    /// correlation; reconciliation stays client-side.
    pub temp_id: String,
    /// Flow step the client believes it is on, if flow is active.
    pub current_step: Option<String>,
}

/// Acknowledgement for a persisted message.
#[derive(Debug, Clone)]
pub struct SendAck {
    pub message_id: i64,
    /// Present when the send advanced the guided flow.
    pub flow: Option<FlowSummary>,
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, request: SendRequest) -> Result<SendAck, ParleyError>;

    /// Advance the flow without a message body (initial greeting fetch).
    async fn process_flow(&self, session_id: &SessionId) -> Result<FlowSummary, ParleyError>;

    async fn fetch_history(&self, session_id: &SessionId) -> Result<Vec<ChatMessage>, ParleyError>;

    async fn send_typing(&self, session_id: &SessionId, active: bool) -> Result<(), ParleyError>;
}

/// Typing signals are best-effort: one retry, then give up quietly.
pub async fn typing_with_retry<T: ChatTransport + ?Sized>(
    transport: &T,
    session_id: &SessionId,
    active: bool,
) {
    for attempt in 0..2 {
        match transport.send_typing(session_id, active).await {
            Ok(()) => return,
            Err(err) => {
                debug!(%session_id, attempt, error = %err, "typing signal failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyTyping {
        calls: AtomicU32,
        fail_first: bool,
    }

    #[async_trait]
    impl ChatTransport for FlakyTyping {
        async fn send_message(&self, _request: SendRequest) -> Result<SendAck, ParleyError> {
            unimplemented!()
        }

        async fn process_flow(&self, _session_id: &SessionId) -> Result<FlowSummary, ParleyError> {
            unimplemented!()
        }

        async fn fetch_history(
            &self,
            _session_id: &SessionId,
        ) -> Result<Vec<ChatMessage>, ParleyError> {
            unimplemented!()
        }

        async fn send_typing(&self, _session_id: &SessionId, _active: bool) -> Result<(), ParleyError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 && self.fail_first {
                Err(ParleyError::Transport {
                    message: "connection reset".to_string(),
                    source: None,
                })
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn typing_retries_once_then_succeeds() {
        let transport = FlakyTyping {
            calls: AtomicU32::new(0),
            fail_first: true,
        };
        typing_with_retry(&transport, &SessionId("s1".to_string()), true).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn typing_gives_up_after_second_failure() {
        struct AlwaysFails(AtomicU32);

        #[async_trait]
        impl ChatTransport for AlwaysFails {
            async fn send_message(&self, _r: SendRequest) -> Result<SendAck, ParleyError> {
                unimplemented!()
            }
            async fn process_flow(&self, _s: &SessionId) -> Result<FlowSummary, ParleyError> {
                unimplemented!()
            }
            async fn fetch_history(&self, _s: &SessionId) -> Result<Vec<ChatMessage>, ParleyError> {
                unimplemented!()
            }
            async fn send_typing(&self, _s: &SessionId, _a: bool) -> Result<(), ParleyError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(ParleyError::Transport {
                    message: "down".to_string(),
                    source: None,
                })
            }
        }

        let transport = AlwaysFails(AtomicU32::new(0));
        typing_with_retry(&transport, &SessionId("s1".to_string()), false).await;
        assert_eq!(transport.0.load(Ordering::SeqCst), 2);
    }
}
