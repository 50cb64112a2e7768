// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Controllable presence probe.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parley_core::traits::presence::PresenceProbe;

/// Presence probe answering from a shared flag, so a test can take an
/// operator on- or offline mid-conversation.
#[derive(Clone, Default)]
pub struct FixedPresence {
    online: Arc<AtomicBool>,
}

impl FixedPresence {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl PresenceProbe for FixedPresence {
    async fn operator_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
