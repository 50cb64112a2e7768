// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel naming convention and authorization rules.
//!
//! One private channel per session (`<prefix>-<session_id>`) plus one shared
//! broadcast channel for operator-facing notifications
//! (`<prefix>-operators`). Anything else is denied outright.

use parley_core::types::SessionId;
use parley_core::ParleyError;

/// Suffix of the shared operator broadcast channel.
const BROADCAST_SUFFIX: &str = "operators";

/// Builds and validates channel names for one configured prefix.
#[derive(Debug, Clone)]
pub struct ChannelNames {
    prefix: String,
}

impl ChannelNames {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The private channel carrying one session's events.
    pub fn session_channel(&self, session_id: &SessionId) -> String {
        format!("{}-{}", self.prefix, session_id.as_str())
    }

    /// The shared channel carrying operator-facing notifications.
    pub fn broadcast_channel(&self) -> String {
        format!("{}-{}", self.prefix, BROADCAST_SUFFIX)
    }

    /// The session embedded in a channel name, if it is a session channel.
    pub fn session_of(&self, channel: &str) -> Option<SessionId> {
        let rest = channel.strip_prefix(&self.prefix)?.strip_prefix('-')?;
        if rest.is_empty() || rest == BROADCAST_SUFFIX {
            return None;
        }
        Some(SessionId(rest.to_string()))
    }

    /// Authorization predicate for a channel-subscribe request.
    ///
    /// Denies channel names outside the two known patterns, and denies a
    /// session channel when the caller-supplied session id does not match
    /// the one embedded in the channel name.
    pub fn check_subscription(
        &self,
        channel: &str,
        session_id: Option<&SessionId>,
    ) -> Result<(), ParleyError> {
        if channel == self.broadcast_channel() {
            return Ok(());
        }
        match self.session_of(channel) {
            Some(embedded) => match session_id {
                Some(claimed) if *claimed == embedded => Ok(()),
                _ => Err(ParleyError::Validation(
                    "session does not match channel".to_string(),
                )),
            },
            None => Err(ParleyError::Validation(
                "unknown channel name".to_string(),
            )),
        }
    }
}
