// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scroll anchoring for the message pane.
//!
//! Auto-scroll follows new messages only while the reader is at (or near)
//! the bottom; scrolling up to read history pins the viewport until the
//! reader returns or sends a message themselves.

/// Distance from the bottom, in pixels, within which the reader still
/// counts as "following" the conversation.
pub const SCROLL_LOCK_PX: f64 = 200.0;

#[derive(Debug, Default)]
pub struct ScrollState {
    /// Reader scrolled up past the lock threshold.
    pinned: bool,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a viewport measurement after a scroll event.
    pub fn observe(&mut self, distance_from_bottom: f64) {
        self.pinned = distance_from_bottom > SCROLL_LOCK_PX;
    }

    /// Whether an appended message should scroll the pane. `force` is set
    /// for the reader's own sends, which always snap to the bottom and
    /// release the pin.
    pub fn should_autoscroll(&mut self, force: bool) -> bool {
        if force {
            self.pinned = false;
            return true;
        }
        !self.pinned
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }
}
