// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Fast, deterministic, CI-runnable: temp SQLite, an in-memory relay
//! double, and a presence probe a test can flip mid-scenario.
//!
//! # Components
//!
//! - [`TestHarness`] - full server stack behind an in-process router
//! - [`MockRelay`] - captures published events, can simulate outages
//! - [`FixedPresence`] - controllable operator presence

pub mod harness;
pub mod mock_presence;
pub mod mock_relay;

pub use harness::{TestHarness, TestHarnessBuilder, TEST_CHANNEL_PREFIX, TEST_OPERATOR_TOKEN};
pub use mock_presence::FixedPresence;
pub use mock_relay::{MockRelay, PublishedEvent};
