// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flow steps and their static declarations.
//!
//! Steps form a forward-only sequence with no terminal state: `ChatActive`
//! self-loops. `CheckAdminStatus` is a pure router that never shows a prompt
//! of its own; it resolves against operator presence at the moment it is
//! asked for.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One step of the visitor data-collection flow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    Welcome,
    FirstMessageReceived,
    PhoneReceived,
    NameReceived,
    CheckAdminStatus,
    WaitingForAdmin,
    AdminConnected,
    ChatActive,
}

impl FlowStep {
    /// Position in the forward-only sequence. Early-completion overrides
    /// never move a session backwards, so "force step X" means
    /// `max(static_next, X)` in ordinal terms.
    pub fn ordinal(self) -> u8 {
        match self {
            FlowStep::Welcome => 0,
            FlowStep::FirstMessageReceived => 1,
            FlowStep::PhoneReceived => 2,
            FlowStep::NameReceived => 3,
            FlowStep::CheckAdminStatus => 4,
            FlowStep::WaitingForAdmin => 5,
            FlowStep::AdminConnected => 6,
            FlowStep::ChatActive => 7,
        }
    }

    /// The later of two steps in sequence order.
    pub fn max(self, other: FlowStep) -> FlowStep {
        if other.ordinal() > self.ordinal() {
            other
        } else {
            self
        }
    }
}

/// What kind of input a step solicits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    GeneralMessage,
    Phone,
    Name,
    None,
}

/// Static declaration of one step: prompt, expected input, and successor.
#[derive(Debug, Clone)]
pub struct StepSpec {
    pub prompt: Option<&'static str>,
    pub requires_input: bool,
    pub input_kind: InputKind,
    pub placeholder: Option<&'static str>,
    pub next: FlowStep,
}

/// Greeting used when the router finds an operator online and drops the
/// visitor straight into free chat.
pub const OPERATOR_CONNECTED_PROMPT: &str =
    "You're connected. An operator will reply in a moment.";

/// Look up the static declaration for a step.
pub fn step_spec(step: FlowStep) -> StepSpec {
    match step {
        FlowStep::Welcome => StepSpec {
            prompt: Some("Hi there! How can we help you today?"),
            requires_input: true,
            input_kind: InputKind::GeneralMessage,
            placeholder: Some("Type your message\u{2026}"),
            next: FlowStep::FirstMessageReceived,
        },
        FlowStep::FirstMessageReceived => StepSpec {
            prompt: Some("Thanks! Could you share your mobile number so we can follow up?"),
            requires_input: true,
            input_kind: InputKind::Phone,
            placeholder: Some("09xxxxxxxxx"),
            next: FlowStep::PhoneReceived,
        },
        // Mirrors name_received. The engine's phone-collected override
        // promotes straight past this step (max with name_received), so it
        // is only ever seen as a client-reported position, never stored;
        // the entry stays so the ordinal chain and wire vocabulary are
        // contiguous.
        FlowStep::PhoneReceived => StepSpec {
            prompt: Some("Got it. And your name or company?"),
            requires_input: true,
            input_kind: InputKind::Name,
            placeholder: Some("Your name"),
            next: FlowStep::NameReceived,
        },
        FlowStep::NameReceived => StepSpec {
            prompt: Some("Got it. And your name or company?"),
            requires_input: true,
            input_kind: InputKind::Name,
            placeholder: Some("Your name"),
            next: FlowStep::CheckAdminStatus,
        },
        // Pure router: no prompt, no input. Resolution happens in the engine.
        FlowStep::CheckAdminStatus => StepSpec {
            prompt: None,
            requires_input: false,
            input_kind: InputKind::None,
            placeholder: None,
            next: FlowStep::ChatActive,
        },
        FlowStep::WaitingForAdmin => StepSpec {
            prompt: Some(
                "All of our operators are away right now. Leave your message and \
                 we'll get back to you as soon as someone is available.",
            ),
            requires_input: true,
            input_kind: InputKind::GeneralMessage,
            placeholder: Some("Leave a message\u{2026}"),
            next: FlowStep::ChatActive,
        },
        FlowStep::AdminConnected => StepSpec {
            prompt: Some("You're connected to an operator."),
            requires_input: true,
            input_kind: InputKind::GeneralMessage,
            placeholder: Some("Type your message\u{2026}"),
            next: FlowStep::ChatActive,
        },
        FlowStep::ChatActive => StepSpec {
            prompt: None,
            requires_input: true,
            input_kind: InputKind::GeneralMessage,
            placeholder: Some("Type your message\u{2026}"),
            next: FlowStep::ChatActive,
        },
    }
}
