//! Events that drive the router

use crate::conversation::{RequestId, Turn};
use crate::registry::ParticipantId;
use crate::state_machine::state::RunFailure;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A caller's answer to one pending request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum UserResponse {
    Reply(String),
    /// Ends the session instead of replying
    Terminate,
}

impl UserResponse {
    pub fn reply(text: impl Into<String>) -> Self {
        UserResponse::Reply(text.into())
    }
}

/// What the executor expects to happen after its turns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The same participant runs again (tool results to consume, or a hand-off)
    Continue,
    /// The participant answered and now needs the user
    AwaitingUser,
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// Opening message of the session
    UserMessage { text: String },

    ExecutionComplete {
        participant: ParticipantId,
        turns: Vec<Turn>,
        outcome: StepOutcome,
        /// Minted by the driver; used if the step suspends
        request_id: RequestId,
    },

    /// `turns` were completed by the failed step before it stopped
    RunFailed {
        turns: Vec<Turn>,
        failure: RunFailure,
    },

    Resume {
        responses: HashMap<RequestId, UserResponse>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserMessage { .. } => "user_message",
            Event::ExecutionComplete { .. } => "execution_complete",
            Event::RunFailed { .. } => "run_failed",
            Event::Resume { .. } => "resume",
        }
    }
}
