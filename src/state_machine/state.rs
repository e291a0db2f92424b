//! Router state types

use crate::conversation::{RequestId, Turn};
use crate::llm::LlmErrorKind;
use crate::registry::{ParticipantId, Registry};
use crate::termination::TerminationEvaluator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// A participant's open request for user input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub id: RequestId,
    pub participant: ParticipantId,
    /// Assistant turns awaiting the reply
    pub prompt: Vec<Turn>,
}

/// Router state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouterState {
    /// Exactly one participant holds control
    Running { active: ParticipantId },

    /// Waiting for the user to answer every pending request
    Suspended { pending: Vec<PendingRequest> },

    /// No further input is accepted
    Terminated {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failure: Option<RunFailure>,
    },
}

impl RouterState {
    pub fn initial(registry: &Registry) -> Self {
        RouterState::Running {
            active: registry.start(),
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, RouterState::Terminated { .. })
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, RouterState::Suspended { .. })
    }

    pub fn active(&self) -> Option<ParticipantId> {
        match self {
            RouterState::Running { active } => Some(*active),
            _ => None,
        }
    }

    pub fn pending(&self) -> &[PendingRequest] {
        match self {
            RouterState::Suspended { pending } => pending,
            _ => &[],
        }
    }

    pub fn failure(&self) -> Option<&RunFailure> {
        match self {
            RouterState::Terminated { failure } => failure.as_ref(),
            _ => None,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            RouterState::Running { .. } => "running",
            RouterState::Suspended { .. } => "suspended",
            RouterState::Terminated { .. } => "terminated",
        }
    }
}

/// Failure that ends a run; attached to [`RouterState::Terminated`]
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunFailure {
    #[error("'{participant}' tried to hand off to '{target}' (allowed: {})", .allowed.join(", "))]
    InvalidHandoff {
        participant: String,
        target: String,
        allowed: Vec<String>,
    },

    #[error("chat client failed for '{participant}': {message}")]
    Upstream {
        participant: String,
        error_kind: LlmErrorKind,
        message: String,
    },

    #[error("tool '{tool}' failed for '{participant}': {message}")]
    Tool {
        participant: String,
        tool: String,
        message: String,
    },

    #[error("'{participant}' exceeded the limit of {limit} consecutive steps")]
    StepLimitExceeded { participant: String, limit: usize },

    #[error("participant {participant} is not in the registry")]
    UnknownParticipant { participant: ParticipantId },
}

impl RunFailure {
    /// Stable kind label for front ends
    pub fn kind(&self) -> &'static str {
        match self {
            RunFailure::InvalidHandoff { .. } => "InvalidHandoff",
            RunFailure::Upstream { .. } => "Upstream",
            RunFailure::Tool { .. } => "Tool",
            RunFailure::StepLimitExceeded { .. } => "StepLimitExceeded",
            RunFailure::UnknownParticipant { .. } => "UnknownParticipant",
        }
    }
}

/// Immutable per-session configuration
#[derive(Debug, Clone)]
pub struct RouterContext {
    pub session_id: String,
    pub registry: Arc<Registry>,
    pub termination: TerminationEvaluator,
}

impl RouterContext {
    pub fn new(
        session_id: impl Into<String>,
        registry: Arc<Registry>,
        termination: TerminationEvaluator,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            registry,
            termination,
        }
    }
}
