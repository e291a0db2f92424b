//! Effects produced by state transitions

use crate::conversation::{Handoff, Turn};
use crate::registry::ParticipantId;
use crate::state_machine::state::{PendingRequest, RunFailure};

/// Effects to be applied by the session after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append turns to the conversation log
    AppendTurns { turns: Vec<Turn> },

    /// Run a participant through the turn executor
    Execute { participant: ParticipantId },

    /// Hand control back to the caller until `resume`
    AwaitUser { requests: Vec<PendingRequest> },

    ReportFailure { failure: RunFailure },

    NotifyHandoff { handoff: Handoff },

    NotifyTerminated,
}

impl Effect {
    pub fn append(turns: Vec<Turn>) -> Self {
        Effect::AppendTurns { turns }
    }

    pub fn append_one(turn: Turn) -> Self {
        Effect::AppendTurns { turns: vec![turn] }
    }

    pub fn execute(participant: ParticipantId) -> Self {
        Effect::Execute { participant }
    }
}
