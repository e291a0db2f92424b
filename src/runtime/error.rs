use crate::conversation::RequestId;
use crate::state_machine::{RunFailure, TransitionError};
use thiserror::Error;

/// Errors from the session control surface
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The run ended with a failure; the partial log is still readable
    #[error(transparent)]
    Run(#[from] RunFailure),

    #[error("unknown request id '{0}'")]
    UnknownRequest(RequestId),

    #[error("missing responses for {} pending request(s)", .missing.len())]
    IncompleteResponse { missing: Vec<RequestId> },

    #[error("session is closed")]
    SessionClosed,

    #[error("session already started")]
    AlreadyStarted,

    #[error("session is not waiting for user input")]
    NotAwaitingInput,

    #[error("session is waiting for replies to pending requests")]
    AwaitingResponses,

    #[error("internal error: {0}")]
    Internal(String),
}

impl SessionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Run(failure) => failure.kind(),
            SessionError::UnknownRequest(_) => "UnknownRequest",
            SessionError::IncompleteResponse { .. } => "IncompleteResponse",
            SessionError::SessionClosed => "SessionClosed",
            SessionError::AlreadyStarted => "AlreadyStarted",
            SessionError::NotAwaitingInput => "NotAwaitingInput",
            SessionError::AwaitingResponses => "AwaitingResponses",
            SessionError::Internal(_) => "Internal",
        }
    }
}

impl From<TransitionError> for SessionError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::SessionClosed => SessionError::SessionClosed,
            TransitionError::AlreadyStarted => SessionError::AlreadyStarted,
            TransitionError::NotAwaitingInput => SessionError::NotAwaitingInput,
            TransitionError::AwaitingResponses => SessionError::AwaitingResponses,
            TransitionError::UnknownRequest(id) => SessionError::UnknownRequest(id),
            TransitionError::IncompleteResponse { missing } => {
                SessionError::IncompleteResponse { missing }
            }
            TransitionError::InvalidTransition(message) => SessionError::Internal(message),
        }
    }
}
