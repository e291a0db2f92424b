//! Pure state transition function

use super::{Effect, Event, PendingRequest, RouterContext, RouterState, RunFailure, StepOutcome, UserResponse};
use crate::conversation::{Handoff, RequestId, Role, Turn};
use crate::registry::ParticipantId;
use std::collections::HashMap;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: RouterState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: RouterState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Rejections; the state is left unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("session is closed")]
    SessionClosed,
    #[error("session already started")]
    AlreadyStarted,
    #[error("session is not waiting for user input")]
    NotAwaitingInput,
    #[error("session is waiting for replies to pending requests")]
    AwaitingResponses,
    #[error("unknown request id '{0}'")]
    UnknownRequest(RequestId),
    #[error("missing responses for {} pending request(s)", .missing.len())]
    IncompleteResponse { missing: Vec<RequestId> },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// `log` is the conversation before this event's turns are appended. Same
/// inputs always give the same outputs.
pub fn transition(
    state: &RouterState,
    context: &RouterContext,
    log: &[Turn],
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        (RouterState::Terminated { .. }, _) => Err(TransitionError::SessionClosed),

        // ============================================================
        // Opening message
        // ============================================================
        (RouterState::Running { active }, Event::UserMessage { text }) => {
            if !log.is_empty() {
                return Err(TransitionError::AlreadyStarted);
            }
            let turn = Turn::user(text);
            if context.termination.is_farewell(Some(&turn)) {
                return Ok(terminated(vec![turn], None));
            }
            Ok(TransitionResult::new(RouterState::Running { active: *active })
                .with_effect(Effect::append_one(turn))
                .with_effect(Effect::execute(*active)))
        }

        (RouterState::Suspended { .. }, Event::UserMessage { .. }) => {
            Err(TransitionError::AwaitingResponses)
        }

        // ============================================================
        // Participant output
        // ============================================================
        (
            RouterState::Running { active },
            Event::ExecutionComplete {
                participant,
                turns,
                outcome,
                request_id,
            },
        ) => {
            if participant != *active {
                return Err(TransitionError::InvalidTransition(format!(
                    "execution result from {participant} while {active} is active"
                )));
            }
            Ok(handle_execution(context, log, *active, turns, outcome, request_id))
        }

        (RouterState::Running { .. }, Event::RunFailed { turns, failure }) => {
            Ok(terminated(turns, Some(failure)))
        }

        (RouterState::Suspended { .. }, Event::ExecutionComplete { .. } | Event::RunFailed { .. }) => {
            Err(TransitionError::InvalidTransition(
                "no participant is running while suspended".to_string(),
            ))
        }

        // ============================================================
        // Resume
        // ============================================================
        (RouterState::Running { .. }, Event::Resume { .. }) => Err(TransitionError::NotAwaitingInput),

        (RouterState::Suspended { pending }, Event::Resume { responses }) => {
            handle_resume(context, pending, responses)
        }
    }
}

fn handle_execution(
    context: &RouterContext,
    log: &[Turn],
    active: ParticipantId,
    turns: Vec<Turn>,
    outcome: StepOutcome,
    request_id: RequestId,
) -> TransitionResult {
    // Termination wins over a hand-off in the same step
    let newest = turns.last().or_else(|| log.last());
    if context.termination.is_farewell(newest) {
        return terminated(turns, None);
    }

    let requested = turns
        .iter()
        .rev()
        .find(|t| t.role == Role::Assistant)
        .and_then(|t| t.handoff);

    if let Some(Handoff { target, .. }) = requested {
        let registry = &context.registry;
        if !registry.is_allowed(active, target) {
            let failure = RunFailure::InvalidHandoff {
                participant: registry.name(active).to_string(),
                target: registry.name(target).to_string(),
                allowed: registry.allowed_names(active),
            };
            return terminated(turns, Some(failure));
        }
        return TransitionResult::new(RouterState::Running { active: target })
            .with_effect(Effect::append(turns))
            .with_effect(Effect::NotifyHandoff {
                handoff: Handoff {
                    source: active,
                    target,
                },
            })
            .with_effect(Effect::execute(target));
    }

    match outcome {
        StepOutcome::AwaitingUser => {
            let request = PendingRequest {
                id: request_id,
                participant: active,
                prompt: turns
                    .iter()
                    .filter(|t| t.role == Role::Assistant)
                    .cloned()
                    .collect(),
            };
            TransitionResult::new(RouterState::Suspended {
                pending: vec![request.clone()],
            })
            .with_effect(Effect::append(turns))
            .with_effect(Effect::AwaitUser {
                requests: vec![request],
            })
        }
        StepOutcome::Continue => TransitionResult::new(RouterState::Running { active })
            .with_effect(Effect::append(turns))
            .with_effect(Effect::execute(active)),
    }
}

fn handle_resume(
    context: &RouterContext,
    pending: &[PendingRequest],
    mut responses: HashMap<RequestId, UserResponse>,
) -> Result<TransitionResult, TransitionError> {
    let Some(first) = pending.first() else {
        return Err(TransitionError::InvalidTransition(
            "suspended without pending requests".to_string(),
        ));
    };

    let mut unknown: Vec<&RequestId> = responses
        .keys()
        .filter(|id| !pending.iter().any(|p| &p.id == *id))
        .collect();
    unknown.sort();
    if let Some(id) = unknown.first() {
        return Err(TransitionError::UnknownRequest((*id).clone()));
    }

    let missing: Vec<RequestId> = pending
        .iter()
        .filter(|p| !responses.contains_key(&p.id))
        .map(|p| p.id.clone())
        .collect();
    if !missing.is_empty() {
        return Err(TransitionError::IncompleteResponse { missing });
    }

    if responses.values().any(|r| *r == UserResponse::Terminate) {
        return Ok(terminated(vec![], None));
    }

    let turns: Vec<Turn> = pending
        .iter()
        .filter_map(|p| match responses.remove(&p.id) {
            Some(UserResponse::Reply(text)) => Some(Turn::user_reply(text, p.id.clone())),
            _ => None,
        })
        .collect();

    if context.termination.is_farewell(turns.last()) {
        return Ok(terminated(turns, None));
    }

    Ok(TransitionResult::new(RouterState::Running {
        active: first.participant,
    })
    .with_effect(Effect::append(turns))
    .with_effect(Effect::execute(first.participant)))
}

/// Terminal result; `turns` are still appended so the partial log survives
fn terminated(turns: Vec<Turn>, failure: Option<RunFailure>) -> TransitionResult {
    let mut result = TransitionResult::new(RouterState::Terminated {
        failure: failure.clone(),
    });
    if !turns.is_empty() {
        result = result.with_effect(Effect::append(turns));
    }
    match failure {
        Some(failure) => result.with_effect(Effect::ReportFailure { failure }),
        None => result.with_effect(Effect::NotifyTerminated),
    }
}
