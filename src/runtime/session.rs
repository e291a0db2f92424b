//! Session driver
//!
//! Owns the state and the log of one conversation. Every call feeds one event
//! to the pure transition function and applies the resulting effects until the
//! router suspends or terminates.

use super::error::SessionError;
use super::executor::{StepFailure, TurnExecutor};
use super::traits::ToolHandler;
use crate::conversation::{ConversationLog, RequestId, Turn};
use crate::llm::ChatClient;
use crate::registry::Registry;
use crate::state_machine::{
    transition, Effect, Event, RouterContext, RouterState, RunFailure, UserResponse,
};
use crate::termination::TerminationEvaluator;
use std::collections::HashMap;
use std::sync::Arc;

/// Default cap on consecutive participant executions per user input
pub const DEFAULT_MAX_STEPS: usize = 16;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub max_steps: usize,
    pub termination: TerminationEvaluator,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            termination: TerminationEvaluator::default(),
        }
    }
}

/// One conversation with the hand-off router
pub struct Session<C, T>
where
    C: ChatClient,
    T: ToolHandler,
{
    context: RouterContext,
    state: RouterState,
    log: ConversationLog,
    executor: TurnExecutor<C, T>,
    max_steps: usize,
}

impl<C, T> Session<C, T>
where
    C: ChatClient,
    T: ToolHandler,
{
    pub fn new(registry: Arc<Registry>, client: C, tools: T, config: SessionConfig) -> Self {
        let executor = TurnExecutor::new(registry, client, tools);
        Self::with_executor(executor, config)
    }

    pub fn with_executor(executor: TurnExecutor<C, T>, config: SessionConfig) -> Self {
        let registry = executor.registry().clone();
        let context = RouterContext::new(
            uuid::Uuid::new_v4().to_string(),
            registry.clone(),
            config.termination,
        );
        Self {
            state: RouterState::initial(&registry),
            context,
            log: ConversationLog::new(),
            executor,
            max_steps: config.max_steps.max(1),
        }
    }

    pub fn id(&self) -> &str {
        &self.context.session_id
    }

    pub fn state(&self) -> &RouterState {
        &self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.context.registry
    }

    pub fn current_log(&self) -> &[Turn] {
        self.log.turns()
    }

    /// Send the opening message and run until the router stops
    pub async fn start(&mut self, message: impl Into<String>) -> Result<RouterState, SessionError> {
        tracing::info!(session_id = %self.context.session_id, "Starting session");
        self.drive(Event::UserMessage {
            text: message.into(),
        })
        .await
    }

    /// Answer the open requests and run until the router stops
    pub async fn resume(
        &mut self,
        responses: HashMap<RequestId, UserResponse>,
    ) -> Result<RouterState, SessionError> {
        tracing::debug!(
            session_id = %self.context.session_id,
            responses = responses.len(),
            "Resuming session"
        );
        self.drive(Event::Resume { responses }).await
    }

    async fn drive(&mut self, event: Event) -> Result<RouterState, SessionError> {
        let mut steps = 0;
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let event_name = current_event.name();
            let result = transition(&self.state, &self.context, self.log.turns(), current_event)?;

            tracing::debug!(
                session_id = %self.context.session_id,
                event = event_name,
                from = self.state.name(),
                to = result.new_state.name(),
                "Transition"
            );
            self.state = result.new_state;

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(effect, &mut steps).await {
                    events_to_process.push(generated);
                }
            }
        }

        match self.state.failure() {
            Some(failure) => Err(SessionError::Run(failure.clone())),
            None => Ok(self.state.clone()),
        }
    }

    /// Apply one effect, returning the event it produced, if any
    async fn execute_effect(&mut self, effect: Effect, steps: &mut usize) -> Option<Event> {
        match effect {
            Effect::AppendTurns { turns } => {
                for turn in turns {
                    self.log.append(turn);
                }
                None
            }

            Effect::Execute { participant } => {
                *steps += 1;
                if *steps > self.max_steps {
                    return Some(Event::RunFailed {
                        turns: vec![],
                        failure: RunFailure::StepLimitExceeded {
                            participant: self.context.registry.name(participant).to_string(),
                            limit: self.max_steps,
                        },
                    });
                }

                let event = match self.executor.execute(participant, self.log.turns()).await {
                    Ok(execution) => Event::ExecutionComplete {
                        participant,
                        turns: execution.turns,
                        outcome: execution.outcome,
                        request_id: RequestId::new(),
                    },
                    Err(StepFailure { turns, failure }) => Event::RunFailed { turns, failure },
                };
                Some(event)
            }

            Effect::AwaitUser { requests } => {
                for request in &requests {
                    tracing::info!(
                        session_id = %self.context.session_id,
                        request_id = %request.id,
                        participant = self.context.registry.name(request.participant),
                        "Awaiting user input"
                    );
                }
                None
            }

            Effect::NotifyHandoff { handoff } => {
                tracing::info!(
                    session_id = %self.context.session_id,
                    from = self.context.registry.name(handoff.source),
                    to = self.context.registry.name(handoff.target),
                    "Handoff"
                );
                None
            }

            Effect::ReportFailure { failure } => {
                tracing::warn!(
                    session_id = %self.context.session_id,
                    kind = failure.kind(),
                    error = %failure,
                    "Run failed"
                );
                None
            }

            Effect::NotifyTerminated => {
                tracing::info!(
                    session_id = %self.context.session_id,
                    turns = self.log.len(),
                    "Session terminated"
                );
                None
            }
        }
    }
}
