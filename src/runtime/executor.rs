//! Turn executor
//!
//! Runs one participant: builds the chat request from the log, calls the
//! model, runs any requested tools and turns the result into new turns. The
//! log itself is never touched here.

use super::traits::ToolHandler;
use crate::conversation::{Handoff, Role, Turn};
use crate::llm::{ChatClient, ChatMessage, ChatRequest, FunctionCall, ToolDefinition};
use crate::registry::{Capability, Participant, ParticipantId, Registry};
use crate::state_machine::{RunFailure, StepOutcome};
use crate::tools::{ToolArgs, ToolError};
use futures::future::join_all;
use serde_json::{json, Value};
use std::sync::Arc;

/// Function-name prefix for hand-off requests
pub const HANDOFF_PREFIX: &str = "handoff_to_";

/// Leading text of the turns that carry tool output
pub const TOOL_RESULT_PREFIX: &str = "Tool result (";

/// Output of one participant step
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub turns: Vec<Turn>,
    pub outcome: StepOutcome,
}

/// A failed step and the turns it completed before failing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub turns: Vec<Turn>,
    pub failure: RunFailure,
}

impl StepFailure {
    fn after(turns: Vec<Turn>, failure: RunFailure) -> Self {
        Self { turns, failure }
    }
}

impl From<RunFailure> for StepFailure {
    fn from(failure: RunFailure) -> Self {
        Self::after(Vec::new(), failure)
    }
}

/// Executes participants against an injected chat client and tool handler
pub struct TurnExecutor<C, T>
where
    C: ChatClient,
    T: ToolHandler,
{
    registry: Arc<Registry>,
    client: Arc<C>,
    tools: Arc<T>,
}

impl<C, T> TurnExecutor<C, T>
where
    C: ChatClient,
    T: ToolHandler,
{
    pub fn new(registry: Arc<Registry>, client: C, tools: T) -> Self {
        Self {
            registry,
            client: Arc::new(client),
            tools: Arc::new(tools),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run `id` once over `log`
    ///
    /// On failure the turns finished before the error travel with it.
    pub async fn execute(
        &self,
        id: ParticipantId,
        log: &[Turn],
    ) -> Result<Execution, StepFailure> {
        let participant = self
            .registry
            .participant(id)
            .ok_or(RunFailure::UnknownParticipant { participant: id })?;

        let request = self.build_request(participant, log);
        tracing::debug!(
            participant = participant.name(),
            messages = request.messages.len(),
            functions = request.tools.len(),
            "Executing participant"
        );

        let generation = self
            .client
            .generate(&request)
            .await
            .map_err(|e| RunFailure::Upstream {
                participant: participant.name().to_string(),
                error_kind: e.kind,
                message: e.message,
            })?;

        let (handoffs, tool_calls): (Vec<FunctionCall>, Vec<FunctionCall>) = generation
            .function_calls
            .into_iter()
            .partition(|call| call.name.starts_with(HANDOFF_PREFIX));

        if let Some(first) = handoffs.first() {
            if handoffs.len() > 1 || !tool_calls.is_empty() {
                tracing::warn!(
                    participant = participant.name(),
                    chosen = %first.name,
                    ignored = handoffs.len() - 1 + tool_calls.len(),
                    "Multiple function calls with a hand-off; only the first hand-off is used"
                );
            }
            let target = match self.resolve_handoff(participant, &first.name) {
                Ok(target) => target,
                Err(failure) => {
                    let turns = vec![Turn::assistant(id, generation.text)];
                    return Err(StepFailure::after(turns, failure));
                }
            };
            let turn = Turn::assistant(id, generation.text).with_handoff(Handoff {
                source: id,
                target,
            });
            return Ok(Execution {
                turns: vec![turn],
                outcome: StepOutcome::Continue,
            });
        }

        if !tool_calls.is_empty() {
            let mut turns = Vec::with_capacity(tool_calls.len() + 1);
            if !generation.text.trim().is_empty() {
                turns.push(Turn::assistant(id, generation.text));
            }
            match self.run_tools(participant, tool_calls).await {
                Ok(results) => turns.extend(results),
                Err(StepFailure {
                    turns: done,
                    failure,
                }) => {
                    turns.extend(done);
                    return Err(StepFailure::after(turns, failure));
                }
            }
            return Ok(Execution {
                turns,
                outcome: StepOutcome::Continue,
            });
        }

        Ok(Execution {
            turns: vec![Turn::assistant(id, generation.text)],
            outcome: StepOutcome::AwaitingUser,
        })
    }

    fn build_request(&self, participant: &Participant, log: &[Turn]) -> ChatRequest {
        let messages = log
            .iter()
            .filter(|turn| !turn.is_blank())
            .map(|turn| match turn.role {
                Role::User => ChatMessage::user(&turn.text),
                Role::Assistant => ChatMessage::assistant(
                    turn.author.map(|a| self.registry.name(a).to_string()),
                    &turn.text,
                ),
                Role::System => ChatMessage::system(&turn.text),
            })
            .collect();

        let mut tools = participant.tools().to_vec();
        tools.extend(
            participant
                .handoff_targets()
                .iter()
                .map(|target| handoff_definition(self.registry.name(*target))),
        );

        ChatRequest {
            system_prompt: participant.instructions().to_string(),
            messages,
            tools,
            max_tokens: None,
        }
    }

    /// Map a hand-off function name back to a participant
    fn resolve_handoff(
        &self,
        participant: &Participant,
        function: &str,
    ) -> Result<ParticipantId, RunFailure> {
        let target = function.strip_prefix(HANDOFF_PREFIX).unwrap_or(function);
        self.registry
            .lookup(target)
            .ok_or_else(|| RunFailure::InvalidHandoff {
                participant: participant.name().to_string(),
                target: target.to_string(),
                allowed: self.registry.allowed_names(participant.id()),
            })
    }

    async fn run_tools(
        &self,
        participant: &Participant,
        calls: Vec<FunctionCall>,
    ) -> Result<Vec<Turn>, StepFailure> {
        let tool_failure = |tool: &str, message: String| RunFailure::Tool {
            participant: participant.name().to_string(),
            tool: tool.to_string(),
            message,
        };

        if participant.capability() == Capability::Plain {
            return Err(tool_failure(
                &calls[0].name,
                "participant cannot call tools".to_string(),
            )
            .into());
        }

        let mut prepared = Vec::with_capacity(calls.len());
        for call in calls {
            if !participant.tools().iter().any(|t| t.name == call.name) {
                return Err(tool_failure(
                    &call.name,
                    "tool is not available to this participant".to_string(),
                )
                .into());
            }
            let args = string_args(&call.name, call.arguments)
                .map_err(|e| StepFailure::from(tool_failure(&call.name, e.to_string())))?;
            prepared.push((call.name, args));
        }

        tracing::info!(
            participant = participant.name(),
            tools = ?prepared.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
            "Running tool calls"
        );

        let results = join_all(
            prepared
                .iter()
                .map(|(name, args)| self.tools.invoke(name, args)),
        )
        .await;

        let mut turns = Vec::with_capacity(prepared.len());
        for ((name, _), result) in prepared.iter().zip(results) {
            match result {
                Ok(value) => {
                    let rendered = serde_json::to_string_pretty(&value)
                        .unwrap_or_else(|_| value.to_string());
                    turns.push(Turn::assistant(
                        participant.id(),
                        format!("{TOOL_RESULT_PREFIX}{name}): {rendered}"),
                    ));
                }
                Err(e) => return Err(StepFailure::after(turns, tool_failure(name, e.to_string()))),
            }
        }
        Ok(turns)
    }
}

fn handoff_definition(target: &str) -> ToolDefinition {
    ToolDefinition {
        name: format!("{HANDOFF_PREFIX}{target}"),
        description: format!("Hand off the conversation to {target}."),
        input_schema: json!({"type": "object", "properties": {}}),
    }
}

/// Flatten model arguments into the string map tools take
fn string_args(tool: &str, arguments: Value) -> Result<ToolArgs, ToolError> {
    match arguments {
        Value::Null => Ok(ToolArgs::new()),
        Value::Object(map) => Ok(map
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect()),
        other => Err(ToolError::invalid(
            tool,
            format!("arguments must be an object, got {other}"),
        )),
    }
}
