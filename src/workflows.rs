//! Agent topologies
//!
//! [`handoff`] builds the interactive PM assistant registry that runs on the
//! router. The other three are one-shot demos that speak through the chat
//! client directly:
//!
//! - [`sequential`]: each agent appends one message to a growing transcript
//! - [`concurrent`]: every agent answers the same prompt in parallel
//! - [`group_chat`]: agents speak round-robin for a fixed number of rounds

pub mod concurrent;
pub mod group_chat;
pub mod handoff;
pub mod sequential;

pub use concurrent::{ConcurrentWorkflow, Dashboard};
pub use group_chat::GroupChatWorkflow;
pub use sequential::SequentialWorkflow;

use crate::conversation::Role;
use crate::llm::{ChatClient, ChatMessage, ChatRequest, LlmError};
use serde::Serialize;
use thiserror::Error;

/// A named system prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub name: String,
    pub instructions: String,
}

impl Agent {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
        }
    }
}

/// One entry of a demo transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    /// Agent name for assistant messages
    pub author: Option<String>,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            author: None,
            text: text.into(),
        }
    }

    pub fn agent(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            author: Some(name.into()),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("workflow has no agents")]
    NoAgents,

    #[error("agent '{agent}' failed: {error}")]
    Agent { agent: String, error: LlmError },
}

impl WorkflowError {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::NoAgents => "NoAgents",
            WorkflowError::Agent { .. } => "Upstream",
        }
    }
}

pub(crate) fn require_agents(agents: &[Agent]) -> Result<(), WorkflowError> {
    if agents.is_empty() {
        Err(WorkflowError::NoAgents)
    } else {
        Ok(())
    }
}

/// Let one agent reply to the transcript so far
pub(crate) async fn speak<C>(
    client: &C,
    agent: &Agent,
    transcript: &[Message],
) -> Result<Message, WorkflowError>
where
    C: ChatClient + ?Sized,
{
    let messages = transcript
        .iter()
        .filter(|m| !m.text.trim().is_empty())
        .map(|m| match m.role {
            Role::User => ChatMessage::user(&m.text),
            Role::Assistant => ChatMessage::assistant(m.author.clone(), &m.text),
            Role::System => ChatMessage::system(&m.text),
        })
        .collect();

    let request = ChatRequest {
        system_prompt: agent.instructions.clone(),
        messages,
        ..ChatRequest::default()
    };

    let generation = client
        .generate(&request)
        .await
        .map_err(|error| WorkflowError::Agent {
            agent: agent.name.clone(),
            error,
        })?;

    if !generation.function_calls.is_empty() {
        tracing::warn!(
            agent = %agent.name,
            calls = generation.function_calls.len(),
            "Ignoring function calls from a demo agent"
        );
    }
    tracing::debug!(agent = %agent.name, chars = generation.text.len(), "Agent spoke");

    Ok(Message::agent(agent.name.clone(), generation.text))
}
