//! Conversation turns and the append-only log

use crate::registry::ParticipantId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a turn's speaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// Identifier of a pending user-input request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Mint a fresh random request id
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directed transfer of control between two participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handoff {
    pub source: ParticipantId,
    pub target: ParticipantId,
}

/// One atomic unit of conversation content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    /// Participant that produced the turn; `None` for user and system turns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<ParticipantId>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff: Option<Handoff>,
    /// Request this user turn answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<RequestId>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            author: None,
            text: text.into(),
            handoff: None,
            in_reply_to: None,
        }
    }

    pub fn user_reply(text: impl Into<String>, request: RequestId) -> Self {
        Self {
            in_reply_to: Some(request),
            ..Self::user(text)
        }
    }

    pub fn assistant(author: ParticipantId, text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            author: Some(author),
            text: text.into(),
            handoff: None,
            in_reply_to: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            author: None,
            text: text.into(),
            handoff: None,
            in_reply_to: None,
        }
    }

    #[must_use]
    pub fn with_handoff(mut self, handoff: Handoff) -> Self {
        self.handoff = Some(handoff);
        self
    }

    /// Empty turns stay in the log but are never rendered
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Ordered, append-only sequence of turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn last_user_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::User)
    }

    pub fn last_assistant_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::Assistant)
    }
}
