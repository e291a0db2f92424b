//! Common types for chat-completion interactions

use serde::{Deserialize, Serialize};

/// Chat-completion request
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    /// Functions the model may call: tools and hand-offs alike
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: Option<u32>,
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Message in conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    /// Speaker name for assistant messages written by another participant
    pub name: Option<String>,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            name: None,
            content: content.into(),
        }
    }

    pub fn assistant(name: Option<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            name,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            name: None,
            content: content.into(),
        }
    }
}

/// Tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A function call requested by the model
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Model output of one generation step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub text: String,
    pub function_calls: Vec<FunctionCall>,
    pub usage: Usage,
}

impl Generation {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_call(mut self, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        let id = format!("call_{}", self.function_calls.len());
        self.function_calls.push(FunctionCall {
            id,
            name: name.into(),
            arguments,
        });
        self
    }
}

/// Token usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}
