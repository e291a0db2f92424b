//! Trait abstractions for runtime I/O
//!
//! The chat client trait lives in [`crate::llm`]; tools are reached through
//! [`ToolHandler`] so the executor can be tested with mocks.

use crate::tools::{ToolArgs, ToolError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Runs tools by name
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run one tool with string arguments
    async fn invoke(&self, name: &str, args: &ToolArgs) -> Result<Value, ToolError>;
}

#[async_trait]
impl<T: ToolHandler + ?Sized> ToolHandler for Arc<T> {
    async fn invoke(&self, name: &str, args: &ToolArgs) -> Result<Value, ToolError> {
        (**self).invoke(name, args).await
    }
}

/// Handler for registries with only plain participants
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTools;

#[async_trait]
impl ToolHandler for NoTools {
    async fn invoke(&self, name: &str, _args: &ToolArgs) -> Result<Value, ToolError> {
        Err(ToolError::UnknownTool(name.to_string()))
    }
}
