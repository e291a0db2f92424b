//! Tools available to tool-using participants
//!
//! Every tool takes string arguments and returns JSON. The PM tools are backed
//! by [`MockDirectory`], an in-memory stand-in for the directory and calendar
//! service.

mod calendar;
pub mod directory;
mod documents;
mod meetings;
mod sharepoint;

pub use calendar::{CreateMeetingTool, ListUpcomingEventsTool};
pub use directory::MockDirectory;
pub use documents::{CreatePresentationTool, CreateReportTool};
pub use meetings::{
    AnalyzeMeetingTasksTool, GetMeetingAttendeesTool, GetMeetingTranscriptTool,
    ListRecentMeetingsTool,
};
pub use sharepoint::{CreateListTool, CreateSiteTool, ListSitesTool, UploadFileTool};

use crate::llm::ToolDefinition;
use crate::runtime::ToolHandler;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// String arguments as sent by the model
pub type ToolArgs = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("'{tool}' failed: {message}")]
    Failed { tool: String, message: String },
}

impl ToolError {
    pub fn invalid(tool: &str, message: impl Into<String>) -> Self {
        ToolError::InvalidArguments {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

/// A single tool
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    /// Tool description for the model
    fn description(&self) -> String;

    /// JSON schema for the arguments
    fn input_schema(&self) -> Value;

    async fn run(&self, args: &ToolArgs) -> Result<Value, ToolError>;
}

/// Required string argument
pub(crate) fn required<'a>(tool: &str, args: &'a ToolArgs, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .map(String::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ToolError::invalid(tool, format!("missing '{key}'")))
}

/// Optional integer argument with a default
pub(crate) fn integer_or(tool: &str, args: &ToolArgs, key: &str, default: u32) -> Result<u32, ToolError> {
    match args.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ToolError::invalid(tool, format!("'{key}' must be a whole number, got '{raw}'"))),
    }
}

/// Comma-separated list argument
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Object schema where every property is a described string
pub(crate) fn string_schema(properties: &[(&str, &str)], required: &[&str]) -> Value {
    let props: serde_json::Map<String, Value> = properties
        .iter()
        .map(|(name, description)| {
            (
                (*name).to_string(),
                json!({"type": "string", "description": description}),
            )
        })
        .collect();
    json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}

/// Collection of tools, dispatched by name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every PM tool over one shared directory
    pub fn pm_assistant(directory: Arc<MockDirectory>) -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(ListSitesTool::new(directory.clone())),
            Arc::new(CreateSiteTool::new(directory.clone())),
            Arc::new(CreateListTool::new(directory.clone())),
            Arc::new(UploadFileTool::new(directory.clone())),
            Arc::new(ListRecentMeetingsTool::new(directory.clone())),
            Arc::new(GetMeetingTranscriptTool::new(directory.clone())),
            Arc::new(GetMeetingAttendeesTool::new(directory.clone())),
            Arc::new(AnalyzeMeetingTasksTool),
            Arc::new(CreateMeetingTool::new(directory.clone())),
            Arc::new(ListUpcomingEventsTool::new(directory.clone())),
            Arc::new(CreateReportTool::new(directory.clone())),
            Arc::new(CreatePresentationTool::new(directory)),
        ];
        Self { tools }
    }

    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Definitions of the named tools, in the order given; unknown names are skipped
    pub fn definitions_for(&self, names: &[&str]) -> Vec<ToolDefinition> {
        let all = self.definitions();
        names
            .iter()
            .filter_map(|name| all.iter().find(|d| d.name == *name).cloned())
            .collect()
    }
}

#[async_trait]
impl ToolHandler for ToolRegistry {
    async fn invoke(&self, name: &str, args: &ToolArgs) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.run(args).await
    }
}
