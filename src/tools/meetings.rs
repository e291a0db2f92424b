//! Meeting history, transcript and task-extraction tools

use super::{integer_or, required, string_schema, MockDirectory, Tool, ToolArgs, ToolError};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Phrases that mark a transcript line as a likely action item
const TASK_KEYWORDS: &[&str] = &[
    "can you", "will do", "i'll", "please", "need to", "should", "by ", "deadline",
    "take the", "handle the", "set up", "send", "coordinate", "review", "finish",
    "complete", "deliver", "prepare", "schedule",
];

pub struct ListRecentMeetingsTool {
    directory: Arc<MockDirectory>,
}

impl ListRecentMeetingsTool {
    pub fn new(directory: Arc<MockDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for ListRecentMeetingsTool {
    fn name(&self) -> &'static str {
        "list_recent_meetings"
    }

    fn description(&self) -> String {
        "List recent Teams meetings for a user within the specified timeframe.".to_string()
    }

    fn input_schema(&self) -> Value {
        string_schema(
            &[
                ("user_id", "User principal name or 'me' for the current user"),
                ("days_back", "Number of days to look back for meetings (default 7)"),
            ],
            &[],
        )
    }

    async fn run(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        // The stub history is the same for every user and window
        integer_or(self.name(), args, "days_back", 7)?;
        Ok(json!(self.directory.list_meetings()))
    }
}

pub struct GetMeetingTranscriptTool {
    directory: Arc<MockDirectory>,
}

impl GetMeetingTranscriptTool {
    pub fn new(directory: Arc<MockDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for GetMeetingTranscriptTool {
    fn name(&self) -> &'static str {
        "get_meeting_transcript"
    }

    fn description(&self) -> String {
        "Retrieve the full transcript text of a Teams meeting.".to_string()
    }

    fn input_schema(&self) -> Value {
        string_schema(
            &[("meeting_id", "The meeting ID to retrieve the transcript for")],
            &["meeting_id"],
        )
    }

    async fn run(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let meeting_id = required(self.name(), args, "meeting_id")?;
        let transcript = self
            .directory
            .transcript(meeting_id)
            .unwrap_or("No transcript available for this meeting.");
        Ok(json!({ "meeting_id": meeting_id, "transcript": transcript }))
    }
}

pub struct GetMeetingAttendeesTool {
    directory: Arc<MockDirectory>,
}

impl GetMeetingAttendeesTool {
    pub fn new(directory: Arc<MockDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for GetMeetingAttendeesTool {
    fn name(&self) -> &'static str {
        "get_meeting_attendees"
    }

    fn description(&self) -> String {
        "List all attendees of a specific Teams meeting.".to_string()
    }

    fn input_schema(&self) -> Value {
        string_schema(
            &[("meeting_id", "The meeting ID to get attendees for")],
            &["meeting_id"],
        )
    }

    async fn run(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let meeting_id = required(self.name(), args, "meeting_id")?;
        Ok(json!(self.directory.attendees(meeting_id)))
    }
}

/// Keyword-based action item extraction; the model refines the result
pub struct AnalyzeMeetingTasksTool;

#[derive(Debug, Serialize)]
struct ExtractedTask {
    speaker: String,
    task: String,
    raw_line: String,
}

fn extract_tasks(transcript: &str) -> Vec<ExtractedTask> {
    transcript
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            TASK_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .map(|line| {
            let (speaker, task) = match line.split_once(':') {
                Some((speaker, task)) => (speaker.trim(), task.trim()),
                None => ("", line.trim()),
            };
            ExtractedTask {
                speaker: speaker.to_string(),
                task: task.to_string(),
                raw_line: line.trim().to_string(),
            }
        })
        .collect()
}

#[async_trait]
impl Tool for AnalyzeMeetingTasksTool {
    fn name(&self) -> &'static str {
        "analyze_meeting_tasks"
    }

    fn description(&self) -> String {
        "Analyze a meeting transcript and extract action items, owners, and deadlines \
         using keyword matching."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        string_schema(
            &[(
                "transcript_text",
                "The raw transcript text to analyze for action items",
            )],
            &["transcript_text"],
        )
    }

    async fn run(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let transcript = required(self.name(), args, "transcript_text")?;
        let tasks = extract_tasks(transcript);
        Ok(json!({
            "total_tasks_found": tasks.len(),
            "tasks": tasks,
            "note": "Preliminary extraction based on keyword matching.",
        }))
    }
}
