//! Calendar tools

use super::{integer_or, required, split_list, string_schema, MockDirectory, Tool, ToolArgs, ToolError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use serde_json::{json, Value};
use std::sync::Arc;

/// Accepts RFC 3339 or a bare local timestamp with or without seconds
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

pub struct CreateMeetingTool {
    directory: Arc<MockDirectory>,
}

impl CreateMeetingTool {
    pub fn new(directory: Arc<MockDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for CreateMeetingTool {
    fn name(&self) -> &'static str {
        "create_meeting"
    }

    fn description(&self) -> String {
        "Create a new calendar event with a Teams meeting link.".to_string()
    }

    fn input_schema(&self) -> Value {
        string_schema(
            &[
                ("subject", "Meeting title / subject line"),
                (
                    "start_time",
                    "Start time in ISO 8601 format, e.g. '2026-02-20T10:00:00'",
                ),
                (
                    "end_time",
                    "End time in ISO 8601 format, e.g. '2026-02-20T11:00:00'",
                ),
                ("attendees", "Comma-separated email addresses of attendees"),
            ],
            &["subject", "start_time", "end_time", "attendees"],
        )
    }

    async fn run(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let subject = required(self.name(), args, "subject")?;
        let start_raw = required(self.name(), args, "start_time")?;
        let end_raw = required(self.name(), args, "end_time")?;
        let attendees = split_list(required(self.name(), args, "attendees")?);

        let start = parse_timestamp(start_raw).ok_or_else(|| {
            ToolError::invalid(self.name(), format!("start_time '{start_raw}' is not ISO 8601"))
        })?;
        let end = parse_timestamp(end_raw).ok_or_else(|| {
            ToolError::invalid(self.name(), format!("end_time '{end_raw}' is not ISO 8601"))
        })?;
        if end <= start {
            return Err(ToolError::invalid(
                self.name(),
                "end_time must be after start_time",
            ));
        }

        tracing::debug!(subject, attendees = attendees.len(), "Creating meeting");
        Ok(json!(self
            .directory
            .create_event(subject, start, end, attendees)))
    }
}

pub struct ListUpcomingEventsTool {
    directory: Arc<MockDirectory>,
}

impl ListUpcomingEventsTool {
    pub fn new(directory: Arc<MockDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for ListUpcomingEventsTool {
    fn name(&self) -> &'static str {
        "list_upcoming_events"
    }

    fn description(&self) -> String {
        "List upcoming calendar events for a user within the specified timeframe.".to_string()
    }

    fn input_schema(&self) -> Value {
        string_schema(
            &[
                ("user_id", "User principal name or 'me' for the current user"),
                ("days_ahead", "Number of days to look ahead (default 7)"),
            ],
            &[],
        )
    }

    async fn run(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let days_ahead = integer_or(self.name(), args, "days_ahead", 7)?;
        Ok(json!(self.directory.list_events(days_ahead)))
    }
}
