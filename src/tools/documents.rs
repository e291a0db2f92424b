//! Report and presentation tools
//!
//! Documents are described, not rendered: the result carries the reserved
//! file name and what would have been written.

use super::{required, string_schema, MockDirectory, Tool, ToolArgs, ToolError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct ReportData {
    #[serde(default)]
    headers: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Slide {
    #[serde(default)]
    title: String,
    #[serde(default)]
    bullets: Vec<String>,
}

pub struct CreateReportTool {
    directory: Arc<MockDirectory>,
}

impl CreateReportTool {
    pub fn new(directory: Arc<MockDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for CreateReportTool {
    fn name(&self) -> &'static str {
        "create_xlsx_report"
    }

    fn description(&self) -> String {
        "Create an Excel report (.xlsx) from the provided data and return the file name."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        string_schema(
            &[
                ("title", "Report title that appears in the header"),
                (
                    "data_json",
                    "JSON string with 'headers' (list of column names) and 'rows' (list of lists). \
                     Example: {\"headers\":[\"Task\",\"Owner\"],\"rows\":[[\"Auth\",\"Bob\"]]}",
                ),
            ],
            &["title", "data_json"],
        )
    }

    async fn run(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let title = required(self.name(), args, "title")?;
        let data: ReportData = serde_json::from_str(required(self.name(), args, "data_json")?)
            .map_err(|e| ToolError::invalid(self.name(), format!("data_json: {e}")))?;

        if let Some(row) = data.rows.iter().find(|r| r.len() > data.headers.len()) {
            return Err(ToolError::invalid(
                self.name(),
                format!(
                    "row has {} cells but there are only {} headers",
                    row.len(),
                    data.headers.len()
                ),
            ));
        }

        Ok(json!({
            "status": "success",
            "file_name": self.directory.document_name("report", "xlsx"),
            "title": title,
            "sheets": ["Project Report"],
            "columns": data.headers,
            "row_count": data.rows.len(),
        }))
    }
}

pub struct CreatePresentationTool {
    directory: Arc<MockDirectory>,
}

impl CreatePresentationTool {
    pub fn new(directory: Arc<MockDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for CreatePresentationTool {
    fn name(&self) -> &'static str {
        "create_pptx_presentation"
    }

    fn description(&self) -> String {
        "Create a PowerPoint presentation (.pptx) with a title slide and content slides."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        string_schema(
            &[
                ("title", "Presentation title for the title slide"),
                ("subtitle", "Subtitle or project name"),
                (
                    "slides_json",
                    "JSON array of slide objects, each with 'title' and 'bullets' (list of strings)",
                ),
            ],
            &["title"],
        )
    }

    async fn run(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let title = required(self.name(), args, "title")?;
        let subtitle = args
            .get("subtitle")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or("Project Summary");
        let slides: Vec<Slide> = match args.get("slides_json").map(|s| s.trim()) {
            None | Some("") => Vec::new(),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| ToolError::invalid(self.name(), format!("slides_json: {e}")))?,
        };

        let outline: Vec<Value> = slides
            .iter()
            .map(|s| json!({ "title": s.title, "bullets": s.bullets.len() }))
            .collect();

        Ok(json!({
            "status": "success",
            "file_name": self.directory.document_name("presentation", "pptx"),
            "title": title,
            "subtitle": subtitle,
            "slide_count": 1 + slides.len(),
            "outline": outline,
        }))
    }
}
