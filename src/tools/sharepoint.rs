//! Site, list and file tools

use super::{required, split_list, string_schema, MockDirectory, Tool, ToolArgs, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ListSitesTool {
    directory: Arc<MockDirectory>,
}

impl ListSitesTool {
    pub fn new(directory: Arc<MockDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for ListSitesTool {
    fn name(&self) -> &'static str {
        "list_sharepoint_sites"
    }

    fn description(&self) -> String {
        "List all SharePoint sites available in the organisation.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn run(&self, _args: &ToolArgs) -> Result<Value, ToolError> {
        Ok(json!(self.directory.list_sites()))
    }
}

pub struct CreateSiteTool {
    directory: Arc<MockDirectory>,
}

impl CreateSiteTool {
    pub fn new(directory: Arc<MockDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for CreateSiteTool {
    fn name(&self) -> &'static str {
        "create_sharepoint_site"
    }

    fn description(&self) -> String {
        "Create a new SharePoint team site with the given name and description.".to_string()
    }

    fn input_schema(&self) -> Value {
        string_schema(
            &[
                ("name", "Display name for the new SharePoint site"),
                ("description", "Description of the site's purpose"),
            ],
            &["name", "description"],
        )
    }

    async fn run(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let name = required(self.name(), args, "name")?;
        let description = args.get("description").map_or("", String::as_str);
        Ok(json!(self.directory.create_site(name, description)))
    }
}

pub struct CreateListTool {
    directory: Arc<MockDirectory>,
}

impl CreateListTool {
    pub fn new(directory: Arc<MockDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for CreateListTool {
    fn name(&self) -> &'static str {
        "create_sharepoint_list"
    }

    fn description(&self) -> String {
        "Create a new list on a SharePoint site with the specified columns.".to_string()
    }

    fn input_schema(&self) -> Value {
        string_schema(
            &[
                ("site_id", "The SharePoint site ID to create the list in"),
                ("list_name", "Name of the new list"),
                (
                    "columns",
                    "Comma-separated column names, e.g. 'Title,Status,Assignee,DueDate'",
                ),
            ],
            &["site_id", "list_name", "columns"],
        )
    }

    async fn run(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let site_id = required(self.name(), args, "site_id")?;
        let list_name = required(self.name(), args, "list_name")?;
        let columns = split_list(required(self.name(), args, "columns")?);
        Ok(self.directory.create_list(site_id, list_name, &columns))
    }
}

pub struct UploadFileTool {
    directory: Arc<MockDirectory>,
}

impl UploadFileTool {
    pub fn new(directory: Arc<MockDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for UploadFileTool {
    fn name(&self) -> &'static str {
        "upload_to_sharepoint"
    }

    fn description(&self) -> String {
        "Upload a file to a SharePoint document library folder.".to_string()
    }

    fn input_schema(&self) -> Value {
        string_schema(
            &[
                ("site_id", "The SharePoint site ID"),
                (
                    "folder_path",
                    "Destination folder path, e.g. 'Shared Documents/Reports'",
                ),
                ("file_name", "Name of the file to upload"),
            ],
            &["site_id", "folder_path", "file_name"],
        )
    }

    async fn run(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let site_id = required(self.name(), args, "site_id")?;
        let folder = required(self.name(), args, "folder_path")?;
        let file_name = required(self.name(), args, "file_name")?;
        Ok(self.directory.upload_file(site_id, folder, file_name))
    }
}
