//! Project file tools: create, read, update, and list.
//!
//! All failures are rendered as descriptive strings for the model; these
//! tools never raise past the dispatch step.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

use crate::llm::ToolDefinition;
use crate::tools::error::ToolError;
use crate::tools::executor::ToolResult;
use crate::tools::tool::Tool;

fn parse_args<'a, T: Deserialize<'a>>(arguments: &'a str) -> Result<T, ToolError> {
    serde_json::from_str(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

// ============================================================================
// create_file
// ============================================================================

pub struct CreateFileTool;

#[derive(Debug, Deserialize)]
struct CreateFileArgs {
    name: String,
    content: String,
}

#[async_trait]
impl Tool for CreateFileTool {
    fn name(&self) -> &str {
        "create_file"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "create_file",
            "Create a new file at the specified path with the given content. \
             Parent directories are created as needed. Fails if the file \
             already exists.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Path where the file should be created. Use forward slashes for path separation."
                    },
                    "content": {
                        "type": "string",
                        "description": "Full content of the file, including all necessary code and formatting."
                    }
                },
                "required": ["name", "content"]
            }),
        )
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: CreateFileArgs = parse_args(arguments)?;
        let path = Path::new(&args.name);

        if path.exists() {
            return Ok(ToolResult::error(format!(
                "Error: File '{}' already exists.",
                args.name
            )));
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return Ok(ToolResult::error(format!("Error creating file: {}", e)));
        }

        match tokio::fs::write(path, &args.content).await {
            Ok(()) => Ok(ToolResult::ok(format!(
                "File '{}' created successfully.",
                args.name
            ))),
            Err(e) => Ok(ToolResult::error(format!("Error creating file: {}", e))),
        }
    }
}

// ============================================================================
// create_folder
// ============================================================================

pub struct CreateFolderTool;

#[derive(Debug, Deserialize)]
struct CreateFolderArgs {
    path: String,
}

#[async_trait]
impl Tool for CreateFolderTool {
    fn name(&self) -> &str {
        "create_folder"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "create_folder",
            "Create a new folder at the specified path, including any missing \
             parent directories. Fails if the path already exists.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path where the folder should be created. Use forward slashes for path separation."
                    }
                },
                "required": ["path"]
            }),
        )
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: CreateFolderArgs = parse_args(arguments)?;

        if Path::new(&args.path).exists() {
            return Ok(ToolResult::error(format!(
                "Error: Folder '{}' already exists.",
                args.path
            )));
        }

        match tokio::fs::create_dir_all(&args.path).await {
            Ok(()) => Ok(ToolResult::ok(format!(
                "Folder '{}' created successfully.",
                args.path
            ))),
            Err(e) => Ok(ToolResult::error(format!("Error creating folder: {}", e))),
        }
    }
}

// ============================================================================
// list_files
// ============================================================================

pub struct ListFilesTool;

#[derive(Debug, Deserialize)]
struct ListFilesArgs {
    path: String,
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "list_files",
            "List all entries in the specified folder.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path of the folder to list."
                    }
                },
                "required": ["path"]
            }),
        )
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: ListFilesArgs = parse_args(arguments)?;

        let mut entries = match tokio::fs::read_dir(&args.path).await {
            Ok(entries) => entries,
            Err(e) => return Ok(ToolResult::error(format!("Error listing files: {}", e))),
        };

        let mut names = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => names.push(entry.file_name().to_string_lossy().into_owned()),
                Ok(None) => break,
                Err(e) => return Ok(ToolResult::error(format!("Error listing files: {}", e))),
            }
        }
        names.sort();

        Ok(ToolResult::ok(format!(
            "Files in folder '{}': {}",
            args.path,
            names.join(", ")
        )))
    }
}

// ============================================================================
// read_file
// ============================================================================

pub struct ReadFileTool;

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    path: String,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "read_file",
            "Read and return the content of the specified file.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path of the file to read."
                    }
                },
                "required": ["path"]
            }),
        )
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: ReadFileArgs = parse_args(arguments)?;

        match tokio::fs::read_to_string(&args.path).await {
            Ok(content) => Ok(ToolResult::ok(format!(
                "Content of file '{}':\n{}",
                args.path, content
            ))),
            Err(e) => Ok(ToolResult::error(format!("Error reading file: {}", e))),
        }
    }
}

// ============================================================================
// update_file
// ============================================================================

pub struct UpdateFileTool;

#[derive(Debug, Deserialize)]
struct UpdateFileArgs {
    path: String,
    content: String,
}

#[async_trait]
impl Tool for UpdateFileTool {
    fn name(&self) -> &str {
        "update_file"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "update_file",
            "Overwrite the content of an existing file. Fails if the file \
             does not exist; use create_file for new files.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path of the file to update."
                    },
                    "content": {
                        "type": "string",
                        "description": "New content of the file, replacing the previous content entirely."
                    }
                },
                "required": ["path", "content"]
            }),
        )
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: UpdateFileArgs = parse_args(arguments)?;

        // Updating a missing file is an error, not an implicit create.
        if !Path::new(&args.path).exists() {
            return Ok(ToolResult::error(format!(
                "Error: File '{}' does not exist.",
                args.path
            )));
        }

        match tokio::fs::write(&args.path, &args.content).await {
            Ok(()) => Ok(ToolResult::ok(format!(
                "File '{}' updated successfully.",
                args.path
            ))),
            Err(e) => Ok(ToolResult::error(format!("Error updating file: {}", e))),
        }
    }
}
