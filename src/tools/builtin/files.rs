use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::tools::builtin::str_param;
use crate::tools::registry::Tool;

/// File operations keyed by an `action` parameter. Paths are taken as given,
/// with the process's full privileges; there is no sandbox here by design.
pub struct FileManagerTool;

#[async_trait]
impl Tool for FileManagerTool {
    fn name(&self) -> &str {
        "file_manager"
    }

    fn description(&self) -> &str {
        "Read, write, and manage files. Usage: action='read/write/list', path='file_path', content='text' (for write)"
    }

    async fn execute(&self, params: &Map<String, Value>) -> String {
        let action = str_param(params, "action").to_lowercase();
        let path = str_param(params, "path");
        let content = str_param(params, "content");

        match action.as_str() {
            "read" => read(&path),
            "write" => write(&path, &content),
            "list" => list(&path),
            _ => "Invalid action. Use 'read', 'write', or 'list'.".to_string(),
        }
    }
}

fn read(path: &str) -> String {
    if !Path::new(path).exists() {
        return format!("File {path} does not exist.");
    }
    match std::fs::read_to_string(path) {
        Ok(text) => format!("File content of {path}:\n{text}"),
        Err(e) => format!("Error: {e}"),
    }
}

fn write(path: &str, content: &str) -> String {
    match std::fs::write(path, content) {
        Ok(()) => format!("Successfully wrote to {path}"),
        Err(e) => format!("Error: {e}"),
    }
}

fn list(path: &str) -> String {
    if !Path::new(path).is_dir() {
        return format!("{path} is not a directory.");
    }
    match std::fs::read_dir(path) {
        Ok(entries) => {
            let mut names = Vec::new();
            for entry in entries {
                match entry {
                    Ok(entry) => names.push(entry.file_name().to_string_lossy().into_owned()),
                    Err(e) => return format!("Error: {e}"),
                }
            }
            names.sort();
            format!("Files in {path}:\n{}", names.join("\n"))
        }
        Err(e) => format!("Error: {e}"),
    }
}
