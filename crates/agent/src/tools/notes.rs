use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

use super::{required_str, Tool, ToolError};

const NOTES_FILE: &str = "notes.txt";

/// Appends timestamped notes to `notes.txt` in the workspace
pub struct LoggerTool {
    root: PathBuf,
}

impl LoggerTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Tool for LoggerTool {
    fn name(&self) -> &str {
        "logger"
    }

    fn description(&self) -> &str {
        "Append a note to notes.txt in the workspace."
    }

    fn input_schema(&self) -> Value {
        json!({
            "note": {
                "type": "string",
                "description": "The note to append."
            }
        })
    }

    async fn run(&self, args: Value) -> Result<Value, ToolError> {
        let note = required_str(&args, "note")?;
        let entry = format!("[{}] {}\n", chrono::Local::now().to_rfc3339(), note);

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(NOTES_FILE))
            .await
            .map_err(|e| ToolError::Failed(format!("{}: {}", NOTES_FILE, e)))?;
        file.write_all(entry.as_bytes())
            .await
            .map_err(|e| ToolError::Failed(format!("{}: {}", NOTES_FILE, e)))?;
        // tokio completes file writes on a blocking task; wait for it
        file.flush()
            .await
            .map_err(|e| ToolError::Failed(format!("{}: {}", NOTES_FILE, e)))?;

        Ok(json!({ "path": NOTES_FILE, "note": note }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_notes() {
        let dir = tempfile::tempdir().unwrap();
        let tool = LoggerTool::new(dir.path().to_path_buf());

        let result = tool.run(json!({"note": "first"})).await.unwrap();
        tool.run(json!({"note": "second"})).await.unwrap();

        assert_eq!(result["path"], "notes.txt");
        let contents = std::fs::read_to_string(dir.path().join("notes.txt")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
        assert!(lines[1].ends_with("] second"));
    }

    #[tokio::test]
    async fn note_is_on_disk_when_run_returns() {
        let dir = tempfile::tempdir().unwrap();
        let tool = LoggerTool::new(dir.path().to_path_buf());

        for i in 0..50 {
            let note = format!("note {}", i);
            tool.run(json!({ "note": note })).await.unwrap();

            let contents = std::fs::read_to_string(dir.path().join("notes.txt")).unwrap();
            assert_eq!(contents.lines().count(), i + 1);
            assert!(contents.ends_with(&format!("] {}\n", note)));
        }
    }

    #[tokio::test]
    async fn empty_note_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tool = LoggerTool::new(dir.path().to_path_buf());
        assert!(tool.run(json!({"note": ""})).await.is_err());
    }
}
