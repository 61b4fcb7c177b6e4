use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use super::{required_str, resolve_within, usize_arg, Tool, ToolError};

const DEFAULT_MAX_CHARS: usize = 2000;

/// Longest UTF-8 encoding of a single character
const MAX_UTF8_BYTES: usize = 4;

/// Reads a file inside the workspace, truncated to `max_chars` characters
pub struct FileReaderTool {
    root: PathBuf,
}

impl FileReaderTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

/// Read only as many bytes as `max_chars` characters can occupy
async fn read_prefix(path: &Path, max_chars: usize) -> std::io::Result<Vec<u8>> {
    let limit = max_chars.saturating_mul(MAX_UTF8_BYTES) as u64;
    let file = tokio::fs::File::open(path).await?;

    let mut bytes = Vec::new();
    file.take(limit).read_to_end(&mut bytes).await?;
    Ok(bytes)
}

#[async_trait]
impl Tool for FileReaderTool {
    fn name(&self) -> &str {
        "file_reader"
    }

    fn description(&self) -> &str {
        "Read the contents of a file within the workspace given its relative path."
    }

    fn input_schema(&self) -> Value {
        json!({
            "path": {
                "type": "string",
                "description": "Relative path to the file (relative to the workspace root)."
            },
            "max_chars": {
                "type": "integer",
                "description": "Optional limit on the number of characters to return.",
                "default": DEFAULT_MAX_CHARS
            }
        })
    }

    async fn run(&self, args: Value) -> Result<Value, ToolError> {
        let path = required_str(&args, "path")?;
        let max_chars = usize_arg(&args, "max_chars", DEFAULT_MAX_CHARS)?;

        let resolved = resolve_within(&self.root, path)?;
        if !resolved.is_file() {
            return Err(ToolError::FileNotFound(path.to_string()));
        }

        let bytes = read_prefix(&resolved, max_chars)
            .await
            .map_err(|e| ToolError::Failed(format!("{}: {}", path, e)))?;
        let text = String::from_utf8_lossy(&bytes);
        let content: String = text.chars().take(max_chars).collect();
        let truncated = content.chars().count() >= max_chars;

        Ok(json!({ "content": content, "truncated": truncated }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_small_file_whole() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "Hello world").unwrap();

        let tool = FileReaderTool::new(dir.path().to_path_buf());
        let result = tool.run(json!({"path": "hello.txt"})).await.unwrap();

        assert_eq!(result["content"], "Hello world");
        assert_eq!(result["truncated"], false);
    }

    #[tokio::test]
    async fn truncates_to_max_chars() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("long.txt"), "abcdefghij").unwrap();

        let tool = FileReaderTool::new(dir.path().to_path_buf());
        let result = tool
            .run(json!({"path": "long.txt", "max_chars": 4}))
            .await
            .unwrap();

        assert_eq!(result["content"], "abcd");
        assert_eq!(result["truncated"], true);
    }

    #[tokio::test]
    async fn large_file_is_read_only_up_to_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.log");
        std::fs::write(&path, "x".repeat(4 * 1024 * 1024)).unwrap();

        let bytes = read_prefix(&path, 10).await.unwrap();
        assert!(bytes.len() <= 10 * MAX_UTF8_BYTES);

        let tool = FileReaderTool::new(dir.path().to_path_buf());
        let result = tool
            .run(json!({"path": "big.log", "max_chars": 10}))
            .await
            .unwrap();
        assert_eq!(result["content"], "x".repeat(10));
        assert_eq!(result["truncated"], true);
    }

    #[tokio::test]
    async fn multibyte_text_keeps_whole_characters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wide.txt"), "a€€€€€€").unwrap();

        let tool = FileReaderTool::new(dir.path().to_path_buf());
        let result = tool
            .run(json!({"path": "wide.txt", "max_chars": 4}))
            .await
            .unwrap();
        assert_eq!(result["content"], "a€€€");
        assert_eq!(result["truncated"], true);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FileReaderTool::new(dir.path().to_path_buf());

        let err = tool.run(json!({"path": "nope.txt"})).await.unwrap_err();
        assert!(matches!(err, ToolError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn escaping_the_workspace_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "s3cret").unwrap();

        let tool = FileReaderTool::new(root);
        let err = tool.run(json!({"path": "../secret.txt"})).await.unwrap_err();
        assert!(matches!(err, ToolError::OutsideWorkspace(_)));
    }

    #[tokio::test]
    async fn path_is_required() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FileReaderTool::new(dir.path().to_path_buf());
        let err = tool.run(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
