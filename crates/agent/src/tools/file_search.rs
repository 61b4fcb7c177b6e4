use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{required_str, usize_arg, Tool, ToolError};

const DEFAULT_MAX_RESULTS: usize = 20;

const TEXT_EXTENSIONS: &[&str] = &[
    "py", "md", "txt", "yaml", "yml", "json", "sh", "ps1", "ini", "cfg", "toml", "js", "ts",
    "html", "css", "rs",
];

#[derive(Debug, Serialize)]
struct SearchMatch {
    file: String,
    line: usize,
    text: String,
}

/// Case-insensitive regex search over text files in the workspace
pub struct FileSearchTool {
    root: PathBuf,
}

impl FileSearchTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Returns the matches and whether the limit cut the search short
fn search(root: &Path, pattern: &Regex, max_results: usize) -> (Vec<SearchMatch>, bool) {
    let mut matches = Vec::new();

    let files = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_text_file(e.path()));

    for entry in files {
        // Unreadable files are skipped
        let Ok(bytes) = std::fs::read(entry.path()) else {
            continue;
        };
        let text = String::from_utf8_lossy(&bytes);
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");

        for (index, line) in text.lines().enumerate() {
            if pattern.is_match(line) {
                matches.push(SearchMatch {
                    file: relative.clone(),
                    line: index + 1,
                    text: line.trim().to_string(),
                });
                if matches.len() >= max_results {
                    return (matches, true);
                }
            }
        }
    }

    (matches, false)
}

#[async_trait]
impl Tool for FileSearchTool {
    fn name(&self) -> &str {
        "file_search"
    }

    fn description(&self) -> &str {
        "Search for a string or regex pattern in workspace files and return occurrences."
    }

    fn input_schema(&self) -> Value {
        json!({
            "query": {
                "type": "string",
                "description": "String or regular expression to search for."
            },
            "max_results": {
                "type": "integer",
                "description": "Maximum number of matches to return.",
                "default": DEFAULT_MAX_RESULTS
            }
        })
    }

    async fn run(&self, args: Value) -> Result<Value, ToolError> {
        let query = required_str(&args, "query")?;
        let max_results = usize_arg(&args, "max_results", DEFAULT_MAX_RESULTS)?;
        if max_results == 0 {
            return Err(ToolError::InvalidArguments(
                "'max_results' must be at least 1".to_string(),
            ));
        }

        let pattern = RegexBuilder::new(query)
            .case_insensitive(true)
            .build()
            .map_err(|e| ToolError::InvalidArguments(format!("invalid pattern: {}", e)))?;

        let root = self.root.clone();
        let (matches, truncated) =
            tokio::task::spawn_blocking(move || search(&root, &pattern, max_results))
                .await
                .map_err(|e| ToolError::Failed(e.to_string()))?;

        Ok(json!({ "matches": matches, "truncated": truncated }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "foo bar\nhello world").unwrap();
        std::fs::write(dir.path().join("b.md"), "another FOO line\nno match").unwrap();
        std::fs::write(dir.path().join("image.png"), "foo in a binary").unwrap();
        dir
    }

    #[tokio::test]
    async fn finds_matches_in_text_files_only() {
        let dir = workspace();
        let tool = FileSearchTool::new(dir.path().to_path_buf());

        let result = tool
            .run(json!({"query": "foo", "max_results": 10}))
            .await
            .unwrap();

        let matches = result["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0]["file"], "a.txt");
        assert_eq!(matches[0]["line"], 1);
        assert_eq!(matches[1]["file"], "b.md");
        assert_eq!(matches[1]["text"], "another FOO line");
        assert_eq!(result["truncated"], false);
    }

    #[tokio::test]
    async fn stops_at_max_results() {
        let dir = workspace();
        let tool = FileSearchTool::new(dir.path().to_path_buf());

        let result = tool
            .run(json!({"query": "o", "max_results": 1}))
            .await
            .unwrap();

        assert_eq!(result["matches"].as_array().unwrap().len(), 1);
        assert_eq!(result["truncated"], true);
    }

    #[tokio::test]
    async fn searches_nested_directories() {
        let dir = workspace();
        std::fs::create_dir_all(dir.path().join("src/deep")).unwrap();
        std::fs::write(dir.path().join("src/deep/lib.rs"), "fn needle() {}").unwrap();

        let tool = FileSearchTool::new(dir.path().to_path_buf());
        let result = tool.run(json!({"query": "needle"})).await.unwrap();

        assert_eq!(result["matches"][0]["file"], "src/deep/lib.rs");
    }

    #[tokio::test]
    async fn zero_max_results_is_rejected() {
        let dir = workspace();
        let tool = FileSearchTool::new(dir.path().to_path_buf());

        let err = tool
            .run(json!({"query": "foo", "max_results": 0}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn invalid_regex_is_rejected() {
        let dir = workspace();
        let tool = FileSearchTool::new(dir.path().to_path_buf());
        let err = tool.run(json!({"query": "("})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
