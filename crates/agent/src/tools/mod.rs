//! Tools the model may invoke through a JSON tool call.

mod file_reader;
mod file_search;
mod notes;

pub use file_reader::FileReaderTool;
pub use file_search::FileSearchTool;
pub use notes::LoggerTool;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// A capability exposed to the model
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// Parameter name -> `{type, description, default?}`, shown to the model
    fn input_schema(&self) -> Value;

    /// Run with the model-supplied arguments; the result must be JSON
    async fn run(&self, args: Value) -> Result<Value, ToolError>;
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Access outside the workspace is not allowed: {0}")]
    OutsideWorkspace(String),
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Unknown tool: {0}")]
    NotFound(String),
    #[error("Tool failed: {0}")]
    Failed(String),
}

/// Tool description for listings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Ordered set of enabled tools
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from tool names, rooting file tools at `root`
    pub fn from_names<S: AsRef<str>>(names: &[S], root: &Path) -> Result<Self, ToolError> {
        let mut registry = Self::new();
        for name in names {
            let tool = builtin(name.as_ref(), root)
                .ok_or_else(|| ToolError::NotFound(name.as_ref().to_string()))?;
            tracing::debug!("Registered tool {}", tool.name());
            registry.register(tool);
        }
        Ok(registry)
    }

    /// Add a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn list(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Construct a built-in tool by name
pub fn builtin(name: &str, root: &Path) -> Option<Arc<dyn Tool>> {
    let root = root.to_path_buf();
    match name {
        "file_reader" => Some(Arc::new(FileReaderTool::new(root))),
        "file_search" => Some(Arc::new(FileSearchTool::new(root))),
        "logger" => Some(Arc::new(LoggerTool::new(root))),
        _ => None,
    }
}

pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("'{}' argument is required", key)))
}

/// Non-negative integer argument; numeric strings are accepted
pub(crate) fn usize_arg(args: &Value, key: &str, default: usize) -> Result<usize, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| ToolError::InvalidArguments(format!("'{}' must be a non-negative integer", key))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| ToolError::InvalidArguments(format!("'{}' must be a non-negative integer", key))),
        Some(_) => Err(ToolError::InvalidArguments(format!(
            "'{}' must be a non-negative integer",
            key
        ))),
    }
}

/// Resolve `relative` under `root`, refusing anything that escapes it.
///
/// `..` components are resolved lexically first; existing paths are then
/// canonicalized so symlinks cannot point outside the root either.
pub(crate) fn resolve_within(root: &Path, relative: &str) -> Result<PathBuf, ToolError> {
    let root = root
        .canonicalize()
        .map_err(|e| ToolError::Failed(format!("workspace root {}: {}", root.display(), e)))?;

    let mut resolved = root.clone();
    for component in Path::new(relative).components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => resolved.push(part),
            Component::ParentDir => {
                if !resolved.pop() || !resolved.starts_with(&root) {
                    return Err(ToolError::OutsideWorkspace(relative.to_string()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ToolError::OutsideWorkspace(relative.to_string()));
            }
        }
    }

    if let Ok(real) = resolved.canonicalize() {
        if !real.starts_with(&root) {
            return Err(ToolError::OutsideWorkspace(relative.to_string()));
        }
        return Ok(real);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_keeps_configured_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry =
            ToolRegistry::from_names(&["logger", "file_reader", "file_search"], dir.path()).unwrap();

        let names: Vec<String> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["logger", "file_reader", "file_search"]);
    }

    #[test]
    fn unknown_tool_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = ToolRegistry::from_names(&["shell"], dir.path());
        assert!(matches!(result, Err(ToolError::NotFound(name)) if name == "shell"));
    }

    #[test]
    fn listing_exposes_schema() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ToolRegistry::from_names(&["file_reader"], dir.path()).unwrap();
        let info = &registry.list()[0];
        assert_eq!(info.input_schema["path"]["type"], "string");
        assert_eq!(info.input_schema["max_chars"]["default"], 2000);
    }

    #[test]
    fn usize_arg_accepts_numbers_and_strings() {
        let args = json!({"a": 5, "b": "7", "c": -1});
        assert_eq!(usize_arg(&args, "a", 1).unwrap(), 5);
        assert_eq!(usize_arg(&args, "b", 1).unwrap(), 7);
        assert_eq!(usize_arg(&args, "missing", 3).unwrap(), 3);
        assert!(usize_arg(&args, "c", 1).is_err());
    }

    #[test]
    fn paths_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        assert!(resolve_within(dir.path(), "sub/../file.txt").is_ok());
        assert!(matches!(
            resolve_within(dir.path(), "../outside.txt"),
            Err(ToolError::OutsideWorkspace(_))
        ));
        assert!(matches!(
            resolve_within(dir.path(), "/etc/passwd"),
            Err(ToolError::OutsideWorkspace(_))
        ));
    }
}
