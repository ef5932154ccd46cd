//! Workspace file tools
//!
//! Every path is resolved lexically under the workspace directory. Absolute
//! paths and `..` segments that climb above the workspace root are refused.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::core::{AideError, Result, ToolCategory, ToolDefinition};
use crate::tools::registry::ToolRegistry;

const MAX_READ_BYTES: u64 = 1_000_000;

fn default_path() -> String {
    ".".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListFilesArgs {
    #[serde(default = "default_path")]
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteFileArgs {
    pub path: String,
    pub content: String,
}

/// Sandboxed view of the workspace directory
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a workspace-relative path to a real path inside the root
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => parts.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if parts.pop().is_none() {
                        return Err(AideError::WorkspaceEscape);
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(AideError::WorkspaceEscape);
                }
            }
        }

        fs::create_dir_all(&self.root)?;
        let mut resolved = self.root.clone();
        resolved.extend(parts);
        Ok(resolved)
    }

    pub fn list(&self, args: ListFilesArgs) -> Result<String> {
        let path = args.path;
        let target = self.resolve(&path)?;

        if !target.exists() {
            return Ok(format!("Path '{}' does not exist.", path));
        }
        if target.is_file() {
            let size = target.metadata()?.len();
            return Ok(format!("{} (file, {} bytes)", path, size));
        }

        let mut items: Vec<(bool, String, u64)> = Vec::new();
        for entry in fs::read_dir(&target)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            items.push((
                metadata.is_file(),
                entry.file_name().to_string_lossy().into_owned(),
                metadata.len(),
            ));
        }
        if items.is_empty() {
            return Ok(format!("Directory '{}' is empty.", path));
        }
        // Directories first, then by name
        items.sort();

        let mut lines = vec![format!("Contents of '{}':", path)];
        for (is_file, name, size) in items {
            if is_file {
                lines.push(format!("  📄 {} ({} bytes)", name, size));
            } else {
                lines.push(format!("  📁 {}/", name));
            }
        }
        Ok(lines.join("\n"))
    }

    pub fn read(&self, args: PathArgs) -> Result<String> {
        let target = self.resolve(&args.path)?;

        if !target.exists() {
            return Ok(format!("File '{}' does not exist.", args.path));
        }
        if target.is_dir() {
            return Ok(format!("'{}' is a directory, not a file.", args.path));
        }
        if target.metadata()?.len() > MAX_READ_BYTES {
            return Ok(format!("File '{}' is too large to read (>1MB).", args.path));
        }

        let bytes = fs::read(&target)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn write(&self, args: WriteFileArgs) -> Result<String> {
        let target = self.resolve(&args.path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &args.content)?;
        Ok(format!(
            "File '{}' written ({} characters).",
            args.path,
            args.content.chars().count()
        ))
    }

    pub fn delete(&self, args: PathArgs) -> Result<String> {
        let target = self.resolve(&args.path)?;
        if target == self.root {
            return Err(AideError::tool("Refusing to delete the workspace root."));
        }

        if !target.exists() {
            return Ok(format!("'{}' does not exist.", args.path));
        }
        if target.is_dir() {
            fs::remove_dir_all(&target)?;
            return Ok(format!("Directory '{}' deleted.", args.path));
        }
        fs::remove_file(&target)?;
        Ok(format!("File '{}' deleted.", args.path))
    }
}

/// Register the workspace file tools
pub fn register(registry: &mut ToolRegistry, workspace_dir: &Path) -> Result<()> {
    let workspace = Arc::new(Workspace::new(workspace_dir));

    let w = workspace.clone();
    registry.register_typed(
        ToolDefinition::new(
            "list_files",
            "List files and folders in the user's workspace.",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Relative path within workspace (default '.')"}
                }
            }),
        ),
        ToolCategory::Files,
        move |args: ListFilesArgs| w.list(args),
    )?;

    let w = workspace.clone();
    registry.register_typed(
        ToolDefinition::new(
            "read_file",
            "Read the contents of a file from the workspace.",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Relative path within workspace"}
                },
                "required": ["path"]
            }),
        ),
        ToolCategory::Files,
        move |args: PathArgs| w.read(args),
    )?;

    let w = workspace.clone();
    registry.register_typed(
        ToolDefinition::new(
            "write_file",
            "Write or overwrite a file in the workspace.",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "content": {"type": "string"}
                },
                "required": ["path", "content"]
            }),
        ),
        ToolCategory::Files,
        move |args: WriteFileArgs| w.write(args),
    )?;

    let w = workspace;
    registry.register_typed(
        ToolDefinition::new(
            "delete_file",
            "Delete a file or directory from the workspace.",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"}
                },
                "required": ["path"]
            }),
        ),
        ToolCategory::Files,
        move |args: PathArgs| w.delete(args),
    )?;

    Ok(())
}
