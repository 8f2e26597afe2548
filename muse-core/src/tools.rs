//! Project-rooted file capability.
//!
//! The workspace is the only file surface exposed to oracle-driven
//! callers, so boundary violations come back as descriptive strings
//! instead of errors - a non-deterministic caller cannot be trusted to
//! catch anything. The engine itself uses the typed `try_*` layer and
//! propagates real IO faults.

use crate::error::WorkspaceError;
use chrono::Local;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Write behavior for [`Workspace::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the file's contents.
    Overwrite,
    /// Append to the file, creating it if missing.
    Append,
}

/// A file capability confined to one project root.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create a workspace rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a caller-supplied path against the root, refusing
    /// absolute paths and any path that escapes the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, WorkspaceError> {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            return Err(WorkspaceError::Refused(
                "Refusing to access absolute paths. Use relative paths like 'stories/file.txt'"
                    .to_string(),
            ));
        }
        if candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(WorkspaceError::Refused(
                "Cannot access paths outside the project directory.".to_string(),
            ));
        }
        Ok(self.root.join(candidate))
    }

    /// Read a file, or `None` if it does not exist.
    pub async fn try_read(&self, path: &str) -> Result<Option<String>, WorkspaceError> {
        let resolved = self.resolve(path)?;
        match fs::read_to_string(&resolved).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a file, creating parent directories as needed. Returns the
    /// number of bytes written.
    pub async fn try_write(
        &self,
        path: &str,
        content: &str,
        mode: WriteMode,
    ) -> Result<usize, WorkspaceError> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).await?;
        }

        match mode {
            WriteMode::Overwrite => fs::write(&resolved, content).await?,
            WriteMode::Append => {
                let mut existing = match fs::read_to_string(&resolved).await {
                    Ok(text) => text,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
                    Err(e) => return Err(e.into()),
                };
                existing.push_str(content);
                fs::write(&resolved, existing).await?;
            }
        }

        Ok(content.len())
    }

    /// Read a file for an oracle-driven caller. Missing files and
    /// boundary violations come back as sentinel strings.
    pub async fn read(&self, path: &str) -> String {
        match self.try_read(path).await {
            Ok(Some(content)) => content,
            Ok(None) => format!("{path} does not exist."),
            Err(WorkspaceError::Refused(msg)) => msg,
            Err(e) => format!("Error reading {path}: {e}"),
        }
    }

    /// Write a file for an oracle-driven caller. Returns a confirmation
    /// or refusal string, never an error.
    pub async fn write(&self, path: &str, content: &str, mode: WriteMode) -> String {
        match self.try_write(path, content, mode).await {
            Ok(bytes) => format!("Wrote {bytes} chars to {path}"),
            Err(WorkspaceError::Refused(msg)) => msg,
            Err(e) => format!("Error writing {path}: {e}"),
        }
    }

    /// List a directory's contents for an oracle-driven caller.
    pub async fn list(&self, dir: &str) -> String {
        let resolved = match self.resolve(dir) {
            Ok(p) => p,
            Err(WorkspaceError::Refused(msg)) => return msg,
            Err(e) => return format!("Error listing {dir}: {e}"),
        };

        let mut entries = match fs::read_dir(&resolved).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return format!("Directory {dir} does not exist.");
            }
            Err(e) => return format!("Error listing {dir}: {e}"),
        };

        let mut listing = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            match entry.metadata().await {
                Ok(meta) if meta.is_dir() => listing.push(format!("{name}/ (directory)")),
                Ok(meta) => listing.push(format!("{name} ({} bytes)", meta.len())),
                Err(_) => listing.push(name),
            }
        }

        if listing.is_empty() {
            return format!("No files found in {dir}");
        }

        listing.sort();
        format!("Contents of {dir}:\n{}", listing.join("\n"))
    }
}

/// Current local time as `YYYY-MM-DD_HH-MM-SS`, for story filenames.
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}
