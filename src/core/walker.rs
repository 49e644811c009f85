//! Text file discovery under a subtree.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Extensions (lowercase, without the dot) treated as rewritable text.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "kt",
    "java",
    "xml",
    "gradle",
    "properties",
    "txt",
    "md",
    "dart",
];

pub fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Collect every text file under `root`, in directory traversal order.
///
/// Symlinked directories are not followed. Unreadable directories are errors.
pub fn walk_text_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_recursive(root, &mut files)?;
    Ok(files)
}

fn walk_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("list {}", dir.display())))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("list {}", dir.display())))
        })?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("stat {}", path.display())))
        })?;

        if file_type.is_dir() {
            walk_recursive(&path, files)?;
        } else if (file_type.is_file() || (file_type.is_symlink() && path.is_file()))
            && is_text_file(&path)
        {
            files.push(path);
        }
    }

    Ok(())
}

/// Path of `path` relative to `root`, always `/`-separated.
pub fn relative_display(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
