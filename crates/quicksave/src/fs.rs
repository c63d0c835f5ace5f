//! Filesystem helpers shared across the pipeline services.
//!
//! Errors carry the operation and the path so a failed job can be reproduced
//! from its log line alone.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Convert an IO error into a pipeline error with operation + path context.
pub fn io_error(op: &'static str, path: &Path, source: std::io::Error) -> Error {
    Error::io_path(op, path, source)
}

/// Ensure a directory exists, creating it (recursively) if needed.
pub async fn ensure_dir_all(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| io_error("creating directory", path, e))
}

/// Regular files directly inside `dir`, sorted by path.
pub async fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| io_error("reading directory", dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| io_error("reading directory", dir, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| io_error("reading file type", &entry.path(), e))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}

/// Regular files anywhere below `root`, sorted by path. Symlinked
/// directories are not followed.
pub async fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| io_error("reading directory", &dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("reading directory", &dir, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| io_error("reading file type", &path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// File name of `path` as UTF-8, if it has one.
pub fn file_name_str(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_files_is_one_level() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.vtt"), "").unwrap();
        fs::write(temp_dir.path().join("a.webm"), "").unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        fs::write(temp_dir.path().join("nested/c.vtt"), "").unwrap();

        let files = list_files(temp_dir.path()).await.unwrap();
        assert_eq!(
            files,
            vec![temp_dir.path().join("a.webm"), temp_dir.path().join("b.vtt")]
        );
    }

    #[tokio::test]
    async fn test_walk_files_recurses() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("x/y")).unwrap();
        fs::write(temp_dir.path().join("top.vtt"), "").unwrap();
        fs::write(temp_dir.path().join("x/y/deep.vtt"), "").unwrap();

        let files = walk_files(temp_dir.path()).await.unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.contains(&temp_dir.path().join("x/y/deep.vtt")));
    }

    #[tokio::test]
    async fn test_missing_directory_has_context() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        let err = list_files(&missing).await.unwrap_err();
        assert!(matches!(err, Error::Io { op: "reading directory", .. }));
    }
}
