//! Local directory materialization

use std::path::Path;

use crate::error::{Error, Result};

/// Create `path` and every missing ancestor
///
/// Succeeds when the directory already exists, including when another task
/// creates it concurrently.
pub async fn ensure_directory(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| Error::Directory {
            path: path.to_path_buf(),
            source,
        })
}

/// Write `data` to `path`, creating the parent directory first
///
/// Any existing file at `path` is replaced.
pub async fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent).await?;
    }
    tokio::fs::write(path, data).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ensure_directory_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");

        ensure_directory(&dir).await.unwrap();
        ensure_directory(&dir).await.unwrap();

        assert!(dir.is_dir());
        let entries: Vec<_> = std::fs::read_dir(temp.path().join("a")).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_directory_concurrent_shared_ancestors() {
        let temp = TempDir::new().unwrap();
        let left = temp.path().join("shared").join("deep").join("left");
        let right = temp.path().join("shared").join("deep").join("right");
        let same = temp.path().join("shared").join("deep").join("left");

        let (a, b, c) = tokio::join!(
            ensure_directory(&left),
            ensure_directory(&right),
            ensure_directory(&same)
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        assert!(left.is_dir());
        assert!(right.is_dir());
    }

    #[tokio::test]
    async fn test_ensure_directory_reports_path_on_failure() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("blocker");
        std::fs::write(&file, b"x").unwrap();

        let err = ensure_directory(&file.join("child")).await.unwrap_err();
        assert!(matches!(err, Error::Directory { .. }));
        assert!(err.to_string().contains("blocker"));
    }

    #[tokio::test]
    async fn test_write_file_overwrites() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("main.py");

        write_file(&path, b"print(1)").await.unwrap();
        write_file(&path, b"print(2)").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"print(2)");
    }
}
