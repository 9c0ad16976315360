//! Payloads and local directories into a prefix

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::path::{join_key, relative_local_key};
use crate::traits::{ObjectInfo, ObjectStore};

use super::{TransferOptions, TransferReport, TransferTask, run_batch};

/// Guess a content type from a key or file name extension
pub fn guess_content_type(path: impl AsRef<Path>) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
}

/// Writes payloads under a folder prefix
pub struct FolderUploader {
    store: Arc<dyn ObjectStore>,
    options: TransferOptions,
}

impl FolderUploader {
    pub fn new(store: Arc<dyn ObjectStore>, options: TransferOptions) -> Self {
        Self { store, options }
    }

    /// Write `content` at `prefix + relative_path`, replacing any existing object
    ///
    /// The key is the plain concatenation of both parts; callers supply the
    /// separators they want.
    pub async fn upload_to_folder(
        &self,
        prefix: &str,
        relative_path: &str,
        content: impl Into<Vec<u8>>,
    ) -> Result<ObjectInfo> {
        if self.options.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let key = join_key(prefix, relative_path);
        if key.is_empty() {
            return Err(Error::InvalidPath("Object key cannot be empty".into()));
        }

        let info = self
            .store
            .put_object(&key, content.into(), guess_content_type(relative_path))
            .await
            .map_err(|e| Error::transfer(&key, e))?;

        tracing::debug!(key = %key, size = info.size_bytes, "Uploaded object");
        Ok(info)
    }

    /// Upload every regular file below `local_root` to `prefix + <relative path>`
    ///
    /// Relative paths always use `/`. Symlinks and other special files are
    /// ignored.
    pub async fn upload_directory(
        &self,
        local_root: impl AsRef<Path>,
        prefix: &str,
    ) -> Result<TransferReport> {
        let local_root = local_root.as_ref();
        let files = walk_files(local_root).await?;

        let tasks = files
            .into_iter()
            .map(|path| {
                let relative = relative_local_key(local_root, &path)?;
                Ok(TransferTask::upload(path, join_key(prefix, &relative)))
            })
            .collect::<Result<Vec<_>>>()?;
        self.options.listed(tasks.len());

        tracing::info!(
            root = %local_root.display(),
            prefix,
            files = tasks.len(),
            "Uploading directory"
        );

        let mut report = TransferReport::default();
        report.extend(run_batch(self.store.as_ref(), &self.options, tasks).await);

        tracing::info!(
            prefix,
            uploaded = report.succeeded().count(),
            failed = report.failed().count(),
            bytes = report.total_bytes(),
            "Upload finished"
        );
        self.options.finish(report)
    }
}

/// Regular files below `root`, sorted
async fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    let metadata = tokio::fs::metadata(root).await.map_err(|e| {
        Error::InvalidPath(format!("Cannot read {}: {e}", root.display()))
    })?;
    if !metadata.is_dir() {
        return Err(Error::InvalidPath(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            } else {
                tracing::debug!(path = %entry.path().display(), "Skipping special file");
            }
        }
    }

    files.sort();
    Ok(files)
}
