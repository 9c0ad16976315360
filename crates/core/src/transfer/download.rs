//! Prefix to local directory

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::path::{local_path, relative_key};
use crate::traits::ObjectStore;

use super::{Pages, TaskOutcome, TransferOptions, TransferReport, TransferTask, run_batch};

/// Materializes every object under a prefix into a local directory tree
pub struct FolderDownloader {
    store: Arc<dyn ObjectStore>,
    options: TransferOptions,
}

impl FolderDownloader {
    pub fn new(store: Arc<dyn ObjectStore>, options: TransferOptions) -> Self {
        Self { store, options }
    }

    /// Download every object under `source_prefix` into `local_root`
    ///
    /// The full listing is gathered first, then all objects are fetched and
    /// written concurrently. Keys equal to the prefix or ending with `/` are
    /// placeholders and are recorded as skipped. Returns
    /// [`crate::Error::PartialTransfer`] if any object could not be written.
    pub async fn download_folder(
        &self,
        source_prefix: &str,
        local_root: impl AsRef<Path>,
    ) -> Result<TransferReport> {
        let local_root = local_root.as_ref();
        let mut report = TransferReport::default();
        let mut tasks = Vec::new();

        let mut pages = Pages::new(self.store.as_ref(), source_prefix, &self.options);
        loop {
            let page = match pages.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(e) => {
                    report.pages = pages.fetched();
                    return Err(e.with_report(report));
                }
            };
            for item in page.items {
                let Some(relative) = relative_key(source_prefix, &item.key) else {
                    tracing::debug!(key = %item.key, "Skipping folder marker");
                    let outcome = TaskOutcome::skipped(TransferTask::download(&item.key, local_root));
                    self.options.settled(&outcome);
                    report.record(outcome);
                    continue;
                };

                match local_path(local_root, relative) {
                    Ok(path) => tasks.push(TransferTask::download(item.key, path)),
                    Err(e) => {
                        tracing::warn!(key = %item.key, error = %e, "Rejecting key");
                        let outcome =
                            TaskOutcome::failed(TransferTask::download(&item.key, local_root), &e);
                        self.options.settled(&outcome);
                        report.record(outcome);
                    }
                }
            }
        }
        report.pages = pages.fetched();

        tracing::info!(
            prefix = source_prefix,
            root = %local_root.display(),
            objects = tasks.len(),
            pages = report.pages,
            "Downloading folder"
        );

        let outcomes = run_batch(self.store.as_ref(), &self.options, tasks).await;
        report.extend(outcomes);

        tracing::info!(
            prefix = source_prefix,
            downloaded = report.succeeded().count(),
            failed = report.failed().count(),
            bytes = report.total_bytes(),
            "Download finished"
        );
        self.options.finish(report)
    }
}
