//! Prefix to prefix server-side copy

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::path::rewrite_prefix;
use crate::traits::ObjectStore;

use super::{Pages, TransferOptions, TransferReport, TransferTask, run_batch};

/// Mirrors every object under one prefix to another prefix in the same bucket
pub struct FolderCopier {
    store: Arc<dyn ObjectStore>,
    options: TransferOptions,
}

impl FolderCopier {
    pub fn new(store: Arc<dyn ObjectStore>, options: TransferOptions) -> Self {
        Self { store, options }
    }

    /// Copy every object under `source_prefix` to `destination_prefix`
    ///
    /// Pages are processed one at a time: all copies for a page settle before
    /// the next page is requested with that page's continuation token. Copying
    /// an empty or missing folder succeeds with zero transfers.
    ///
    /// The destination may not lie under the source, since fresh copies would
    /// then show up in later pages of the same listing.
    pub async fn copy_folder(
        &self,
        source_prefix: &str,
        destination_prefix: &str,
    ) -> Result<TransferReport> {
        if destination_prefix.starts_with(source_prefix) {
            return Err(Error::InvalidPath(format!(
                "Destination '{destination_prefix}' lies inside source '{source_prefix}'"
            )));
        }

        tracing::info!(
            source = source_prefix,
            destination = destination_prefix,
            "Copying folder"
        );

        let mut report = TransferReport::default();
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
            let tasks: Vec<TransferTask> = page
                .items
                .into_iter()
                .map(|item| {
                    let destination = rewrite_prefix(&item.key, source_prefix, destination_prefix);
                    TransferTask::copy(item.key, destination)
                })
                .collect();

            let outcomes = run_batch(self.store.as_ref(), &self.options, tasks).await;
            report.extend(outcomes);
        }
        report.pages = pages.fetched();

        tracing::info!(
            source = source_prefix,
            destination = destination_prefix,
            copied = report.succeeded().count(),
            failed = report.failed().count(),
            pages = report.pages,
            "Copy finished"
        );
        self.options.finish(report)
    }
}
