//! Folder transfer engine
//!
//! [`FolderDownloader`], [`FolderCopier`] and [`FolderUploader`] turn a prefix
//! listing (or a local directory walk) into a batch of [`TransferTask`]s and run
//! each batch on the calling task with a bounded number of transfers in flight.
//!
//! Every task settles into a [`TaskOutcome`]; a batch with any failed task
//! makes the whole operation return [`Error::PartialTransfer`] once all of its
//! siblings have settled.

mod copy;
mod download;
mod report;
mod upload;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::TransferConfig;
use crate::error::{Error, Result};
use crate::fs::write_file;
use crate::traits::{ListOptions, ListResult, ObjectStore};

pub use copy::FolderCopier;
pub use download::FolderDownloader;
pub use report::{TaskOutcome, TaskStatus, TransferReport, TransferTask};
pub use upload::{FolderUploader, guess_content_type};

/// Default number of transfers in flight per batch
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Default max-keys per listing page
pub const DEFAULT_PAGE_SIZE: i32 = 1000;

/// Observer notified as listings arrive and tasks settle
pub trait TransferProgress: Send + Sync {
    /// A listing page with `count` objects was received
    fn objects_listed(&self, _count: usize) {}

    /// A task settled (in any status)
    fn task_settled(&self, outcome: &TaskOutcome);
}

/// Tuning and control shared by the folder operations
#[derive(Clone)]
pub struct TransferOptions {
    /// Maximum transfers in flight within one batch
    pub concurrency: usize,
    /// Max keys requested per listing page
    pub page_size: Option<i32>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
    progress: Option<Arc<dyn TransferProgress>>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            page_size: Some(DEFAULT_PAGE_SIZE),
            cancel: CancellationToken::new(),
            deadline: None,
            progress: None,
        }
    }
}

impl std::fmt::Debug for TransferOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferOptions")
            .field("concurrency", &self.concurrency)
            .field("page_size", &self.page_size)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("deadline", &self.deadline)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl TransferOptions {
    /// Build options from the `[transfer]` config section
    pub fn from_config(config: &TransferConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            page_size: Some(config.page_size),
            ..Default::default()
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Stop issuing listings and transfers once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Stop issuing listings and transfers after `timeout` has elapsed
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn TransferProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Token observed by every operation using these options
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn listed(&self, count: usize) {
        if let Some(progress) = &self.progress {
            progress.objects_listed(count);
        }
    }

    fn settled(&self, outcome: &TaskOutcome) {
        if let Some(progress) = &self.progress {
            progress.task_settled(outcome);
        }
    }

    /// Turn a finished report into the operation result
    fn finish(&self, report: TransferReport) -> Result<TransferReport> {
        if self.is_cancelled() {
            return Err(Error::Cancelled.with_report(report));
        }
        report.into_result()
    }
}

/// Page-at-a-time walk over a prefix listing
///
/// Each request carries the token returned by the page before it. A truncated
/// page without a token, or one repeating the token just sent, ends the walk
/// with [`Error::Listing`] instead of looping or stopping short.
pub struct Pages<'a> {
    store: &'a dyn ObjectStore,
    prefix: &'a str,
    options: &'a TransferOptions,
    next_token: Option<String>,
    done: bool,
    fetched: usize,
}

impl<'a> Pages<'a> {
    pub fn new(store: &'a dyn ObjectStore, prefix: &'a str, options: &'a TransferOptions) -> Self {
        Self {
            store,
            prefix,
            options,
            next_token: None,
            done: false,
            fetched: 0,
        }
    }

    /// The next page, or `None` once the listing is exhausted
    pub async fn next_page(&mut self) -> Result<Option<ListResult>> {
        if self.done {
            return Ok(None);
        }
        if self.options.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let sent_token = self.next_token.take();
        let request = ListOptions {
            max_keys: self.options.page_size,
            continuation_token: sent_token.clone(),
        };

        let page = self
            .store
            .list_objects(self.prefix, request)
            .await
            .map_err(|e| match e {
                Error::Listing(_) | Error::Cancelled => e,
                other => Error::Listing(format!("{}: {other}", self.prefix)),
            })?;
        self.fetched += 1;

        tracing::debug!(
            prefix = self.prefix,
            page = self.fetched,
            objects = page.items.len(),
            truncated = page.truncated,
            "Listed page"
        );

        if page.items.is_empty() || !page.truncated {
            self.done = true;
        } else {
            match &page.continuation_token {
                None => {
                    return Err(Error::Listing(format!(
                        "{}: truncated page {} carried no continuation token",
                        self.prefix, self.fetched
                    )));
                }
                Some(token) if sent_token.as_ref() == Some(token) => {
                    return Err(Error::Listing(format!(
                        "{}: store repeated continuation token on page {}",
                        self.prefix, self.fetched
                    )));
                }
                Some(token) => self.next_token = Some(token.clone()),
            }
        }

        self.options.listed(page.items.len());
        Ok(Some(page))
    }

    /// Pages received so far
    pub fn fetched(&self) -> usize {
        self.fetched
    }
}

/// Run every task, at most `options.concurrency` at a time, until all settle
///
/// Tasks that have not started when the operation is cancelled settle as
/// [`TaskStatus::Cancelled`]; tasks already in flight run to completion.
async fn run_batch(
    store: &dyn ObjectStore,
    options: &TransferOptions,
    tasks: Vec<TransferTask>,
) -> Vec<TaskOutcome> {
    let semaphore = Semaphore::new(options.concurrency.max(1));

    let pending = tasks.into_iter().map(|task| {
        let semaphore = &semaphore;
        async move {
            let outcome = match semaphore.acquire().await {
                Ok(_permit) if !options.is_cancelled() => match execute(store, &task).await {
                    Ok(bytes) => {
                        tracing::debug!(%task, "Transfer complete");
                        TaskOutcome::succeeded(task, bytes)
                    }
                    Err(e) => {
                        tracing::warn!(%task, error = %e, "Transfer failed");
                        TaskOutcome::failed(task, &e)
                    }
                },
                _ => TaskOutcome::cancelled(task),
            };
            options.settled(&outcome);
            outcome
        }
    });

    join_all(pending).await
}

/// Perform a single task, returning the bytes that passed through this process
async fn execute(store: &dyn ObjectStore, task: &TransferTask) -> Result<Option<u64>> {
    match task {
        TransferTask::Copy {
            source_key,
            destination_key,
        } => {
            store
                .copy_object(source_key, destination_key)
                .await
                .map_err(|e| Error::transfer(source_key, e))?;
            Ok(None)
        }
        TransferTask::Download {
            source_key,
            local_path,
        } => {
            let data = store
                .get_object(source_key)
                .await
                .map_err(|e| Error::transfer(source_key, e))?;
            write_file(local_path, &data).await?;
            Ok(Some(data.len() as u64))
        }
        TransferTask::Upload {
            local_path,
            destination_key,
        } => {
            let data = tokio::fs::read(local_path)
                .await
                .map_err(|e| Error::transfer(destination_key, e))?;
            let size = data.len() as u64;
            store
                .put_object(destination_key, data, guess_content_type(local_path))
                .await
                .map_err(|e| Error::transfer(destination_key, e))?;
            Ok(Some(size))
        }
    }
}
