//! Per-task outcomes and their per-operation aggregate

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Error, Result};

/// One unit of work produced from a listing or a directory walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferTask {
    /// Server-side copy between two keys
    Copy {
        source_key: String,
        destination_key: String,
    },
    /// Fetch an object into a local file
    Download {
        source_key: String,
        local_path: PathBuf,
    },
    /// Put a local file at a key
    Upload {
        local_path: PathBuf,
        destination_key: String,
    },
}

impl TransferTask {
    pub fn copy(source_key: impl Into<String>, destination_key: impl Into<String>) -> Self {
        Self::Copy {
            source_key: source_key.into(),
            destination_key: destination_key.into(),
        }
    }

    pub fn download(source_key: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self::Download {
            source_key: source_key.into(),
            local_path: local_path.into(),
        }
    }

    pub fn upload(local_path: impl Into<PathBuf>, destination_key: impl Into<String>) -> Self {
        Self::Upload {
            local_path: local_path.into(),
            destination_key: destination_key.into(),
        }
    }

    /// The object key on the store side of the task
    pub fn key(&self) -> &str {
        match self {
            Self::Copy { source_key, .. } | Self::Download { source_key, .. } => source_key,
            Self::Upload {
                destination_key, ..
            } => destination_key,
        }
    }
}

impl fmt::Display for TransferTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy {
                source_key,
                destination_key,
            } => write!(f, "{source_key} -> {destination_key}"),
            Self::Download {
                source_key,
                local_path,
            } => write!(f, "{source_key} -> {}", local_path.display()),
            Self::Upload {
                local_path,
                destination_key,
            } => write!(f, "{} -> {destination_key}", local_path.display()),
        }
    }
}

/// How a task settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Succeeded,
    /// Folder-placeholder marker, visited without side effect
    Skipped,
    Failed {
        error: String,
    },
    /// Never started because the operation was cancelled
    Cancelled,
}

/// Settled task with its status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    pub task: TransferTask,
    #[serde(flatten)]
    pub status: TaskStatus,
    /// Bytes moved through this process (not reported for server-side copies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

impl TaskOutcome {
    pub fn succeeded(task: TransferTask, bytes: Option<u64>) -> Self {
        Self {
            task,
            status: TaskStatus::Succeeded,
            bytes,
        }
    }

    pub fn skipped(task: TransferTask) -> Self {
        Self {
            task,
            status: TaskStatus::Skipped,
            bytes: None,
        }
    }

    pub fn failed(task: TransferTask, error: &Error) -> Self {
        Self {
            task,
            status: TaskStatus::Failed {
                error: error.to_string(),
            },
            bytes: None,
        }
    }

    pub fn cancelled(task: TransferTask) -> Self {
        Self {
            task,
            status: TaskStatus::Cancelled,
            bytes: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Succeeded
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, TaskStatus::Failed { .. })
    }
}

/// Aggregate of every task visited by one copy, download or upload
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferReport {
    /// Number of listing pages fetched
    pub pages: usize,
    /// Every visited object, in settle order
    pub outcomes: Vec<TaskOutcome>,
}

impl TransferReport {
    pub fn record(&mut self, outcome: TaskOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn extend(&mut self, outcomes: impl IntoIterator<Item = TaskOutcome>) {
        self.outcomes.extend(outcomes);
    }

    /// Objects visited, including skipped markers
    pub fn visited(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Skipped)
    }

    /// Tasks that never started because the operation was cancelled
    pub fn cancelled(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Cancelled)
    }

    pub fn total_bytes(&self) -> u64 {
        self.outcomes.iter().filter_map(|o| o.bytes).sum()
    }

    /// `Ok` when nothing failed, otherwise [`Error::PartialTransfer`] carrying this report
    pub fn into_result(self) -> Result<Self> {
        if self.failed().next().is_some() {
            Err(Error::PartialTransfer(Box::new(self)))
        } else {
            Ok(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> TransferReport {
        let mut report = TransferReport::default();
        report.record(TaskOutcome::succeeded(
            TransferTask::download("p/a", "/tmp/a"),
            Some(10),
        ));
        report.record(TaskOutcome::skipped(TransferTask::download("p/", "/tmp")));
        report.record(TaskOutcome::failed(
            TransferTask::download("p/b", "/tmp/b"),
            &Error::NotFound("p/b".into()),
        ));
        report
    }

    #[test]
    fn test_report_views() {
        let report = sample_report();
        assert_eq!(report.visited(), 3);
        assert_eq!(report.succeeded().count(), 1);
        assert_eq!(report.skipped().count(), 1);
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.total_bytes(), 10);
    }

    #[test]
    fn test_into_result_fails_on_any_failure() {
        let err = sample_report().into_result().unwrap_err();
        let report = err.report().expect("partial transfer carries report");
        assert_eq!(report.failed().next().unwrap().task.key(), "p/b");
    }

    #[test]
    fn test_into_result_ok_without_failures() {
        let mut report = TransferReport::default();
        report.record(TaskOutcome::succeeded(TransferTask::copy("a", "b"), None));
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = TaskOutcome::failed(
            TransferTask::copy("base/x", "code/x"),
            &Error::Network("reset".into()),
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["task"]["kind"], "copy");
        assert_eq!(json["task"]["destination_key"], "code/x");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "Network error: reset");
        assert!(json.get("bytes").is_none());
    }

    #[test]
    fn test_task_display() {
        let task = TransferTask::copy("base/python/main.py", "code/abc/main.py");
        assert_eq!(task.to_string(), "base/python/main.py -> code/abc/main.py");
    }
}
