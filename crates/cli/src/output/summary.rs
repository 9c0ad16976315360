//! Per-command transfer summary

use std::fmt;

use osync_core::{TaskStatus, TransferReport};
use serde::Serialize;

/// What a download, copy, upload or project command did
#[derive(Debug, Serialize)]
pub struct TransferSummary {
    pub operation: &'static str,
    pub source: String,
    pub destination: String,
    pub pages: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub total_bytes: u64,
    pub total_size_human: String,
    pub failures: Vec<FailedTask>,
}

#[derive(Debug, Serialize)]
pub struct FailedTask {
    pub key: String,
    pub error: String,
}

impl TransferSummary {
    pub fn new(
        operation: &'static str,
        source: impl Into<String>,
        destination: impl Into<String>,
        report: &TransferReport,
    ) -> Self {
        let mut failures: Vec<FailedTask> = report
            .outcomes
            .iter()
            .filter_map(|outcome| match &outcome.status {
                TaskStatus::Failed { error } => Some(FailedTask {
                    key: outcome.task.key().to_string(),
                    error: error.clone(),
                }),
                _ => None,
            })
            .collect();
        failures.sort_by(|a, b| a.key.cmp(&b.key));

        let total_bytes = report.total_bytes();
        Self {
            operation,
            source: source.into(),
            destination: destination.into(),
            pages: report.pages,
            succeeded: report.succeeded().count(),
            skipped: report.skipped().count(),
            failed: failures.len(),
            cancelled: report.cancelled().count(),
            total_bytes,
            total_size_human: humansize::format_size(total_bytes, humansize::BINARY),
            failures,
        }
    }
}

impl fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}: {} succeeded",
            self.operation, self.source, self.destination, self.succeeded
        )?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.cancelled > 0 {
            write!(f, ", {} cancelled", self.cancelled)?;
        }
        if self.total_bytes > 0 {
            write!(f, " ({})", self.total_size_human)?;
        }
        for failure in &self.failures {
            write!(f, "\n  {}: {}", failure.key, failure.error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osync_core::{Error, TaskOutcome, TransferTask};

    fn report() -> TransferReport {
        let mut report = TransferReport::default();
        report.pages = 2;
        report.record(TaskOutcome::succeeded(
            TransferTask::copy("base/python/main.py", "code/abc/main.py"),
            None,
        ));
        report.record(TaskOutcome::skipped(TransferTask::copy(
            "base/python/",
            "code/abc/",
        )));
        report.record(TaskOutcome::failed(
            TransferTask::copy("base/python/lib.py", "code/abc/lib.py"),
            &Error::Network("connection reset".into()),
        ));
        report
    }

    #[test]
    fn test_summary_json() {
        let summary = TransferSummary::new("copy", "base/python/", "code/abc/", &report());
        insta::assert_json_snapshot!(summary, @r#"
        {
          "operation": "copy",
          "source": "base/python/",
          "destination": "code/abc/",
          "pages": 2,
          "succeeded": 1,
          "skipped": 1,
          "failed": 1,
          "cancelled": 0,
          "total_bytes": 0,
          "total_size_human": "0 B",
          "failures": [
            {
              "key": "base/python/lib.py",
              "error": "Network error: connection reset"
            }
          ]
        }
        "#);
    }

    #[test]
    fn test_summary_display() {
        let summary = TransferSummary::new("copy", "base/python/", "code/abc/", &report());
        assert_eq!(
            summary.to_string(),
            "copy: base/python/ -> code/abc/: 1 succeeded, 1 skipped, 1 failed\n  \
             base/python/lib.py: Network error: connection reset"
        );
    }
}
