//! Progress bar for folder transfers
//!
//! The bar's length grows as listing pages arrive and advances once per
//! settled task, so it works for copies whose total is only known at the end.

use osync_core::{TaskOutcome, TransferProgress};

use super::OutputConfig;

const TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Progress bar wrapper
///
/// Hidden in quiet or JSON mode and with `--no-progress`.
#[derive(Debug)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a bar with an initial length of `total` tasks
    pub fn new(config: &OutputConfig, total: u64) -> Self {
        let bar = if config.quiet || config.json || config.no_progress {
            None
        } else {
            let bar = indicatif::ProgressBar::new(total);
            if let Ok(style) = indicatif::ProgressStyle::with_template(TEMPLATE) {
                bar.set_style(style.progress_chars("#>-"));
            }
            Some(bar)
        };

        Self { bar }
    }

    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }

    #[cfg(test)]
    fn counts(&self) -> Option<(u64, Option<u64>)> {
        self.bar.as_ref().map(|bar| (bar.position(), bar.length()))
    }
}

impl TransferProgress for ProgressBar {
    fn objects_listed(&self, count: usize) {
        if let Some(bar) = &self.bar {
            bar.inc_length(count as u64);
        }
    }

    fn task_settled(&self, outcome: &TaskOutcome) {
        if let Some(bar) = &self.bar {
            bar.set_message(outcome.task.key().to_string());
            bar.inc(1);
        }
    }
}
