//! ls command - List every object under a prefix
//!
//! The listing is flat: nested keys are shown with their full names.

use clap::Args;
use osync_core::{ObjectInfo, ObjectStore, Pages, TransferOptions};
use serde::Serialize;

use super::Session;
use crate::exit_code::ExitCode;

/// List objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Key prefix (lists the whole bucket when omitted)
    #[arg(default_value = "")]
    pub prefix: String,

    /// Summarize output (show totals only)
    #[arg(long)]
    pub summarize: bool,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Vec<ObjectInfo>>,
    summary: Summary,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_objects: usize,
    total_size_bytes: i64,
    total_size_human: String,
}

impl Summary {
    fn of(items: &[ObjectInfo]) -> Self {
        let total_size: i64 = items.iter().map(|i| i.size_bytes).sum();
        Self {
            total_objects: items.len(),
            total_size_bytes: total_size,
            total_size_human: humansize::format_size(total_size.max(0) as u64, humansize::BINARY),
        }
    }
}

/// Execute the ls command
pub async fn execute(args: LsArgs, session: &Session) -> ExitCode {
    let formatter = &session.formatter;
    let items = match list_all(session.store.as_ref(), &args.prefix, &session.options()).await {
        Ok(items) => items,
        Err(e) => {
            formatter.error(&format!("Failed to list objects: {e}"));
            return ExitCode::from(&e);
        }
    };

    let summary = Summary::of(&items);

    if formatter.is_json() {
        formatter.json(&LsOutput {
            items: (!args.summarize).then_some(items),
            summary,
        });
        return ExitCode::Success;
    }

    if !args.summarize {
        for item in &items {
            formatter.println(&format_line(item));
        }
    }
    formatter.println(&format!(
        "\nTotal: {} objects, {}",
        summary.total_objects, summary.total_size_human
    ));

    ExitCode::Success
}

/// Every object under `prefix`, following continuation tokens to the end
async fn list_all(
    store: &dyn ObjectStore,
    prefix: &str,
    options: &TransferOptions,
) -> osync_core::Result<Vec<ObjectInfo>> {
    let mut items = Vec::new();
    let mut pages = Pages::new(store, prefix, options);
    while let Some(page) = pages.next_page().await? {
        items.extend(page.items);
    }
    Ok(items)
}

fn format_line(item: &ObjectInfo) -> String {
    let date = item
        .last_modified
        .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| " ".repeat(19));
    format!("[{date}] {:>10} {}", item.size_human, item.key)
}
