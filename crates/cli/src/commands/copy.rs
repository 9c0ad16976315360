//! copy command - Server-side copy of one prefix to another

use clap::Args;
use osync_core::FolderCopier;

use super::Session;
use crate::exit_code::ExitCode;

/// Copy every object under a prefix
#[derive(Args, Debug)]
pub struct CopyArgs {
    /// Source key prefix (e.g. "base/python/")
    pub source: String,

    /// Destination key prefix (e.g. "code/abc123/")
    pub destination: String,
}

/// Execute the copy command
pub async fn execute(args: CopyArgs, session: &Session) -> ExitCode {
    let progress = session.progress();
    let copier = FolderCopier::new(session.store.clone(), session.transfer_options(&progress));

    let result = copier.copy_folder(&args.source, &args.destination).await;
    progress.finish_and_clear();

    session.finish("copy", &args.source, &args.destination, result)
}
