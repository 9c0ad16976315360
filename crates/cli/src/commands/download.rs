//! download command - Mirror a prefix into a local directory

use std::path::PathBuf;

use clap::Args;
use osync_core::FolderDownloader;

use super::Session;
use crate::exit_code::ExitCode;

/// Download every object under a prefix
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Key prefix to download (e.g. "code/abc123/")
    pub prefix: String,

    /// Local directory to write into; created if missing
    pub local_dir: PathBuf,
}

/// Execute the download command
pub async fn execute(args: DownloadArgs, session: &Session) -> ExitCode {
    let progress = session.progress();
    let downloader =
        FolderDownloader::new(session.store.clone(), session.transfer_options(&progress));

    let result = downloader.download_folder(&args.prefix, &args.local_dir).await;
    progress.finish_and_clear();

    session.finish(
        "download",
        &args.prefix,
        &args.local_dir.display().to_string(),
        result,
    )
}
