//! upload command - Write a file, stdin, or a directory under a prefix

use std::fmt;
use std::path::{Path, PathBuf};

use clap::Args;
use osync_core::{FolderUploader, ObjectInfo};
use serde::Serialize;
use tokio::io::AsyncReadExt;

use super::Session;
use crate::exit_code::ExitCode;

/// Upload content under a prefix
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Destination key prefix (e.g. "code/abc123/")
    pub prefix: String,

    /// Local file or directory; reads stdin when omitted or "-"
    pub source: Option<PathBuf>,

    /// Relative path appended to the prefix (defaults to the file name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Upload every file below a directory
    #[arg(short, long)]
    pub recursive: bool,
}

/// Output for a single uploaded object
#[derive(Debug, Serialize)]
struct UploadOutput {
    key: String,
    size_bytes: i64,
    size_human: String,
}

impl From<ObjectInfo> for UploadOutput {
    fn from(info: ObjectInfo) -> Self {
        Self {
            key: info.key,
            size_bytes: info.size_bytes,
            size_human: info.size_human,
        }
    }
}

impl fmt::Display for UploadOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uploaded {} ({})", self.key, self.size_human)
    }
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, session: &Session) -> ExitCode {
    let source = args.source.as_deref().filter(|p| *p != Path::new("-"));

    if args.recursive {
        let Some(dir) = source else {
            session
                .formatter
                .error("--recursive needs a local directory to upload");
            return ExitCode::UsageError;
        };
        let progress = session.progress();
        let uploader = FolderUploader::new(session.store.clone(), session.transfer_options(&progress));
        let result = uploader.upload_directory(dir, &args.prefix).await;
        progress.finish_and_clear();
        return session.finish("upload", &dir.display().to_string(), &args.prefix, result);
    }

    let name = match relative_name(source, args.name.as_deref()) {
        Ok(name) => name,
        Err(message) => {
            session.formatter.error(&message);
            return ExitCode::UsageError;
        }
    };

    let content = match read_source(source).await {
        Ok(content) => content,
        Err(e) => {
            session.formatter.error(&format!("Failed to read input: {e}"));
            return ExitCode::GeneralError;
        }
    };

    let uploader = FolderUploader::new(session.store.clone(), session.options());
    match uploader.upload_to_folder(&args.prefix, &name, content).await {
        Ok(info) => {
            session.formatter.output(&UploadOutput::from(info));
            ExitCode::Success
        }
        Err(e) => {
            session.formatter.error(&format!("upload failed: {e}"));
            ExitCode::from(&e)
        }
    }
}

/// The path appended to the prefix for a single upload
fn relative_name(source: Option<&Path>, name: Option<&str>) -> Result<String, String> {
    if let Some(name) = name {
        return Ok(name.to_string());
    }
    source
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| "--name is required when uploading from stdin".to_string())
}

async fn read_source(source: Option<&Path>) -> std::io::Result<Vec<u8>> {
    match source {
        Some(path) => tokio::fs::read(path).await,
        None => {
            let mut content = Vec::new();
            tokio::io::stdin().read_to_end(&mut content).await?;
            Ok(content)
        }
    }
}
