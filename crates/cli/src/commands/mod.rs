//! CLI command definitions and execution
//!
//! Each command loads the configuration, connects to the configured bucket
//! and runs one folder operation from osync-core.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use osync_core::{Config, ConfigManager, ObjectStore, TransferOptions, TransferReport};
use osync_s3::S3Client;
use tokio_util::sync::CancellationToken;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar, TransferSummary};

mod config;
mod copy;
mod download;
mod ls;
mod project;
mod upload;

/// osync - folder synchronization for object storage
///
/// Downloads, copies and uploads whole key prefixes of a single bucket on
/// S3-compatible storage or Google Cloud Storage.
#[derive(Parser, Debug)]
#[command(name = "osync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Stop issuing new requests after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum transfers in flight (overrides [transfer].concurrency)
    #[arg(long, global = true, value_name = "N")]
    pub concurrency: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download every object under a prefix into a local directory
    Download(download::DownloadArgs),

    /// Copy every object under one prefix to another prefix
    Copy(copy::CopyArgs),

    /// Upload a file, stdin, or a directory under a prefix
    Upload(upload::UploadArgs),

    /// List every object under a prefix
    Ls(ls::LsArgs),

    /// Create a project folder from a language template
    Project(project::ProjectArgs),

    /// Show or edit the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    let Cli {
        command,
        timeout,
        concurrency,
        ..
    } = cli;

    let command = match command {
        Commands::Config(cmd) => return config::execute(cmd, Formatter::new(output_config)),
        other => other,
    };

    let session = match Session::open(output_config, timeout, concurrency).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    match command {
        Commands::Download(args) => download::execute(args, &session).await,
        Commands::Copy(args) => copy::execute(args, &session).await,
        Commands::Upload(args) => upload::execute(args, &session).await,
        Commands::Ls(args) => ls::execute(args, &session).await,
        Commands::Project(args) => project::execute(args, &session).await,
        Commands::Config(_) => ExitCode::Success,
    }
}

/// Loaded configuration plus a connected store, shared by the transfer commands
pub struct Session {
    pub config: Config,
    pub formatter: Formatter,
    pub store: Arc<dyn ObjectStore>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl Session {
    async fn open(
        output_config: OutputConfig,
        timeout: Option<u64>,
        concurrency: Option<usize>,
    ) -> Result<Self, ExitCode> {
        let formatter = Formatter::new(output_config.clone());

        let mut config = ConfigManager::new()
            .and_then(|manager| manager.load_with_env())
            .map_err(|e| fail(&formatter, "Failed to load configuration", &e))?;
        if let Some(concurrency) = concurrency {
            config.transfer.concurrency = concurrency;
        }
        config
            .validate()
            .map_err(|e| fail(&formatter, "Invalid configuration", &e))?;

        let formatter = Formatter::new(output_config.with_defaults(&config.defaults));

        let client = S3Client::new(&config.store)
            .await
            .map_err(|e| fail(&formatter, "Failed to create S3 client", &e))?;

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, letting in-flight transfers finish");
                on_interrupt.cancel();
            }
        });

        Ok(Self {
            config,
            formatter,
            store: Arc::new(client),
            cancel,
            timeout: timeout.map(Duration::from_secs),
        })
    }

    /// Transfer options wired to the config, Ctrl+C and `--timeout`
    pub fn options(&self) -> TransferOptions {
        let options = TransferOptions::from_config(&self.config.transfer)
            .with_cancellation(self.cancel.clone());
        match self.timeout {
            Some(timeout) => options.with_timeout(timeout),
            None => options,
        }
    }

    /// [`Session::options`] reporting into a progress bar
    pub fn transfer_options(&self, progress: &Arc<ProgressBar>) -> TransferOptions {
        self.options().with_progress(progress.clone())
    }

    pub fn progress(&self) -> Arc<ProgressBar> {
        Arc::new(ProgressBar::new(self.formatter.config(), 0))
    }

    /// Print the outcome of a folder operation and map it to an exit code
    pub fn finish(
        &self,
        operation: &'static str,
        source: &str,
        destination: &str,
        result: osync_core::Result<TransferReport>,
    ) -> ExitCode {
        match result {
            Ok(report) => {
                self.formatter
                    .output(&TransferSummary::new(operation, source, destination, &report));
                ExitCode::Success
            }
            Err(e) => {
                if let Some(report) = e.report() {
                    self.formatter
                        .output(&TransferSummary::new(operation, source, destination, report));
                }
                self.formatter.error(&format!("{operation} failed: {e}"));
                ExitCode::from(&e)
            }
        }
    }
}

fn fail(formatter: &Formatter, context: &str, error: &osync_core::Error) -> ExitCode {
    formatter.error(&format!("{context}: {error}"));
    ExitCode::from(error)
}

/// A session over an in-memory store, for command tests
#[cfg(test)]
pub(crate) fn test_session(
    store: Arc<dyn ObjectStore>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
) -> Session {
    Session {
        config: Config::default(),
        formatter: Formatter::new(OutputConfig {
            quiet: true,
            no_progress: true,
            ..Default::default()
        }),
        store,
        cancel,
        timeout,
    }
}
