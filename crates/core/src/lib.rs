//! osync-core: Core library for the osync folder synchronization tool
//!
//! This crate provides the core functionality for osync, including:
//! - Configuration management
//! - The ObjectStore trait and an in-memory implementation
//! - Key and local path derivation
//! - Folder download, copy and upload over a flat key namespace
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! allowing for easy testing and potential future support for other backends.

pub mod config;
pub mod error;
pub mod fs;
pub mod memory;
pub mod path;
pub mod project;
pub mod store;
pub mod traits;
pub mod transfer;

pub use config::{Config, ConfigManager, ProjectConfig, TransferConfig};
pub use error::{Error, Result};
pub use fs::{ensure_directory, write_file};
pub use memory::MemoryStore;
pub use project::{ProjectPrefixes, ProjectTemplate};
pub use store::{Provider, StoreConfig};
pub use traits::{ListOptions, ListResult, ObjectInfo, ObjectStore};
pub use transfer::{
    FolderCopier, FolderDownloader, FolderUploader, Pages, TaskOutcome, TaskStatus,
    TransferOptions, TransferProgress, TransferReport, TransferTask,
};
