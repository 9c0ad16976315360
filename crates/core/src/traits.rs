//! ObjectStore trait definition
//!
//! This trait defines the key-level capability the sync engine needs from a
//! storage provider. Each implementation is bound to a single bucket, so keys
//! are the only addressing the engine deals with.

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata for a listed or written object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,

    /// Size in bytes
    pub size_bytes: i64,

    /// Human-readable size
    pub size_human: String,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Storage class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for an object of the given size
    pub fn new(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: size,
            size_human: humansize::format_size(size.max(0) as u64, humansize::BINARY),
            last_modified: None,
            etag: None,
            storage_class: None,
        }
    }
}

/// One page of a prefix listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResult {
    /// Listed objects, in store order
    pub items: Vec<ObjectInfo>,

    /// Whether more pages are available
    pub truncated: bool,

    /// Token for fetching the next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

/// Options for list operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Maximum number of keys to return per request
    pub max_keys: Option<i32>,

    /// Continuation token returned by the previous page
    pub continuation_token: Option<String>,
}

/// Key-level operations against a single bucket
///
/// Implemented by the provider adapters and by [`crate::MemoryStore`].
/// Listings are always recursive: every key starting with `prefix` is
/// returned, with no delimiter grouping.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of objects whose key starts with `prefix`
    async fn list_objects(&self, prefix: &str, options: ListOptions) -> Result<ListResult>;

    /// Get object content as bytes
    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;

    /// Write an object, replacing any existing object at `key`
    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<ObjectInfo>;

    /// Server-side copy of `src_key` to `dst_key` within the bucket
    async fn copy_object(&self, src_key: &str, dst_key: &str) -> Result<()>;
}
