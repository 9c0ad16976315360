//! In-process ObjectStore
//!
//! A complete, bucket-less store kept in a sorted map. Listings paginate like
//! S3 ListObjectsV2: keys come back in lexical order and each truncated page
//! carries an opaque token pointing past its last key. Used for tests and for
//! embedding the engine without a remote provider.

use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::traits::{ListOptions, ListResult, ObjectInfo, ObjectStore};

const TOKEN_PREFIX: &str = "after:";

/// A recorded `list_objects` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCall {
    pub prefix: String,
    pub continuation_token: Option<String>,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<String, (Vec<u8>, Option<String>)>,
    failing_keys: HashSet<String>,
    fail_listing: bool,
    list_calls: Vec<ListCall>,
}

/// Sorted in-memory object store
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    page_size: Option<usize>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap every listing page at `page_size` keys, regardless of the request
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    /// Delay every get/put/copy by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.state()
            .objects
            .insert(key.into(), (data.into(), None));
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.state().objects.get(key).map(|(data, _)| data.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.state().objects.get(key).and_then(|(_, ct)| ct.clone())
    }

    /// All keys in lexical order
    pub fn keys(&self) -> Vec<String> {
        self.state().objects.keys().cloned().collect()
    }

    /// Make every get, put or copy touching `key` fail with a network error
    pub fn fail_key(&self, key: impl Into<String>) {
        self.state().failing_keys.insert(key.into());
    }

    /// Make every listing fail with a network error
    pub fn fail_listing(&self) {
        self.state().fail_listing = true;
    }

    /// Listing requests received so far, in order
    pub fn list_calls(&self) -> Vec<ListCall> {
        self.state().list_calls.clone()
    }

    /// Highest number of get/put/copy calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_key(&self, key: &str) -> Result<()> {
        if self.state().failing_keys.contains(key) {
            return Err(Error::Network(format!("injected failure for {key}")));
        }
        Ok(())
    }

    async fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        InFlight(&self.in_flight)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(&self, prefix: &str, options: ListOptions) -> Result<ListResult> {
        let mut state = self.state();
        state.list_calls.push(ListCall {
            prefix: prefix.to_string(),
            continuation_token: options.continuation_token.clone(),
        });
        if state.fail_listing {
            return Err(Error::Network(format!("injected listing failure for {prefix}")));
        }

        let start = match &options.continuation_token {
            Some(token) => {
                let after = token.strip_prefix(TOKEN_PREFIX).ok_or_else(|| {
                    Error::Listing(format!("invalid continuation token '{token}'"))
                })?;
                Bound::Excluded(after.to_string())
            }
            None => Bound::Included(prefix.to_string()),
        };

        let requested = options
            .max_keys
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(1000);
        let limit = self.page_size.map_or(requested, |cap| cap.min(requested));

        let mut matching = state
            .objects
            .range((start, Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix));

        let items: Vec<ObjectInfo> = matching
            .by_ref()
            .take(limit)
            .map(|(key, (data, _))| ObjectInfo::new(key.clone(), data.len() as i64))
            .collect();
        let truncated = matching.next().is_some();
        let continuation_token = if truncated {
            items.last().map(|last| format!("{TOKEN_PREFIX}{}", last.key))
        } else {
            None
        };

        Ok(ListResult {
            items,
            truncated,
            continuation_token,
        })
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let _guard = self.enter().await;
        self.check_key(key)?;
        self.get(key).ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<ObjectInfo> {
        let _guard = self.enter().await;
        self.check_key(key)?;
        let info = ObjectInfo::new(key, data.len() as i64);
        self.state()
            .objects
            .insert(key.to_string(), (data, content_type));
        Ok(info)
    }

    async fn copy_object(&self, src_key: &str, dst_key: &str) -> Result<()> {
        let _guard = self.enter().await;
        self.check_key(src_key)?;
        self.check_key(dst_key)?;
        let mut state = self.state();
        let object = state
            .objects
            .get(src_key)
            .cloned()
            .ok_or_else(|| Error::NotFound(src_key.to_string()))?;
        state.objects.insert(dst_key.to_string(), object);
        Ok(())
    }
}
