//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from osync-core.
//! Google Cloud Storage is reached through its S3-compatible XML API with HMAC
//! keys, so the same client serves both providers.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_smithy_types::error::display::DisplayErrorContext;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use osync_core::{Error, ListOptions, ListResult, ObjectInfo, ObjectStore, Result, StoreConfig};

/// S3 client bound to a single bucket
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Client {
    /// Create a new S3 client from store settings
    ///
    /// Settings are validated before any SDK setup, so a missing bucket fails
    /// here rather than on the first request.
    pub async fn new(store: &StoreConfig) -> Result<Self> {
        store.validate()?;

        let retry = store.retry_config();
        let timeout = store.timeout_config();

        let retry_config = aws_config::retry::RetryConfig::standard()
            .with_max_attempts(retry.max_attempts)
            .with_initial_backoff(Duration::from_millis(retry.initial_backoff_ms));
        let timeout_config = aws_config::timeout::TimeoutConfig::builder()
            .connect_timeout(Duration::from_millis(timeout.connect_ms))
            .read_timeout(Duration::from_millis(timeout.read_ms))
            .build();

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(store.region.clone()))
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let (Some(access_key), Some(secret_key)) = (&store.access_key, &store.secret_key) {
            let credentials = aws_credential_types::Credentials::new(
                access_key,
                secret_key,
                None, // session token
                None, // expiry
                "osync-static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }

        if let Some(endpoint) = store.effective_endpoint() {
            loader = loader.endpoint_url(endpoint);
        }

        let config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(store.force_path_style())
            .build();

        tracing::debug!(
            provider = %store.provider,
            bucket = %store.bucket,
            endpoint = store.effective_endpoint().unwrap_or("default"),
            "Created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: store.bucket.clone(),
        })
    }

    /// Bucket every request targets
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_objects(&self, prefix: &str, options: ListOptions) -> Result<ListResult> {
        // No delimiter: the listing is flat and covers every nested key.
        let mut request = self.inner.list_objects_v2().bucket(&self.bucket).prefix(prefix);

        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }

        if let Some(token) = &options.continuation_token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(&e, prefix))?;

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let mut info = ObjectInfo::new(object.key().unwrap_or_default(), object.size().unwrap_or(0));

                if let Some(modified) = object.last_modified() {
                    info.last_modified = jiff::Timestamp::from_second(modified.secs()).ok();
                }

                if let Some(etag) = object.e_tag() {
                    info.etag = Some(etag.trim_matches('"').to_string());
                }

                if let Some(sc) = object.storage_class() {
                    info.storage_class = Some(sc.as_str().to_string());
                }

                info
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            prefix,
            count = items.len(),
            truncated = response.is_truncated().unwrap_or(false),
            "Listed page"
        );

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(&e, key))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<ObjectInfo> {
        let size = data.len() as i64;
        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        let response = self
            .inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .set_content_type(content_type)
            .send()
            .await
            .map_err(|e| classify(&e, key))?;

        let mut info = ObjectInfo::new(key, size);
        if let Some(etag) = response.e_tag() {
            info.etag = Some(etag.trim_matches('"').to_string());
        }
        info.last_modified = Some(jiff::Timestamp::now());

        Ok(info)
    }

    async fn copy_object(&self, src_key: &str, dst_key: &str) -> Result<()> {
        self.inner
            .copy_object()
            .copy_source(copy_source(&self.bucket, src_key))
            .bucket(&self.bucket)
            .key(dst_key)
            .send()
            .await
            .map_err(|e| classify(&e, src_key))?;

        Ok(())
    }
}

/// Map an SDK failure onto the core error taxonomy by its service error code
fn classify<E>(err: &E, target: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match err.code() {
        Some("NoSuchKey" | "NotFound" | "NoSuchBucket") => Error::NotFound(target.to_string()),
        Some(
            "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "ExpiredToken",
        ) => Error::Auth(err.message().unwrap_or("access denied").to_string()),
        _ => Error::Network(DisplayErrorContext(err).to_string()),
    }
}

/// Bytes escaped in a CopyObject source key; `/` stays literal
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// `bucket/key` with the key percent-encoded, as CopyObject expects
fn copy_source(bucket: &str, key: &str) -> String {
    format!("{bucket}/{}", utf8_percent_encode(key, COPY_SOURCE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use osync_core::Provider;

    #[test]
    fn test_copy_source_encodes_key() {
        assert_eq!(copy_source("b", "base/python/main.py"), "b/base/python/main.py");
        assert_eq!(copy_source("b", "code/x/my file+1.txt"), "b/code/x/my%20file%2B1.txt");
        assert_eq!(copy_source("b", "é"), "b/%C3%A9");
    }

    #[tokio::test]
    async fn test_new_rejects_missing_bucket() {
        let store = StoreConfig::new(Provider::S3, "");
        let err = S3Client::new(&store).await.err().expect("missing bucket");
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_new_with_static_credentials() {
        let mut store = StoreConfig::new(Provider::Gcs, "repl-projects");
        store.access_key = Some("GOOG1EXAMPLE".into());
        store.secret_key = Some("secret".into());

        let client = S3Client::new(&store).await.unwrap();
        assert_eq!(client.bucket(), "repl-projects");
    }
}
