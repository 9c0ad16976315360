//! Object store connection settings
//!
//! A store is the single bucket every operation targets, plus the endpoint and
//! credentials needed to reach it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Endpoint used for Google Cloud Storage through its S3 interoperability API
pub const GCS_ENDPOINT: &str = "https://storage.googleapis.com";

/// Which provider adapter serves the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// AWS S3 or any S3-compatible service (MinIO, RustFS, ...)
    #[default]
    S3,
    /// Google Cloud Storage via HMAC keys and the XML API
    Gcs,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::S3 => f.write_str("s3"),
            Provider::Gcs => f.write_str("gcs"),
        }
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "s3" => Ok(Provider::S3),
            "gcs" => Ok(Provider::Gcs),
            other => Err(Error::Config(format!(
                "Unknown provider '{other}'. Expected 's3' or 'gcs'"
            ))),
        }
    }
}

/// Retry configuration handed to the provider SDK
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff duration in milliseconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    100
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
        }
    }
}

/// Timeout configuration for store requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,

    /// Read timeout in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_ms: u64,
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_read_timeout() -> u64 {
    30000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout(),
            read_ms: default_read_timeout(),
        }
    }
}

/// Connection settings for the bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Provider adapter
    #[serde(default)]
    pub provider: Provider,

    /// Bucket all operations target
    #[serde(default)]
    pub bucket: String,

    /// Endpoint URL; the provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Region
    #[serde(default = "default_region")]
    pub region: String,

    /// Access key ID; the SDK credential chain when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Secret access key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    /// Bucket lookup style: "auto", "path", or "dns"
    #[serde(default = "default_bucket_lookup")]
    pub bucket_lookup: String,

    /// Retry configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,

    /// Timeout configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutConfig>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket_lookup() -> String {
    "auto".to_string()
}

impl StoreConfig {
    /// Create a config for `bucket` with provider defaults
    pub fn new(provider: Provider, bucket: impl Into<String>) -> Self {
        Self {
            provider,
            bucket: bucket.into(),
            region: default_region(),
            bucket_lookup: default_bucket_lookup(),
            ..Default::default()
        }
    }

    /// Endpoint to connect to, falling back to the provider default
    pub fn effective_endpoint(&self) -> Option<&str> {
        match (&self.endpoint, self.provider) {
            (Some(endpoint), _) => Some(endpoint.as_str()),
            (None, Provider::Gcs) => Some(GCS_ENDPOINT),
            (None, Provider::S3) => None,
        }
    }

    /// Whether requests should use path-style addressing
    pub fn force_path_style(&self) -> bool {
        match self.bucket_lookup.as_str() {
            "path" => true,
            "dns" => false,
            // Custom endpoints rarely serve virtual-hosted buckets; GCS serves both.
            _ => self.endpoint.is_some() || self.provider == Provider::Gcs,
        }
    }

    /// Get the effective retry configuration
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    /// Get the effective timeout configuration
    pub fn timeout_config(&self) -> TimeoutConfig {
        self.timeout.clone().unwrap_or_default()
    }

    /// Check that the settings describe a usable store
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::Config(
                "No bucket configured. Set [store].bucket or OSYNC_BUCKET".into(),
            ));
        }

        if let Some(endpoint) = &self.endpoint {
            url::Url::parse(endpoint)?;
        }

        if !matches!(self.bucket_lookup.as_str(), "auto" | "path" | "dns") {
            return Err(Error::Config(
                "Bucket lookup must be 'auto', 'path', or 'dns'".into(),
            ));
        }

        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(Error::Config(
                "access_key and secret_key must be set together".into(),
            ));
        }

        if self.retry_config().max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_defaults() {
        let store = StoreConfig::new(Provider::S3, "repl");
        assert_eq!(store.bucket, "repl");
        assert_eq!(store.region, "us-east-1");
        assert_eq!(store.bucket_lookup, "auto");
        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_missing_bucket_is_config_error() {
        let store = StoreConfig::new(Provider::S3, "  ");
        assert!(matches!(store.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let mut store = StoreConfig::new(Provider::S3, "b");
        store.endpoint = Some("not a url".into());
        assert!(matches!(store.validate(), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_half_credentials_rejected() {
        let mut store = StoreConfig::new(Provider::S3, "b");
        store.access_key = Some("key".into());
        assert!(store.validate().is_err());
    }

    #[test]
    fn test_gcs_defaults_endpoint_and_path_style() {
        let store = StoreConfig::new(Provider::Gcs, "b");
        assert_eq!(store.effective_endpoint(), Some(GCS_ENDPOINT));
        assert!(store.force_path_style());

        let mut s3 = StoreConfig::new(Provider::S3, "b");
        assert_eq!(s3.effective_endpoint(), None);
        assert!(!s3.force_path_style());
        s3.endpoint = Some("http://localhost:9000".into());
        assert!(s3.force_path_style());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("GCS".parse::<Provider>().unwrap(), Provider::Gcs);
        assert_eq!("s3".parse::<Provider>().unwrap(), Provider::S3);
        assert!("azure".parse::<Provider>().is_err());
        assert_eq!(Provider::Gcs.to_string(), "gcs");
    }
}
