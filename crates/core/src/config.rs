//! Configuration management
//!
//! This module handles loading, saving, and migrating the osync configuration file.
//! The configuration file is stored in TOML format at ~/.config/osync/config.toml,
//! or under `$OSYNC_CONFIG_DIR` when that variable is set.
//!
//! PROTECTED FILE: Changes to schema_version require migration support.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::StoreConfig;
use crate::transfer::{DEFAULT_CONCURRENCY, DEFAULT_PAGE_SIZE};

/// Current configuration schema version
///
/// IMPORTANT: Bumping this version requires:
/// 1. Adding a migration in `ConfigManager::migrate`
/// 2. Updating migration tests
/// 3. Marking the change as BREAKING
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "OSYNC_CONFIG_DIR";

/// Default output format
const DEFAULT_OUTPUT: &str = "human";

/// Default color setting
const DEFAULT_COLOR: &str = "auto";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Bucket and connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Fan-out and pagination tuning
    #[serde(default)]
    pub transfer: TransferConfig,

    /// Prefix layout for project seeding
    #[serde(default)]
    pub project: ProjectConfig,
}

/// Default settings for CLI behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,

    /// Show progress bars
    #[serde(default = "default_true")]
    pub progress: bool,
}

/// Transfer tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Maximum transfers in flight per batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Keys requested per listing page
    #[serde(default = "default_page_size")]
    pub page_size: i32,
}

/// Where project templates and projects live in the bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Prefix holding one folder per template language
    #[serde(default = "default_template_root")]
    pub template_root: String,

    /// Prefix holding one folder per project
    #[serde(default = "default_project_root")]
    pub project_root: String,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_page_size() -> i32 {
    DEFAULT_PAGE_SIZE
}

fn default_template_root() -> String {
    "base".to_string()
}

fn default_project_root() -> String {
    "code".to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            progress: true,
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            page_size: default_page_size(),
        }
    }
}

impl TransferConfig {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config("transfer.concurrency must be at least 1".into()));
        }
        if !(1..=1000).contains(&self.page_size) {
            return Err(Error::Config(
                "transfer.page_size must be between 1 and 1000".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            template_root: default_template_root(),
            project_root: default_project_root(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            store: StoreConfig::default(),
            transfer: TransferConfig::default(),
            project: ProjectConfig::default(),
        }
    }
}

impl Config {
    /// Override store settings from `OSYNC_*` variables
    ///
    /// `lookup` resolves a variable name; pass `|k| std::env::var(k).ok()` for
    /// the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(provider) = lookup("OSYNC_PROVIDER") {
            self.store.provider = provider.parse()?;
        }
        if let Some(bucket) = lookup("OSYNC_BUCKET") {
            self.store.bucket = bucket;
        }
        if let Some(endpoint) = lookup("OSYNC_ENDPOINT") {
            self.store.endpoint = Some(endpoint);
        }
        if let Some(region) = lookup("OSYNC_REGION") {
            self.store.region = region;
        }
        if let Some(access_key) = lookup("OSYNC_ACCESS_KEY") {
            self.store.access_key = Some(access_key);
        }
        if let Some(secret_key) = lookup("OSYNC_SECRET_KEY") {
            self.store.secret_key = Some(secret_key);
        }
        if let Some(concurrency) = lookup("OSYNC_CONCURRENCY") {
            self.transfer.concurrency = concurrency.parse().map_err(|_| {
                Error::Config(format!("OSYNC_CONCURRENCY '{concurrency}' is not a number"))
            })?;
        }
        Ok(())
    }

    /// Validate every section needed to run transfers
    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        self.transfer.validate()
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("osync"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        // Check schema version and migrate if necessary
        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade osync.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// Load configuration and apply `OSYNC_*` overrides from the process environment
    pub fn load_with_env(&self) -> Result<Config> {
        let mut config = self.load()?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only) since the file may hold keys.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;

        // Version 0 predates the [project] section, which serde already defaulted.

        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}
