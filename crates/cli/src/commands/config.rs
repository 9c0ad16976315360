//! Configuration commands
//!
//! Reads and edits the TOML config file. Secrets are never printed.

use clap::Subcommand;
use osync_core::{Config, ConfigManager};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration (file plus OSYNC_* overrides)
    Show,

    /// Print the configuration file path
    Path,

    /// Set a single value, e.g. `osync config set store.bucket my-bucket`
    Set(SetArgs),
}

/// Arguments for the `config set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Dotted key such as store.bucket or transfer.concurrency
    pub key: String,

    /// New value
    pub value: String,
}

/// JSON output for config set
#[derive(Serialize)]
struct SetOutput {
    success: bool,
    key: String,
    path: String,
}

/// Execute a config subcommand
pub fn execute(cmd: ConfigCommands, formatter: Formatter) -> ExitCode {
    let manager = match ConfigManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    match cmd {
        ConfigCommands::Show => show(&manager, &formatter),
        ConfigCommands::Path => {
            let path = manager.config_path().display().to_string();
            if formatter.is_json() {
                formatter.json(&serde_json::json!({ "path": path }));
            } else {
                formatter.println(&path);
            }
            ExitCode::Success
        }
        ConfigCommands::Set(args) => set(args, &manager, &formatter),
    }
}

fn show(manager: &ConfigManager, formatter: &Formatter) -> ExitCode {
    let mut config = match manager.load_with_env() {
        Ok(config) => config,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from(&e);
        }
    };
    redact(&mut config);

    if formatter.is_json() {
        formatter.json(&config);
        return ExitCode::Success;
    }

    match toml::to_string_pretty(&config) {
        Ok(text) => {
            formatter.println(text.trim_end());
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to render configuration: {e}"));
            ExitCode::GeneralError
        }
    }
}

fn set(args: SetArgs, manager: &ConfigManager, formatter: &Formatter) -> ExitCode {
    let mut config = match manager.load() {
        Ok(config) => config,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from(&e);
        }
    };

    if let Err(message) = apply_setting(&mut config, &args.key, &args.value) {
        formatter.error(&message);
        return ExitCode::UsageError;
    }

    if let Err(e) = manager.save(&config) {
        formatter.error(&format!("Failed to save configuration: {e}"));
        return ExitCode::from(&e);
    }

    if formatter.is_json() {
        formatter.json(&SetOutput {
            success: true,
            key: args.key,
            path: manager.config_path().display().to_string(),
        });
    } else {
        formatter.success(&format!("Set {}", args.key));
    }
    ExitCode::Success
}

/// Update one dotted key, validating the section it belongs to
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<(), String> {
    let optional = |v: &str| (!v.is_empty()).then(|| v.to_string());

    match key {
        "store.provider" => config.store.provider = value.parse().map_err(|e| format!("{e}"))?,
        "store.bucket" => config.store.bucket = value.to_string(),
        "store.endpoint" => config.store.endpoint = optional(value),
        "store.region" => config.store.region = value.to_string(),
        "store.access_key" => config.store.access_key = optional(value),
        "store.secret_key" => config.store.secret_key = optional(value),
        "store.bucket_lookup" => config.store.bucket_lookup = value.to_string(),
        "transfer.concurrency" => {
            config.transfer.concurrency = value
                .parse()
                .map_err(|_| format!("'{value}' is not a valid concurrency"))?
        }
        "transfer.page_size" => {
            config.transfer.page_size = value
                .parse()
                .map_err(|_| format!("'{value}' is not a valid page size"))?
        }
        "project.template_root" => config.project.template_root = value.to_string(),
        "project.project_root" => config.project.project_root = value.to_string(),
        "defaults.output" => match value {
            "human" | "json" => config.defaults.output = value.to_string(),
            _ => return Err("defaults.output must be 'human' or 'json'".into()),
        },
        "defaults.color" => match value {
            "auto" | "always" | "never" => config.defaults.color = value.to_string(),
            _ => return Err("defaults.color must be 'auto', 'always', or 'never'".into()),
        },
        "defaults.progress" => {
            config.defaults.progress = value
                .parse()
                .map_err(|_| "defaults.progress must be 'true' or 'false'".to_string())?
        }
        _ => return Err(format!("Unknown configuration key '{key}'")),
    }

    if key.starts_with("transfer.") {
        config.transfer.validate().map_err(|e| e.to_string())?;
    }
    if key == "store.endpoint" {
        if let Some(endpoint) = &config.store.endpoint {
            url::Url::parse(endpoint).map_err(|e| format!("Invalid endpoint: {e}"))?;
        }
    }
    Ok(())
}

fn redact(config: &mut Config) {
    for secret in [&mut config.store.access_key, &mut config.store.secret_key] {
        if secret.is_some() {
            *secret = Some("********".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osync_core::Provider;

    #[test]
    fn test_apply_store_settings() {
        let mut config = Config::default();
        apply_setting(&mut config, "store.provider", "gcs").unwrap();
        apply_setting(&mut config, "store.bucket", "repl").unwrap();
        apply_setting(&mut config, "store.endpoint", "http://localhost:9000").unwrap();

        assert_eq!(config.store.provider, Provider::Gcs);
        assert_eq!(config.store.bucket, "repl");
        assert_eq!(config.store.endpoint.as_deref(), Some("http://localhost:9000"));

        apply_setting(&mut config, "store.endpoint", "").unwrap();
        assert_eq!(config.store.endpoint, None);
    }

    #[test]
    fn test_apply_transfer_settings_are_validated() {
        let mut config = Config::default();
        apply_setting(&mut config, "transfer.concurrency", "8").unwrap();
        assert_eq!(config.transfer.concurrency, 8);

        assert!(apply_setting(&mut config, "transfer.concurrency", "0").is_err());
        assert!(apply_setting(&mut config, "transfer.page_size", "lots").is_err());
    }

    #[test]
    fn test_apply_rejects_unknown_key_and_bad_values() {
        let mut config = Config::default();
        assert!(apply_setting(&mut config, "store.colour", "x").is_err());
        assert!(apply_setting(&mut config, "defaults.output", "yaml").is_err());
        assert!(apply_setting(&mut config, "store.endpoint", "not a url").is_err());
    }

    #[test]
    fn test_redact_hides_credentials() {
        let mut config = Config::default();
        config.store.secret_key = Some("hunter2".into());
        redact(&mut config);
        assert_eq!(config.store.secret_key.as_deref(), Some("********"));
        assert_eq!(config.store.access_key, None);
    }
}
