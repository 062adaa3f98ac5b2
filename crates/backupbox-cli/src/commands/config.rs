//! Config command - View and validate BackupBox configuration

use std::path::Path;

use anyhow::{Context, Result};
use backupbox_core::config::Config;
use clap::Subcommand;
use tracing::info;

use crate::output::{OutputFormat, Printer};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
    /// Print the configuration file location
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(format, config_path),
            ConfigCommand::Validate => execute_validate(format, config_path),
            ConfigCommand::Path => {
                let out = Printer::new(format);
                if out.is_json() {
                    out.value(&serde_json::json!({
                        "config_path": config_path.display().to_string(),
                        "exists": config_path.exists(),
                    }));
                } else {
                    println!("{}", config_path.display());
                }
                Ok(())
            }
        }
    }
}

fn execute_show(format: OutputFormat, config_path: &Path) -> Result<()> {
    let out = Printer::new(format);
    let mut config = Config::load_or_default(config_path);
    if config.remote.access_token.is_some() {
        config.remote.access_token = Some("********".into());
    }

    info!(config_path = %config_path.display(), "Showing configuration");

    if out.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        out.value(&json);
    } else {
        out.done(&format!("Configuration ({})", config_path.display()));
        out.note("");

        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            out.note(line);
        }
    }
    Ok(())
}

fn execute_validate(format: OutputFormat, config_path: &Path) -> Result<()> {
    let out = Printer::new(format);

    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            let message = if config_path.exists() {
                format!("Failed to parse configuration: {e:#}")
            } else {
                "Configuration file not found. Using defaults.".to_string()
            };
            if out.is_json() {
                out.value(&serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "errors": [message],
                }));
            } else {
                out.fail(&message);
                out.note(&format!("File: {}", config_path.display()));
            }
            return Ok(());
        }
    };

    info!(config_path = %config_path.display(), "Validating configuration");
    let errors = config.validate();

    if out.is_json() {
        let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        out.value(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        out.done("Configuration is valid");
        out.note(&format!("File: {}", config_path.display()));
    } else {
        out.fail(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        out.note(&format!("File: {}", config_path.display()));
        out.note("");
        for error in &errors {
            out.note(&format!("  {} - {}", error.field, error.message));
        }
    }
    Ok(())
}
