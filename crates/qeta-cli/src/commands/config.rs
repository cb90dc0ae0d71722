//! Config command handlers

use anyhow::{bail, Context, Result};

use qeta_core::Config;

use crate::output::{Output, OutputFormat};

const KEYS: &str = "data_dir, default_user, page_size, max_page_size, trend_gravity";

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "default_user": config.default_user,
                    "page_size": config.page_size,
                    "max_page_size": config.max_page_size,
                    "trend_gravity": config.trend_gravity,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:      {}", config.data_dir.display());
            println!(
                "  default_user:  {}",
                config.default_user.as_deref().unwrap_or("(not set)")
            );
            println!("  page_size:     {}", config.page_size);
            println!("  max_page_size: {}", config.max_page_size);
            println!("  trend_gravity: {}", config.trend_gravity);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
            println!("Database:    {}", config.sqlite_path().display());
        }
    }

    Ok(())
}

/// Apply `key = value` to a configuration
pub fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "default_user" => {
            config.default_user = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.to_string())
            };
        }
        "page_size" => {
            config.page_size = value
                .parse()
                .context("Invalid value for page_size. Use a positive number.")?;
        }
        "max_page_size" => {
            config.max_page_size = value
                .parse()
                .context("Invalid value for max_page_size. Use a positive number.")?;
        }
        "trend_gravity" => {
            config.trend_gravity = value
                .parse()
                .context("Invalid value for trend_gravity. Use a decimal number.")?;
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                KEYS
            );
        }
    }
    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    apply(&mut config, &key, &value)?;
    config.save().context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}
