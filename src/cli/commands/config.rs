//! Effective configuration command.

use anyhow::{Context, Result};

use crate::domain::models::Config;

pub fn execute(config: &Config, json_mode: bool) -> Result<()> {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?
        );
    } else {
        print!(
            "{}",
            serde_yaml::to_string(config).context("Failed to serialize configuration")?
        );
    }
    Ok(())
}
