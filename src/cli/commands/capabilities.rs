//! Capability listing command.

use anyhow::Result;
use serde::Serialize;

use crate::application::SessionConfigBuilder;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{CapabilityRegistry, CapabilitySet, Config};

#[derive(Debug, Serialize)]
pub struct CapabilityOutput {
    pub identifier: String,
    pub provider: String,
    pub operation: String,
    pub summary: String,
    pub granted: bool,
}

#[derive(Debug, Serialize)]
pub struct CapabilityListOutput {
    pub capabilities: Vec<CapabilityOutput>,
    #[serde(skip)]
    granted: CapabilitySet,
}

impl CapabilityListOutput {
    pub fn new(granted: CapabilitySet) -> Self {
        let capabilities = CapabilityRegistry::all()
            .iter()
            .map(|c| CapabilityOutput {
                identifier: c.identifier(),
                provider: c.provider.as_str().to_string(),
                operation: c.operation.to_string(),
                summary: c.summary.to_string(),
                granted: granted.contains(&c.identifier()),
            })
            .collect();
        Self { capabilities, granted }
    }
}

impl CommandOutput for CapabilityListOutput {
    fn to_human(&self) -> String {
        let table = TableFormatter::new()
            .format_capabilities(CapabilityRegistry::all(), |c| self.granted.contains(&c.identifier()));
        format!(
            "{table}\n{} of {} capabilities granted",
            self.granted.len(),
            self.capabilities.len()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let granted = SessionConfigBuilder::from_config(config).capabilities()?;
    output(&CapabilityListOutput::new(granted), json_mode);
    Ok(())
}
