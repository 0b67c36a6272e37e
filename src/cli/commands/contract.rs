//! Behavior contract command.

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{BehaviorContract, ContractSection};

#[derive(Debug, Serialize)]
pub struct ContractOutput {
    pub sections: Vec<String>,
    pub text: String,
}

impl ContractOutput {
    pub fn new(contract: &BehaviorContract) -> Self {
        Self {
            sections: ContractSection::ALL
                .iter()
                .filter_map(|s| s.heading())
                .map(str::to_string)
                .collect(),
            text: contract.render(),
        }
    }
}

impl CommandOutput for ContractOutput {
    fn to_human(&self) -> String {
        self.text.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn execute(json_mode: bool) -> Result<()> {
    output(&ContractOutput::new(&BehaviorContract::standard()), json_mode);
    Ok(())
}
