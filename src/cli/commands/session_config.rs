//! Session configuration inspection command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::fmt::Write as _;

use crate::application::SessionConfigBuilder;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{Config, SessionConfiguration};

#[derive(Args, Debug)]
pub struct SessionConfigArgs {
    /// Build for a host that already provides the capability providers
    #[arg(long)]
    pub embedded: bool,

    /// Include the full behavior contract
    #[arg(long)]
    pub show_prompt: bool,
}

/// A session configuration with environment values withheld.
#[derive(Debug, Serialize)]
pub struct SessionConfigOutput {
    pub mode: &'static str,
    pub model: String,
    pub max_turns: u32,
    pub allowed_tools: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_config: Option<serde_json::Value>,
    /// Variable names only
    pub environment: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    pub system_prompt: String,
}

impl SessionConfigOutput {
    pub fn new(config: &SessionConfiguration, show_prompt: bool) -> Self {
        let prompt = config.system_prompt();
        Self {
            mode: if config.is_standalone() { "standalone" } else { "embedded" },
            model: config.model().to_string(),
            max_turns: config.max_turns(),
            allowed_tools: config.allowed_tools().to_vec(),
            mcp_config: config.mcp_config_json(),
            environment: config.environment().keys().cloned().collect(),
            working_dir: config.working_dir().map(|p| p.display().to_string()),
            system_prompt: if show_prompt {
                prompt.to_string()
            } else {
                truncate(prompt.lines().next().unwrap_or_default(), 80)
            },
        }
    }
}

impl CommandOutput for SessionConfigOutput {
    fn to_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Mode:          {}", self.mode);
        let _ = writeln!(out, "Model:         {}", self.model);
        let _ = writeln!(out, "Max turns:     {}", self.max_turns);
        if let Some(ref dir) = self.working_dir {
            let _ = writeln!(out, "Working dir:   {dir}");
        }
        let _ = writeln!(out, "Environment:   {}", self.environment.join(", "));
        let _ = writeln!(out, "Allowed tools:");
        for tool in &self.allowed_tools {
            let _ = writeln!(out, "  - {tool}");
        }
        if let Some(servers) = self.mcp_config.as_ref().and_then(|c| c["mcpServers"].as_object()) {
            let _ = writeln!(out, "MCP servers:");
            for (name, server) in servers {
                let args: Vec<&str> = server["args"]
                    .as_array()
                    .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
                    .unwrap_or_default();
                let command = server["command"].as_str().unwrap_or_default();
                let _ = writeln!(out, "  {name}: {command} {}", args.join(" "));
            }
        }
        let _ = write!(out, "System prompt:\n{}", self.system_prompt);
        out
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn execute(args: &SessionConfigArgs, config: &Config, json_mode: bool) -> Result<()> {
    let session = SessionConfigBuilder::from_config(config).build_configuration(!args.embedded)?;
    output(&SessionConfigOutput::new(&session, args.show_prompt), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default().with_env_source(|key| match key {
            "ANTHROPIC_API_KEY" => Some("sk-ant-secret".to_string()),
            "PATH" => Some("/usr/bin".to_string()),
            _ => None,
        })
    }

    #[test]
    fn test_environment_values_are_withheld() {
        let session = builder().build_configuration(true).unwrap();
        let json = SessionConfigOutput::new(&session, false).to_json();

        assert_eq!(json["environment"], serde_json::json!(["ANTHROPIC_API_KEY", "PATH"]));
        assert!(!json.to_string().contains("sk-ant-secret"));
        assert_eq!(json["mode"], "standalone");
        assert!(json["mcp_config"]["mcpServers"]["sqlite"].is_object());
    }

    #[test]
    fn test_embedded_output_has_no_mcp_config() {
        let session = builder().build_configuration(false).unwrap();
        let out = SessionConfigOutput::new(&session, true);
        let json = out.to_json();

        assert_eq!(json["mode"], "embedded");
        assert!(json.get("mcp_config").is_none());
        assert!(out.system_prompt.contains("## Available Tools"));
        assert!(!out.to_human().contains("MCP servers:"));
    }
}
