//! Session configuration and bookkeeping.
//!
//! A [`SessionConfiguration`] is assembled once per session by the
//! configuration builder and never mutated afterwards: fields are private
//! and only readable through accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::capability::CapabilityProvider;

/// How the agent talks to a capability provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpTransportKind {
    /// Child process speaking JSON-RPC over stdin/stdout
    #[default]
    Stdio,
}

/// Connection descriptor for one capability provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerDescriptor {
    #[serde(rename = "type")]
    pub transport: McpTransportKind,
    /// Executable to start
    pub command: String,
    /// Fixed startup arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment for the provider process
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl McpServerDescriptor {
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            transport: McpTransportKind::Stdio,
            command: command.into(),
            args,
            env: BTreeMap::new(),
        }
    }

    /// Full command line, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Immutable bundle handed to one agent session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionConfiguration {
    environment: BTreeMap<String, String>,
    system_prompt: String,
    model: String,
    max_turns: u32,
    allowed_tools: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mcp_servers: Option<BTreeMap<CapabilityProvider, McpServerDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    working_dir: Option<PathBuf>,
}

impl SessionConfiguration {
    pub(crate) fn assemble(
        environment: BTreeMap<String, String>,
        system_prompt: String,
        model: String,
        max_turns: u32,
        allowed_tools: Vec<String>,
        mcp_servers: Option<BTreeMap<CapabilityProvider, McpServerDescriptor>>,
        working_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            environment,
            system_prompt,
            model,
            max_turns,
            allowed_tools,
            mcp_servers,
            working_dir,
        }
    }

    /// Environment the agent process starts with.
    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// Rendered behavior contract.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Cap on agent-internal turns.
    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    /// Capability identifiers the agent is granted.
    pub fn allowed_tools(&self) -> &[String] {
        &self.allowed_tools
    }

    /// Provider descriptors; present only for standalone sessions.
    pub fn mcp_servers(&self) -> Option<&BTreeMap<CapabilityProvider, McpServerDescriptor>> {
        self.mcp_servers.as_ref()
    }

    pub fn is_standalone(&self) -> bool {
        self.mcp_servers.is_some()
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// The `{"mcpServers": {...}}` document the agent CLI reads.
    pub fn mcp_config_json(&self) -> Option<serde_json::Value> {
        let servers = self.mcp_servers.as_ref()?;
        let servers: serde_json::Map<String, serde_json::Value> = servers
            .iter()
            .filter_map(|(provider, descriptor)| {
                serde_json::to_value(descriptor)
                    .ok()
                    .map(|v| (provider.as_str().to_string(), v))
            })
            .collect();
        Some(serde_json::json!({ "mcpServers": servers }))
    }
}

/// Running totals for one session, used for logging and summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub messages: u64,
    pub tool_calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub failed: bool,
}

impl SessionSummary {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            ended_at: None,
            messages: 0,
            tool_calls: 0,
            input_tokens: 0,
            output_tokens: 0,
            failed: false,
        }
    }

    pub fn record_usage(&mut self, input: u64, output: u64) {
        self.input_tokens = self.input_tokens.saturating_add(input);
        self.output_tokens = self.output_tokens.saturating_add(output);
    }

    pub fn finish(&mut self, failed: bool) {
        self.failed = failed;
        self.ended_at = Some(Utc::now());
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at.map(|end| (end - self.started_at).num_milliseconds())
    }
}

impl Default for SessionSummary {
    fn default() -> Self {
        Self::new()
    }
}
