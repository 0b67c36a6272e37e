use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Model tier used for sessions unless configured otherwise.
pub const DEFAULT_MODEL: &str = "haiku";

/// Cap on agent-internal turns unless configured otherwise.
pub const DEFAULT_MAX_TURNS: u32 = 50;

/// Main configuration structure for the todo agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Agent session configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Capability provider configuration
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Agent session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AgentConfig {
    /// Path to claude CLI executable
    #[serde(default = "default_claude_path")]
    pub claude_path: String,

    /// Model selector passed to the agent
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum agent-internal turns per session
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Working directory for the agent process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    /// Wall-clock limit per session in seconds (0 disables)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Subset of capability identifiers to grant (defaults to all)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,

    /// Extra environment variable names forwarded from the caller
    #[serde(default)]
    pub env_passthrough: Vec<String>,

    /// Explicit environment entries for the agent process
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_claude_path() -> String {
    "claude".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

const fn default_max_turns() -> u32 {
    DEFAULT_MAX_TURNS
}

const fn default_timeout_secs() -> u64 {
    300
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            claude_path: default_claude_path(),
            model: default_model(),
            max_turns: default_max_turns(),
            working_dir: None,
            timeout_secs: default_timeout_secs(),
            capabilities: None,
            env_passthrough: vec![],
            env: BTreeMap::new(),
        }
    }
}

/// Capability provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProvidersConfig {
    /// SQLite task store provider
    #[serde(default)]
    pub sqlite: SqliteProviderConfig,

    /// Filesystem provider
    #[serde(default)]
    pub filesystem: FilesystemProviderConfig,
}

/// SQLite MCP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SqliteProviderConfig {
    /// Launcher command
    #[serde(default = "default_provider_command")]
    pub command: String,

    /// Package started by the launcher
    #[serde(default = "default_sqlite_package")]
    pub package: String,

    /// Path to the task database file
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_provider_command() -> String {
    "npx".to_string()
}

fn default_sqlite_package() -> String {
    "@modelcontextprotocol/server-sqlite".to_string()
}

fn default_db_path() -> String {
    "todo.db".to_string()
}

impl Default for SqliteProviderConfig {
    fn default() -> Self {
        Self {
            command: default_provider_command(),
            package: default_sqlite_package(),
            db_path: default_db_path(),
        }
    }
}

/// Filesystem MCP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FilesystemProviderConfig {
    /// Launcher command
    #[serde(default = "default_provider_command")]
    pub command: String,

    /// Package started by the launcher
    #[serde(default = "default_filesystem_package")]
    pub package: String,

    /// Root directory the provider exposes
    #[serde(default = "default_fs_root")]
    pub root: String,
}

fn default_filesystem_package() -> String {
    "@modelcontextprotocol/server-filesystem".to_string()
}

fn default_fs_root() -> String {
    ".".to_string()
}

impl Default for FilesystemProviderConfig {
    fn default() -> Self {
        Self {
            command: default_provider_command(),
            package: default_filesystem_package(),
            root: default_fs_root(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Rotation for file logs: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
