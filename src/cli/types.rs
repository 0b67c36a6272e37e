//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::ask::AskArgs;
use super::commands::chat::ChatArgs;
use super::commands::session_config::SessionConfigArgs;

#[derive(Parser, Debug)]
#[command(name = "todo-agent")]
#[command(about = "Conversational task manager backed by a Claude Code agent", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format (newline-delimited events for ask/chat)
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this YAML file instead of .todo-agent/
    #[arg(short, long, global = true, env = "TODO_AGENT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one request to the agent and stream its response
    Ask(AskArgs),

    /// Read requests line by line from stdin, one session per line
    Chat(ChatArgs),

    /// List the capabilities granted to the agent
    Capabilities,

    /// Print the behavior contract given to the agent
    Contract,

    /// Show the configuration a session would run with
    SessionConfig(SessionConfigArgs),

    /// Show the effective configuration
    Config,
}
