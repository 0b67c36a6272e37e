//! CLI command implementations.

pub mod ask;
pub mod capabilities;
pub mod chat;
pub mod config;
pub mod contract;
pub mod session_config;

use anyhow::{bail, Context, Result};
use clap::Args;
use futures::StreamExt;
use std::io::Write;
use std::path::Path;

use crate::application::StreamingOrchestrator;
use crate::cli::output::EventRenderer;
use crate::domain::errors::DomainError;
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

/// Per-invocation overrides of the agent settings.
#[derive(Args, Debug, Clone, Default)]
pub struct AgentOverrides {
    /// Model to run the agent with (e.g. haiku, sonnet)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum agent-internal turns per request
    #[arg(long)]
    pub max_turns: Option<u32>,

    /// Wall-clock limit per request in seconds (0 disables)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl AgentOverrides {
    /// Apply the overrides and re-validate.
    pub fn apply(&self, mut config: Config) -> Result<Config> {
        if let Some(ref model) = self.model {
            config.agent.model.clone_from(model);
        }
        if let Some(max_turns) = self.max_turns {
            config.agent.max_turns = max_turns;
        }
        if let Some(timeout) = self.timeout {
            config.agent.timeout_secs = timeout;
        }
        ConfigLoader::validate(&config).context("Invalid command line overrides")?;
        Ok(config)
    }
}

/// Load configuration from `path` or the project hierarchy.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    ConfigLoader::load_or_default(path).context("Failed to load configuration")
}

/// Fail early when the agent CLI cannot be started.
pub async fn ensure_available(orchestrator: &StreamingOrchestrator, claude_path: &str) -> Result<()> {
    if orchestrator.is_available().await? {
        return Ok(());
    }
    bail!(
        "{} agent is not available: '{claude_path} --version' failed. \
         Install Claude Code or set agent.claude_path",
        orchestrator.transport_name()
    )
}

/// How one streamed session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    Completed,
    Failed(DomainError),
    Interrupted,
}

/// Stream one prompt through the orchestrator into the renderer.
///
/// Ctrl-C drops the stream, which stops the agent process.
pub async fn run_session<O: Write, E: Write>(
    orchestrator: &StreamingOrchestrator,
    prompt: &str,
    renderer: &mut EventRenderer<O, E>,
) -> Result<SessionOutcome> {
    let mut stream = orchestrator.stream_agent(prompt)?;
    renderer.start();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut failure = None;
    let mut interrupted = false;
    loop {
        tokio::select! {
            item = stream.next() => match item {
                Some(Ok(event)) => renderer.render(&event)?,
                Some(Err(e)) => failure = Some(e),
                None => break,
            },
            _ = &mut ctrl_c => {
                interrupted = true;
                break;
            }
        }
    }
    drop(stream);
    if interrupted {
        renderer.clear();
    }

    Ok(match failure {
        _ if interrupted => SessionOutcome::Interrupted,
        Some(e) => SessionOutcome::Failed(e),
        None => SessionOutcome::Completed,
    })
}
