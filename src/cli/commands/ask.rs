//! One-shot request command.

use anyhow::{bail, Result};
use clap::Args;

use super::{ensure_available, run_session, AgentOverrides, SessionOutcome};
use crate::application::StreamingOrchestrator;
use crate::cli::output::EventRenderer;
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Request for the agent, e.g. "add buy milk with high priority"
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,

    #[command(flatten)]
    pub overrides: AgentOverrides,
}

impl AskArgs {
    /// Words joined back into one request.
    pub fn prompt_text(&self) -> String {
        self.prompt.join(" ").trim().to_string()
    }
}

pub async fn execute(args: AskArgs, config: Config, json_mode: bool) -> Result<()> {
    let prompt = args.prompt_text();
    if prompt.is_empty() {
        bail!("Request cannot be empty");
    }

    let config = args.overrides.apply(config)?;
    let orchestrator = StreamingOrchestrator::from_config(&config);
    ensure_available(&orchestrator, &config.agent.claude_path).await?;
    let mut renderer = EventRenderer::stdio(json_mode);

    match run_session(&orchestrator, &prompt, &mut renderer).await? {
        SessionOutcome::Completed => Ok(()),
        SessionOutcome::Failed(e) => Err(e.into()),
        SessionOutcome::Interrupted => bail!("Interrupted"),
    }
}
