//! Line-oriented conversation command.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::io::IsTerminal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::{ensure_available, run_session, AgentOverrides, SessionOutcome};
use crate::application::StreamingOrchestrator;
use crate::cli::output::EventRenderer;
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub overrides: AgentOverrides,
}

/// What one input line asks the chat loop to do.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput<'a> {
    Skip,
    Quit,
    Prompt(&'a str),
}

impl<'a> ChatInput<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Skip;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return Self::Quit;
        }
        Self::Prompt(line)
    }
}

pub async fn execute(args: ChatArgs, config: Config, json_mode: bool) -> Result<()> {
    let config = args.overrides.apply(config)?;
    let orchestrator = StreamingOrchestrator::from_config(&config);
    ensure_available(&orchestrator, &config.agent.claude_path).await?;
    let mut renderer = EventRenderer::stdio(json_mode);

    let interactive = !json_mode && std::io::stdin().is_terminal();
    if interactive {
        eprintln!(
            "{} Type a request, or 'exit' to quit.",
            style("Todo agent ready.").green().bold()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            eprint!("{} ", style("you>").cyan().bold());
        }

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let prompt = match ChatInput::parse(&line) {
            ChatInput::Skip => continue,
            ChatInput::Quit => break,
            ChatInput::Prompt(prompt) => prompt,
        };

        match run_session(&orchestrator, prompt, &mut renderer).await? {
            SessionOutcome::Completed => {}
            SessionOutcome::Failed(e) => renderer.render_error(&e)?,
            SessionOutcome::Interrupted => {
                debug!("request interrupted");
                if interactive {
                    eprintln!("{}", style("(interrupted)").dim());
                }
            }
        }
    }

    if interactive {
        eprintln!("Goodbye!");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_input() {
        assert_eq!(ChatInput::parse("   "), ChatInput::Skip);
        assert_eq!(ChatInput::parse("exit"), ChatInput::Quit);
        assert_eq!(ChatInput::parse(" QUIT \n"), ChatInput::Quit);
        assert_eq!(
            ChatInput::parse("  add buy milk  "),
            ChatInput::Prompt("add buy milk")
        );
        assert_eq!(ChatInput::parse("exit the loop"), ChatInput::Prompt("exit the loop"));
    }
}
