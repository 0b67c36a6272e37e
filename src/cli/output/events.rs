//! Live rendering of agent events
//!
//! Human mode prints assistant text to stdout and keeps tool activity,
//! token usage and the spinner on stderr. JSON mode prints one event
//! object per line to stdout.

use console::{style, Term};
use indicatif::ProgressBar;
use std::io::{self, Stderr, Stdout, Write};

use super::progress::create_spinner_with_message;
use crate::domain::errors::DomainError;
use crate::domain::models::AgentEvent;

/// Renders one session's events as they arrive.
pub struct EventRenderer<O: Write, E: Write> {
    out: O,
    err: E,
    json: bool,
    show_spinner: bool,
    spinner: Option<ProgressBar>,
    last_text: Option<String>,
    tool_calls: u32,
    input_tokens: u64,
    output_tokens: u64,
}

impl EventRenderer<Stdout, Stderr> {
    /// Renderer on the process's stdout/stderr; the spinner is only shown
    /// on an interactive terminal.
    pub fn stdio(json: bool) -> Self {
        let mut renderer = Self::with_writers(io::stdout(), io::stderr(), json);
        renderer.show_spinner = !json && Term::stderr().is_term();
        renderer
    }
}

impl<O: Write, E: Write> EventRenderer<O, E> {
    pub fn with_writers(out: O, err: E, json: bool) -> Self {
        Self {
            out,
            err,
            json,
            show_spinner: false,
            spinner: None,
            last_text: None,
            tool_calls: 0,
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    /// Signal that a session is starting.
    pub fn start(&mut self) {
        self.last_text = None;
        self.tool_calls = 0;
        self.input_tokens = 0;
        self.output_tokens = 0;
        if self.show_spinner {
            self.spinner = Some(create_spinner_with_message("Thinking..."));
        }
    }

    pub fn render(&mut self, event: &AgentEvent) -> io::Result<()> {
        if self.json {
            let line = serde_json::to_string(event).map_err(io::Error::other)?;
            writeln!(self.out, "{line}")?;
            return self.out.flush();
        }

        match event {
            AgentEvent::Text { text } => {
                self.print_out(text)?;
                self.last_text = Some(text.trim().to_string());
            }
            AgentEvent::Tool { name } => {
                self.tool_calls = self.tool_calls.saturating_add(1);
                if let Some(ref spinner) = self.spinner {
                    spinner.set_message(format!("Running {name}"));
                }
                let line = style(format!("  → {name}")).dim().to_string();
                self.print_err(&line)?;
            }
            AgentEvent::Usage { input, output } => {
                self.input_tokens = self.input_tokens.saturating_add(*input);
                self.output_tokens = self.output_tokens.saturating_add(*output);
            }
            AgentEvent::Result { text } => {
                // The final result usually repeats the last assistant text
                if self.last_text.as_deref() != Some(text.trim()) {
                    self.print_out(text)?;
                }
            }
            AgentEvent::Done => {
                self.clear();
                if self.input_tokens.saturating_add(self.output_tokens) > 0 {
                    let line = style(format!(
                        "{} tool calls, {} input / {} output tokens",
                        self.tool_calls, self.input_tokens, self.output_tokens
                    ))
                    .dim()
                    .to_string();
                    writeln!(self.err, "{line}")?;
                }
            }
        }
        self.out.flush()
    }

    /// Remove the spinner without rendering anything else.
    pub fn clear(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Report a failed session.
    pub fn render_error(&mut self, error: &DomainError) -> io::Result<()> {
        if self.json {
            let line = serde_json::json!({ "type": "error", "message": error.to_string() });
            writeln!(self.out, "{line}")?;
            return self.out.flush();
        }
        let line = format!("{} {error}", style("Error:").red().bold());
        self.print_err(&line)
    }

    fn print_out(&mut self, text: &str) -> io::Result<()> {
        match self.spinner {
            Some(ref spinner) => spinner.suspend(|| writeln!(self.out, "{text}")),
            None => writeln!(self.out, "{text}"),
        }
    }

    fn print_err(&mut self, text: &str) -> io::Result<()> {
        match self.spinner {
            Some(ref spinner) => spinner.suspend(|| writeln!(self.err, "{text}")),
            None => writeln!(self.err, "{text}"),
        }
    }
}
