//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

use console::style;

use crate::domain::errors::DomainError;

const CONFIGURATION_HINT: &str =
    "check agent and providers settings in .todo-agent/config.yaml or the --config file";

/// Hint for errors the user fixes in configuration rather than by retrying.
pub fn configuration_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<DomainError>())
        .any(DomainError::is_configuration)
        .then_some(CONFIGURATION_HINT)
}

/// Print an error chain and exit with a failure status.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let hint = configuration_hint(&err);
    if json_mode {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let value = serde_json::json!({
            "error": err.to_string(),
            "causes": causes,
            "hint": hint,
        });
        println!("{value}");
    } else {
        eprintln!("{} {err}", style("Error:").red().bold());
        for cause in err.chain().skip(1) {
            eprintln!("  {} {cause}", style("caused by:").dim());
        }
        if let Some(hint) = hint {
            eprintln!("  {} {hint}", style("hint:").yellow());
        }
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_configuration_errors_get_a_hint() {
        let err: anyhow::Result<()> =
            Err(DomainError::UnknownCapability("mcp__sqlite__drop".into())).context("Failed to start request");
        assert_eq!(configuration_hint(&err.unwrap_err()), Some(CONFIGURATION_HINT));

        let err = anyhow::Error::from(DomainError::Transport("broken pipe".into()));
        assert_eq!(configuration_hint(&err), None);
    }
}
