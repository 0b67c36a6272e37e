//! Command-line parsing tests

use clap::Parser;
use std::path::PathBuf;
use todo_agent::cli::{Cli, Commands};

#[test]
fn test_ask_joins_prompt_words() {
    let cli = Cli::try_parse_from(["todo-agent", "ask", "add", "buy milk", "with", "high", "priority"])
        .unwrap();
    match cli.command {
        Commands::Ask(args) => {
            assert_eq!(args.prompt_text(), "add buy milk with high priority");
            assert!(args.overrides.model.is_none());
        }
        other => panic!("expected ask, got {other:?}"),
    }
    assert!(!cli.json);
}

#[test]
fn test_ask_requires_prompt() {
    assert!(Cli::try_parse_from(["todo-agent", "ask"]).is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "todo-agent",
        "ask",
        "list tasks",
        "--json",
        "--config",
        "/etc/todo-agent.yaml",
    ])
    .unwrap();
    assert!(cli.json);
    assert_eq!(cli.config, Some(PathBuf::from("/etc/todo-agent.yaml")));
}

#[test]
fn test_agent_overrides() {
    let cli = Cli::try_parse_from([
        "todo-agent",
        "chat",
        "--model",
        "sonnet",
        "--max-turns",
        "10",
        "--timeout",
        "60",
    ])
    .unwrap();
    let Commands::Chat(args) = cli.command else {
        panic!("expected chat");
    };
    assert_eq!(args.overrides.model.as_deref(), Some("sonnet"));
    assert_eq!(args.overrides.max_turns, Some(10));
    assert_eq!(args.overrides.timeout, Some(60));
}

#[test]
fn test_invalid_max_turns_value() {
    assert!(Cli::try_parse_from(["todo-agent", "chat", "--max-turns", "many"]).is_err());
}

#[test]
fn test_session_config_flags() {
    let cli = Cli::try_parse_from(["todo-agent", "session-config", "--embedded", "--show-prompt"])
        .unwrap();
    let Commands::SessionConfig(args) = cli.command else {
        panic!("expected session-config");
    };
    assert!(args.embedded);
    assert!(args.show_prompt);
}

#[test]
fn test_simple_subcommands() {
    let parse = |name: &str| Cli::try_parse_from(["todo-agent", name, "-j"]).unwrap();

    let cli = parse("capabilities");
    assert!(matches!(cli.command, Commands::Capabilities));
    assert!(cli.json);
    assert!(matches!(parse("contract").command, Commands::Contract));
    assert!(matches!(parse("config").command, Commands::Config));
}

#[test]
fn test_unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["todo-agent", "serve"]).is_err());
}
