//! The Claude Code transport against a scripted stand-in executable.

#![cfg(unix)]

mod common;

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

use common::*;
use todo_agent::adapters::transports::{ClaudeCodeConfig, ClaudeCodeTransport};
use todo_agent::application::{SessionConfigBuilder, StreamingOrchestrator};
use todo_agent::domain::models::{AgentEvent, Config};
use todo_agent::domain::ports::AgentTransport;
use todo_agent::domain::DomainError;

fn orchestrator_for(agent: &std::path::Path, config: &Config) -> StreamingOrchestrator {
    let transport = ClaudeCodeTransport::new(
        ClaudeCodeConfig::default().with_binary_path(agent.display().to_string()),
    );
    StreamingOrchestrator::new(Arc::new(transport), SessionConfigBuilder::from_config(config))
        .with_timeout(Some(Duration::from_secs(20)))
}

#[tokio::test]
async fn test_streams_agent_output() {
    let script = format!(
        "cat <<'EOF'\n{}\n\n{}\n{}\nEOF",
        system_init("connected"),
        r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Added"},{"type":"tool_use","id":"t1","name":"mcp__sqlite__write_query","input":{}}],"usage":{"input_tokens":5,"output_tokens":2}}}"#,
        result_line("Task added"),
    );
    let (_dir, agent) = fake_agent(&script);

    let orchestrator = orchestrator_for(&agent, &Config::default());
    let events = collect_events(orchestrator.stream_agent("add buy milk").unwrap()).await;

    assert_eq!(
        events,
        vec![
            AgentEvent::text("Added"),
            AgentEvent::tool("mcp__sqlite__write_query"),
            AgentEvent::Usage { input: 5, output: 2 },
            AgentEvent::result("Task added"),
            AgentEvent::Done,
        ]
    );
}

#[tokio::test]
async fn test_passes_arguments_and_explicit_environment() {
    let (dir, agent) = fake_agent(
        "printf '%s\\n' \"$@\" > \"$ARGS_FILE\"\nenv > \"$ENV_FILE\"\necho '{\"type\":\"result\",\"result\":\"ok\"}'",
    );
    let args_file = dir.path().join("args.txt");
    let env_file = dir.path().join("env.txt");

    let mut config = Config::default();
    config.agent.model = "sonnet".to_string();
    config.agent.max_turns = 7;
    config.agent.env.insert("ARGS_FILE".to_string(), args_file.display().to_string());
    config.agent.env.insert("ENV_FILE".to_string(), env_file.display().to_string());

    let transport = ClaudeCodeTransport::new(
        ClaudeCodeConfig::default().with_binary_path(agent.display().to_string()),
    );
    let builder = test_builder(&config);
    let orchestrator = StreamingOrchestrator::new(Arc::new(transport), builder);

    let events = collect_events(orchestrator.stream_agent("--list everything").unwrap()).await;
    assert_eq!(events, vec![AgentEvent::result("ok"), AgentEvent::Done]);

    let args = std::fs::read_to_string(&args_file).unwrap();
    let args: Vec<&str> = args.lines().collect();
    let after = |flag: &str| args.iter().position(|a| *a == flag).map(|i| args[i + 1]);

    assert_eq!(args[0], "--print");
    assert_eq!(after("--output-format"), Some("stream-json"));
    assert_eq!(after("--model"), Some("sonnet"));
    assert_eq!(after("--max-turns"), Some("7"));
    assert!(after("--allowedTools").unwrap().contains("mcp__filesystem__create_directory"));
    assert!(args.contains(&"--strict-mcp-config"));
    assert_eq!(&args[args.len() - 2..], ["--", "--list everything"]);

    let env = std::fs::read_to_string(&env_file).unwrap();
    assert!(env.lines().any(|l| l == "HOME=/tmp"));
    assert!(env.lines().any(|l| l.starts_with("ARGS_FILE=")));
    assert!(!env.lines().any(|l| l.starts_with("CARGO_PKG_NAME=")));
}

#[tokio::test]
async fn test_nonzero_exit_is_reported_with_stderr() {
    let (_dir, agent) = fake_agent(&format!(
        "echo '{}'\necho 'MCP server sqlite failed to start' >&2\nexit 3",
        assistant_text(&["Let me check"])
    ));

    let orchestrator = orchestrator_for(&agent, &Config::default());
    let items = collect(orchestrator.stream_agent("list").unwrap()).await;

    assert_eq!(items.len(), 3);
    assert!(matches!(&items[0], Ok(AgentEvent::Text { text }) if text == "Let me check"));
    match &items[1] {
        Err(DomainError::Transport(message)) => {
            assert!(message.contains("MCP server sqlite failed to start"), "{message}");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
    assert!(matches!(&items[2], Ok(AgentEvent::Done)));
}

#[tokio::test]
async fn test_missing_binary_yields_error_then_done() {
    let config = Config::default();
    let orchestrator = orchestrator_for(std::path::Path::new("/nonexistent/claude"), &config);

    let items = collect(orchestrator.stream_agent("hi").unwrap()).await;
    assert_eq!(items.len(), 2);
    assert!(matches!(&items[0], Err(DomainError::SpawnFailed(_))));
    assert!(matches!(&items[1], Ok(AgentEvent::Done)));
}

#[tokio::test]
async fn test_is_available_checks_version() {
    let (_dir, agent) = fake_agent("[ \"$1\" = \"--version\" ] && echo '1.0.0 (Claude Code)'");
    let transport = ClaudeCodeTransport::new(
        ClaudeCodeConfig::default().with_binary_path(agent.display().to_string()),
    );
    assert!(transport.is_available().await.unwrap());
}

#[tokio::test]
async fn test_dropping_stream_stops_agent_process() {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let (dir, agent) = fake_agent(&format!(
        "echo $$ > \"$PID_FILE\"\necho '{}'\nexec sleep 30",
        assistant_text(&["thinking"])
    ));
    let pid_file = dir.path().join("pid");

    let mut config = Config::default();
    config.agent.env.insert("PID_FILE".to_string(), pid_file.display().to_string());
    let orchestrator = orchestrator_for(&agent, &config);

    let mut stream = orchestrator.stream_agent("hi").unwrap();
    assert!(matches!(stream.next().await, Some(Ok(AgentEvent::Text { .. }))));

    let pid: i32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
    assert!(kill(Pid::from_raw(pid), None).is_ok(), "agent should be running");

    drop(stream);

    let mut stopped = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if kill(Pid::from_raw(pid), None).is_err() {
            stopped = true;
            break;
        }
    }
    assert!(stopped, "agent process should exit after the stream is dropped");
}
