//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

#![allow(dead_code)]

use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use todo_agent::adapters::transports::MockTransport;
use todo_agent::application::{AgentEventStream, SessionConfigBuilder, StreamingOrchestrator};
use todo_agent::domain::models::{AgentEvent, Config};
use todo_agent::domain::DomainResult;

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Builder with a fixed environment so tests don't depend on the caller's.
pub fn test_builder(config: &Config) -> SessionConfigBuilder {
    SessionConfigBuilder::from_config(config).with_env_source(|key| match key {
        "PATH" => Some("/usr/bin:/bin".to_string()),
        "HOME" => Some("/tmp".to_string()),
        _ => None,
    })
}

/// Orchestrator over a mock transport, without a session timeout.
pub fn mock_orchestrator(transport: MockTransport) -> StreamingOrchestrator {
    StreamingOrchestrator::new(Arc::new(transport), test_builder(&Config::default()))
        .with_timeout(None)
}

/// Drain a stream into its items.
pub async fn collect(stream: AgentEventStream) -> Vec<DomainResult<AgentEvent>> {
    stream.collect().await
}

/// Drain a stream, panicking on the first error item.
pub async fn collect_events(stream: AgentEventStream) -> Vec<AgentEvent> {
    collect(stream)
        .await
        .into_iter()
        .map(|item| item.expect("unexpected error item"))
        .collect()
}

/// `assistant` line with one text block per entry.
pub fn assistant_text(texts: &[&str]) -> String {
    let blocks: Vec<_> = texts
        .iter()
        .map(|t| serde_json::json!({ "type": "text", "text": t }))
        .collect();
    serde_json::json!({ "type": "assistant", "message": { "content": blocks } }).to_string()
}

/// `assistant` line invoking one tool.
pub fn assistant_tool(name: &str) -> String {
    serde_json::json!({
        "type": "assistant",
        "message": { "content": [{ "type": "tool_use", "id": "toolu_01", "name": name, "input": {} }] }
    })
    .to_string()
}

/// `result` line.
pub fn result_line(text: &str) -> String {
    serde_json::json!({ "type": "result", "subtype": "success", "result": text, "is_error": false })
        .to_string()
}

/// `system` init line reporting provider status.
pub fn system_init(sqlite_status: &str) -> String {
    serde_json::json!({
        "type": "system",
        "subtype": "init",
        "session_id": "test-session",
        "mcp_servers": [
            { "name": "sqlite", "status": sqlite_status },
            { "name": "filesystem", "status": "connected" }
        ]
    })
    .to_string()
}

/// Write an executable shell script standing in for the agent CLI.
#[cfg(unix)]
pub fn fake_agent(body: &str) -> (TempDir, PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("claude");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write fake agent");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake agent executable");
    (dir, path)
}
