//! Claude Code CLI transport implementation.
//!
//! Spawns one headless Claude Code CLI process per session and reads its
//! `stream-json` output line by line.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{SessionConfiguration, SessionMessage};
use crate::domain::ports::{AgentTransport, MessageStream};

/// Bytes of stderr kept for error reports.
const STDERR_TAIL_BYTES: usize = 4096;

/// Time a cancelled session gets to exit after SIGTERM before it is killed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Claude Code CLI transport configuration.
#[derive(Debug, Clone)]
pub struct ClaudeCodeConfig {
    /// Path to claude CLI binary
    pub binary_path: String,
    /// Output format for print mode (must be stream-json for streaming)
    pub output_format: String,
    /// Additional CLI flags
    pub extra_flags: Vec<String>,
}

impl Default for ClaudeCodeConfig {
    fn default() -> Self {
        Self {
            binary_path: "claude".to_string(),
            output_format: "stream-json".to_string(),
            extra_flags: vec![],
        }
    }
}

impl ClaudeCodeConfig {
    pub fn with_binary_path(mut self, path: impl Into<String>) -> Self {
        self.binary_path = path.into();
        self
    }
}

/// Claude Code CLI transport.
pub struct ClaudeCodeTransport {
    config: ClaudeCodeConfig,
}

impl ClaudeCodeTransport {
    pub fn new(config: ClaudeCodeConfig) -> Self {
        Self { config }
    }

    /// Build CLI arguments for a session.
    fn build_args(&self, prompt: &str, session: &SessionConfiguration) -> Vec<String> {
        let mut args = vec![
            "--print".to_string(),
            "--output-format".to_string(),
            self.config.output_format.clone(),
            // stream-json in print mode is only emitted with --verbose
            "--verbose".to_string(),
            "--model".to_string(),
            session.model().to_string(),
            "--max-turns".to_string(),
            session.max_turns().to_string(),
        ];

        if !session.system_prompt().is_empty() {
            args.push("--system-prompt".to_string());
            args.push(session.system_prompt().to_string());
        }

        args.push("--allowedTools".to_string());
        args.push(session.allowed_tools().join(","));

        // Standalone sessions bring their own providers and nothing else
        if let Some(mcp_config) = session.mcp_config_json() {
            args.push("--mcp-config".to_string());
            args.push(mcp_config.to_string());
            args.push("--strict-mcp-config".to_string());
        }

        args.extend(self.config.extra_flags.clone());

        // The prompt itself
        args.push("--".to_string());
        args.push(prompt.to_string());

        args
    }
}

impl Default for ClaudeCodeTransport {
    fn default() -> Self {
        Self::new(ClaudeCodeConfig::default())
    }
}

#[async_trait]
impl AgentTransport for ClaudeCodeTransport {
    fn name(&self) -> &'static str {
        "claude_code"
    }

    async fn is_available(&self) -> DomainResult<bool> {
        let output = Command::new(&self.config.binary_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(out) => Ok(out.status.success()),
            Err(_) => Ok(false),
        }
    }

    async fn open(&self, prompt: &str, session: &SessionConfiguration) -> DomainResult<MessageStream> {
        let args = self.build_args(prompt, session);

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.args(&args)
            .env_clear()
            .envs(session.environment())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = session.working_dir() {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            DomainError::SpawnFailed(format!("Failed to spawn {}: {}", self.config.binary_path, e))
        })?;

        info!(
            pid = ?child.id(),
            model = session.model(),
            max_turns = session.max_turns(),
            standalone = session.is_standalone(),
            tools = session.allowed_tools().len(),
            "agent process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DomainError::SpawnFailed("Failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DomainError::SpawnFailed("Failed to capture stderr".to_string()))?;

        let process = SessionProcess {
            child: Some(child),
            lines: BufReader::new(stdout).lines(),
            stderr: Some(tokio::spawn(collect_stderr(stderr))),
        };

        let stream = futures::stream::unfold(Some(process), |state| async move {
            let mut process = state?;
            match process.next_message().await? {
                Ok(message) => Some((Ok(message), Some(process))),
                Err(e) => Some((Err(e), None)),
            }
        });

        Ok(Box::pin(stream))
    }
}

/// A running agent process and its output pipes.
struct SessionProcess {
    child: Option<Child>,
    lines: Lines<BufReader<ChildStdout>>,
    stderr: Option<JoinHandle<String>>,
}

impl SessionProcess {
    /// Next decoded message, a transport error, or `None` after a clean exit.
    async fn next_message(&mut self) -> Option<DomainResult<SessionMessage>> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    return Some(Ok(SessionMessage::decode(&line)));
                }
                Ok(None) => return self.finish().await.err().map(Err),
                Err(e) => {
                    return Some(Err(DomainError::Transport(format!(
                        "Failed to read agent output: {e}"
                    ))))
                }
            }
        }
    }

    /// Reap the process once stdout is closed.
    async fn finish(&mut self) -> DomainResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child
            .wait()
            .await
            .map_err(|e| DomainError::Transport(format!("Failed to wait for agent process: {e}")))?;

        let stderr = match self.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        check_exit(status, &stderr)
    }
}

impl Drop for SessionProcess {
    fn drop(&mut self) {
        if let Some(handle) = self.stderr.take() {
            handle.abort();
        }

        let Some(child) = self.child.take() else {
            return;
        };

        // Abandoned mid-session: let the CLI shut its providers down first.
        // Without a runtime, kill_on_drop takes the process down immediately.
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(shutdown(child));
        }
    }
}

async fn shutdown(mut child: Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) {
            if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
                debug!(pid, error = %e, "failed to signal agent process");
            }
        }
    }

    match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
        Ok(Ok(status)) => debug!(?status, "cancelled agent process exited"),
        Ok(Err(e)) => warn!(error = %e, "error waiting for cancelled agent process"),
        Err(_) => {
            warn!("agent process ignored SIGTERM, killing");
            let _ = child.kill().await;
        }
    }
}

async fn collect_stderr(stderr: tokio::process::ChildStderr) -> String {
    let mut lines = BufReader::new(stderr).lines();
    let mut tail = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "todo_agent::agent_stderr", "{line}");
        tail.push_str(&line);
        tail.push('\n');
        if tail.len() > STDERR_TAIL_BYTES {
            let mut cut = tail.len() - STDERR_TAIL_BYTES;
            while !tail.is_char_boundary(cut) {
                cut += 1;
            }
            tail.drain(..cut);
        }
    }
    tail
}

fn check_exit(status: ExitStatus, stderr: &str) -> DomainResult<()> {
    if status.success() {
        return Ok(());
    }
    let detail = stderr.trim();
    let message = if detail.is_empty() {
        format!("agent process exited with {status}")
    } else {
        format!("agent process exited with {status}: {detail}")
    };
    Err(DomainError::Transport(message))
}
