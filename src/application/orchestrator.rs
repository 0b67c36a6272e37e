//! Streaming orchestration of agent sessions.
//!
//! [`StreamingOrchestrator::stream_agent`] turns one prompt into a lazy
//! [`AgentEventStream`]: the session is opened on first poll, raw session
//! messages are translated into [`AgentEvent`]s as they arrive, and the
//! stream always finishes with exactly one [`AgentEvent::Done`].

use futures::stream::{FusedStream, Stream};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::Sleep;
use tracing::{debug, info, info_span, warn, Span};

use crate::adapters::transports::{ClaudeCodeConfig, ClaudeCodeTransport};
use crate::application::config_builder::SessionConfigBuilder;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AgentEvent, Config, ContentBlock, SessionMessage, SessionSummary,
};
use crate::domain::ports::{AgentTransport, MessageStream};

/// Runs prompts through an agent transport and normalizes the output.
///
/// Holds only immutable settings, so concurrent calls are independent.
pub struct StreamingOrchestrator {
    transport: Arc<dyn AgentTransport>,
    builder: SessionConfigBuilder,
    timeout: Option<Duration>,
}

impl StreamingOrchestrator {
    /// Create an orchestrator; the session timeout comes from the builder's
    /// agent settings.
    pub fn new(transport: Arc<dyn AgentTransport>, builder: SessionConfigBuilder) -> Self {
        let timeout_secs = builder.agent().timeout_secs;
        Self {
            transport,
            builder,
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }

    /// Orchestrator backed by the Claude Code CLI named in `config`.
    pub fn from_config(config: &Config) -> Self {
        let transport = ClaudeCodeTransport::new(
            ClaudeCodeConfig::default().with_binary_path(config.agent.claude_path.clone()),
        );
        Self::new(Arc::new(transport), SessionConfigBuilder::from_config(config))
    }

    /// Override the wall-clock limit per session (`None` disables it).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Whether the underlying agent can be started at all.
    pub async fn is_available(&self) -> DomainResult<bool> {
        self.transport.is_available().await
    }

    /// Stream the agent's response to one prompt.
    ///
    /// Configuration errors are returned here, before any session exists.
    /// Nothing is started until the returned stream is first polled.
    pub fn stream_agent(&self, prompt: &str) -> DomainResult<AgentEventStream> {
        let config = self.builder.build_configuration(true)?;
        let summary = SessionSummary::new();
        let span = info_span!("agent_session", session_id = %summary.id, transport = self.transport.name());

        let transport = Arc::clone(&self.transport);
        let prompt = prompt.to_string();
        let opening: OpenFuture = Box::pin(async move { transport.open(&prompt, &config).await });

        Ok(AgentEventStream {
            state: StreamState::Opening(opening),
            pending: VecDeque::new(),
            timeout: self.timeout,
            deadline: None,
            summary,
            span,
        })
    }
}

/// Translate one raw session message into normalized events.
///
/// Within a message: text blocks first, then tool invocations, then token
/// usage, then the final result.
pub fn translate_message(message: &SessionMessage) -> Vec<AgentEvent> {
    let mut events = Vec::new();

    if let SessionMessage::Assistant(_) = message {
        if let Some(body) = message.body() {
            events.extend(body.content.iter().filter_map(|block| match block {
                ContentBlock::Text { text } if !text.is_empty() => Some(AgentEvent::text(text.clone())),
                _ => None,
            }));
            events.extend(body.content.iter().filter_map(|block| match block {
                ContentBlock::ToolUse { name, .. } => Some(AgentEvent::tool(name.clone())),
                _ => None,
            }));
        }
    }

    if let Some(usage) = message.body().and_then(|body| body.usage) {
        events.push(AgentEvent::Usage {
            input: usage.input_tokens.unwrap_or(0),
            output: usage.output_tokens.unwrap_or(0),
        });
    }

    if let SessionMessage::Result(result) = message {
        if let Some(text) = result.result.as_deref().filter(|t| !t.is_empty()) {
            events.push(AgentEvent::result(text));
        }
    }

    events
}

type OpenFuture = Pin<Box<dyn Future<Output = DomainResult<MessageStream>> + Send>>;

enum StreamState {
    /// Session not started yet, or starting
    Opening(OpenFuture),
    /// Reading the session's messages
    Streaming(MessageStream),
    /// `Done` has been queued; the session is released
    Finished,
}

enum Step {
    Opened(DomainResult<MessageStream>),
    Received(Option<DomainResult<SessionMessage>>),
}

/// Lazy, finite stream of [`AgentEvent`]s for one session.
///
/// Dropping the stream releases the session and the agent process.
pub struct AgentEventStream {
    state: StreamState,
    pending: VecDeque<DomainResult<AgentEvent>>,
    timeout: Option<Duration>,
    deadline: Option<Pin<Box<Sleep>>>,
    summary: SessionSummary,
    span: Span,
}

impl AgentEventStream {
    /// Running totals for this session.
    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// The clock starts on first poll, when the session is opened.
    fn deadline_passed(&mut self, cx: &mut Context<'_>) -> bool {
        let Some(timeout) = self.timeout else {
            return false;
        };
        self.deadline
            .get_or_insert_with(|| Box::pin(tokio::time::sleep(timeout)))
            .as_mut()
            .poll(cx)
            .is_ready()
    }

    fn accept(&mut self, message: &SessionMessage) {
        self.summary.messages += 1;

        if let SessionMessage::System(system) = message {
            for server in system.mcp_servers.iter().filter(|s| !s.is_connected()) {
                warn!(provider = %server.name, status = %server.status, "capability provider not connected");
            }
        }

        for event in translate_message(message) {
            match event {
                AgentEvent::Tool { ref name } => {
                    self.summary.tool_calls += 1;
                    debug!(tool = %name, "agent invoked capability");
                }
                AgentEvent::Usage { input, output } => self.summary.record_usage(input, output),
                _ => {}
            }
            debug!(kind = event.kind(), "agent event");
            self.pending.push_back(Ok(event));
        }
    }

    fn fail(&mut self, error: DomainError) {
        warn!(error = %error, "agent session failed");
        self.pending.push_back(Err(error));
        self.finish(true);
    }

    fn finish(&mut self, failed: bool) {
        self.state = StreamState::Finished;
        self.deadline = None;
        self.summary.finish(failed);
        info!(
            messages = self.summary.messages,
            tool_calls = self.summary.tool_calls,
            input_tokens = self.summary.input_tokens,
            output_tokens = self.summary.output_tokens,
            total_tokens = self.summary.total_tokens(),
            duration_ms = self.summary.duration_ms().unwrap_or_default(),
            failed,
            "agent session finished"
        );
        self.pending.push_back(Ok(AgentEvent::Done));
    }
}

impl Stream for AgentEventStream {
    type Item = DomainResult<AgentEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let span = this.span.clone();
        let _entered = span.enter();

        loop {
            if let Some(item) = this.pending.pop_front() {
                return Poll::Ready(Some(item));
            }

            if matches!(this.state, StreamState::Finished) {
                return Poll::Ready(None);
            }

            if this.deadline_passed(cx) {
                let secs = this.timeout.map_or(0, |t| t.as_secs());
                // Release the session before reporting
                this.state = StreamState::Finished;
                this.fail(DomainError::SessionTimedOut(secs));
                continue;
            }

            let step = match &mut this.state {
                StreamState::Opening(opening) => match opening.as_mut().poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(result) => Step::Opened(result),
                },
                StreamState::Streaming(messages) => match messages.as_mut().poll_next(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(item) => Step::Received(item),
                },
                StreamState::Finished => return Poll::Ready(None),
            };

            match step {
                Step::Opened(Ok(messages)) => {
                    debug!("agent session opened");
                    this.state = StreamState::Streaming(messages);
                }
                Step::Opened(Err(e)) | Step::Received(Some(Err(e))) => this.fail(e),
                Step::Received(Some(Ok(message))) => this.accept(&message),
                Step::Received(None) => this.finish(false),
            }
        }
    }
}

impl FusedStream for AgentEventStream {
    fn is_terminated(&self) -> bool {
        matches!(self.state, StreamState::Finished) && self.pending.is_empty()
    }
}

impl Drop for AgentEventStream {
    fn drop(&mut self) {
        if !matches!(self.state, StreamState::Finished) {
            let _entered = self.span.enter();
            debug!("agent session dropped before completion");
        }
    }
}

impl std::fmt::Debug for AgentEventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            StreamState::Opening(_) => "opening",
            StreamState::Streaming(_) => "streaming",
            StreamState::Finished => "finished",
        };
        f.debug_struct("AgentEventStream")
            .field("state", &state)
            .field("pending", &self.pending.len())
            .field("session_id", &self.summary.id)
            .finish_non_exhaustive()
    }
}
