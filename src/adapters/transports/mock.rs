//! Mock transport for testing.
//!
//! Replays a scripted session without starting any process, and records
//! what it was asked to do so tests can assert on it.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{SessionConfiguration, SessionMessage};
use crate::domain::ports::{AgentTransport, MessageStream};

/// One scripted step of a mock session.
#[derive(Debug, Clone)]
pub enum MockStep {
    /// A protocol line, decoded like real agent output
    Line(String),
    /// An already decoded message
    Message(SessionMessage),
    /// A transport failure; the session ends after it
    Fail(String),
    /// Never produce anything else
    Hang,
}

/// What the transport observed on its last `open`.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub prompt: String,
    pub config: SessionConfiguration,
}

/// Mock transport for testing.
pub struct MockTransport {
    script: Vec<MockStep>,
    open_error: Option<String>,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockTransport {
    pub fn new(script: Vec<MockStep>) -> Self {
        Self {
            script,
            open_error: None,
            opened: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script a session from raw protocol lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(lines.into_iter().map(|l| MockStep::Line(l.into())).collect())
    }

    /// A transport whose sessions fail to start.
    pub fn failing_open(error: impl Into<String>) -> Self {
        Self {
            open_error: Some(error.into()),
            ..Self::new(vec![])
        }
    }

    /// Shared flag for observing release after the transport moved into an `Arc`.
    pub fn release_flag(&self) -> Arc<AtomicBool> {
        self.released.clone()
    }

    /// Shared counter for observing opens after the transport moved into an `Arc`.
    pub fn open_counter(&self) -> Arc<AtomicUsize> {
        self.opened.clone()
    }

    /// Shared call log for observing calls after the transport moved into an `Arc`.
    pub fn call_log(&self) -> Arc<Mutex<Vec<MockCall>>> {
        self.calls.clone()
    }
}

/// Sets the release flag when the session stream is dropped.
struct ReleaseGuard(Arc<AtomicBool>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AgentTransport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn is_available(&self) -> DomainResult<bool> {
        Ok(true)
    }

    async fn open(&self, prompt: &str, config: &SessionConfiguration) -> DomainResult<MessageStream> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCall {
                prompt: prompt.to_string(),
                config: config.clone(),
            });
        }

        if let Some(ref error) = self.open_error {
            return Err(DomainError::SpawnFailed(error.clone()));
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        self.released.store(false, Ordering::SeqCst);

        let steps: VecDeque<MockStep> = self.script.iter().cloned().collect();
        let guard = ReleaseGuard(self.released.clone());

        let stream = futures::stream::unfold((steps, guard), |(mut steps, guard)| async move {
            match steps.pop_front()? {
                MockStep::Line(line) => Some((Ok(SessionMessage::decode(&line)), (steps, guard))),
                MockStep::Message(message) => Some((Ok(message), (steps, guard))),
                MockStep::Fail(error) => {
                    steps.clear();
                    Some((Err(DomainError::Transport(error)), (steps, guard)))
                }
                MockStep::Hang => {
                    futures::future::pending::<()>().await;
                    None
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::SessionConfigBuilder;
    use crate::domain::models::Config;
    use futures::StreamExt;

    fn config() -> SessionConfiguration {
        SessionConfigBuilder::from_config(&Config::default())
            .build_configuration(false)
            .unwrap()
    }

    #[tokio::test]
    async fn test_replays_script_and_records_call() {
        let transport = MockTransport::new(vec![
            MockStep::Line(r#"{"type":"result","result":"ok"}"#.to_string()),
            MockStep::Fail("pipe closed".to_string()),
            MockStep::Line(r#"{"type":"result","result":"never"}"#.to_string()),
        ]);

        let opened = transport.open_counter();
        let released = transport.release_flag();
        let calls = transport.call_log();

        let items: Vec<_> = transport.open("hello", &config()).await.unwrap().collect().await;

        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], Ok(SessionMessage::Result(r)) if r.result.as_deref() == Some("ok")));
        assert!(matches!(&items[1], Err(DomainError::Transport(e)) if e == "pipe closed"));
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert!(released.load(Ordering::SeqCst));
        assert_eq!(calls.lock().unwrap()[0].prompt, "hello");
    }

    #[tokio::test]
    async fn test_failing_open() {
        let transport = MockTransport::failing_open("no binary");
        let result = transport.open("hello", &config()).await;
        assert!(matches!(result, Err(DomainError::SpawnFailed(_))));
        assert_eq!(transport.open_counter().load(Ordering::SeqCst), 0);
    }
}
