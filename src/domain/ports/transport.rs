//! Transport port - interface for agent session backends.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::domain::errors::DomainResult;
use crate::domain::models::{SessionConfiguration, SessionMessage};

/// Raw messages of one session, in arrival order.
///
/// An `Err` item is a transport failure; the stream ends after it. Dropping
/// the stream must release every process and pipe the session holds.
pub type MessageStream = Pin<Box<dyn Stream<Item = DomainResult<SessionMessage>> + Send>>;

/// Trait for agent session transports.
///
/// A transport submits one prompt with one configuration and hands back the
/// session's message stream. It knows nothing about event translation.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Get the transport name.
    fn name(&self) -> &'static str;

    /// Check if the transport is installed and usable.
    async fn is_available(&self) -> DomainResult<bool>;

    /// Start a session and return its message stream.
    async fn open(&self, prompt: &str, config: &SessionConfiguration) -> DomainResult<MessageStream>;
}
