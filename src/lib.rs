//! todo-agent - conversational task manager
//!
//! Streams a Claude Code agent session that manages a todo list through
//! SQLite and filesystem MCP servers, and normalizes its output into a
//! small set of events.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): capability registry, behavior contract,
//!   session and event models, the transport port
//! - **Application Layer** (`application`): session configuration and
//!   streaming orchestration
//! - **Adapters** (`adapters`): the Claude Code CLI transport and a mock
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use todo_agent::application::StreamingOrchestrator;
//! use todo_agent::domain::models::{AgentEvent, Config};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let orchestrator = StreamingOrchestrator::from_config(&Config::default());
//! let mut events = orchestrator.stream_agent("add buy milk with high priority")?;
//! while let Some(event) = events.next().await {
//!     if let AgentEvent::Text { text } = event? {
//!         println!("{text}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use adapters::transports::{ClaudeCodeTransport, MockTransport};
pub use application::{AgentEventStream, SessionConfigBuilder, StreamingOrchestrator};
pub use domain::models::{
    AgentEvent, BehaviorContract, Capability, CapabilityProvider, CapabilityRegistry,
    CapabilitySet, Config, SessionConfiguration, Task, TaskPriority, TaskStatus,
};
pub use domain::ports::AgentTransport;
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
