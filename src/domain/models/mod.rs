//! Domain models for the todo agent.

pub mod capability;
pub mod config;
pub mod contract;
pub mod event;
pub mod message;
pub mod session;
pub mod task;

pub use capability::{Capability, CapabilityProvider, CapabilityRegistry, CapabilitySet};
pub use config::{
    AgentConfig, Config, FilesystemProviderConfig, LoggingConfig, ProvidersConfig,
    SqliteProviderConfig, DEFAULT_MAX_TURNS, DEFAULT_MODEL,
};
pub use contract::{BehaviorContract, ContractSection, Intent, Procedure, TODO_SCHEMA, TODO_TABLE};
pub use event::AgentEvent;
pub use message::{ContentBlock, MessageBody, ResultMessage, SessionMessage, SystemMessage, Usage};
pub use session::{McpServerDescriptor, McpTransportKind, SessionConfiguration, SessionSummary};
pub use task::{Task, TaskPriority, TaskStatus};
