//! Application layer: session assembly and streaming orchestration.

pub mod config_builder;
pub mod orchestrator;

pub use config_builder::{EnvSource, SessionConfigBuilder, ENV_ALLOWLIST};
pub use orchestrator::{translate_message, AgentEventStream, StreamingOrchestrator};
