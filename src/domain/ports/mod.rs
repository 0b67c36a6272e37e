//! Port trait definitions (Hexagonal Architecture)
//!
//! - AgentTransport: opens an agent session and yields its raw messages
//!
//! The orchestrator depends only on these traits, so the Claude Code CLI
//! adapter and the scripted test transport are interchangeable.

pub mod transport;

pub use transport::{AgentTransport, MessageStream};
