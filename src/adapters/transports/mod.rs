//! Agent transport implementations.

pub mod claude_code;
pub mod mock;

pub use claude_code::{ClaudeCodeConfig, ClaudeCodeTransport};
pub use mock::{MockCall, MockStep, MockTransport};
