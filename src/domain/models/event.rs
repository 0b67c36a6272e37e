//! Normalized agent events.

use serde::{Deserialize, Serialize};

/// One unit of the normalized output stream.
///
/// Every stream ends with exactly one [`AgentEvent::Done`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Assistant-authored text fragment, verbatim
    Text { text: String },
    /// A capability the assistant invoked (identifier only)
    Tool { name: String },
    /// Token usage reported on one message
    Usage { input: u64, output: u64 },
    /// Final result text of the session
    Result { text: String },
    /// End of stream
    Done,
}

impl AgentEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool(name: impl Into<String>) -> Self {
        Self::Tool { name: name.into() }
    }

    pub fn result(text: impl Into<String>) -> Self {
        Self::Result { text: text.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Tool { .. } => "tool",
            Self::Usage { .. } => "usage",
            Self::Result { .. } => "result",
            Self::Done => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        assert_eq!(
            serde_json::to_string(&AgentEvent::text("hi")).unwrap(),
            r#"{"type":"text","text":"hi"}"#
        );
        assert_eq!(
            serde_json::to_string(&AgentEvent::tool("mcp__sqlite__read_query")).unwrap(),
            r#"{"type":"tool","name":"mcp__sqlite__read_query"}"#
        );
        assert_eq!(
            serde_json::to_string(&AgentEvent::Usage { input: 12, output: 0 }).unwrap(),
            r#"{"type":"usage","input":12,"output":0}"#
        );
        assert_eq!(serde_json::to_string(&AgentEvent::Done).unwrap(), r#"{"type":"done"}"#);
    }

    #[test]
    fn test_kind() {
        assert_eq!(AgentEvent::result("ok").kind(), "result");
        assert!(AgentEvent::Done.is_done());
        assert!(!AgentEvent::text("x").is_done());
    }
}
