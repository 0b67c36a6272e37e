//! Raw session messages.
//!
//! The agent CLI prints one JSON object per line (`--output-format
//! stream-json`). The shapes are open-ended, so decoding is lenient: every
//! line becomes one of a closed set of variants, and anything that does not
//! fit lands in [`SessionMessage::Other`] instead of failing the stream.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One decoded line of the session protocol.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionMessage {
    /// Session bookkeeping (init, compaction notices)
    System(SystemMessage),
    /// Model output: text and tool calls
    Assistant(ConversationMessage),
    /// Tool results fed back to the model
    User(ConversationMessage),
    /// Terminal summary of the session
    Result(ResultMessage),
    /// Anything not recognised
    #[serde(other)]
    Other,
}

impl SessionMessage {
    /// Decode one protocol line, never failing.
    pub fn decode(line: &str) -> Self {
        match serde_json::from_str::<Self>(line) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(error = %e, "unrecognised session message");
                Self::Other
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::System(_) => "system",
            Self::Assistant(_) => "assistant",
            Self::User(_) => "user",
            Self::Result(_) => "result",
            Self::Other => "other",
        }
    }

    /// Body of an assistant or user message, if present.
    pub fn body(&self) -> Option<&MessageBody> {
        match self {
            Self::Assistant(m) | Self::User(m) => m.message.as_ref(),
            _ => None,
        }
    }
}

/// `system` message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SystemMessage {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub mcp_servers: Vec<McpServerStatus>,
}

/// Connection state of one capability provider as reported at init.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct McpServerStatus {
    pub name: String,
    pub status: String,
}

impl McpServerStatus {
    pub fn is_connected(&self) -> bool {
        self.status == "connected"
    }
}

/// `assistant` or `user` message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConversationMessage {
    #[serde(default, deserialize_with = "lenient_option")]
    pub message: Option<MessageBody>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Inner model message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessageBody {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub content: Vec<ContentBlock>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub usage: Option<Usage>,
}

/// One content block of a model message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

/// Token accounting attached to a model message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
    #[serde(default)]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default)]
    pub cache_read_input_tokens: Option<u64>,
}

/// `result` message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultMessage {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub result: Option<String>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub num_turns: Option<u32>,
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Decode an array element by element, replacing bad elements with their
/// fallback and anything that is not an array with an empty list.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Fallback,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok().or_else(T::fallback))
            .collect(),
        _ => Vec::new(),
    })
}

/// Decode an optional object, treating a malformed value as absent.
fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Decode a result payload: strings verbatim, other non-null values as JSON.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Replacement for an element that failed to decode; `None` drops it.
trait Fallback: Sized {
    fn fallback() -> Option<Self>;
}

impl Fallback for ContentBlock {
    fn fallback() -> Option<Self> {
        Some(Self::Other)
    }
}

impl Fallback for McpServerStatus {
    fn fallback() -> Option<Self> {
        None
    }
}
