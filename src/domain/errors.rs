//! Domain errors for the todo agent.

use thiserror::Error;

/// Domain-level errors that can occur while configuring or running a session.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Unknown capability: {0} is not in the capability registry")]
    UnknownCapability(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to start agent session: {0}")]
    SpawnFailed(String),

    #[error("Agent session transport failed: {0}")]
    Transport(String),

    #[error("Agent session timed out after {0}s")]
    SessionTimedOut(u64),

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Configuration errors are raised before a session starts.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnknownCapability(_) | Self::InvalidConfiguration(_))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_classified() {
        assert!(DomainError::UnknownCapability("mcp__x__y".into()).is_configuration());
        assert!(DomainError::InvalidConfiguration("bad".into()).is_configuration());
        assert!(!DomainError::Transport("broken pipe".into()).is_configuration());
        assert!(!DomainError::SessionTimedOut(5).is_configuration());
    }

    #[test]
    fn test_error_messages() {
        let err = DomainError::UnknownCapability("mcp__shell__exec".into());
        assert_eq!(
            err.to_string(),
            "Unknown capability: mcp__shell__exec is not in the capability registry"
        );
        assert_eq!(
            DomainError::SessionTimedOut(30).to_string(),
            "Agent session timed out after 30s"
        );
    }
}
