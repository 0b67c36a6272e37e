//! Capability registry.
//!
//! Capabilities are the externally hosted tool operations the agent may
//! invoke. The registry is a compile-time constant: nothing can be added,
//! removed or renamed at runtime, and every grant handed to a session is a
//! validated subset of it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::{DomainError, DomainResult};

/// An external process that hosts a group of capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityProvider {
    /// Persistent task store (SQLite MCP server)
    Sqlite,
    /// Filesystem access (filesystem MCP server)
    Filesystem,
}

impl CapabilityProvider {
    /// Every provider, in registry order.
    pub const ALL: [Self; 2] = [Self::Sqlite, Self::Filesystem];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Filesystem => "filesystem",
        }
    }

    /// Heading used when the capabilities are described to the agent.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Sqlite => "SQLite Tools",
            Self::Filesystem => "Filesystem Tools",
        }
    }
}

impl fmt::Display for CapabilityProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single registered capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Capability {
    /// Provider hosting the operation
    pub provider: CapabilityProvider,
    /// Operation name as exposed by the provider
    pub operation: &'static str,
    /// Short description given to the agent
    pub summary: &'static str,
}

impl Capability {
    const fn new(provider: CapabilityProvider, operation: &'static str, summary: &'static str) -> Self {
        Self { provider, operation, summary }
    }

    /// Fully qualified tool identifier, e.g. `mcp__sqlite__read_query`.
    pub fn identifier(&self) -> String {
        format!("mcp__{}__{}", self.provider.as_str(), self.operation)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mcp__{}__{}", self.provider.as_str(), self.operation)
    }
}

static REGISTRY: [Capability; 9] = [
    Capability::new(CapabilityProvider::Sqlite, "read_query", "Execute SELECT queries to retrieve data"),
    Capability::new(
        CapabilityProvider::Sqlite,
        "write_query",
        "Execute INSERT, UPDATE, DELETE queries to modify data",
    ),
    Capability::new(CapabilityProvider::Sqlite, "create_table", "Create new tables"),
    Capability::new(CapabilityProvider::Sqlite, "describe_table", "Show the schema of a table"),
    Capability::new(CapabilityProvider::Sqlite, "list_tables", "List all tables in the database"),
    Capability::new(CapabilityProvider::Filesystem, "read_file", "Read file contents"),
    Capability::new(CapabilityProvider::Filesystem, "write_file", "Write content to files"),
    Capability::new(CapabilityProvider::Filesystem, "list_directory", "List directory contents"),
    Capability::new(CapabilityProvider::Filesystem, "create_directory", "Create new directories"),
];

/// Read-only view over the fixed capability registry.
pub struct CapabilityRegistry;

impl CapabilityRegistry {
    /// Every registered capability, in registry order.
    pub fn all() -> &'static [Capability] {
        &REGISTRY
    }

    /// Find a capability by its fully qualified identifier.
    pub fn lookup(identifier: &str) -> Option<&'static Capability> {
        REGISTRY.iter().find(|c| c.identifier() == identifier)
    }
}

/// A validated grant of capabilities handed to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
    capabilities: Vec<&'static Capability>,
}

impl CapabilitySet {
    /// Grant the whole registry.
    pub fn full() -> Self {
        Self {
            capabilities: REGISTRY.iter().collect(),
        }
    }

    /// Grant a subset of the registry by identifier.
    ///
    /// Duplicates are collapsed and registry order is kept. Any identifier
    /// outside the registry is a configuration error.
    pub fn from_identifiers<I, S>(identifiers: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut granted = vec![false; REGISTRY.len()];
        for id in identifiers {
            let id = id.as_ref();
            let index = REGISTRY
                .iter()
                .position(|c| c.identifier() == id)
                .ok_or_else(|| DomainError::UnknownCapability(id.to_string()))?;
            granted[index] = true;
        }

        let capabilities: Vec<_> = REGISTRY
            .iter()
            .zip(granted)
            .filter_map(|(c, g)| g.then_some(c))
            .collect();

        if capabilities.is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "capability grant cannot be empty".to_string(),
            ));
        }

        Ok(Self { capabilities })
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Capability> + '_ {
        self.capabilities.iter().copied()
    }

    /// Fully qualified identifiers, in registry order.
    pub fn identifiers(&self) -> Vec<String> {
        self.capabilities.iter().map(|c| c.identifier()).collect()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.capabilities.iter().any(|c| c.identifier() == identifier)
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::full()
    }
}
