//! Session configuration assembly.
//!
//! Turns loaded [`Config`] into the immutable [`SessionConfiguration`] one
//! agent session runs with. Building is pure: nothing is spawned and no
//! connection is opened.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AgentConfig, BehaviorContract, CapabilityProvider, CapabilitySet, Config, McpServerDescriptor,
    ProvidersConfig, SessionConfiguration,
};

/// Variables forwarded from the caller's environment to every session.
pub const ENV_ALLOWLIST: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "LANG",
    "TERM",
    "TMPDIR",
    "SHELL",
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_BASE_URL",
    "CLAUDE_CONFIG_DIR",
    "NODE_OPTIONS",
    "NPM_CONFIG_CACHE",
];

/// Source of caller environment values.
pub type EnvSource = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Builds [`SessionConfiguration`]s from agent and provider settings.
#[derive(Clone)]
pub struct SessionConfigBuilder {
    agent: AgentConfig,
    providers: ProvidersConfig,
    contract: BehaviorContract,
    env_source: EnvSource,
}

impl SessionConfigBuilder {
    pub fn new(agent: AgentConfig, providers: ProvidersConfig) -> Self {
        Self {
            agent,
            providers,
            contract: BehaviorContract::standard(),
            env_source: Arc::new(|key| std::env::var(key).ok()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.agent.clone(), config.providers.clone())
    }

    /// Replace where caller environment values are read from.
    #[must_use]
    pub fn with_env_source<F>(mut self, source: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env_source = Arc::new(source);
        self
    }

    pub fn agent(&self) -> &AgentConfig {
        &self.agent
    }

    /// Capabilities granted to sessions built by this builder.
    pub fn capabilities(&self) -> DomainResult<CapabilitySet> {
        match self.agent.capabilities {
            Some(ref ids) => CapabilitySet::from_identifiers(ids),
            None => Ok(CapabilitySet::full()),
        }
    }

    /// Assemble the configuration for one session.
    ///
    /// Standalone sessions carry descriptors for every provider, whatever
    /// the grant; embedded sessions rely on a host that already provides
    /// them. The contract only describes granted capabilities.
    pub fn build_configuration(&self, standalone: bool) -> DomainResult<SessionConfiguration> {
        self.check_agent()?;
        let capabilities = self.capabilities()?;

        let mcp_servers = if standalone {
            let mut servers = BTreeMap::new();
            for provider in CapabilityProvider::ALL {
                let descriptor = self.descriptor(provider)?;
                debug!(%provider, command = %descriptor.command_line(), "provisioning capability provider");
                servers.insert(provider, descriptor);
            }
            Some(servers)
        } else {
            None
        };

        let environment = self.environment();
        debug!(
            standalone,
            tools = capabilities.len(),
            env_vars = environment.len(),
            "built session configuration"
        );

        Ok(SessionConfiguration::assemble(
            environment,
            self.contract.clone().restricted_to(&capabilities).render(),
            self.agent.model.clone(),
            self.agent.max_turns,
            capabilities.identifiers(),
            mcp_servers,
            self.agent.working_dir.as_ref().map(PathBuf::from),
        ))
    }

    fn check_agent(&self) -> DomainResult<()> {
        if self.agent.max_turns == 0 {
            return Err(DomainError::InvalidConfiguration(
                "max_turns must be at least 1".to_string(),
            ));
        }
        if self.agent.model.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "model cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn descriptor(&self, provider: CapabilityProvider) -> DomainResult<McpServerDescriptor> {
        let (command, package, target) = match provider {
            CapabilityProvider::Sqlite => {
                let sqlite = &self.providers.sqlite;
                (&sqlite.command, &sqlite.package, vec!["--db-path".to_string(), sqlite.db_path.clone()])
            }
            CapabilityProvider::Filesystem => {
                let fs = &self.providers.filesystem;
                (&fs.command, &fs.package, vec![fs.root.clone()])
            }
        };

        if command.trim().is_empty() || package.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(format!(
                "{provider} provider needs a command and a package"
            )));
        }
        if target.iter().any(|arg| arg.trim().is_empty()) {
            return Err(DomainError::InvalidConfiguration(format!(
                "{provider} provider path cannot be empty"
            )));
        }

        let mut args = vec!["-y".to_string(), package.clone()];
        args.extend(target);
        Ok(McpServerDescriptor::stdio(command.clone(), args))
    }

    fn environment(&self) -> BTreeMap<String, String> {
        let mut env: BTreeMap<String, String> = ENV_ALLOWLIST
            .iter()
            .copied()
            .chain(self.agent.env_passthrough.iter().map(String::as_str))
            .filter_map(|key| (self.env_source)(key).map(|value| (key.to_string(), value)))
            .collect();

        env.extend(self.agent.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl std::fmt::Debug for SessionConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfigBuilder")
            .field("agent", &self.agent)
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_env(key: &str) -> Option<String> {
        match key {
            "PATH" => Some("/usr/bin".to_string()),
            "HOME" => Some("/home/tester".to_string()),
            "SECRET_TOKEN" => Some("hunter2".to_string()),
            "EXTRA_VAR" => Some("extra".to_string()),
            _ => None,
        }
    }

    fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default().with_env_source(fixed_env)
    }

    #[test]
    fn test_standalone_has_both_descriptors() {
        let config = builder().build_configuration(true).unwrap();
        let servers = config.mcp_servers().unwrap();

        assert_eq!(servers.len(), 2);
        let sqlite = &servers[&CapabilityProvider::Sqlite];
        assert_eq!(sqlite.command, "npx");
        assert_eq!(
            sqlite.args,
            vec!["-y", "@modelcontextprotocol/server-sqlite", "--db-path", "todo.db"]
        );
        let fs = &servers[&CapabilityProvider::Filesystem];
        assert_eq!(fs.args, vec!["-y", "@modelcontextprotocol/server-filesystem", "."]);
    }

    #[test]
    fn test_embedded_has_no_descriptors() {
        let config = builder().build_configuration(false).unwrap();
        assert!(config.mcp_servers().is_none());
        assert!(!config.is_standalone());
    }

    #[test]
    fn test_capabilities_identical_across_modes() {
        let b = builder();
        let standalone = b.build_configuration(true).unwrap();
        let embedded = b.build_configuration(false).unwrap();
        assert_eq!(standalone.allowed_tools(), embedded.allowed_tools());
        assert_eq!(standalone.allowed_tools().len(), 9);
        assert_eq!(standalone.system_prompt(), embedded.system_prompt());
    }

    #[test]
    fn test_build_is_deterministic() {
        let b = builder();
        assert_eq!(b.build_configuration(true).unwrap(), b.build_configuration(true).unwrap());
    }

    #[test]
    fn test_defaults() {
        let config = builder().build_configuration(true).unwrap();
        assert_eq!(config.model(), "haiku");
        assert_eq!(config.max_turns(), 50);
        assert!(config.system_prompt().contains("Todo List Agent"));
    }

    #[test]
    fn test_environment_is_allowlisted() {
        let config = builder().build_configuration(false).unwrap();
        let env = config.environment();
        assert_eq!(env.get("PATH").map(String::as_str), Some("/usr/bin"));
        assert_eq!(env.get("HOME").map(String::as_str), Some("/home/tester"));
        assert!(!env.contains_key("SECRET_TOKEN"));
    }

    #[test]
    fn test_environment_passthrough_and_explicit_entries() {
        let mut agent = AgentConfig::default();
        agent.env_passthrough = vec!["EXTRA_VAR".to_string()];
        agent.env.insert("PATH".to_string(), "/opt/bin".to_string());
        agent.env.insert("TODO_MODE".to_string(), "1".to_string());

        let config = SessionConfigBuilder::new(agent, ProvidersConfig::default())
            .with_env_source(fixed_env)
            .build_configuration(false)
            .unwrap();
        let env = config.environment();

        assert_eq!(env.get("EXTRA_VAR").map(String::as_str), Some("extra"));
        assert_eq!(env.get("PATH").map(String::as_str), Some("/opt/bin"));
        assert_eq!(env.get("TODO_MODE").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_capability_subset_still_provisions_every_provider() {
        let mut agent = AgentConfig::default();
        agent.capabilities = Some(vec!["mcp__sqlite__read_query".to_string()]);

        let b = SessionConfigBuilder::new(agent, ProvidersConfig::default()).with_env_source(fixed_env);
        let config = b.build_configuration(true).unwrap();

        assert_eq!(config.allowed_tools(), ["mcp__sqlite__read_query"]);
        let servers = config.mcp_servers().unwrap();
        assert_eq!(
            servers.keys().copied().collect::<Vec<_>>(),
            CapabilityProvider::ALL.to_vec()
        );
        assert!(servers.values().all(|d| !d.command.is_empty() && !d.args.is_empty()));

        // The agent is only told about what it was granted
        let prompt = config.system_prompt();
        assert!(prompt.contains("**read_query**"));
        assert!(!prompt.contains("write_query"));
        assert!(!prompt.contains("read_file"));
        assert!(!prompt.contains("Filesystem Tools"));

        let embedded = b.build_configuration(false).unwrap();
        assert_eq!(embedded.system_prompt(), prompt);
        assert_eq!(embedded.allowed_tools(), config.allowed_tools());
    }

    #[test]
    fn test_full_grant_prompt_is_standard_contract() {
        let config = builder().build_configuration(true).unwrap();
        assert_eq!(config.system_prompt(), BehaviorContract::standard().render());
    }

    #[test]
    fn test_unknown_capability_is_rejected() {
        let mut agent = AgentConfig::default();
        agent.capabilities = Some(vec!["mcp__sqlite__drop_everything".to_string()]);

        let result = SessionConfigBuilder::new(agent, ProvidersConfig::default())
            .build_configuration(true);
        assert!(matches!(result, Err(DomainError::UnknownCapability(_))));
    }

    #[test]
    fn test_zero_max_turns_is_rejected() {
        let mut agent = AgentConfig::default();
        agent.max_turns = 0;
        let result = SessionConfigBuilder::new(agent, ProvidersConfig::default())
            .build_configuration(false);
        assert!(matches!(result, Err(DomainError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_empty_provider_command_is_rejected() {
        let mut providers = ProvidersConfig::default();
        providers.sqlite.command = String::new();

        let b = SessionConfigBuilder::new(AgentConfig::default(), providers);
        assert!(matches!(
            b.build_configuration(true),
            Err(DomainError::InvalidConfiguration(_))
        ));
        // Embedded sessions never start providers
        assert!(b.build_configuration(false).is_ok());
    }

    #[test]
    fn test_working_dir_is_carried() {
        let mut agent = AgentConfig::default();
        agent.working_dir = Some("/tmp/todos".to_string());
        let config = SessionConfigBuilder::new(agent, ProvidersConfig::default())
            .build_configuration(false)
            .unwrap();
        assert_eq!(config.working_dir(), Some(std::path::Path::new("/tmp/todos")));
    }
}
