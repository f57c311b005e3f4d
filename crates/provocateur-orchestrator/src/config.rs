use crate::profiles::{default_registry, SUPERVISOR_AGENT};
use crate::types::{AgentCapabilityProfile, AgentRegistry};
use provocateur_core::{ProvocateurError, ProvocateurResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level `provocateur.toml` contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvocateurConfig {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// When non-empty, replaces the default agent profiles.
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

/// Tuning for goal processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
    #[serde(default = "default_max_results")]
    pub default_max_results: u64,
    #[serde(default = "default_fallback_agent")]
    pub fallback_agent: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            task_timeout_secs: default_task_timeout_secs(),
            default_max_results: default_max_results(),
            fallback_agent: default_fallback_agent(),
        }
    }
}

/// One agent entry in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

fn default_task_timeout_secs() -> u64 {
    30
}

fn default_max_results() -> u64 {
    5
}

fn default_fallback_agent() -> String {
    SUPERVISOR_AGENT.to_string()
}

impl ProvocateurConfig {
    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> ProvocateurResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ProvocateurError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn from_path(path: &Path) -> ProvocateurResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProvocateurError::Config(format!(
                "Failed to read config '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Reject settings the orchestrator cannot run with.
    pub fn validate(&self) -> ProvocateurResult<()> {
        if self.orchestrator.task_timeout_secs == 0 {
            return Err(ProvocateurError::Config(
                "orchestrator.task_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.orchestrator.fallback_agent.trim().is_empty() {
            return Err(ProvocateurError::Config(
                "orchestrator.fallback_agent must not be empty".to_string(),
            ));
        }
        self.registry().validate()
    }

    /// The configured agents, or the default profiles if none are listed.
    pub fn registry(&self) -> AgentRegistry {
        if self.agents.is_empty() {
            return default_registry();
        }
        AgentRegistry::from_profiles(
            self.agents
                .iter()
                .map(|a| {
                    AgentCapabilityProfile::new(
                        a.id.clone(),
                        a.description.clone(),
                        a.capabilities.iter().cloned(),
                    )
                })
                .collect(),
        )
    }
}
