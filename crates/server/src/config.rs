use std::path::Path;

use orchestrator::WorkflowConfig;
use provider::SimulatedConfig;
use resize_core::CoreError;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "resize.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] CoreError),
}

/// Workflow settings the server uses when the file has no `[workflow]` table.
///
/// Unlike the library default, the server confirms the caller's declared
/// instance state with one status read before acting.
fn server_workflow_default() -> WorkflowConfig {
    WorkflowConfig {
        verify_origin_state: true,
        ..WorkflowConfig::default()
    }
}

/// Read `[workflow]`, keeping state verification on unless the table turns it off.
fn deserialize_workflow<'de, D>(deserializer: D) -> Result<WorkflowConfig, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Section {
        verify_origin_state: Option<bool>,
        #[serde(flatten)]
        config: WorkflowConfig,
    }

    let section = Section::deserialize(deserializer)?;
    Ok(WorkflowConfig {
        verify_origin_state: section.verify_origin_state.unwrap_or(true),
        ..section.config
    })
}

/// Server configuration read from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(
        default = "server_workflow_default",
        deserialize_with = "deserialize_workflow"
    )]
    pub workflow: WorkflowConfig,
    /// Seed data for the built-in simulated provider
    pub simulated: SimulatedConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            workflow: server_workflow_default(),
            simulated: SimulatedConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read config from `path`, falling back to defaults when the file is absent
    pub async fn read(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await?;
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), "Config loaded successfully");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.workflow.validate()
    }

    /// Write config to `path`, creating parent directories as needed
    pub async fn write(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).await?;
        debug!(path = %path.display(), "Config saved successfully");
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
