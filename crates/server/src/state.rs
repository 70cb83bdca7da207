use std::sync::Arc;

use orchestrator::{WorkflowConfig, WorkflowEngine};
use provider::{InstanceProvider, SimulatedProvider};

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn InstanceProvider>,
    pub engine: WorkflowEngine,
}

impl AppState {
    pub fn new(provider: Arc<dyn InstanceProvider>, workflow: WorkflowConfig) -> Self {
        let engine = WorkflowEngine::new(provider.clone(), workflow);
        Self { provider, engine }
    }

    /// State backed by the simulated provider seeded from `config`
    pub fn from_config(config: &ServerConfig) -> Self {
        let provider = Arc::new(SimulatedProvider::new(config.simulated.clone()));
        tracing::info!(
            instances = config.simulated.instances.len(),
            addresses = config.simulated.addresses.len(),
            "Using simulated instance provider"
        );
        Self::new(provider, config.workflow.clone())
    }
}
