//! In-memory provider that walks instances through their lifecycle.
//!
//! Each stop or start request puts the instance into a transitional state
//! that settles after a configurable number of status reads, which is enough
//! to exercise the workflow end to end without a cloud account.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use resize_core::{
    sort_catalogue, Address, InstanceState, InstanceStatus, InstanceSummary, InstanceType,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, Result};
use crate::traits::InstanceProvider;

const DEFAULT_SETTLE_POLLS: u32 = 2;

/// Seed data for one simulated instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimulatedInstance {
    pub id: String,
    pub instance_type: String,
    pub state: InstanceState,
}

/// Seed data for the whole simulated account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimulatedConfig {
    /// Status reads a transitional state lasts before it settles
    #[serde(default = "default_settle_polls")]
    pub settle_polls: u32,
    #[serde(default)]
    pub instances: Vec<SimulatedInstance>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    /// Types a resize may target; an empty catalogue accepts any name
    #[serde(default = "default_catalogue")]
    pub instance_types: Vec<InstanceType>,
}

fn default_settle_polls() -> u32 {
    DEFAULT_SETTLE_POLLS
}

fn default_catalogue() -> Vec<InstanceType> {
    vec![
        InstanceType::new("t3.nano", 2, 512, "EBS only", "Up to 5 Gigabit"),
        InstanceType::new("t3.micro", 2, 1024, "EBS only", "Up to 5 Gigabit"),
        InstanceType::new("t3.small", 2, 2048, "EBS only", "Up to 5 Gigabit"),
        InstanceType::new("t3.medium", 2, 4096, "EBS only", "Up to 5 Gigabit"),
        InstanceType::new("m5.large", 2, 8192, "EBS only", "Up to 10 Gigabit"),
        InstanceType::new("m5.xlarge", 4, 16384, "EBS only", "Up to 10 Gigabit"),
        InstanceType::new("m5.2xlarge", 8, 32768, "EBS only", "Up to 10 Gigabit"),
        InstanceType::new("c5.large", 2, 4096, "EBS only", "Up to 10 Gigabit"),
        InstanceType::new("r5.large", 2, 16384, "EBS only", "Up to 10 Gigabit"),
    ]
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            settle_polls: DEFAULT_SETTLE_POLLS,
            instances: vec![
                SimulatedInstance {
                    id: "i-0a1b2c3d4e5f60001".to_string(),
                    instance_type: "t3.micro".to_string(),
                    state: InstanceState::Running,
                },
                SimulatedInstance {
                    id: "i-0a1b2c3d4e5f60002".to_string(),
                    instance_type: "m5.large".to_string(),
                    state: InstanceState::Stopped,
                },
            ],
            addresses: vec![Address::new("203.0.113.10", "eipalloc-0000000000000001")],
            instance_types: default_catalogue(),
        }
    }
}

#[derive(Debug)]
struct InstanceRecord {
    instance_type: String,
    state: InstanceState,
    /// Status reads left before a transitional state settles
    remaining: u32,
}

impl InstanceRecord {
    fn observe(&mut self) -> InstanceState {
        let current = self.state;
        if self.remaining > 0 {
            self.remaining -= 1;
        } else {
            self.state = settled(self.state);
        }
        current
    }
}

#[derive(Debug, Default)]
struct Account {
    instances: HashMap<String, InstanceRecord>,
    addresses: Vec<Address>,
    instance_types: Vec<InstanceType>,
}

pub struct SimulatedProvider {
    account: Mutex<Account>,
    settle_polls: u32,
}

impl SimulatedProvider {
    pub fn new(config: SimulatedConfig) -> Self {
        let instances = config
            .instances
            .into_iter()
            .map(|seed| {
                (
                    seed.id,
                    InstanceRecord {
                        instance_type: seed.instance_type,
                        state: seed.state,
                        remaining: 0,
                    },
                )
            })
            .collect();

        Self {
            account: Mutex::new(Account {
                instances,
                addresses: config.addresses,
                instance_types: sort_catalogue(config.instance_types),
            }),
            settle_polls: config.settle_polls,
        }
    }

    /// Current instance type, if the instance exists
    pub fn instance_type(&self, instance_id: &str) -> Option<String> {
        self.with_account(|account| {
            Ok(account
                .instances
                .get(instance_id)
                .map(|record| record.instance_type.clone()))
        })
        .ok()
        .flatten()
    }

    fn with_account<T>(&self, f: impl FnOnce(&mut Account) -> Result<T>) -> Result<T> {
        let mut account = self
            .account
            .lock()
            .map_err(|_| ProviderError::Unreachable("simulated account poisoned".to_string()))?;
        f(&mut account)
    }

    fn transition(
        &self,
        call: &str,
        instance_id: &str,
        from: InstanceState,
        via: InstanceState,
    ) -> Result<()> {
        let settle = self.settle_polls;
        self.with_account(|account| {
            let record = account
                .instances
                .get_mut(instance_id)
                .ok_or_else(|| ProviderError::NotFound(instance_id.to_string()))?;

            if record.state == via || record.state == settled(via) {
                debug!(instance_id, call, "Instance already transitioning, ignoring");
                return Ok(());
            }
            if record.state != from {
                return Err(ProviderError::rejected(
                    call,
                    format!("instance is {}", record.state),
                ));
            }

            record.state = via;
            record.remaining = settle;
            info!(instance_id, call, state = %via, "Simulated transition started");
            Ok(())
        })
    }
}

fn settled(state: InstanceState) -> InstanceState {
    match state {
        InstanceState::Stopping => InstanceState::Stopped,
        InstanceState::Pending => InstanceState::Running,
        other => other,
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new(SimulatedConfig::default())
    }
}

#[async_trait]
impl InstanceProvider for SimulatedProvider {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn get_status(&self, instance_id: &str) -> Result<InstanceStatus> {
        self.with_account(|account| {
            let record = account
                .instances
                .get_mut(instance_id)
                .ok_or_else(|| ProviderError::NotFound(instance_id.to_string()))?;
            Ok(InstanceStatus::of(instance_id, record.observe()))
        })
    }

    async fn stop(&self, instance_id: &str) -> Result<()> {
        self.transition(
            "stop",
            instance_id,
            InstanceState::Running,
            InstanceState::Stopping,
        )
    }

    async fn start(&self, instance_id: &str) -> Result<()> {
        self.transition(
            "start",
            instance_id,
            InstanceState::Stopped,
            InstanceState::Pending,
        )
    }

    async fn modify_instance_type(&self, instance_id: &str, instance_type: &str) -> Result<()> {
        self.with_account(|account| {
            let record = account
                .instances
                .get_mut(instance_id)
                .ok_or_else(|| ProviderError::NotFound(instance_id.to_string()))?;

            if record.state != InstanceState::Stopped {
                return Err(ProviderError::rejected(
                    "modify_instance_type",
                    format!("instance must be stopped, is {}", record.state),
                ));
            }
            if instance_type.trim().is_empty() {
                return Err(ProviderError::rejected(
                    "modify_instance_type",
                    "instance type is empty",
                ));
            }
            if !account.instance_types.is_empty()
                && !account.instance_types.iter().any(|t| t.name == instance_type)
            {
                return Err(ProviderError::rejected(
                    "modify_instance_type",
                    format!("unknown instance type {}", instance_type),
                ));
            }

            info!(
                instance_id,
                from = %record.instance_type,
                to = %instance_type,
                "Simulated instance type change"
            );
            record.instance_type = instance_type.to_string();
            Ok(())
        })
    }

    async fn associate_address(&self, instance_id: &str, allocation_id: &str) -> Result<()> {
        self.with_account(|account| {
            if !account.instances.contains_key(instance_id) {
                return Err(ProviderError::NotFound(instance_id.to_string()));
            }

            let address = account
                .addresses
                .iter_mut()
                .find(|address| address.allocation_id == allocation_id)
                .ok_or_else(|| {
                    ProviderError::rejected(
                        "associate_address",
                        format!("unknown allocation {}", allocation_id),
                    )
                })?;

            if !address.is_open() {
                return Err(ProviderError::rejected(
                    "associate_address",
                    format!("allocation {} is already associated", allocation_id),
                ));
            }

            address.association_id = Some(format!("eipassoc-{}", allocation_id));
            address.instance_id = Some(instance_id.to_string());
            info!(instance_id, allocation_id, "Simulated address association");
            Ok(())
        })
    }

    async fn list_addresses(&self) -> Result<Vec<Address>> {
        self.with_account(|account| Ok(account.addresses.clone()))
    }

    async fn list_instances(&self) -> Result<Vec<InstanceSummary>> {
        self.with_account(|account| {
            let mut instances: Vec<_> = account
                .instances
                .iter()
                .map(|(id, record)| InstanceSummary {
                    instance_id: id.clone(),
                    instance_type: record.instance_type.clone(),
                    state: record.state,
                })
                .collect();
            instances.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));
            Ok(instances)
        })
    }

    async fn list_instance_types(&self) -> Result<Vec<InstanceType>> {
        self.with_account(|account| Ok(account.instance_types.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(settle_polls: u32) -> SimulatedProvider {
        SimulatedProvider::new(SimulatedConfig {
            settle_polls,
            instances: vec![SimulatedInstance {
                id: "i-1".to_string(),
                instance_type: "t3.micro".to_string(),
                state: InstanceState::Running,
            }],
            addresses: vec![Address::new("203.0.113.1", "eipalloc-1")],
            instance_types: default_catalogue(),
        })
    }

    #[tokio::test]
    async fn test_stop_settles_after_polls() {
        let provider = provider(2);
        provider.stop("i-1").await.unwrap();

        let mut states = Vec::new();
        for _ in 0..4 {
            states.push(provider.get_status("i-1").await.unwrap().state());
        }

        assert_eq!(
            states,
            vec![
                InstanceState::Stopping,
                InstanceState::Stopping,
                InstanceState::Stopping,
                InstanceState::Stopped,
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let provider = provider(0);
        provider.stop("i-1").await.unwrap();
        provider.stop("i-1").await.unwrap();

        let err = provider.start("i-1").await.unwrap_err();
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn test_full_resize_cycle() {
        let provider = provider(0);

        provider.stop("i-1").await.unwrap();
        assert_eq!(
            provider.get_status("i-1").await.unwrap().state(),
            InstanceState::Stopping
        );
        assert_eq!(
            provider.get_status("i-1").await.unwrap().state(),
            InstanceState::Stopped
        );

        provider.modify_instance_type("i-1", "m5.xlarge").await.unwrap();
        assert_eq!(provider.instance_type("i-1").as_deref(), Some("m5.xlarge"));

        provider.start("i-1").await.unwrap();
        assert_eq!(
            provider.get_status("i-1").await.unwrap().state(),
            InstanceState::Pending
        );
        assert_eq!(
            provider.get_status("i-1").await.unwrap().state(),
            InstanceState::Running
        );
    }

    #[tokio::test]
    async fn test_modify_running_instance_is_rejected() {
        let provider = provider(0);
        let err = provider
            .modify_instance_type("i-1", "m5.xlarge")
            .await
            .unwrap_err();
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn test_associate_address_only_once() {
        let provider = provider(0);
        provider.associate_address("i-1", "eipalloc-1").await.unwrap();

        let err = provider
            .associate_address("i-1", "eipalloc-1")
            .await
            .unwrap_err();
        assert!(err.is_rejection());

        let addresses = provider.list_addresses().await.unwrap();
        assert!(!addresses[0].is_open());
        assert_eq!(addresses[0].instance_id.as_deref(), Some("i-1"));
    }

    #[tokio::test]
    async fn test_unknown_instance() {
        let provider = provider(0);
        assert_eq!(
            provider.get_status("i-missing").await.unwrap_err(),
            ProviderError::NotFound("i-missing".to_string())
        );
    }

    #[tokio::test]
    async fn test_modify_to_unknown_type_is_rejected() {
        let provider = provider(0);
        provider.stop("i-1").await.unwrap();
        provider.get_status("i-1").await.unwrap();
        provider.get_status("i-1").await.unwrap();

        let err = provider
            .modify_instance_type("i-1", "x9.colossal")
            .await
            .unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(provider.instance_type("i-1").as_deref(), Some("t3.micro"));
    }

    #[tokio::test]
    async fn test_listing_does_not_advance_transitions() {
        let provider = provider(0);
        provider.stop("i-1").await.unwrap();

        for _ in 0..3 {
            let instances = provider.list_instances().await.unwrap();
            assert_eq!(
                instances,
                vec![InstanceSummary {
                    instance_id: "i-1".to_string(),
                    instance_type: "t3.micro".to_string(),
                    state: InstanceState::Stopping,
                }]
            );
        }
        assert_eq!(
            provider.get_status("i-1").await.unwrap().state(),
            InstanceState::Stopping
        );
    }

    #[tokio::test]
    async fn test_default_account_lists_sorted_instances_and_types() {
        let provider = SimulatedProvider::default();

        let ids: Vec<_> = provider
            .list_instances()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.instance_id)
            .collect();
        assert_eq!(ids, vec!["i-0a1b2c3d4e5f60001", "i-0a1b2c3d4e5f60002"]);

        let types = provider.list_instance_types().await.unwrap();
        assert_eq!(types.len(), default_catalogue().len());
        assert_eq!(types[0].name, "c5.large");
        assert!(types.iter().any(|t| t.name == "m5.xlarge"));
    }

    #[test]
    fn test_config_defaults() {
        let config: SimulatedConfig = serde_json::from_str(
            r#"{"instances":[{"id":"i-9","instance_type":"t3.nano","state":"stopped"}]}"#,
        )
        .unwrap();
        assert_eq!(config.settle_polls, DEFAULT_SETTLE_POLLS);
        assert_eq!(config.instances[0].state, InstanceState::Stopped);
        assert!(config.addresses.is_empty());
        assert_eq!(config.instance_types, default_catalogue());
    }
}
