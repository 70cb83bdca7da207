//! Provider double with scripted answers and a call log.
//!
//! Status reads are served from a queue; once the queue is drained the
//! fallback answer repeats. Every call is recorded in order so tests can
//! assert on exactly which provider operations a workflow issued.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use resize_core::{Address, InstanceState, InstanceStatus, InstanceSummary, InstanceType};

use crate::error::{ProviderError, Result};
use crate::traits::InstanceProvider;

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    GetStatus(String),
    Stop(String),
    Start(String),
    ModifyInstanceType {
        instance_id: String,
        instance_type: String,
    },
    AssociateAddress {
        instance_id: String,
        allocation_id: String,
    },
    ListAddresses,
    ListInstances,
    ListInstanceTypes,
}

impl ProviderCall {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetStatus(_) => "get_status",
            Self::Stop(_) => "stop",
            Self::Start(_) => "start",
            Self::ModifyInstanceType { .. } => "modify_instance_type",
            Self::AssociateAddress { .. } => "associate_address",
            Self::ListAddresses => "list_addresses",
            Self::ListInstances => "list_instances",
            Self::ListInstanceTypes => "list_instance_types",
        }
    }
}

type StatusAnswer = std::result::Result<InstanceState, ProviderError>;

#[derive(Debug, Default)]
struct Script {
    statuses: VecDeque<StatusAnswer>,
    fallback: Option<StatusAnswer>,
    stop: Option<ProviderError>,
    start: Option<ProviderError>,
    mutate: Option<ProviderError>,
    addresses: Vec<Address>,
    instances: Vec<InstanceSummary>,
    instance_types: Vec<InstanceType>,
    listing: Option<ProviderError>,
    calls: Vec<ProviderCall>,
}

#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<Script>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn script_mut(&mut self) -> &mut Script {
        match self.script.get_mut() {
            Ok(script) => script,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Queue status answers, one per read
    pub fn with_states(mut self, states: impl IntoIterator<Item = InstanceState>) -> Self {
        self.script_mut().statuses.extend(states.into_iter().map(Ok));
        self
    }

    /// Queue a failed status read
    pub fn with_query_error(mut self, error: ProviderError) -> Self {
        self.script_mut().statuses.push_back(Err(error));
        self
    }

    /// Answer every read after the queue is drained with `state`
    pub fn otherwise(mut self, state: InstanceState) -> Self {
        self.script_mut().fallback = Some(Ok(state));
        self
    }

    pub fn fail_stop(mut self, error: ProviderError) -> Self {
        self.script_mut().stop = Some(error);
        self
    }

    pub fn fail_start(mut self, error: ProviderError) -> Self {
        self.script_mut().start = Some(error);
        self
    }

    /// Make the mutation call answer with `error`
    pub fn fail_mutation(mut self, error: ProviderError) -> Self {
        self.script_mut().mutate = Some(error);
        self
    }

    /// Make the mutation call explicitly decline
    pub fn reject_mutation(self) -> Self {
        self.fail_mutation(ProviderError::rejected("mutation", "bad response from provider"))
    }

    pub fn with_addresses(mut self, addresses: Vec<Address>) -> Self {
        self.script_mut().addresses = addresses;
        self
    }

    pub fn with_instances(mut self, instances: Vec<InstanceSummary>) -> Self {
        self.script_mut().instances = instances;
        self
    }

    pub fn with_instance_types(mut self, instance_types: Vec<InstanceType>) -> Self {
        self.script_mut().instance_types = instance_types;
        self
    }

    /// Make every listing call answer with `error`
    pub fn fail_listing(mut self, error: ProviderError) -> Self {
        self.script_mut().listing = Some(error);
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.locked(|script| script.calls.clone())
    }

    /// Names of every call made so far, in order
    pub fn call_names(&self) -> Vec<&'static str> {
        self.locked(|script| script.calls.iter().map(ProviderCall::name).collect())
    }

    pub fn count(&self, name: &str) -> usize {
        self.locked(|script| script.calls.iter().filter(|c| c.name() == name).count())
    }

    fn locked<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        match self.script.lock() {
            Ok(mut script) => f(&mut script),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn record(&self, call: ProviderCall) {
        self.locked(|script| script.calls.push(call));
    }
}

#[async_trait]
impl InstanceProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn get_status(&self, instance_id: &str) -> Result<InstanceStatus> {
        self.record(ProviderCall::GetStatus(instance_id.to_string()));
        let answer = self.locked(|script| {
            script
                .statuses
                .pop_front()
                .or_else(|| script.fallback.clone())
        });

        match answer {
            Some(Ok(state)) => Ok(InstanceStatus::of(instance_id, state)),
            Some(Err(error)) => Err(error),
            None => Err(ProviderError::NotFound(instance_id.to_string())),
        }
    }

    async fn stop(&self, instance_id: &str) -> Result<()> {
        self.record(ProviderCall::Stop(instance_id.to_string()));
        self.locked(|script| script.stop.clone()).map_or(Ok(()), Err)
    }

    async fn start(&self, instance_id: &str) -> Result<()> {
        self.record(ProviderCall::Start(instance_id.to_string()));
        self.locked(|script| script.start.clone()).map_or(Ok(()), Err)
    }

    async fn modify_instance_type(&self, instance_id: &str, instance_type: &str) -> Result<()> {
        self.record(ProviderCall::ModifyInstanceType {
            instance_id: instance_id.to_string(),
            instance_type: instance_type.to_string(),
        });
        self.locked(|script| script.mutate.clone()).map_or(Ok(()), Err)
    }

    async fn associate_address(&self, instance_id: &str, allocation_id: &str) -> Result<()> {
        self.record(ProviderCall::AssociateAddress {
            instance_id: instance_id.to_string(),
            allocation_id: allocation_id.to_string(),
        });
        self.locked(|script| script.mutate.clone()).map_or(Ok(()), Err)
    }

    async fn list_addresses(&self) -> Result<Vec<Address>> {
        self.record(ProviderCall::ListAddresses);
        self.locked(|script| match &script.listing {
            Some(error) => Err(error.clone()),
            None => Ok(script.addresses.clone()),
        })
    }

    async fn list_instances(&self) -> Result<Vec<InstanceSummary>> {
        self.record(ProviderCall::ListInstances);
        self.locked(|script| match &script.listing {
            Some(error) => Err(error.clone()),
            None => Ok(script.instances.clone()),
        })
    }

    async fn list_instance_types(&self) -> Result<Vec<InstanceType>> {
        self.record(ProviderCall::ListInstanceTypes);
        self.locked(|script| match &script.listing {
            Some(error) => Err(error.clone()),
            None => Ok(script.instance_types.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_queue_then_fallback() {
        let provider = ScriptedProvider::new()
            .with_states([InstanceState::Stopping])
            .with_query_error(ProviderError::Unreachable("timeout".to_string()))
            .otherwise(InstanceState::Stopped);

        assert_eq!(
            provider.get_status("i-1").await.unwrap().state(),
            InstanceState::Stopping
        );
        assert!(provider.get_status("i-1").await.is_err());
        assert_eq!(
            provider.get_status("i-1").await.unwrap().state(),
            InstanceState::Stopped
        );
        assert_eq!(
            provider.get_status("i-1").await.unwrap().state(),
            InstanceState::Stopped
        );
        assert_eq!(provider.count("get_status"), 4);
    }

    #[tokio::test]
    async fn test_empty_script_reports_not_found() {
        let provider = ScriptedProvider::new();
        assert_eq!(
            provider.get_status("i-1").await.unwrap_err(),
            ProviderError::NotFound("i-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let provider = ScriptedProvider::new().reject_mutation();

        provider.stop("i-1").await.unwrap();
        assert!(provider
            .modify_instance_type("i-1", "m5.large")
            .await
            .unwrap_err()
            .is_rejection());
        provider.start("i-1").await.unwrap();

        assert_eq!(
            provider.call_names(),
            vec!["stop", "modify_instance_type", "start"]
        );
        assert_eq!(
            provider.calls()[1],
            ProviderCall::ModifyInstanceType {
                instance_id: "i-1".to_string(),
                instance_type: "m5.large".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_listing_failure_applies_to_every_listing() {
        let provider = ScriptedProvider::new()
            .with_instance_types(vec![InstanceType::new(
                "m5.large",
                2,
                8192,
                "EBS only",
                "Up to 10 Gigabit",
            )])
            .fail_listing(ProviderError::Unreachable("throttled".to_string()));

        assert!(provider.list_instances().await.is_err());
        assert!(provider.list_instance_types().await.is_err());
        assert!(provider.list_addresses().await.is_err());
        assert_eq!(
            provider.call_names(),
            vec!["list_instances", "list_instance_types", "list_addresses"]
        );
    }
}
