use async_trait::async_trait;
use resize_core::{Address, InstanceStatus, InstanceSummary, InstanceType};

use crate::error::Result;

/// Trait for the cloud provider operations a resize workflow needs
///
/// Implementations must tolerate concurrent calls from independent workflows.
/// An explicit "not OK" answer is reported as [`crate::ProviderError::Rejected`],
/// a failure to get any answer as [`crate::ProviderError::Unreachable`].
#[async_trait]
pub trait InstanceProvider: Send + Sync {
    /// Get the name of the provider backend
    fn name(&self) -> &'static str;

    /// Read the current status of an instance
    async fn get_status(&self, instance_id: &str) -> Result<InstanceStatus>;

    /// Ask the provider to stop an instance
    async fn stop(&self, instance_id: &str) -> Result<()>;

    /// Ask the provider to start an instance
    async fn start(&self, instance_id: &str) -> Result<()>;

    /// Change the instance type of a stopped instance
    async fn modify_instance_type(&self, instance_id: &str, instance_type: &str) -> Result<()>;

    /// Associate an address allocation with an instance, without reassociation
    async fn associate_address(&self, instance_id: &str, allocation_id: &str) -> Result<()>;

    /// List the account's elastic addresses
    async fn list_addresses(&self) -> Result<Vec<Address>>;

    /// List the account's instances with their current type and state
    async fn list_instances(&self) -> Result<Vec<InstanceSummary>>;

    /// Instance types an instance can be resized to
    async fn list_instance_types(&self) -> Result<Vec<InstanceType>>;
}
