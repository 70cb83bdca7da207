use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One entry of the provider's instance type catalogue.
///
/// The catalogue is the set of targets a resize can pick from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct InstanceType {
    pub name: String,
    pub vcpus: u32,
    pub memory_mib: u32,
    /// Instance storage, e.g. "EBS only" or "1 x 75 NVMe SSD"
    pub storage: String,
    pub network_performance: String,
}

impl InstanceType {
    pub fn new(
        name: impl Into<String>,
        vcpus: u32,
        memory_mib: u32,
        storage: impl Into<String>,
        network_performance: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            vcpus,
            memory_mib,
            storage: storage.into(),
            network_performance: network_performance.into(),
        }
    }

    /// Family prefix of the type name ("m5" for "m5.large").
    pub fn family(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }
}

/// Catalogue sorted by family, then by size within the family.
pub fn sort_catalogue(mut types: Vec<InstanceType>) -> Vec<InstanceType> {
    types.sort_by(|a, b| {
        a.family()
            .cmp(b.family())
            .then(a.vcpus.cmp(&b.vcpus))
            .then(a.memory_mib.cmp(&b.memory_mib))
            .then(a.name.cmp(&b.name))
    });
    types
}
