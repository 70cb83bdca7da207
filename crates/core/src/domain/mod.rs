mod address;
mod instance;
mod instance_type;
mod mutation;
mod workflow;

pub use address::{open_addresses, Address};
pub use instance::{InstanceState, InstanceStatus, InstanceSummary};
pub use instance_type::{sort_catalogue, InstanceType};
pub use mutation::{MutationKind, MutationSpec, OriginState};
pub use workflow::{ResizeWorkflow, WorkflowPhase};
