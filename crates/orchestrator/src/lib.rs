pub mod config;
pub mod error;
pub mod poller;
pub mod state_machine;
pub mod workflow;

pub use config::{PollPolicy, WorkflowConfig};
pub use error::{PollError, Result, WorkflowError};
pub use poller::StatusPoller;
pub use state_machine::WorkflowStateMachine;
pub use workflow::{WorkflowEngine, WorkflowRequest};
