mod handler;
mod messages;

pub use handler::{relay, upgrade_workflow, WorkflowSession};
pub use messages::{encode_event, ClientMessage};
