//! Progress events for resize workflows
//!
//! This crate provides the progress event types and the sinks that carry
//! them from a running workflow to whoever is watching it.

mod sink;
mod types;

pub use sink::{progress_channel, CollectingSink, EventSink, ProgressSink, ProgressStream};
pub use types::*;
