//! Bounded status polling.
//!
//! The poller reads an instance's status at a fixed interval until it reports
//! the requested state, reports a state from which the target is unreachable,
//! or the attempt budget runs out. Every attempt produces one progress message
//! so a watcher sees the instance's state change as it happens.

use std::sync::Arc;

use events::{EventSink, ProgressEvent};
use provider::InstanceProvider;
use resize_core::{InstanceState, InstanceStatus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::PollPolicy;
use crate::error::PollError;

#[derive(Clone)]
pub struct StatusPoller {
    provider: Arc<dyn InstanceProvider>,
}

impl StatusPoller {
    pub fn new(provider: Arc<dyn InstanceProvider>) -> Self {
        Self { provider }
    }

    /// Wait for `instance_id` to report `target`.
    ///
    /// Each attempt sleeps for the policy interval and then reads the status
    /// once. A failed read uses up the attempt but never counts as reaching the
    /// target. Cancellation is honoured between attempts; an in-flight status
    /// read is allowed to finish. A policy without a positive attempt budget
    /// and interval is refused before the first read.
    pub async fn poll_until(
        &self,
        instance_id: &str,
        target: InstanceState,
        policy: &PollPolicy,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<InstanceState, PollError> {
        policy
            .validate()
            .map_err(|e| PollError::InvalidPolicy(e.to_string()))?;
        let mut last_seen = String::from("nothing");

        for attempt in 1..=policy.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(instance_id, attempt, %target, "Polling cancelled");
                    return Err(PollError::Cancelled { target });
                }
                _ = tokio::time::sleep(policy.interval()) => {}
            }

            let status = match self.provider.get_status(instance_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(
                        instance_id,
                        attempt,
                        error = %e,
                        "Instance status query failed, will retry"
                    );
                    sink.emit(ProgressEvent::message(format!(
                        "status unavailable ({}), retrying",
                        e
                    )));
                    last_seen = format!("query error: {}", e);
                    continue;
                }
            };

            let state = status.state();
            debug!(
                instance_id,
                attempt,
                code = status.code,
                name = %status.name,
                %state,
                %target,
                "Polled instance status"
            );
            sink.emit(ProgressEvent::message(progress_text(&status, state)));

            if state == target {
                return Ok(state);
            }
            if !state.can_reach(target) {
                return Err(PollError::UnexpectedState {
                    observed: status.name,
                    target,
                });
            }
            last_seen = status.name;
        }

        Err(PollError::Timeout {
            attempts: policy.max_attempts,
            target,
            last_seen,
        })
    }
}

fn progress_text(status: &InstanceStatus, state: InstanceState) -> String {
    if state == InstanceState::Unknown {
        format!(
            "unrecognised instance status '{}' (code {})",
            status.name, status.code
        )
    } else {
        status.name.clone()
    }
}
