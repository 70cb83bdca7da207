use std::time::Duration;

use resize_core::CoreError;
use serde::{Deserialize, Serialize};

/// How often and how long to poll for a state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self, CoreError> {
        let policy = Self {
            max_attempts,
            interval_ms: interval.as_millis() as u64,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Default cadence while waiting for an instance to stop (about a minute).
    pub fn stop_default() -> Self {
        Self {
            max_attempts: 20,
            interval_ms: 3_000,
        }
    }

    /// Default cadence while waiting for an instance to start (about 40s).
    pub fn start_default() -> Self {
        Self {
            max_attempts: 20,
            interval_ms: 2_000,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_attempts == 0 {
            return Err(CoreError::Validation(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.interval_ms == 0 {
            return Err(CoreError::Validation(
                "interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the workflow engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Polling while waiting for the instance to stop
    pub stop_poll: PollPolicy,
    /// Polling while waiting for the instance to run again
    pub start_poll: PollPolicy,
    /// Read the instance status once before acting instead of trusting the
    /// caller's declared state
    pub verify_origin_state: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            stop_poll: PollPolicy::stop_default(),
            start_poll: PollPolicy::start_default(),
            verify_origin_state: false,
        }
    }
}

impl WorkflowConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        self.stop_poll.validate()?;
        self.start_poll.validate()
    }
}
