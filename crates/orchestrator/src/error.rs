use events::FailureCause;
use resize_core::{CoreError, InstanceState, MutationSpec, WorkflowPhase};
use thiserror::Error;

/// Why a status poll ended without reaching its target.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("Timed out after {attempts} attempts waiting for instance to reach '{target}' (last seen: {last_seen})")]
    Timeout {
        attempts: u32,
        target: InstanceState,
        last_seen: String,
    },

    #[error("Unexpected instance state '{observed}' while waiting for '{target}'")]
    UnexpectedState {
        observed: String,
        target: InstanceState,
    },

    #[error("Cancelled while waiting for instance to reach '{target}'")]
    Cancelled { target: InstanceState },

    #[error("Invalid poll policy: {0}")]
    InvalidPolicy(String),
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid precondition: {0}")]
    InvalidPrecondition(String),

    #[error("Could not read instance status: {0}")]
    QueryFailed(String),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("Provider rejected {mutation}: {reason}")]
    MutationRejected { mutation: String, reason: String },

    #[error("Provider call '{call}' failed: {reason}")]
    ProviderCallFailed { call: &'static str, reason: String },

    /// The mutation is in place but the instance did not come back up.
    /// Nothing is rolled back; the instance may be left stopped.
    #[error("{applied} was applied but the instance was not restarted: {source}")]
    RestoreFailed {
        applied: String,
        source: Box<WorkflowError>,
    },

    #[error("Workflow cancelled during {0}")]
    Cancelled(WorkflowPhase),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl WorkflowError {
    pub fn provider_call(call: &'static str, error: provider::ProviderError) -> Self {
        Self::ProviderCallFailed {
            call,
            reason: error.to_string(),
        }
    }

    /// Failure cause reported on the terminal progress record.
    pub fn cause(&self) -> FailureCause {
        match self {
            Self::InvalidPrecondition(_)
            | Self::Core(_)
            | Self::Poll(PollError::InvalidPolicy(_)) => FailureCause::InvalidPrecondition,
            Self::QueryFailed(_) => FailureCause::QueryFailed,
            Self::Poll(PollError::Timeout { .. }) => FailureCause::Timeout,
            Self::Poll(PollError::UnexpectedState { .. }) => FailureCause::UnexpectedState,
            Self::Poll(PollError::Cancelled { .. }) | Self::Cancelled(_) => FailureCause::Cancelled,
            Self::MutationRejected { .. } => FailureCause::MutationRejected,
            Self::ProviderCallFailed { .. } => FailureCause::ProviderCallFailed,
            Self::RestoreFailed { .. } => FailureCause::RestoreFailed,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        self.cause() == FailureCause::Cancelled
    }

    /// Re-classify an error raised after `mutation` was applied.
    pub fn after_mutation(self, mutation: &MutationSpec) -> Self {
        if self.is_cancellation() {
            return self;
        }
        Self::RestoreFailed {
            applied: mutation.describe(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_error_causes() {
        let timeout = WorkflowError::from(PollError::Timeout {
            attempts: 5,
            target: InstanceState::Stopped,
            last_seen: "stopping".to_string(),
        });
        assert_eq!(timeout.cause(), FailureCause::Timeout);
        assert!(timeout.to_string().contains("5 attempts"));

        let unexpected = WorkflowError::from(PollError::UnexpectedState {
            observed: "terminated".to_string(),
            target: InstanceState::Running,
        });
        assert_eq!(unexpected.cause(), FailureCause::UnexpectedState);

        let policy = WorkflowError::from(PollError::InvalidPolicy(
            "max_attempts must be at least 1".to_string(),
        ));
        assert_eq!(policy.cause(), FailureCause::InvalidPrecondition);
    }

    #[test]
    fn test_after_mutation_wraps_restore_failures() {
        let mutation = MutationSpec::ResizeType {
            instance_type: "m5.large".to_string(),
        };
        let err = WorkflowError::provider_call(
            "start",
            provider::ProviderError::Unreachable("connection reset".to_string()),
        )
        .after_mutation(&mutation);

        assert_eq!(err.cause(), FailureCause::RestoreFailed);
        let message = err.to_string();
        assert!(message.contains("resize to m5.large"));
        assert!(message.contains("connection reset"));
    }

    #[test]
    fn test_after_mutation_keeps_cancellation() {
        let mutation = MutationSpec::AssociateAddress {
            allocation_id: "eipalloc-1".to_string(),
        };
        let err = WorkflowError::Cancelled(WorkflowPhase::EnsureRunning).after_mutation(&mutation);
        assert_eq!(err.cause(), FailureCause::Cancelled);
        assert!(err.to_string().contains("ensure_running"));
    }
}
