use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::mutation::{MutationSpec, OriginState};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    #[default]
    Init,
    EnsureStopped,
    Mutating,
    EnsureRunning,
    Done,
}

impl WorkflowPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::EnsureStopped => "ensure_stopped",
            Self::Mutating => "mutating",
            Self::EnsureRunning => "ensure_running",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One quiesce, mutate, restore run against a single instance.
///
/// `origin_state` is fixed at creation; only the engine advances `phase`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResizeWorkflow {
    pub id: Uuid,
    pub instance_id: String,
    pub origin_state: OriginState,
    pub mutation: MutationSpec,
    pub since_start: DateTime<Utc>,
    pub phase: WorkflowPhase,
}

impl ResizeWorkflow {
    pub fn new(
        instance_id: impl Into<String>,
        origin_state: OriginState,
        mutation: MutationSpec,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instance_id: instance_id.into(),
            origin_state,
            mutation,
            since_start: Utc::now(),
            phase: WorkflowPhase::default(),
        }
    }

    /// Whether the instance must be started again once the mutation is applied.
    pub fn restores_running(&self) -> bool {
        self.origin_state == OriginState::Running
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.since_start).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_creation() {
        let workflow = ResizeWorkflow::new(
            "i-123",
            OriginState::Running,
            MutationSpec::ResizeType {
                instance_type: "t3.large".to_string(),
            },
        );

        assert_eq!(workflow.instance_id, "i-123");
        assert_eq!(workflow.phase, WorkflowPhase::Init);
        assert!(workflow.restores_running());
        assert!(!workflow.id.is_nil());
        assert!(workflow.since_start <= Utc::now());
    }

    #[test]
    fn test_stopped_origin_does_not_restore() {
        let workflow = ResizeWorkflow::new(
            "i-123",
            OriginState::Stopped,
            MutationSpec::AssociateAddress {
                allocation_id: "eipalloc-1".to_string(),
            },
        );
        assert!(!workflow.restores_running());
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(WorkflowPhase::EnsureStopped.as_str(), "ensure_stopped");
        assert_eq!(WorkflowPhase::default(), WorkflowPhase::Init);
    }
}
