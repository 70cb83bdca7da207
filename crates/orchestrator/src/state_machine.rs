use resize_core::{CoreError, ResizeWorkflow, WorkflowPhase};

pub struct WorkflowStateMachine;

impl WorkflowStateMachine {
    pub fn validate_transition(from: &WorkflowPhase, to: &WorkflowPhase) -> Result<(), CoreError> {
        let allowed = Self::allowed_transitions(from);

        if allowed.contains(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidPhaseTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    fn allowed_transitions(from: &WorkflowPhase) -> Vec<WorkflowPhase> {
        match from {
            WorkflowPhase::Init => vec![
                WorkflowPhase::EnsureStopped,
                WorkflowPhase::Mutating,
                WorkflowPhase::Done,
            ],
            WorkflowPhase::EnsureStopped => vec![WorkflowPhase::Mutating, WorkflowPhase::Done],
            WorkflowPhase::Mutating => vec![WorkflowPhase::EnsureRunning, WorkflowPhase::Done],
            WorkflowPhase::EnsureRunning => vec![WorkflowPhase::Done],
            WorkflowPhase::Done => vec![],
        }
    }

    /// Phase that follows the workflow's current one on the success path.
    ///
    /// A workflow that started from a running instance goes through the stop
    /// and restart phases; one that started stopped goes straight to the
    /// mutation and finishes after it.
    pub fn next_phase(workflow: &ResizeWorkflow) -> Option<WorkflowPhase> {
        let running = workflow.restores_running();
        match workflow.phase {
            WorkflowPhase::Init if running => Some(WorkflowPhase::EnsureStopped),
            WorkflowPhase::Init => Some(WorkflowPhase::Mutating),
            WorkflowPhase::EnsureStopped => Some(WorkflowPhase::Mutating),
            WorkflowPhase::Mutating if running => Some(WorkflowPhase::EnsureRunning),
            WorkflowPhase::Mutating => Some(WorkflowPhase::Done),
            WorkflowPhase::EnsureRunning => Some(WorkflowPhase::Done),
            WorkflowPhase::Done => None,
        }
    }
}
