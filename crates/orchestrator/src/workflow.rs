//! The quiesce, mutate, restore workflow.
//!
//! A workflow stops a running instance, applies one configuration change while
//! it is stopped and starts it again if it was running to begin with. Each
//! phase runs strictly after the previous one; the first error ends the run
//! with exactly one failure record and nothing is rolled back.

use std::sync::Arc;

use events::{EventSink, ProgressEvent};
use provider::{InstanceProvider, ProviderError};
use resize_core::{InstanceState, MutationSpec, OriginState, ResizeWorkflow, WorkflowPhase};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::WorkflowConfig;
use crate::error::{Result, WorkflowError};
use crate::poller::StatusPoller;
use crate::state_machine::WorkflowStateMachine;

/// A caller's request to change one instance.
#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    pub instance_id: String,
    /// State the caller says the instance is in, as sent on the wire
    pub declared_state: String,
    pub mutation: MutationSpec,
}

impl WorkflowRequest {
    pub fn new(
        instance_id: impl Into<String>,
        declared_state: impl Into<String>,
        mutation: MutationSpec,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            declared_state: declared_state.into(),
            mutation,
        }
    }
}

#[derive(Clone)]
pub struct WorkflowEngine {
    provider: Arc<dyn InstanceProvider>,
    poller: StatusPoller,
    config: WorkflowConfig,
}

impl WorkflowEngine {
    pub fn new(provider: Arc<dyn InstanceProvider>, config: WorkflowConfig) -> Self {
        Self {
            poller: StatusPoller::new(provider.clone()),
            provider,
            config,
        }
    }

    /// Run the workflow and report its outcome on `sink`.
    ///
    /// Progress messages are emitted while the run is in flight, followed by
    /// exactly one `Success` or `Failure`. The finished workflow is returned
    /// on success so callers can log or inspect it.
    pub async fn execute(
        &self,
        request: WorkflowRequest,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<ResizeWorkflow> {
        let instance_id = request.instance_id.clone();
        let mutation = request.mutation.describe();

        match self.run(request, sink, cancel).await {
            Ok(workflow) => {
                info!(
                    instance_id = %instance_id,
                    workflow_id = %workflow.id,
                    mutation = %mutation,
                    elapsed_ms = workflow.elapsed_ms(),
                    "Workflow completed"
                );
                sink.emit(ProgressEvent::success());
                Ok(workflow)
            }
            Err(e) => {
                warn!(
                    instance_id = %instance_id,
                    mutation = %mutation,
                    cause = e.cause().as_str(),
                    error = %e,
                    "Workflow failed"
                );
                sink.emit(ProgressEvent::failure(e.cause(), e.to_string()));
                Err(e)
            }
        }
    }

    /// Run every phase without emitting a terminal record.
    pub async fn run(
        &self,
        request: WorkflowRequest,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<ResizeWorkflow> {
        self.config
            .validate()
            .map_err(|e| WorkflowError::InvalidPrecondition(e.to_string()))?;
        let declared = OriginState::parse(&request.declared_state)
            .map_err(|e| WorkflowError::InvalidPrecondition(e.to_string()))?;

        let origin = if self.config.verify_origin_state {
            self.confirm_origin(&request.instance_id, declared, sink)
                .await?
        } else {
            declared
        };

        let mut workflow = ResizeWorkflow::new(request.instance_id, origin, request.mutation);
        info!(
            instance_id = %workflow.instance_id,
            workflow_id = %workflow.id,
            origin = origin.as_str(),
            mutation = %workflow.mutation.describe(),
            "Starting workflow"
        );

        while let Some(next) = WorkflowStateMachine::next_phase(&workflow) {
            self.advance(&mut workflow, next)?;
            match next {
                WorkflowPhase::EnsureStopped => self.ensure_stopped(&workflow, sink, cancel).await?,
                WorkflowPhase::Mutating => self.apply_mutation(&workflow, cancel).await?,
                WorkflowPhase::EnsureRunning => self
                    .ensure_running(&workflow, sink, cancel)
                    .await
                    .map_err(|e| e.after_mutation(&workflow.mutation))?,
                WorkflowPhase::Init | WorkflowPhase::Done => {}
            }
        }
        Ok(workflow)
    }

    /// One authoritative status read replacing the caller's declared state.
    async fn confirm_origin(
        &self,
        instance_id: &str,
        declared: OriginState,
        sink: &dyn EventSink,
    ) -> Result<OriginState> {
        let status = self
            .provider
            .get_status(instance_id)
            .await
            .map_err(|e| WorkflowError::QueryFailed(e.to_string()))?;

        let observed = OriginState::from_state(status.state()).ok_or_else(|| {
            WorkflowError::InvalidPrecondition(format!(
                "instance is '{}', expected 'running' or 'stopped'",
                status.name
            ))
        })?;

        if observed != declared {
            debug!(
                instance_id,
                declared = declared.as_str(),
                observed = observed.as_str(),
                "Declared state is stale"
            );
            sink.emit(ProgressEvent::message(format!(
                "instance is {}, not {}",
                observed.as_str(),
                declared.as_str()
            )));
        }
        Ok(observed)
    }

    async fn ensure_stopped(
        &self,
        workflow: &ResizeWorkflow,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        check_cancelled(workflow, cancel)?;
        self.provider
            .stop(&workflow.instance_id)
            .await
            .map_err(|e| WorkflowError::provider_call("stop", e))?;

        self.poller
            .poll_until(
                &workflow.instance_id,
                InstanceState::Stopped,
                &self.config.stop_poll,
                sink,
                cancel,
            )
            .await?;
        Ok(())
    }

    async fn apply_mutation(
        &self,
        workflow: &ResizeWorkflow,
        cancel: &CancellationToken,
    ) -> Result<()> {
        check_cancelled(workflow, cancel)?;

        let (call, outcome) = match &workflow.mutation {
            MutationSpec::ResizeType { instance_type } => (
                "modify_instance_type",
                self.provider
                    .modify_instance_type(&workflow.instance_id, instance_type)
                    .await,
            ),
            MutationSpec::AssociateAddress { allocation_id } => (
                "associate_address",
                self.provider
                    .associate_address(&workflow.instance_id, allocation_id)
                    .await,
            ),
        };

        outcome.map_err(|e| match e {
            ProviderError::Rejected { reason, .. } => WorkflowError::MutationRejected {
                mutation: workflow.mutation.describe(),
                reason,
            },
            other => WorkflowError::provider_call(call, other),
        })
    }

    async fn ensure_running(
        &self,
        workflow: &ResizeWorkflow,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        check_cancelled(workflow, cancel)?;
        self.provider
            .start(&workflow.instance_id)
            .await
            .map_err(|e| WorkflowError::provider_call("start", e))?;

        self.poller
            .poll_until(
                &workflow.instance_id,
                InstanceState::Running,
                &self.config.start_poll,
                sink,
                cancel,
            )
            .await?;
        Ok(())
    }

    fn advance(&self, workflow: &mut ResizeWorkflow, to: WorkflowPhase) -> Result<()> {
        WorkflowStateMachine::validate_transition(&workflow.phase, &to)?;
        debug!(
            workflow_id = %workflow.id,
            from = %workflow.phase,
            to = %to,
            "Workflow phase transition"
        );
        workflow.phase = to;
        Ok(())
    }
}

fn check_cancelled(workflow: &ResizeWorkflow, cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(WorkflowError::Cancelled(workflow.phase));
    }
    Ok(())
}
