//! Progress event types and their wire shape

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of a progress record, independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKind {
    Message,
    Success,
    Failure,
}

/// Machine-readable reason attached to a failure record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    InvalidPrecondition,
    QueryFailed,
    Timeout,
    UnexpectedState,
    MutationRejected,
    ProviderCallFailed,
    /// The mutation was applied but the instance was not brought back up
    RestoreFailed,
    Cancelled,
    /// The transport could not start or finish the workflow
    Transport,
}

impl FailureCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPrecondition => "invalid_precondition",
            Self::QueryFailed => "query_failed",
            Self::Timeout => "timeout",
            Self::UnexpectedState => "unexpected_state",
            Self::MutationRejected => "mutation_rejected",
            Self::ProviderCallFailed => "provider_call_failed",
            Self::RestoreFailed => "restore_failed",
            Self::Cancelled => "cancelled",
            Self::Transport => "transport",
        }
    }
}

/// One record in a workflow's progress stream.
///
/// Serialises to the wire records `{"status":"message","message":..}`,
/// `{"status":"success"}` and `{"status":"failure","message":..,"cause":..}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProgressEvent {
    Message {
        message: String,
    },
    Success,
    Failure {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cause: Option<FailureCause>,
    },
}

impl ProgressEvent {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message {
            message: text.into(),
        }
    }

    pub fn success() -> Self {
        Self::Success
    }

    pub fn failure(cause: FailureCause, text: impl Into<String>) -> Self {
        Self::Failure {
            message: text.into(),
            cause: Some(cause),
        }
    }

    pub fn kind(&self) -> ProgressKind {
        match self {
            Self::Message { .. } => ProgressKind::Message,
            Self::Success => ProgressKind::Success,
            Self::Failure { .. } => ProgressKind::Failure,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Message { message } | Self::Failure { message, .. } => message.as_str(),
            Self::Success => "",
        }
    }

    pub fn cause(&self) -> Option<FailureCause> {
        match self {
            Self::Failure { cause, .. } => *cause,
            _ => None,
        }
    }

    /// Success and Failure end a stream; nothing may follow them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Message { .. })
    }
}
