use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider could not be reached or the call failed in transport.
    #[error("Provider unreachable: {0}")]
    Unreachable(String),

    /// The provider answered but explicitly declined the request.
    #[error("Provider rejected {call}: {reason}")]
    Rejected { call: String, reason: String },

    #[error("Instance status not available: {0}")]
    NotFound(String),
}

impl ProviderError {
    pub fn rejected(call: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            call: call.into(),
            reason: reason.into(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
