use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unsupported instance state '{0}', expected 'running' or 'stopped'")]
    InvalidOriginState(String),

    #[error("Invalid workflow phase transition from {from} to {to}")]
    InvalidPhaseTransition { from: String, to: String },

    #[error("Validation error: {0}")]
    Validation(String),
}
