//! Error types for the churn predictor

use thiserror::Error;

/// Rejection of a submitted profile before any inference runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required fields were left unset
    #[error("incomplete input (missing: {})", .missing.join(", "))]
    IncompleteInput { missing: Vec<&'static str> },
}

impl ValidationError {
    /// Labels of the fields that were missing
    pub fn missing_fields(&self) -> &[&'static str] {
        match self {
            Self::IncompleteInput { missing } => missing,
        }
    }
}

/// Failure of a full submit: either the user's input or the model
#[derive(Error, Debug)]
pub enum PredictError {
    /// Recoverable: the user must complete the form and resubmit
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Inference runtime failure
    #[error("inference failed: {0:#}")]
    Inference(#[from] anyhow::Error),
}
