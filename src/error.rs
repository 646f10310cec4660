use thiserror::Error;

/// Failures surfaced by the analysis boundary.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Valid request, but nothing to analyse (unknown team, empty league/season, no meetings).
    #[error("not found: {0}")]
    NotFound(String),

    /// Rejected before touching the store.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Store or aggregation fault, with enough context to replay the call.
    #[error("{operation} failed ({params}): {message}")]
    Computation {
        operation: &'static str,
        params: String,
        message: String,
    },
}

impl AnalysisError {
    pub fn computation(operation: &'static str, params: impl Into<String>, err: anyhow::Error) -> Self {
        AnalysisError::Computation {
            operation,
            params: params.into(),
            message: format!("{err:#}"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AnalysisError::NotFound(_))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, AnalysisError::InvalidInput(_))
    }
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
