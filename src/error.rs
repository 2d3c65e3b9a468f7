use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("failed to load model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("model worker is not running")]
    WorkerUnavailable,

    #[error("expected {expected} embeddings, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

impl From<rust_bert::RustBertError> for OracleError {
    fn from(err: rust_bert::RustBertError) -> Self {
        OracleError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ScoringError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("malformed weight {weight} for keyword '{keyword}'")]
    MalformedWeight { keyword: String, weight: f64 },
}

/// Why an evaluation produced the fixed fallback payload instead of a score.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FallbackReason {
    #[error("Invalid payload")]
    InvalidPayload,

    #[error("Invalid question format")]
    InvalidQuestion,

    #[error("Missing response")]
    MissingResponse,

    #[error("Invalid response format")]
    InvalidResponse,

    #[error("Evaluation failed due to system error.")]
    SystemError {
        question: String,
        response: String,
        cause: String,
    },
}

impl FallbackReason {
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::SystemError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_messages() {
        assert_eq!(
            FallbackReason::InvalidQuestion.to_string(),
            "Invalid question format"
        );
        assert_eq!(FallbackReason::MissingResponse.to_string(), "Missing response");
        let system = FallbackReason::SystemError {
            question: "q".into(),
            response: "r".into(),
            cause: "boom".into(),
        };
        assert_eq!(system.to_string(), "Evaluation failed due to system error.");
        assert!(!system.is_input_error());
        assert!(FallbackReason::InvalidPayload.is_input_error());
    }

    #[test]
    fn test_oracle_error_is_transparent_in_scoring_error() {
        let err: ScoringError = OracleError::WorkerUnavailable.into();
        assert_eq!(err.to_string(), "model worker is not running");
    }
}
