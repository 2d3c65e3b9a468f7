pub mod error;
pub mod evaluator;
pub mod scoring;
pub mod service;
pub mod settings;
pub mod types;
pub mod utils;

pub use error::{FallbackReason, OracleError, ScoringError};
pub use evaluator::{fallback_result, EvaluationRequest, Evaluator};
pub use types::{EvaluationResult, ExpectedKeyword, Question, SentimentLabel};
