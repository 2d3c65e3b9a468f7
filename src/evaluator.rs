//! Evaluation orchestrator.
//!
//! An evaluation moves through `Validating → Scoring → Assembling → Done`.
//! Any failure along the way ends in the fixed fallback payload instead, so
//! every call returns a well-formed [`EvaluationResult`].

use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use strum::Display;

use crate::error::{FallbackReason, ScoringError};
use crate::scoring::{
    calculate_score, BlendWeights, Embedder, KeywordCache, KeywordScore, KeywordScorer,
    LruKeywordCache, MLHandle, NoCache, PolarityOracle, ScoreBreakdown, SentimentScore,
    SentimentScorer,
};
use crate::settings::Settings;
use crate::types::{
    EvaluationResult, ExpectedKeyword, Feedback, Question, Scores, SentimentLabel, Weights,
};

pub const SYSTEM_ERROR_SENTINEL: &str = "System Error";
pub const INVALID_QUESTION_TEXT: &str = "Invalid Question";

const FALLBACK_KEYWORD_SCORE: f64 = 0.0;
const FALLBACK_SENTIMENT_SCORE: f64 = 50.0;
const FALLBACK_FINAL_SCORE: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    Validating,
    Scoring,
    Assembling,
    Done,
    Fallback,
}

/// A request decoded from a JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRequest {
    pub response: String,
    pub question: Question,
    pub weights: BlendWeights,
}

impl EvaluationRequest {
    /// Validates the raw payload shape. Weight fields are optional; anything
    /// that isn't a number falls back to `default_weights`.
    pub fn from_payload(payload: &Value, default_weights: BlendWeights) -> Result<Self, FallbackReason> {
        let object = payload.as_object().ok_or(FallbackReason::InvalidPayload)?;

        let question = object
            .get("question")
            .filter(|q| q.get("text").is_some_and(Value::is_string))
            .and_then(|q| serde_json::from_value::<Question>(q.clone()).ok())
            .ok_or(FallbackReason::InvalidQuestion)?;

        let response = match object.get("response") {
            None | Some(Value::Null) => return Err(FallbackReason::MissingResponse),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(FallbackReason::InvalidResponse),
        };

        let weight = |key: &str, default: f64| object.get(key).and_then(Value::as_f64).unwrap_or(default);

        Ok(Self {
            response,
            question,
            weights: BlendWeights::new(
                weight("keyword_weight", default_weights.keyword),
                weight("sentiment_weight", default_weights.sentiment),
            ),
        })
    }
}

pub struct Evaluator {
    keywords: KeywordScorer,
    sentiment: SentimentScorer,
    default_weights: BlendWeights,
}

struct Scored {
    keyword: KeywordScore,
    sentiment: SentimentScore,
    blend: ScoreBreakdown,
}

impl Evaluator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        oracle: Arc<dyn PolarityOracle>,
        settings: &Settings,
    ) -> Self {
        let cache: Arc<dyn KeywordCache> = match settings.cache.capacity {
            0 => Arc::new(NoCache),
            capacity => Arc::new(LruKeywordCache::with_capacity(capacity)),
        };
        Self {
            keywords: KeywordScorer::new(embedder, cache, settings.scoring.match_threshold),
            sentiment: SentimentScorer::new(oracle, settings.scoring.sentiment.clone()),
            default_weights: BlendWeights::new(
                settings.scoring.weights.keyword,
                settings.scoring.weights.sentiment,
            ),
        }
    }

    pub fn with_models(handle: MLHandle, settings: &Settings) -> Self {
        let handle = Arc::new(handle);
        Self::new(handle.clone(), handle, settings)
    }

    pub fn default_weights(&self) -> BlendWeights {
        self.default_weights
    }

    /// Scores `response` against `question`. Never fails; problems are
    /// reported through the fallback payload.
    pub fn evaluate(&self, response: Option<&str>, question: &Question, weights: BlendWeights) -> EvaluationResult {
        settle(self.try_evaluate(response, question, weights))
    }

    pub fn evaluate_payload(&self, payload: &Value) -> EvaluationResult {
        settle(self.try_evaluate_payload(payload))
    }

    /// Like [`Evaluator::evaluate_payload`], but hands back the fallback
    /// reason instead of the fallback payload.
    pub fn try_evaluate_payload(&self, payload: &Value) -> Result<EvaluationResult, FallbackReason> {
        let request = EvaluationRequest::from_payload(payload, self.default_weights)?;
        self.try_evaluate(Some(request.response.as_str()), &request.question, request.weights)
    }

    pub fn try_evaluate(
        &self,
        response: Option<&str>,
        question: &Question,
        weights: BlendWeights,
    ) -> Result<EvaluationResult, FallbackReason> {
        tracing::debug!(stage = %Stage::Validating);
        let question_text = question.text.as_deref().ok_or(FallbackReason::InvalidQuestion)?;
        let response = response.ok_or(FallbackReason::MissingResponse)?;

        tracing::debug!(stage = %Stage::Scoring, keywords = question.expected_keywords.len());
        let scored = panic::catch_unwind(AssertUnwindSafe(|| {
            self.score(response, &question.expected_keywords, weights)
        }));

        let scored = match scored {
            Ok(Ok(scored)) => scored,
            Ok(Err(e)) => return Err(system_error(question_text, response, e.to_string())),
            Err(payload) => return Err(system_error(question_text, response, panic_message(&*payload))),
        };

        tracing::debug!(stage = %Stage::Assembling);
        let result = assemble(question_text, response, &question.expected_keywords, scored);

        tracing::debug!(stage = %Stage::Done, final_score = result.scores.final_score);
        Ok(result)
    }

    fn score(
        &self,
        response: &str,
        keywords: &[ExpectedKeyword],
        weights: BlendWeights,
    ) -> Result<Scored, ScoringError> {
        let keyword = self.keywords.score(response, keywords);
        let sentiment = self.sentiment.score(response)?;
        let blend = calculate_score(keyword.score, sentiment.score, weights);
        Ok(Scored {
            keyword,
            sentiment,
            blend,
        })
    }
}

fn settle(outcome: Result<EvaluationResult, FallbackReason>) -> EvaluationResult {
    outcome.unwrap_or_else(|reason| {
        if reason.is_input_error() {
            tracing::warn!(stage = %Stage::Validating, reason = %reason, "rejected input");
        } else {
            tracing::debug!(stage = %Stage::Fallback, reason = %reason);
        }
        fallback_result(&reason)
    })
}

fn system_error(question: &str, response: &str, cause: String) -> FallbackReason {
    tracing::warn!(stage = %Stage::Scoring, cause = %cause, "evaluation failed");
    FallbackReason::SystemError {
        question: question.to_string(),
        response: response.to_string(),
        cause,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}

fn assemble(
    question: &str,
    response: &str,
    keywords: &[ExpectedKeyword],
    scored: Scored,
) -> EvaluationResult {
    let Scored {
        keyword,
        sentiment,
        blend,
    } = scored;

    let matched: HashSet<&str> = keyword.matched.iter().map(String::as_str).collect();
    let missing_keywords: Vec<String> = keywords
        .iter()
        .filter(|k| !matched.contains(k.keyword.as_str()))
        .map(|k| k.keyword.clone())
        .collect();

    let suggestion = suggestion(&missing_keywords);

    EvaluationResult {
        question: question.to_string(),
        response: response.to_string(),
        scores: Scores {
            keyword: blend.keyword_score,
            sentiment: blend.sentiment_score,
            final_score: blend.final_score,
            weights: blend.weights,
        },
        feedback: Feedback {
            matched_keywords: keyword.matched,
            missing_keywords,
            sentiment: sentiment.label,
            suggestion,
            keyword_detail: keyword.detail,
        },
    }
}

/// Names every missing keyword, in input order; empty when nothing is missing.
pub fn suggestion(missing: &[String]) -> String {
    if missing.is_empty() {
        return String::new();
    }
    format!("Try mentioning: {}.", missing.join(", "))
}

/// The guaranteed-safe payload. Scores are fixed sentinels, not computed.
pub fn fallback_result(reason: &FallbackReason) -> EvaluationResult {
    let (question, response, missing_keywords) = match reason {
        FallbackReason::SystemError {
            question, response, ..
        } => (
            question.clone(),
            response.clone(),
            vec![SYSTEM_ERROR_SENTINEL.to_string()],
        ),
        _ => (INVALID_QUESTION_TEXT.to_string(), String::new(), Vec::new()),
    };

    EvaluationResult {
        question,
        response,
        scores: Scores {
            keyword: FALLBACK_KEYWORD_SCORE,
            sentiment: FALLBACK_SENTIMENT_SCORE,
            final_score: FALLBACK_FINAL_SCORE,
            weights: Weights {
                keyword_weight: 0.8,
                sentiment_weight: 0.2,
            },
        },
        feedback: Feedback {
            matched_keywords: Vec::new(),
            missing_keywords,
            sentiment: SentimentLabel::Neutral,
            suggestion: reason.to_string(),
            keyword_detail: BTreeMap::new(),
        },
    }
}
