use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::Display;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedKeyword {
    pub keyword: String,
    pub weight: f64,
}

impl ExpectedKeyword {
    pub fn new(keyword: impl Into<String>, weight: f64) -> Self {
        Self {
            keyword: keyword.into(),
            weight,
        }
    }
}

/// A question as supplied by the question generator. `text` is optional
/// at the type level so a payload without it can still be represented and
/// rejected during validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub expected_keywords: Vec<ExpectedKeyword>,
}

impl Question {
    pub fn new(text: impl Into<String>, expected_keywords: Vec<ExpectedKeyword>) -> Self {
        Self {
            text: Some(text.into()),
            expected_keywords,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub keyword_weight: f64,
    pub sentiment_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub keyword: f64,
    pub sentiment: f64,
    #[serde(rename = "final")]
    pub final_score: f64,
    pub weights: Weights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub sentiment: SentimentLabel,
    pub suggestion: String,
    pub keyword_detail: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub question: String,
    pub response: String,
    pub scores: Scores,
    pub feedback: Feedback,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_without_text_deserializes() {
        let q: Question = serde_json::from_value(json!({ "expected_keywords": [] })).unwrap();
        assert!(q.text.is_none());
    }

    #[test]
    fn test_question_keywords_default_empty() {
        let q: Question = serde_json::from_value(json!({ "text": "What is OOP?" })).unwrap();
        assert_eq!(q.text.as_deref(), Some("What is OOP?"));
        assert!(q.expected_keywords.is_empty());
    }

    #[test]
    fn test_keyword_requires_weight() {
        let parsed = serde_json::from_value::<Question>(json!({
            "text": "t",
            "expected_keywords": [{ "keyword": "rust" }]
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_label_serialization() {
        assert_eq!(SentimentLabel::Positive.to_string(), "positive");
        assert_eq!(
            serde_json::to_value(SentimentLabel::Negative).unwrap(),
            json!("negative")
        );
    }

    #[test]
    fn test_scores_final_field_name() {
        let scores = Scores {
            keyword: 1.0,
            sentiment: 2.0,
            final_score: 3.0,
            weights: Weights {
                keyword_weight: 0.8,
                sentiment_weight: 0.2,
            },
        };
        let value = serde_json::to_value(scores).unwrap();
        assert_eq!(value["final"], json!(3.0));
        assert_eq!(value["weights"]["keyword_weight"], json!(0.8));
    }
}
