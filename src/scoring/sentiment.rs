use std::sync::Arc;

use super::oracle::PolarityOracle;
use super::round_to;
use crate::error::OracleError;
use crate::settings::SentimentThresholds;
use crate::types::SentimentLabel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScore {
    pub score: f64,
    pub label: SentimentLabel,
}

pub struct SentimentScorer {
    oracle: Arc<dyn PolarityOracle>,
    thresholds: SentimentThresholds,
}

impl SentimentScorer {
    pub fn new(oracle: Arc<dyn PolarityOracle>, thresholds: SentimentThresholds) -> Self {
        Self { oracle, thresholds }
    }

    /// Maps the oracle's polarity onto 0..100 and labels it. Oracle
    /// failures are returned to the caller.
    pub fn score(&self, response: &str) -> Result<SentimentScore, OracleError> {
        let polarity = self.oracle.polarity(response)?;
        if !polarity.is_finite() {
            return Err(OracleError::InferenceFailed {
                reason: format!("polarity {polarity} is not a number"),
            });
        }
        let score = polarity_to_score(polarity);
        Ok(SentimentScore {
            score,
            label: self.label(score),
        })
    }

    pub fn label(&self, score: f64) -> SentimentLabel {
        if score >= self.thresholds.positive_min {
            SentimentLabel::Positive
        } else if score >= self.thresholds.neutral_min {
            SentimentLabel::Neutral
        } else {
            SentimentLabel::Negative
        }
    }
}

pub fn polarity_to_score(polarity: f64) -> f64 {
    round_to(((polarity.clamp(-1.0, 1.0) + 1.0) * 50.0).clamp(0.0, 100.0), 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::testing::{FailingPolarity, FixedPolarity};

    fn thresholds() -> SentimentThresholds {
        SentimentThresholds {
            positive_min: 65.0,
            neutral_min: 45.0,
        }
    }

    fn scorer(polarity: f64) -> SentimentScorer {
        SentimentScorer::new(Arc::new(FixedPolarity(polarity)), thresholds())
    }

    #[test]
    fn test_polarity_rescaling() {
        assert_eq!(polarity_to_score(-1.0), 0.0);
        assert_eq!(polarity_to_score(0.0), 50.0);
        assert_eq!(polarity_to_score(1.0), 100.0);
        assert_eq!(polarity_to_score(0.25), 62.5);
    }

    #[test]
    fn test_out_of_range_polarity_is_clamped() {
        assert_eq!(polarity_to_score(3.0), 100.0);
        assert_eq!(polarity_to_score(-7.5), 0.0);
    }

    #[test]
    fn test_label_boundaries_are_inclusive_below() {
        let s = scorer(0.0);
        assert_eq!(s.label(65.0), SentimentLabel::Positive);
        assert_eq!(s.label(64.99), SentimentLabel::Neutral);
        assert_eq!(s.label(45.0), SentimentLabel::Neutral);
        assert_eq!(s.label(44.99), SentimentLabel::Negative);
    }

    #[test]
    fn test_score_labels() {
        assert_eq!(scorer(0.6).score("great").unwrap().label, SentimentLabel::Positive);
        assert_eq!(scorer(0.0).score("").unwrap().label, SentimentLabel::Neutral);
        assert_eq!(scorer(-0.5).score("awful").unwrap().label, SentimentLabel::Negative);
    }

    #[test]
    fn test_oracle_failure_propagates() {
        let s = SentimentScorer::new(Arc::new(FailingPolarity), thresholds());
        assert!(s.score("anything").is_err());
    }

    #[test]
    fn test_nan_polarity_is_an_error() {
        assert!(scorer(f64::NAN).score("x").is_err());
    }
}
