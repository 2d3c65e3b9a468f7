use super::round_to;
use crate::types::Weights;

pub const DEFAULT_KEYWORD_WEIGHT: f64 = 0.8;
pub const DEFAULT_SENTIMENT_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub keyword: f64,
    pub sentiment: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            keyword: DEFAULT_KEYWORD_WEIGHT,
            sentiment: DEFAULT_SENTIMENT_WEIGHT,
        }
    }
}

impl BlendWeights {
    pub fn new(keyword: f64, sentiment: f64) -> Self {
        Self { keyword, sentiment }
    }

    /// Scales the weights to sum to 1. Negative or non-finite weights count
    /// as zero; if nothing positive remains, the defaults are used.
    pub fn normalized(self) -> Weights {
        let keyword = sanitize(self.keyword);
        let sentiment = sanitize(self.sentiment);
        let total = keyword + sentiment;

        if total <= 0.0 {
            return Self::default().normalized();
        }

        Weights {
            keyword_weight: keyword / total,
            sentiment_weight: sentiment / total,
        }
    }
}

fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.max(0.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub keyword_score: f64,
    pub sentiment_score: f64,
    pub final_score: f64,
    pub weights: Weights,
}

pub fn calculate_score(keyword_score: f64, sentiment_score: f64, weights: BlendWeights) -> ScoreBreakdown {
    let weights = weights.normalized();
    let final_score = weights.keyword_weight * keyword_score + weights.sentiment_weight * sentiment_score;

    ScoreBreakdown {
        keyword_score,
        sentiment_score,
        final_score: round_to(final_score.clamp(0.0, 100.0), 2),
        weights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_score_calculation() {
        let score = calculate_score(100.0, 50.0, BlendWeights::default());
        assert!((score.final_score - 90.0).abs() < 1e-9);
        assert_eq!(score.keyword_score, 100.0);
        assert_eq!(score.sentiment_score, 50.0);
    }

    #[test]
    fn test_weights_are_normalized() {
        let score = calculate_score(80.0, 40.0, BlendWeights::new(3.0, 1.0));
        assert!((score.weights.keyword_weight - 0.75).abs() < 1e-9);
        assert!((score.weights.sentiment_weight - 0.25).abs() < 1e-9);
        assert_eq!(score.final_score, 70.0);
    }

    #[test]
    fn test_zero_weights_fall_back_to_defaults() {
        let w = BlendWeights::new(0.0, 0.0).normalized();
        assert!((w.keyword_weight - 0.8).abs() < 1e-9);
        assert!((w.sentiment_weight - 0.2).abs() < 1e-9);

        let w = BlendWeights::new(-1.0, -3.0).normalized();
        assert!((w.keyword_weight - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_single_negative_weight_counts_as_zero() {
        let w = BlendWeights::new(-0.5, 2.0).normalized();
        assert_eq!(w.keyword_weight, 0.0);
        assert_eq!(w.sentiment_weight, 1.0);
    }

    #[test]
    fn test_non_finite_weight_falls_back() {
        let w = BlendWeights::new(f64::NAN, f64::INFINITY).normalized();
        assert!((w.keyword_weight - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_final_score_rounding() {
        let score = calculate_score(33.33, 51.17, BlendWeights::default());
        assert_eq!(score.final_score, 36.9);
    }

    proptest! {
        #[test]
        fn prop_normalized_weights_sum_to_one(k in 0.0001f64..1000.0, s in 0.0001f64..1000.0) {
            let w = BlendWeights::new(k, s).normalized();
            prop_assert!((w.keyword_weight + w.sentiment_weight - 1.0).abs() < 1e-6);
            prop_assert!(w.keyword_weight >= 0.0 && w.sentiment_weight >= 0.0);
        }

        #[test]
        fn prop_final_score_is_bounded(
            ks in 0.0f64..=100.0,
            ss in 0.0f64..=100.0,
            k in -10.0f64..10.0,
            s in -10.0f64..10.0,
        ) {
            let score = calculate_score(ks, ss, BlendWeights::new(k, s));
            prop_assert!((0.0..=100.0).contains(&score.final_score));
        }
    }
}
