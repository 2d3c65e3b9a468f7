pub mod cache;
mod models;
pub mod oracle;
pub mod score;
pub mod semantic;
pub mod sentiment;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{KeywordCache, LruKeywordCache, NoCache};
pub use models::MLHandle;
pub use oracle::{Embedder, Embedding, PolarityOracle};
pub use score::{calculate_score, BlendWeights, ScoreBreakdown};
pub use semantic::{cosine_similarity, KeywordScore, KeywordScorer, DEFAULT_MATCH_THRESHOLD};
pub use sentiment::{polarity_to_score, SentimentScore, SentimentScorer};

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
