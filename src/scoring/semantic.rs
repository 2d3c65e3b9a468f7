use simsimd::SpatialSimilarity;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::cache::KeywordCache;
use super::oracle::Embedder;
use super::round_to;
use crate::error::ScoringError;
use crate::types::ExpectedKeyword;

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordScore {
    pub score: f64,
    /// Matched keywords in input order. Duplicated entries appear once per entry.
    pub matched: Vec<String>,
    pub detail: BTreeMap<String, f64>,
}

pub struct KeywordScorer {
    embedder: Arc<dyn Embedder>,
    cache: Arc<dyn KeywordCache>,
    threshold: f64,
}

impl KeywordScorer {
    pub fn new(embedder: Arc<dyn Embedder>, cache: Arc<dyn KeywordCache>, threshold: f64) -> Self {
        Self {
            embedder,
            cache,
            threshold,
        }
    }

    /// Scores how much of the weighted keyword list the response covers.
    /// Never fails: any error degrades to the empty score.
    pub fn score(&self, response: &str, keywords: &[ExpectedKeyword]) -> KeywordScore {
        match self.try_score(response, keywords) {
            Ok(score) => score,
            Err(e) => {
                tracing::warn!(error = %e, "keyword scoring degraded to empty result");
                KeywordScore::default()
            }
        }
    }

    pub fn try_score(
        &self,
        response: &str,
        keywords: &[ExpectedKeyword],
    ) -> Result<KeywordScore, ScoringError> {
        if let Some(bad) = keywords
            .iter()
            .find(|k| !k.weight.is_finite() || k.weight < 0.0)
        {
            return Err(ScoringError::MalformedWeight {
                keyword: bad.keyword.clone(),
                weight: bad.weight,
            });
        }

        let total_weight: f64 = keywords.iter().map(|k| k.weight).sum();
        if keywords.is_empty() || total_weight <= 0.0 {
            return Ok(KeywordScore::default());
        }

        let response_embedding = self.embedder.encode_one(response)?;
        let texts: Vec<String> = keywords.iter().map(|k| k.keyword.clone()).collect();
        let keyword_embeddings = self
            .cache
            .get_or_compute(&texts, &|keys: &[String]| self.embedder.encode(keys))?;

        let mut matched = Vec::new();
        let mut detail = BTreeMap::new();
        let mut matched_weight = 0.0;

        for (keyword, embedding) in keywords.iter().zip(keyword_embeddings.iter()) {
            let similarity = cosine_similarity(&response_embedding, embedding);
            detail.insert(keyword.keyword.clone(), round_to(similarity, 3));

            if similarity >= self.threshold {
                matched_weight += keyword.weight;
                matched.push(keyword.keyword.clone());
            }
        }

        Ok(KeywordScore {
            score: round_to((100.0 * matched_weight / total_weight).clamp(0.0, 100.0), 2),
            matched,
            detail,
        })
    }
}

/// Cosine similarity in [-1, 1]. Zero-length or zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || is_zero(a) || is_zero(b) {
        return 0.0;
    }
    f32::cosine(a, b)
        .map(|distance| (1.0 - distance).clamp(-1.0, 1.0))
        .unwrap_or(0.0)
}

fn is_zero(v: &[f32]) -> bool {
    v.iter().all(|x| *x == 0.0)
}
