//! Deterministic stand-ins for the embedding and sentiment models.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::oracle::{Embedder, Embedding, PolarityOracle};
use crate::error::OracleError;

/// Embeds text as a bag of concepts: every vocabulary word whose stem
/// appears in the text sets its own axis. Unknown text lands on a shared
/// "other" axis, and the empty string maps to the zero vector.
pub struct ConceptEmbedder {
    vocabulary: Vec<&'static str>,
    calls: AtomicUsize,
}

impl ConceptEmbedder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn embed(&self, text: &str) -> Embedding {
        let lower = text.to_lowercase();
        let mut vector = vec![0.0_f32; self.vocabulary.len() + 1];
        let mut any = false;
        for (i, word) in self.vocabulary.iter().enumerate() {
            if lower.contains(word) {
                vector[i] = 1.0;
                any = true;
            }
        }
        if !any && !lower.trim().is_empty() {
            vector[self.vocabulary.len()] = 1.0;
        }
        vector
    }
}

impl Embedder for ConceptEmbedder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Embedding>, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}

/// Returns fixed vectors per text; anything unknown is an error.
pub struct TableEmbedder {
    table: HashMap<String, Embedding>,
}

impl TableEmbedder {
    pub fn new(entries: &[(&str, Embedding)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(text, v)| (text.to_string(), v.clone()))
                .collect(),
        }
    }
}

impl Embedder for TableEmbedder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Embedding>, OracleError> {
        texts
            .iter()
            .map(|t| {
                self.table
                    .get(t)
                    .cloned()
                    .ok_or_else(|| OracleError::InferenceFailed {
                        reason: format!("no embedding for '{t}'"),
                    })
            })
            .collect()
    }
}

pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn encode(&self, _texts: &[String]) -> Result<Vec<Embedding>, OracleError> {
        Err(OracleError::WorkerUnavailable)
    }
}

/// Returns one embedding fewer than requested.
pub struct TruncatingEmbedder;

impl Embedder for TruncatingEmbedder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Embedding>, OracleError> {
        Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0]).collect())
    }
}

pub struct FixedPolarity(pub f64);

impl PolarityOracle for FixedPolarity {
    fn polarity(&self, _text: &str) -> Result<f64, OracleError> {
        Ok(self.0)
    }
}

pub struct FailingPolarity;

impl PolarityOracle for FailingPolarity {
    fn polarity(&self, _text: &str) -> Result<f64, OracleError> {
        Err(OracleError::InferenceFailed {
            reason: "sentiment model crashed".into(),
        })
    }
}

pub struct PanickingPolarity;

impl PolarityOracle for PanickingPolarity {
    fn polarity(&self, _text: &str) -> Result<f64, OracleError> {
        panic!("sentiment model panicked")
    }
}
