use crate::error::OracleError;

pub type Embedding = Vec<f32>;

/// Sentence-embedding model. One embedding per input, in input order.
pub trait Embedder: Send + Sync {
    fn encode(&self, texts: &[String]) -> Result<Vec<Embedding>, OracleError>;

    fn encode_one(&self, text: &str) -> Result<Embedding, OracleError> {
        let mut embeddings = self.encode(&[text.to_string()])?;
        match embeddings.len() {
            1 => Ok(embeddings.remove(0)),
            actual => Err(OracleError::ShapeMismatch {
                expected: 1,
                actual,
            }),
        }
    }
}

/// Sentiment model returning a polarity in [-1, 1].
pub trait PolarityOracle: Send + Sync {
    fn polarity(&self, text: &str) -> Result<f64, OracleError>;
}
