use rust_bert::pipelines::sentence_embeddings::{SentenceEmbeddingsBuilder, SentenceEmbeddingsModel};
use rust_bert::pipelines::sentiment::{SentimentConfig, SentimentModel, SentimentPolarity};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use super::oracle::{Embedder, Embedding, PolarityOracle};
use crate::error::OracleError;
use crate::settings::EmbeddingModel;
use crate::utils::{log_ml_error, log_ml_model_loaded, log_ml_ready, log_ml_step};

const PROBE_TEXT: &str = "Object-oriented programming groups data and behaviour into classes.";

enum MLRequest {
    Encode {
        texts: Vec<String>,
        response_tx: mpsc::Sender<Result<Vec<Embedding>, OracleError>>,
    },
    Polarity {
        text: String,
        response_tx: mpsc::Sender<Result<f64, OracleError>>,
    },
}

/// Handle to the model thread. Cloning is cheap; all clones talk to the
/// same pair of loaded models.
#[derive(Clone)]
pub struct MLHandle {
    request_tx: mpsc::Sender<MLRequest>,
}

impl MLHandle {
    /// Starts the model thread and blocks until both models are loaded.
    pub fn spawn(model: EmbeddingModel) -> Result<Self, OracleError> {
        let (request_tx, request_rx) = mpsc::channel::<MLRequest>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), OracleError>>();

        thread::Builder::new()
            .name("prism-ml".into())
            .spawn(move || match load_models(model) {
                Ok(models) => {
                    let _ = ready_tx.send(Ok(()));
                    run_ml_worker(models, request_rx);
                }
                Err(e) => {
                    log_ml_error(&format!("Worker failed: {e}"));
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| OracleError::ModelLoadFailed {
                reason: e.to_string(),
            })?;

        ready_rx
            .recv()
            .map_err(|_| OracleError::WorkerUnavailable)??;

        Ok(Self { request_tx })
    }

    /// Runs one embedding and one sentiment inference end to end.
    pub fn probe(&self) -> Result<(), OracleError> {
        self.encode_one(PROBE_TEXT)?;
        self.polarity(PROBE_TEXT)?;
        Ok(())
    }

    fn request<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<Result<T, OracleError>>) -> MLRequest,
    ) -> Result<T, OracleError> {
        let (response_tx, response_rx) = mpsc::channel();
        self.request_tx
            .send(build(response_tx))
            .map_err(|_| OracleError::WorkerUnavailable)?;
        response_rx
            .recv()
            .map_err(|_| OracleError::WorkerUnavailable)?
    }
}

impl Embedder for MLHandle {
    fn encode(&self, texts: &[String]) -> Result<Vec<Embedding>, OracleError> {
        let texts = texts.to_vec();
        self.request(|response_tx| MLRequest::Encode { texts, response_tx })
    }
}

impl PolarityOracle for MLHandle {
    fn polarity(&self, text: &str) -> Result<f64, OracleError> {
        let text = text.to_string();
        self.request(|response_tx| MLRequest::Polarity { text, response_tx })
    }
}

struct Models {
    embeddings: SentenceEmbeddingsModel,
    sentiment: SentimentModel,
}

fn load_models(model: EmbeddingModel) -> Result<Models, OracleError> {
    let load_failed = |e: rust_bert::RustBertError| OracleError::ModelLoadFailed {
        reason: e.to_string(),
    };

    log_ml_step(&format!("Loading sentence embedding model ({model})..."));
    let start = Instant::now();
    let embeddings = SentenceEmbeddingsBuilder::remote(model.model_type())
        .create_model()
        .map_err(load_failed)?;
    log_ml_model_loaded("Embedding model", start.elapsed().as_secs_f32());

    log_ml_step("Loading sentiment model...");
    let start = Instant::now();
    let sentiment = SentimentModel::new(SentimentConfig::default()).map_err(load_failed)?;
    log_ml_model_loaded("Sentiment model", start.elapsed().as_secs_f32());

    log_ml_ready();
    Ok(Models {
        embeddings,
        sentiment,
    })
}

fn run_ml_worker(models: Models, request_rx: mpsc::Receiver<MLRequest>) {
    for request in request_rx {
        match request {
            MLRequest::Encode { texts, response_tx } => {
                let result = models.embeddings.encode(&texts).map_err(OracleError::from);
                let _ = response_tx.send(result);
            }
            MLRequest::Polarity { text, response_tx } => {
                let _ = response_tx.send(predict_polarity(&models.sentiment, &text));
            }
        }
    }
}

/// Polarity as `2 * P(positive) - 1`. The classifier reports the winning
/// class and its confidence.
fn predict_polarity(model: &SentimentModel, text: &str) -> Result<f64, OracleError> {
    let predictions = model.predict([text]);
    let sentiment = predictions
        .first()
        .ok_or_else(|| OracleError::InferenceFailed {
            reason: "sentiment model returned no prediction".into(),
        })?;

    let positive_probability = match sentiment.polarity {
        SentimentPolarity::Positive => sentiment.score,
        SentimentPolarity::Negative => 1.0 - sentiment.score,
    };
    Ok(positive_to_polarity(positive_probability))
}

fn positive_to_polarity(probability: f64) -> f64 {
    (2.0 * probability - 1.0).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_probability_mapping() {
        assert_eq!(positive_to_polarity(1.0), 1.0);
        assert_eq!(positive_to_polarity(0.5), 0.0);
        assert_eq!(positive_to_polarity(0.0), -1.0);
        assert!((positive_to_polarity(0.75) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_closed_worker_is_reported() {
        let (request_tx, request_rx) = mpsc::channel::<MLRequest>();
        drop(request_rx);
        let handle = MLHandle { request_tx };
        assert!(matches!(
            handle.encode(&["x".to_string()]),
            Err(OracleError::WorkerUnavailable)
        ));
        assert!(matches!(
            handle.polarity("x"),
            Err(OracleError::WorkerUnavailable)
        ));
    }

    #[test]
    fn test_worker_dropping_reply_is_reported() {
        let (request_tx, request_rx) = mpsc::channel::<MLRequest>();
        let worker = thread::spawn(move || {
            // answer nothing, drop every reply sender
            for request in request_rx {
                drop(request);
            }
        });
        let handle = MLHandle { request_tx };
        assert!(matches!(
            handle.polarity("x"),
            Err(OracleError::WorkerUnavailable)
        ));
        drop(handle);
        worker.join().unwrap();
    }
}
