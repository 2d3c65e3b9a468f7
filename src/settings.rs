use rust_bert::pipelines::sentence_embeddings::SentenceEmbeddingsModelType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use strum::Display;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

pub const SETTINGS_PATH_ENV: &str = "PRISM_SETTINGS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub scoring: Scoring,
    pub cache: Cache,
    pub ml: Ml,
    pub service: Service,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoring {
    /// Minimum cosine similarity for a keyword to count as covered.
    pub match_threshold: f64,
    pub weights: ScoringWeights,
    pub sentiment: SentimentThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub keyword: f64,
    pub sentiment: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentThresholds {
    pub positive_min: f64,
    pub neutral_min: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cache {
    /// Number of distinct keyword sets kept; 0 disables caching.
    pub capacity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ml {
    pub embedding_model: EmbeddingModel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub max_payload_bytes: usize,
    pub max_in_flight: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum EmbeddingModel {
    #[strum(to_string = "all-MiniLM-L6-v2")]
    AllMiniLmL6V2,
    #[strum(to_string = "all-MiniLM-L12-v2")]
    AllMiniLmL12V2,
    #[strum(to_string = "all-distilroberta-v1")]
    AllDistilrobertaV1,
    #[strum(to_string = "paraphrase-albert-small-v2")]
    ParaphraseAlbertSmallV2,
}

impl EmbeddingModel {
    pub fn model_type(self) -> SentenceEmbeddingsModelType {
        match self {
            Self::AllMiniLmL6V2 => SentenceEmbeddingsModelType::AllMiniLmL6V2,
            Self::AllMiniLmL12V2 => SentenceEmbeddingsModelType::AllMiniLmL12V2,
            Self::AllDistilrobertaV1 => SentenceEmbeddingsModelType::AllDistilrobertaV1,
            Self::ParaphraseAlbertSmallV2 => SentenceEmbeddingsModelType::ParaphraseAlbertSmallV2,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scoring: Scoring {
                match_threshold: 0.7,
                weights: ScoringWeights {
                    keyword: 0.8,
                    sentiment: 0.2,
                },
                sentiment: SentimentThresholds {
                    positive_min: 65.0,
                    neutral_min: 45.0,
                },
            },
            cache: Cache { capacity: 512 },
            ml: Ml {
                embedding_model: EmbeddingModel::AllMiniLmL6V2,
            },
            service: Service {
                max_payload_bytes: 1024 * 1024,
                max_in_flight: 8,
            },
        }
    }
}

impl Settings {
    pub fn load() -> &'static Settings {
        SETTINGS.get_or_init(Self::load_from_files)
    }

    fn load_from_files() -> Settings {
        let default_path = Path::new("settings.default.ron");
        let override_path = std::env::var_os(SETTINGS_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("settings.ron"));

        let mut settings = Self::read(default_path).unwrap_or_default();

        if let Some(overrides) = Self::read(&override_path) {
            settings = overrides;
        }

        settings
    }

    fn read(path: &Path) -> Option<Settings> {
        if !path.exists() {
            return None;
        }
        let content = fs::read_to_string(path).ok()?;
        match ron::from_str::<Settings>(&content) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
                None
            }
        }
    }
}

pub fn settings() -> &'static Settings {
    Settings::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.scoring.match_threshold, 0.7);
        assert_eq!(s.scoring.weights.keyword, 0.8);
        assert_eq!(s.scoring.weights.sentiment, 0.2);
        assert_eq!(s.scoring.sentiment.positive_min, 65.0);
        assert_eq!(s.scoring.sentiment.neutral_min, 45.0);
    }

    #[test]
    fn test_ron_roundtrip_of_defaults() {
        let text = ron::to_string(&Settings::default()).unwrap();
        let parsed: Settings = ron::from_str(&text).unwrap();
        assert_eq!(parsed.cache.capacity, 512);
        assert_eq!(parsed.ml.embedding_model, EmbeddingModel::AllMiniLmL6V2);
    }

    #[test]
    fn test_bundled_default_file_parses() {
        let content = include_str!("../settings.default.ron");
        let parsed: Settings = ron::from_str(content).unwrap();
        assert_eq!(parsed.scoring.match_threshold, 0.7);
        assert_eq!(parsed.service.max_in_flight, 8);
    }

    #[test]
    fn test_model_names() {
        assert_eq!(EmbeddingModel::AllMiniLmL6V2.to_string(), "all-MiniLM-L6-v2");
        assert!(matches!(
            EmbeddingModel::AllMiniLmL12V2.model_type(),
            SentenceEmbeddingsModelType::AllMiniLmL12V2
        ));
    }
}
