//! Learned reranking
//!
//! The model is loaded once at startup, read-only afterwards, and shared
//! across concurrent retrieval calls behind an `Arc`. Scoring is pure
//! in-memory math over the fixed feature schema.

mod features;
mod registry;

pub use features::{extract, FeatureVector, FEATURE_DIM};
pub use registry::{load_reranker, ModelRegistryClient};

use crate::error::{FrontdeskError, Result};

/// A trained scoring function over (query, candidate) feature vectors
pub trait RerankModel: Send + Sync {
    /// Score a batch; one scalar per input row, higher is more relevant
    fn score(&self, batch: &[FeatureVector]) -> Result<Vec<f32>>;

    /// Registry version this model was loaded from
    fn version(&self) -> &str;
}

/// Linear scorer materialized from a registry artifact
pub struct LinearRerankModel {
    version: String,
    weights: FeatureVector,
    bias: f32,
}

impl LinearRerankModel {
    pub fn new(version: String, weights: FeatureVector, bias: f32) -> Self {
        Self {
            version,
            weights,
            bias,
        }
    }
}

impl RerankModel for LinearRerankModel {
    fn score(&self, batch: &[FeatureVector]) -> Result<Vec<f32>> {
        batch
            .iter()
            .map(|row| {
                let score = row
                    .iter()
                    .zip(self.weights.iter())
                    .map(|(x, w)| x * w)
                    .sum::<f32>()
                    + self.bias;
                if score.is_finite() {
                    Ok(score)
                } else {
                    Err(FrontdeskError::ModelUnavailable(
                        "non-finite score from model".to_string(),
                    ))
                }
            })
            .collect()
    }

    fn version(&self) -> &str {
        &self.version
    }
}
