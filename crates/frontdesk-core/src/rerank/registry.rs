//! Model registry client
//!
//! Resolves the latest version of a registered reranker at a named stage,
//! once at process start. A missing or unloadable version is not fatal:
//! the retrieval pipeline runs in vector-score fallback until a restart
//! finds one. No polling in the hot path.

use crate::config::RerankerConfig;
use crate::error::{FrontdeskError, Result};
use crate::rerank::{LinearRerankModel, RerankModel, FEATURE_DIM};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Deserialize)]
struct ModelVersionResponse {
    version: String,
    artifact: LinearArtifact,
}

/// Registry artifact: a linear scorer over the fixed feature schema
#[derive(Deserialize)]
struct LinearArtifact {
    weights: Vec<f32>,
    #[serde(default)]
    bias: f32,
}

/// Fetch and materialize the staged reranker model
pub struct ModelRegistryClient {
    http_client: reqwest::Client,
    config: RerankerConfig,
}

impl ModelRegistryClient {
    pub fn new(config: RerankerConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(FrontdeskError::Http)?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// Resolve the latest version at the configured stage and load it
    pub async fn load_latest(&self) -> Result<LinearRerankModel> {
        let registry_url = self.config.registry_url.as_deref().ok_or_else(|| {
            FrontdeskError::ModelUnavailable("no registry URL configured".to_string())
        })?;

        let url = format!(
            "{}/api/models/{}/stages/{}/latest",
            registry_url, self.config.model_name, self.config.stage
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| FrontdeskError::ModelUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FrontdeskError::ModelUnavailable(format!(
                "no loadable version of '{}' at stage '{}' (HTTP {})",
                self.config.model_name,
                self.config.stage,
                response.status()
            )));
        }

        let parsed: ModelVersionResponse = response
            .json()
            .await
            .map_err(|e| FrontdeskError::ModelUnavailable(e.to_string()))?;

        if parsed.artifact.weights.len() != FEATURE_DIM {
            return Err(FrontdeskError::ModelUnavailable(format!(
                "artifact schema mismatch: expected {} weights, got {}",
                FEATURE_DIM,
                parsed.artifact.weights.len()
            )));
        }

        let mut weights = [0.0f32; FEATURE_DIM];
        weights.copy_from_slice(&parsed.artifact.weights);

        Ok(LinearRerankModel::new(
            parsed.version,
            weights,
            parsed.artifact.bias,
        ))
    }
}

/// Startup helper: resolve the reranker or settle into fallback mode.
/// Mirrors the deployment contract: absence of a loadable version must
/// never prevent the process from serving.
pub async fn load_reranker(config: RerankerConfig) -> Option<Arc<dyn RerankModel>> {
    let client = match ModelRegistryClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("Could not build registry client: {}", e);
            return None;
        }
    };

    match client.load_latest().await {
        Ok(model) => {
            tracing::info!("Loaded reranker version {}", model.version());
            Some(Arc::new(model))
        }
        Err(e) => {
            tracing::warn!("{}; retrieval will order by vector score", e);
            None
        }
    }
}
