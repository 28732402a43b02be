//! Embedding generation service with batching and dimension checks

use std::sync::Arc;

use tracing::debug;
use tracing::info;

use super::client::EmbeddingClient;
use super::Embedder;
use crate::config::AppConfig;
use crate::errors::ExplorerError;
use crate::errors::Result;

/// Service for generating embeddings of the configured dimension
pub struct EmbeddingService {
    client: Arc<dyn Embedder>,
    dimension: usize,
    batch_size: usize,
}

impl EmbeddingService {
    /// Create a new embedding service backed by the hosted API
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = EmbeddingClient::from_config(config)?;
        info!(
            "🌐 Using {} for embeddings (model: {}, dimension: {})",
            client.provider_name(),
            config.embeddings.model,
            config.embeddings.dimension
        );
        Ok(Self::with_embedder(
            Arc::new(client),
            config.embeddings.dimension,
            config.embeddings.batch_size,
        ))
    }

    /// Create from an arbitrary provider
    pub fn with_embedder(client: Arc<dyn Embedder>, dimension: usize, batch_size: usize) -> Self {
        Self {
            client,
            dimension,
            batch_size: batch_size.max(1),
        }
    }

    /// Generate embedding for a single text
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ExplorerError::EmbeddingError("No embedding in response".to_string()))
    }

    /// Generate embeddings for multiple texts, split into provider-sized batches
    pub async fn generate_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for (batch_idx, batch) in texts.chunks(self.batch_size).enumerate() {
            debug!(
                "Embedding batch {} ({} texts) with {}",
                batch_idx + 1,
                batch.len(),
                self.client.provider_name()
            );
            let vectors = self.client.embed_batch(batch).await?;
            if vectors.len() != batch.len() {
                return Err(ExplorerError::EmbeddingError(format!(
                    "Expected {} embeddings, received {}",
                    batch.len(),
                    vectors.len()
                )));
            }
            for vector in &vectors {
                self.check_dimension(vector)?;
            }
            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() == self.dimension {
            Ok(())
        } else {
            Err(ExplorerError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            })
        }
    }
}
