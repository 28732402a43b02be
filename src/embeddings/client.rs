//! Jina embeddings API client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::Embedder;
use crate::config::AppConfig;
use crate::errors::ExplorerError;
use crate::errors::Result;
use crate::http;
use crate::retry::RetryPolicy;

const SERVICE: &str = "Jina";

/// Client for the hosted embeddings endpoint (`POST {endpoint}/embeddings`)
pub struct EmbeddingClient {
    model: String,
    endpoint: String,
    api_key: String,
    client: Client,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    /// Create a new embedding client
    pub fn new(
        model: String,
        endpoint: String,
        api_key: String,
        client: Client,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
            retry,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            config.embeddings.model.clone(),
            config.embeddings.endpoint.clone(),
            config.embeddings.api_key.clone(),
            http::build_client(config.request_timeout())?,
            RetryPolicy::from_config(&config.retry),
        ))
    }

    async fn request_once(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let api_key = http::require_key(&self.api_key, "JINA_API_KEY")?;
        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling {} embeddings API: {} items", SERVICE, texts.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&EmbeddingRequest {
                input: texts,
                model: &self.model,
            })
            .send()
            .await?;
        let response = http::check_status(SERVICE, response).await?;

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ExplorerError::EmbeddingError(format!("Failed to parse response: {e}")))?;

        let mut data = result.data;
        data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));

        if data.len() != texts.len() {
            return Err(ExplorerError::EmbeddingError(format!(
                "Expected {} embeddings, received {}",
                texts.len(),
                data.len()
            )));
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    fn provider_name(&self) -> &str {
        "jina"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.retry
            .run("Jina embeddings request", || self.request_once(texts))
            .await
    }
}
