//! Pinecone REST client
//!
//! Control-plane calls (describe/create index) go to `control_plane_url`;
//! data-plane calls go to the index host returned by the control plane, which
//! is resolved once and cached.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::document_id_prefix;
use super::ChunkMetadata;
use super::IndexStats;
use super::NamespaceStats;
use super::ScoredMatch;
use super::VectorRecord;
use super::VectorStore;
use crate::config::AppConfig;
use crate::config::VectorStoreConfig;
use crate::errors::ExplorerError;
use crate::errors::Result;
use crate::http;
use crate::retry::RetryPolicy;

const SERVICE: &str = "Pinecone";
const API_VERSION: &str = "2024-07";
const DELETE_BATCH_SIZE: usize = 1000;
const READY_POLL_ATTEMPTS: u32 = 60;
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct PineconeStore {
    config: VectorStoreConfig,
    dimension: usize,
    client: Client,
    retry: RetryPolicy,
    host: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    dimension: usize,
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a ChunkMetadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Option<ChunkMetadata>,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    vectors: Vec<ListedVector>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct ListedVector {
    id: String,
}

#[derive(Deserialize)]
struct Pagination {
    next: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    namespaces: BTreeMap<String, NamespaceCount>,
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    total_vector_count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceCount {
    #[serde(default)]
    vector_count: u64,
}

impl PineconeStore {
    pub fn new(config: VectorStoreConfig, dimension: usize, client: Client, retry: RetryPolicy) -> Self {
        Self {
            config,
            dimension,
            client,
            retry,
            host: OnceCell::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        if config.vector_store.api_key.trim().is_empty() {
            warn!("⚠️  Pinecone API key not found. Vector store calls will fail.");
        }
        Ok(Self::new(
            config.vector_store.clone(),
            config.embeddings.dimension,
            http::build_client(config.request_timeout())?,
            RetryPolicy::from_config(&config.retry),
        ))
    }

    fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let key = http::require_key(&self.config.api_key, "PINECONE_API_KEY")?;
        Ok(builder
            .header("Api-Key", key)
            .header("X-Pinecone-API-Version", API_VERSION))
    }

    fn control_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.control_plane_url.trim_end_matches('/'),
            path
        )
    }

    async fn data_url(&self, path: &str) -> Result<String> {
        let host = self.host().await?;
        Ok(format!("{}/{}", host.trim_end_matches('/'), path))
    }

    /// Data-plane base URL, resolving (and if needed creating) the index once
    async fn host(&self) -> Result<&String> {
        self.host.get_or_try_init(|| self.connect()).await
    }

    async fn describe_index(&self) -> Result<Option<IndexDescription>> {
        let url = self.control_url(&format!("indexes/{}", self.config.index_name));
        self.retry
            .run("Pinecone describe index", || async {
                let response = self.authed(self.client.get(&url))?.send().await?;
                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                let response = http::check_status(SERVICE, response).await?;
                Ok(Some(response.json::<IndexDescription>().await?))
            })
            .await
    }

    async fn create_index(&self) -> Result<()> {
        let url = self.control_url("indexes");
        let body = json!({
            "name": self.config.index_name,
            "dimension": self.dimension,
            "metric": self.config.metric,
            "spec": {
                "serverless": {
                    "cloud": self.config.cloud,
                    "region": self.config.region,
                }
            }
        });
        self.retry
            .run("Pinecone create index", || async {
                let response = self.authed(self.client.post(&url))?.json(&body).send().await?;
                http::check_status(SERVICE, response).await?;
                Ok(())
            })
            .await
    }

    async fn connect(&self) -> Result<String> {
        let mut description = match self.describe_index().await? {
            Some(description) => {
                info!("📌 Connecting to existing index: {}", self.config.index_name);
                description
            }
            None => {
                info!("Creating new Pinecone index: {}", self.config.index_name);
                self.create_index().await?;
                self.wait_until_ready().await?
            }
        };

        if description.dimension != self.dimension {
            return Err(ExplorerError::DimensionMismatch {
                expected: self.dimension,
                actual: description.dimension,
            });
        }

        if !description.status.ready {
            description = self.wait_until_ready().await?;
        }

        let host = if description.host.starts_with("http://")
            || description.host.starts_with("https://")
        {
            description.host
        } else {
            format!("https://{}", description.host)
        };
        info!("✅ Index '{}' ready at {}", self.config.index_name, host);
        Ok(host)
    }

    async fn wait_until_ready(&self) -> Result<IndexDescription> {
        for attempt in 1..=READY_POLL_ATTEMPTS {
            if let Some(description) = self.describe_index().await? {
                if description.status.ready {
                    return Ok(description);
                }
                debug!(
                    "Index {} not ready yet (state: {}, poll {}/{})",
                    self.config.index_name, description.status.state, attempt, READY_POLL_ATTEMPTS
                );
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
        Err(ExplorerError::VectorStoreError(format!(
            "Index {} did not become ready",
            self.config.index_name
        )))
    }

    async fn post_data<T: DeserializeOwned>(&self, label: &str, path: &str, body: &Value) -> Result<T> {
        let url = self.data_url(path).await?;
        self.retry
            .run(label, || async {
                let response = self.authed(self.client.post(&url))?.json(body).send().await?;
                let response = http::check_status(SERVICE, response).await?;
                Ok(response.json::<T>().await?)
            })
            .await
    }

    async fn list_ids(&self, prefix: &str) -> Result<Vec<String>> {
        let url = self.data_url("vectors/list").await?;
        let mut ids = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut query = vec![
                ("prefix", prefix.to_string()),
                ("namespace", self.config.namespace.clone()),
            ];
            if let Some(t) = &token {
                query.push(("paginationToken", t.clone()));
            }

            let page: ListResponse = self
                .retry
                .run("Pinecone list vectors", || async {
                    let response = self
                        .authed(self.client.get(&url))?
                        .query(&query)
                        .send()
                        .await?;
                    let response = http::check_status(SERVICE, response).await?;
                    Ok(response.json::<ListResponse>().await?)
                })
                .await?;

            ids.extend(page.vectors.into_iter().map(|v| v.id));
            token = page.pagination.and_then(|p| p.next);
            if token.is_none() {
                break;
            }
        }

        Ok(ids)
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn ensure_index(&self) -> Result<()> {
        self.host().await.map(|_| ())
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize> {
        for record in &records {
            if record.values.len() != self.dimension {
                return Err(ExplorerError::DimensionMismatch {
                    expected: self.dimension,
                    actual: record.values.len(),
                });
            }
        }

        let mut total = 0;
        for (batch_idx, batch) in records.chunks(self.config.upsert_batch_size.max(1)).enumerate() {
            let vectors: Vec<UpsertVector<'_>> = batch
                .iter()
                .map(|r| UpsertVector {
                    id: &r.id,
                    values: &r.values,
                    metadata: &r.metadata,
                })
                .collect();
            let body = json!({
                "vectors": vectors,
                "namespace": self.config.namespace,
            });
            let response: UpsertResponse = self
                .post_data("Pinecone upsert", "vectors/upsert", &body)
                .await?;
            debug!(
                "Upserted batch {}: {} vectors",
                batch_idx + 1,
                response.upserted_count
            );
            total += response.upserted_count;
        }

        info!("✅ Upserted {} vectors to Pinecone", total);
        Ok(total)
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filename: Option<&str>,
    ) -> Result<Vec<ScoredMatch>> {
        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
            "namespace": self.config.namespace,
        });
        if let Some(filename) = filename {
            body["filter"] = json!({ "filename": { "$eq": filename } });
        }

        let response: QueryResponse = self.post_data("Pinecone query", "query", &body).await?;
        let matches: Vec<ScoredMatch> = response
            .matches
            .into_iter()
            .map(|m| ScoredMatch {
                metadata: m.metadata.unwrap_or_else(|| ChunkMetadata {
                    filename: "unknown".to_string(),
                    chunk_id: m.id.clone(),
                    chunk_index: 0,
                    total_chunks: 0,
                    text: String::new(),
                    uploaded_at: None,
                }),
                id: m.id,
                score: m.score,
            })
            .collect();

        info!("🔍 Query returned {} results", matches.len());
        Ok(matches)
    }

    async fn delete_by_filename(&self, filename: &str) -> Result<usize> {
        let ids = self.list_ids(&document_id_prefix(filename)).await?;
        for batch in ids.chunks(DELETE_BATCH_SIZE) {
            let body = json!({
                "ids": batch,
                "namespace": self.config.namespace,
            });
            let _: Value = self
                .post_data("Pinecone delete", "vectors/delete", &body)
                .await?;
        }
        info!("🗑️  Deleted {} vectors for {}", ids.len(), filename);
        Ok(ids.len())
    }

    async fn clear(&self) -> Result<()> {
        let body = json!({
            "deleteAll": true,
            "namespace": self.config.namespace,
        });
        match self
            .post_data::<Value>("Pinecone delete all", "vectors/delete", &body)
            .await
        {
            Ok(_) => Ok(()),
            // An empty serverless namespace does not exist yet
            Err(ExplorerError::Upstream { status: 404, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn stats(&self) -> Result<IndexStats> {
        let response: StatsResponse = self
            .post_data("Pinecone describe stats", "describe_index_stats", &json!({}))
            .await?;
        Ok(IndexStats {
            total_vectors: response.total_vector_count,
            dimension: response.dimension,
            namespaces: response
                .namespaces
                .into_iter()
                .map(|(name, ns)| {
                    (
                        name,
                        NamespaceStats {
                            vector_count: ns.vector_count,
                        },
                    )
                })
                .collect(),
        })
    }
}
