//! Vector storage for document chunks
//!
//! [`VectorStore`] is implemented by [`PineconeStore`] (hosted, the default)
//! and [`MemoryStore`] (in-process, for offline runs and tests). Records
//! belonging to one document share an id prefix derived from the filename, so
//! a document can be removed without a metadata filter.

pub mod memory;
pub mod pinecone;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
pub use memory::MemoryStore;
pub use pinecone::PineconeStore;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::config::AppConfig;
use crate::config::VectorStoreProvider;
use crate::errors::Result;

/// Metadata stored next to every chunk vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default = "unknown_filename")]
    pub filename: String,
    #[serde(default)]
    pub chunk_id: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub chunk_index: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_chunks: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

fn unknown_filename() -> String {
    "unknown".to_string()
}

/// Pinecone returns metadata numbers as floats (`3.0`)
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Int(u64),
        Float(f64),
    }

    Ok(match Count::deserialize(deserializer)? {
        Count::Int(n) => n,
        Count::Float(f) => f.max(0.0) as u64,
    })
}

/// A vector with its id and metadata, ready to upsert
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A nearest-neighbour match
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    pub id: String,
    pub score: f32,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceStats {
    pub vector_count: u64,
}

/// Index statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_vectors: u64,
    pub dimension: usize,
    pub namespaces: BTreeMap<String, NamespaceStats>,
}

/// Storage and similarity search over chunk vectors
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create or connect to the index, checking its dimension
    async fn ensure_index(&self) -> Result<()>;

    /// Insert or replace records; returns how many were written
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize>;

    /// Return up to `top_k` matches by descending similarity
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filename: Option<&str>,
    ) -> Result<Vec<ScoredMatch>>;

    /// Remove every chunk of one document; returns how many were removed
    async fn delete_by_filename(&self, filename: &str) -> Result<usize>;

    /// Remove every vector in the index
    async fn clear(&self) -> Result<()>;

    async fn stats(&self) -> Result<IndexStats>;
}

/// Build the store selected by configuration
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn VectorStore>> {
    Ok(match config.vector_store.provider {
        VectorStoreProvider::Pinecone => Arc::new(PineconeStore::from_config(config)?),
        VectorStoreProvider::Memory => Arc::new(MemoryStore::new(config.embeddings.dimension)),
    })
}

/// Id prefix shared by every chunk of `filename`
///
/// Sixteen hex characters of the filename's SHA-256 followed by `-`. The fixed
/// width keeps one document's prefix from matching another's ids.
pub fn document_id_prefix(filename: &str) -> String {
    let digest = Sha256::digest(filename.as_bytes());
    format!("{}-", &hex::encode(digest)[..16])
}

/// Record id for one chunk of `filename`
pub fn chunk_record_id(filename: &str, chunk_index: usize) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}{}-{}",
        document_id_prefix(filename),
        chunk_index,
        &suffix[..8]
    )
}
