//! In-process vector store using cosine similarity

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use tracing::info;

use super::IndexStats;
use super::NamespaceStats;
use super::ScoredMatch;
use super::VectorRecord;
use super::VectorStore;
use crate::errors::ExplorerError;
use crate::errors::Result;

/// Keeps every record in a concurrent map; nothing is persisted
pub struct MemoryStore {
    dimension: usize,
    records: DashMap<String, VectorRecord>,
}

impl MemoryStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn check_dimension(&self, len: usize) -> Result<()> {
        if len == self.dimension {
            Ok(())
        } else {
            Err(ExplorerError::DimensionMismatch {
                expected: self.dimension,
                actual: len,
            })
        }
    }
}

/// Cosine similarity; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn ensure_index(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize> {
        for record in &records {
            self.check_dimension(record.values.len())?;
        }
        let count = records.len();
        for record in records {
            self.records.insert(record.id.clone(), record);
        }
        info!("✅ Upserted {} vectors to memory store", count);
        Ok(count)
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filename: Option<&str>,
    ) -> Result<Vec<ScoredMatch>> {
        self.check_dimension(vector.len())?;

        let mut matches: Vec<ScoredMatch> = self
            .records
            .iter()
            .filter(|entry| filename.map_or(true, |f| entry.metadata.filename == f))
            .map(|entry| ScoredMatch {
                id: entry.id.clone(),
                score: cosine_similarity(vector, &entry.values),
                metadata: entry.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(top_k);
        debug!("🔍 Memory query returned {} results", matches.len());
        Ok(matches)
    }

    async fn delete_by_filename(&self, filename: &str) -> Result<usize> {
        let before = self.records.len();
        self.records
            .retain(|_, record| record.metadata.filename != filename);
        let removed = before - self.records.len();
        info!("🗑️  Deleted {} vectors for {}", removed, filename);
        Ok(removed)
    }

    async fn clear(&self) -> Result<()> {
        self.records.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let total = self.records.len() as u64;
        let mut namespaces = BTreeMap::new();
        if total > 0 {
            namespaces.insert(
                String::new(),
                NamespaceStats {
                    vector_count: total,
                },
            );
        }
        Ok(IndexStats {
            total_vectors: total,
            dimension: self.dimension,
            namespaces,
        })
    }
}
