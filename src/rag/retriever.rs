//! Similarity retrieval with a relevance threshold

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::embeddings::generator::EmbeddingService;
use crate::errors::Result;
use crate::vectorstore::ScoredMatch;
use crate::vectorstore::VectorStore;

/// A chunk that passed the relevance threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub score: f32,
    pub filename: String,
    pub chunk_id: String,
    pub text: String,
}

impl From<ScoredMatch> for RetrievedChunk {
    fn from(m: ScoredMatch) -> Self {
        Self {
            id: m.id,
            score: m.score,
            filename: m.metadata.filename,
            chunk_id: m.metadata.chunk_id,
            text: m.metadata.text,
        }
    }
}

/// Keep matches scoring at least `min_score`, in store order, up to `top_k`
pub fn filter_relevant(matches: Vec<ScoredMatch>, min_score: f32, top_k: usize) -> Vec<RetrievedChunk> {
    matches
        .into_iter()
        .filter(|m| {
            let keep = m.score >= min_score;
            if !keep {
                debug!("Skipping low-relevance result {} (score: {:.3})", m.id, m.score);
            }
            keep
        })
        .take(top_k)
        .map(RetrievedChunk::from)
        .collect()
}

pub struct Retriever {
    embeddings: Arc<EmbeddingService>,
    store: Arc<dyn VectorStore>,
    min_score: f32,
}

impl Retriever {
    pub fn new(embeddings: Arc<EmbeddingService>, store: Arc<dyn VectorStore>, min_score: f32) -> Self {
        Self {
            embeddings,
            store,
            min_score,
        }
    }

    /// Embed the question, over-fetch `2 * top_k` candidates and keep the
    /// relevant ones
    pub async fn retrieve(
        &self,
        question: &str,
        top_k: usize,
        filename: Option<&str>,
    ) -> Result<Vec<RetrievedChunk>> {
        info!(
            "🔍 Retrieving top {} chunks (min_score: {})",
            top_k, self.min_score
        );
        let vector = self.embeddings.generate(question).await?;
        let matches = self.store.query(&vector, top_k * 2, filename).await?;
        let candidates = matches.len();
        let chunks = filter_relevant(matches, self.min_score, top_k);
        info!(
            "✅ Retrieved {} relevant chunks out of {} candidates",
            chunks.len(),
            candidates
        );
        Ok(chunks)
    }
}
