//! Wiring of the ingestion and query services

use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::embeddings::generator::EmbeddingService;
use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::ingest::IngestionPipeline;
use crate::ingest::TextChunker;
use crate::llm::ChatModel;
use crate::llm::GroqClient;
use crate::rag::RagService;
use crate::rag::Retriever;
use crate::vectorstore;
use crate::vectorstore::IndexStats;
use crate::vectorstore::VectorStore;

/// Everything needed to ingest documents and answer questions about them
pub struct KnowledgeExplorer {
    config: Arc<AppConfig>,
    store: Arc<dyn VectorStore>,
    ingestion: Arc<IngestionPipeline>,
    rag: Arc<RagService>,
}

impl KnowledgeExplorer {
    /// Build against the hosted services named in `config`
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let embeddings = Arc::new(EmbeddingService::new(&config)?);
        let store = vectorstore::from_config(&config)?;
        let llm: Arc<dyn ChatModel> = Arc::new(GroqClient::from_config(&config)?);
        info!(
            "🚀 Knowledge explorer ready (LLM: {}, index: {})",
            llm.model_name(),
            config.vector_store.index_name
        );
        Self::assemble(config, embeddings, store, llm)
    }

    /// Build from explicit providers
    pub fn with_components(
        config: AppConfig,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let embeddings = Arc::new(EmbeddingService::with_embedder(
            embedder,
            config.embeddings.dimension,
            config.embeddings.batch_size,
        ));
        Self::assemble(config, embeddings, store, llm)
    }

    fn assemble(
        config: AppConfig,
        embeddings: Arc<EmbeddingService>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let ingestion = IngestionPipeline::new(
            TextChunker::from_config(&config.ingest)?,
            embeddings.clone(),
            store.clone(),
            config.upload_dir(),
            config.ingest.max_upload_size,
        );
        let retriever = Retriever::new(
            embeddings,
            store.clone(),
            config.retrieval.min_relevance_score,
        );
        let rag = RagService::new(&config.retrieval, retriever, llm, store.clone());

        Ok(Self {
            config: Arc::new(config),
            store,
            ingestion: Arc::new(ingestion),
            rag: Arc::new(rag),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn ingestion(&self) -> &Arc<IngestionPipeline> {
        &self.ingestion
    }

    pub fn rag(&self) -> &Arc<RagService> {
        &self.rag
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub async fn stats(&self) -> Result<IndexStats> {
        self.store.stats().await
    }

    /// Remove every chunk of one document
    pub async fn delete_document(&self, filename: &str) -> Result<usize> {
        self.store.delete_by_filename(filename).await
    }

    /// Remove every stored vector
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await?;
        info!("🗑️  Cleared all vectors from {}", self.config.vector_store.index_name);
        Ok(())
    }
}
