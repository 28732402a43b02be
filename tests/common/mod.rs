//! Offline fixtures shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use knowledge_explorer::api::build_router;
use knowledge_explorer::api::AppState;
use knowledge_explorer::config::AppConfig;
use knowledge_explorer::config::VectorStoreProvider;
use knowledge_explorer::embeddings::Embedder;
use knowledge_explorer::llm::ChatModel;
use knowledge_explorer::llm::StreamingResponse;
use knowledge_explorer::vectorstore::MemoryStore;
use knowledge_explorer::KnowledgeExplorer;
use knowledge_explorer::ExplorerError;
use knowledge_explorer::Result;
use tempfile::TempDir;

pub const DIM: usize = 512;

/// Bag-of-words embedder over hashed buckets
pub struct WordEmbedder;

impl WordEmbedder {
    fn embed(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
                    (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
                });
            vector[(hash % DIM as u64) as usize] += 1.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for WordEmbedder {
    fn provider_name(&self) -> &str {
        "words"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::embed(t)).collect())
    }
}

/// Chat model that repeats the context documents back
pub struct ContextEchoModel;

impl ContextEchoModel {
    fn answer(prompt: &str) -> String {
        match prompt
            .split_once("=== CONTEXT DOCUMENTS ===")
            .and_then(|(_, rest)| rest.split_once("=== END OF CONTEXT ==="))
        {
            Some((context, _)) => format!("Per the documents: {}", context.trim()),
            None => "I can answer that from general knowledge.".to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for ContextEchoModel {
    fn model_name(&self) -> &str {
        "context-echo"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        Ok(Self::answer(prompt))
    }

    async fn stream(&self, prompt: &str) -> Result<StreamingResponse> {
        let tokens = Self::answer(prompt)
            .split_inclusive(' ')
            .map(ToString::to_string)
            .collect();
        Ok(StreamingResponse::from_tokens(tokens))
    }
}

/// Chat model that relays two tokens, then fails
pub struct CutOffModel;

pub const CUT_OFF_MESSAGE: &str = "upstream hung up";

#[async_trait]
impl ChatModel for CutOffModel {
    fn model_name(&self) -> &str {
        "cut-off"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(ExplorerError::LlmError(CUT_OFF_MESSAGE.to_string()))
    }

    async fn stream(&self, _prompt: &str) -> Result<StreamingResponse> {
        let items = vec![
            Ok("Partial ".to_string()),
            Ok("answer ".to_string()),
            Err(ExplorerError::LlmError(CUT_OFF_MESSAGE.to_string())),
        ];
        Ok(StreamingResponse::new(Box::pin(futures::stream::iter(items))))
    }
}

pub struct TestApp {
    pub router: Router,
    pub explorer: Arc<KnowledgeExplorer>,
    pub upload_dir: TempDir,
}

pub fn test_config(upload_dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.vector_store.provider = VectorStoreProvider::Memory;
    config.embeddings.dimension = DIM;
    config.retrieval.min_relevance_score = 0.3;
    config.ingest.upload_dir = upload_dir.path().to_string_lossy().into_owned();
    config
}

pub fn test_app() -> TestApp {
    test_app_with(Arc::new(ContextEchoModel), |_| {})
}

/// Build an app around `llm`, letting the caller adjust the config first
pub fn test_app_with(llm: Arc<dyn ChatModel>, configure: impl FnOnce(&mut AppConfig)) -> TestApp {
    let upload_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&upload_dir);
    configure(&mut config);
    let explorer = Arc::new(
        KnowledgeExplorer::with_components(
            config,
            Arc::new(WordEmbedder),
            Arc::new(MemoryStore::new(DIM)),
            llm,
        )
        .unwrap(),
    );
    TestApp {
        router: build_router(AppState::new(explorer.clone())),
        explorer,
        upload_dir,
    }
}
