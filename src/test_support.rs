//! Offline stand-ins for the hosted embedding and chat APIs

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;

use crate::embeddings::Embedder;
use crate::errors::ExplorerError;
use crate::errors::Result;
use crate::llm::ChatModel;
use crate::llm::StreamingResponse;

/// Bag-of-words embedder: each lowercased word adds 1 to a hashed bucket,
/// and the vector is L2-normalised
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = fnv1a(&word.to_lowercase()) as usize % self.dimension;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn provider_name(&self) -> &str {
        "hash"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}

/// Chat model that answers with the context it was given
#[derive(Default)]
pub struct EchoChatModel {
    pub calls: AtomicUsize,
}

impl EchoChatModel {
    fn answer(prompt: &str) -> String {
        let context = prompt
            .split_once("=== CONTEXT DOCUMENTS ===")
            .and_then(|(_, rest)| rest.split_once("=== END OF CONTEXT ==="))
            .map(|(context, _)| context.trim());
        match context {
            Some(context) => format!("From the documents: {context}"),
            None => {
                let question = prompt
                    .lines()
                    .find_map(|l| l.strip_prefix("Question: "))
                    .unwrap_or_default();
                format!("General answer to: {question}")
            }
        }
    }
}

#[async_trait]
impl ChatModel for EchoChatModel {
    fn model_name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::answer(prompt))
    }

    async fn stream(&self, prompt: &str) -> Result<StreamingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tokens = Self::answer(prompt)
            .split_inclusive(' ')
            .map(ToString::to_string)
            .collect();
        Ok(StreamingResponse::from_tokens(tokens))
    }
}

/// Chat model whose stream breaks off after relaying `tokens`
pub struct BrokenStreamModel {
    pub tokens: Vec<String>,
}

impl BrokenStreamModel {
    pub const FAILURE: &'static str = "connection closed mid-stream";
}

#[async_trait]
impl ChatModel for BrokenStreamModel {
    fn model_name(&self) -> &str {
        "broken"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(ExplorerError::LlmError(Self::FAILURE.to_string()))
    }

    async fn stream(&self, _prompt: &str) -> Result<StreamingResponse> {
        let items: Vec<Result<String>> = self
            .tokens
            .iter()
            .cloned()
            .map(Ok)
            .chain(std::iter::once(Err(ExplorerError::LlmError(
                Self::FAILURE.to_string(),
            ))))
            .collect();
        Ok(StreamingResponse::new(Box::pin(futures::stream::iter(items))))
    }
}
