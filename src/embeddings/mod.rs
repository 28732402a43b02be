//! Embeddings generation module
//!
//! Text is embedded through a hosted API (Jina by default). The
//! [`EmbeddingService`] batches requests and enforces the configured vector
//! dimension; [`Embedder`] is the seam a different provider plugs into.
//!
//! # Examples
//!
//! ```rust,no_run
//! use knowledge_explorer::config::AppConfig;
//! use knowledge_explorer::embeddings::EmbeddingService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.generate("Hello, world!").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod generator;

use async_trait::async_trait;
pub use client::EmbeddingClient;
pub use generator::EmbeddingService;

use crate::errors::Result;

/// A provider that turns texts into vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Short provider name for logs
    fn provider_name(&self) -> &str;

    /// Embed `texts`, returning one vector per input in the same order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
