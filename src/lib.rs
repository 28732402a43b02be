//! Knowledge Explorer: retrieval-augmented question answering over uploaded
//! PDF and TXT documents.
//!
//! Documents are chunked, embedded through a hosted embedding API and stored
//! in a vector index. Questions are routed by keyword, answered from the most
//! relevant chunks when any clear the relevance threshold, and generated by a
//! hosted chat model, either in one response or as a token stream.
//!
//! ```rust,no_run
//! use knowledge_explorer::config::AppConfig;
//! use knowledge_explorer::rag::RagQuery;
//! use knowledge_explorer::KnowledgeExplorer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let explorer = KnowledgeExplorer::from_config(AppConfig::load()?)?;
//!     let response = explorer.rag().query(RagQuery::new("Summarize the report")).await?;
//!     println!("{}", response.answer);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod explorer;
pub mod http;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod retry;
pub mod vectorstore;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
pub(crate) mod test_support;

pub use config::AppConfig;
pub use errors::*;
pub use explorer::KnowledgeExplorer;
