//! LLM access for answer generation

pub mod client;
pub mod prompts;
pub mod streaming;

use async_trait::async_trait;
pub use client::GroqClient;
pub use prompts::build_document_prompt;
pub use prompts::build_general_prompt;
pub use prompts::ContextBlock;
pub use streaming::StreamingResponse;

use crate::errors::Result;

/// A chat model that answers a single user prompt
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Generate the whole answer in one call
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Generate the answer as a stream of tokens
    async fn stream(&self, prompt: &str) -> Result<StreamingResponse>;
}
