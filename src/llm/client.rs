//! Groq chat completions client (OpenAI-compatible API)

use async_trait::async_trait;
use reqwest::Client;
use reqwest::Response;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use super::streaming::token_stream;
use super::streaming::StreamingResponse;
use super::ChatModel;
use crate::config::AppConfig;
use crate::config::LlmConfig;
use crate::errors::ExplorerError;
use crate::errors::Result;
use crate::http;
use crate::retry::RetryPolicy;

const SERVICE: &str = "Groq";

pub struct GroqClient {
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: Client,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GroqClient {
    pub fn new(config: &LlmConfig, client: Client, retry: RetryPolicy) -> Self {
        Self {
            endpoint: config.llm_endpoint.trim_end_matches('/').to_string(),
            api_key: config.llm_key.clone(),
            model: config.llm_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
            retry,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            &config.llm,
            http::build_client(config.request_timeout())?,
            RetryPolicy::from_config(&config.retry),
        ))
    }

    async fn send(&self, prompt: &str, stream: bool) -> Result<Response> {
        let api_key = http::require_key(&self.api_key, "GROQ_API_KEY")?;
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream,
        };
        debug!(
            "Sending {} request to {} (model: {}, prompt: {} chars)",
            if stream { "streaming" } else { "completion" },
            SERVICE,
            self.model,
            prompt.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;
        http::check_status(SERVICE, response).await
    }

    async fn complete_once(&self, prompt: &str) -> Result<String> {
        let response: ChatResponse = self
            .send(prompt, false)
            .await?
            .json()
            .await
            .map_err(|e| ExplorerError::LlmError(format!("Failed to parse response: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ExplorerError::LlmError("No content in response".to_string()))
    }
}

#[async_trait]
impl ChatModel for GroqClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let answer = self
            .retry
            .run("Groq completion", || self.complete_once(prompt))
            .await?;
        info!("✅ Generated answer ({} chars)", answer.len());
        Ok(answer)
    }

    async fn stream(&self, prompt: &str) -> Result<StreamingResponse> {
        // Only opening the stream is retried; tokens already relayed cannot be replayed.
        let response = self
            .retry
            .run("Groq stream", || self.send(prompt, true))
            .await?;
        Ok(StreamingResponse::new(Box::pin(token_stream(Box::pin(
            response.bytes_stream(),
        )))))
    }
}
