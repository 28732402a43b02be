use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::errors::ExplorerError;
use crate::errors::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: true,
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
    #[serde(default = "default_log_dir")]
    pub directory: String,
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            backtrace: true,
            directory: default_log_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_embeddings_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_embeddings_model")]
    pub model: String,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
}

fn default_embeddings_endpoint() -> String {
    "https://api.jina.ai/v1".to_string()
}

fn default_embeddings_model() -> String {
    "jina-embeddings-v2-base-en".to_string()
}

fn default_dimension() -> usize {
    768
}

fn default_embedding_batch_size() -> usize {
    64
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_embeddings_endpoint(),
            api_key: String::new(),
            model: default_embeddings_model(),
            dimension: default_dimension(),
            batch_size: default_embedding_batch_size(),
        }
    }
}

/// Which vector store backs the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    Pinecone,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_provider")]
    pub provider: VectorStoreProvider,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_index_name")]
    pub index_name: String,
    #[serde(default = "default_cloud")]
    pub cloud: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default = "default_control_plane_url")]
    pub control_plane_url: String,
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,
}

fn default_provider() -> VectorStoreProvider {
    VectorStoreProvider::Pinecone
}

fn default_index_name() -> String {
    "knowledge-explorer".to_string()
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_metric() -> String {
    "cosine".to_string()
}

fn default_control_plane_url() -> String {
    "https://api.pinecone.io".to_string()
}

fn default_upsert_batch_size() -> usize {
    100
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            index_name: default_index_name(),
            cloud: default_cloud(),
            region: default_region(),
            metric: default_metric(),
            namespace: String::new(),
            control_plane_url: default_control_plane_url(),
            upsert_batch_size: default_upsert_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,
    #[serde(default)]
    pub llm_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_endpoint() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_endpoint: default_llm_endpoint(),
            llm_key: String::new(),
            llm_model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Per-file size cap in bytes
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
    /// Cap on a whole multipart request in bytes
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_upload_dir() -> String {
    "./uploads".to_string()
}

fn default_max_upload_size() -> usize {
    10 * 1024 * 1024
}

fn default_max_request_size() -> usize {
    50 * 1024 * 1024
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            upload_dir: default_upload_dir(),
            max_upload_size: default_max_upload_size(),
            max_request_size: default_max_request_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
    #[serde(default = "default_min_relevance_score")]
    pub min_relevance_score: f32,
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,
    #[serde(default = "default_document_keywords")]
    pub document_keywords: Vec<String>,
}

fn default_top_k() -> usize {
    5
}

fn default_max_top_k() -> usize {
    20
}

fn default_min_relevance_score() -> f32 {
    0.7
}

fn default_preview_length() -> usize {
    200
}

pub(crate) fn default_document_keywords() -> Vec<String> {
    [
        "document",
        "documents",
        "doc",
        "docs",
        "file",
        "files",
        "pdf",
        "upload",
        "uploaded",
        "attachment",
        "attached",
        "resume",
        "report",
        "paper",
        "summarize",
        "summarise",
        "summary",
        "according to",
        "based on",
        "mentioned in",
        "the text",
        "this text",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            min_relevance_score: default_min_relevance_score(),
            preview_length: default_preview_length(),
            document_keywords: default_document_keywords(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Presence of each hosted-service API key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiKeyStatus {
    pub groq: bool,
    pub pinecone: bool,
    pub jina: bool,
}

impl ApiKeyStatus {
    pub fn all_present(&self) -> bool {
        self.groq && self.pinecone && self.jina
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the default file locations, then apply
    /// environment overrides and validate.
    ///
    /// Tries `config.toml`, then `config.example.toml`, then built-in defaults,
    /// so a deployment configured only through environment variables works.
    pub fn load() -> Result<Self> {
        let mut config = if Path::new("config.toml").exists() {
            Self::from_file("config.toml")?
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")?
        } else {
            Self::default()
        };

        config.apply_env_overrides_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment-style variables.
    ///
    /// `lookup` maps a variable name to its value; the process environment is
    /// passed in by [`AppConfig::load`].
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GROQ_API_KEY") {
            self.llm.llm_key = v;
        }
        if let Some(v) = lookup("GROQ_MODEL") {
            self.llm.llm_model = v;
        }
        if let Some(v) = lookup("GROQ_TEMPERATURE") {
            self.llm.temperature = parse_env("GROQ_TEMPERATURE", &v)?;
        }
        if let Some(v) = lookup("GROQ_MAX_TOKENS") {
            self.llm.max_tokens = parse_env("GROQ_MAX_TOKENS", &v)?;
        }
        if let Some(v) = lookup("PINECONE_API_KEY") {
            self.vector_store.api_key = v;
        }
        if let Some(v) = lookup("PINECONE_ENV") {
            self.vector_store.region = v;
        }
        if let Some(v) = lookup("PINECONE_INDEX") {
            self.vector_store.index_name = v;
        }
        if let Some(v) = lookup("JINA_API_KEY") {
            self.embeddings.api_key = v;
        }
        if let Some(v) = lookup("CHUNK_SIZE") {
            self.ingest.chunk_size = parse_env("CHUNK_SIZE", &v)?;
        }
        if let Some(v) = lookup("CHUNK_OVERLAP") {
            self.ingest.chunk_overlap = parse_env("CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = lookup("MIN_RELEVANCE_SCORE") {
            self.retrieval.min_relevance_score = parse_env("MIN_RELEVANCE_SCORE", &v)?;
        }
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = parse_env("PORT", &v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.logging.level = v.to_lowercase();
        }
        if let Some(v) = lookup("UPLOAD_DIR") {
            self.ingest.upload_dir = v;
        }
        if let Some(v) = lookup("MAX_UPLOAD_SIZE") {
            self.ingest.max_upload_size = parse_env("MAX_UPLOAD_SIZE", &v)?;
        }
        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.ingest.chunk_size == 0 {
            return Err(ExplorerError::ConfigError(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(ExplorerError::ConfigError(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        if !(-1.0..=1.0).contains(&self.retrieval.min_relevance_score) {
            return Err(ExplorerError::ConfigError(format!(
                "min_relevance_score must be within [-1, 1], got {}",
                self.retrieval.min_relevance_score
            )));
        }
        if self.retrieval.top_k == 0 || self.retrieval.top_k > self.retrieval.max_top_k {
            return Err(ExplorerError::ConfigError(format!(
                "top_k must be within 1..={}, got {}",
                self.retrieval.max_top_k, self.retrieval.top_k
            )));
        }
        if self.embeddings.dimension == 0 {
            return Err(ExplorerError::ConfigError(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        if self.embeddings.batch_size == 0 || self.vector_store.upsert_batch_size == 0 {
            return Err(ExplorerError::ConfigError(
                "batch sizes must be greater than zero".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ExplorerError::ConfigError(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        for (name, endpoint) in [
            ("embeddings.endpoint", &self.embeddings.endpoint),
            ("llm.llm_endpoint", &self.llm.llm_endpoint),
            (
                "vector_store.control_plane_url",
                &self.vector_store.control_plane_url,
            ),
        ] {
            Url::parse(endpoint).map_err(|e| {
                ExplorerError::ConfigError(format!("{name} is not a valid URL ({endpoint}): {e}"))
            })?;
        }
        Ok(())
    }

    /// Report which API keys are configured
    pub fn api_key_status(&self) -> ApiKeyStatus {
        ApiKeyStatus {
            groq: !self.llm.llm_key.trim().is_empty(),
            pinecone: !self.vector_store.api_key.trim().is_empty(),
            jina: !self.embeddings.api_key.trim().is_empty(),
        }
    }

    /// Get the upload directory as a path
    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.ingest.upload_dir)
    }

    /// Get the per-request timeout for outbound API calls
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.retry.request_timeout_secs)
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ExplorerError::ConfigError(format!("Invalid value for {key} ({value}): {e}")))
}
