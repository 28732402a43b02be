use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Malformed response body: {0}")]
    ResponseDecode(String),

    #[error("{service} API error ({status}): {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Vector store error: {0}")]
    VectorStoreError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Unsupported file type: {0}. Only PDF and TXT files are allowed")]
    UnsupportedFileType(String),

    #[error("File too large: {size} bytes exceeds the limit of {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Request too large: the body exceeds the limit of {limit} bytes")]
    RequestTooLarge { limit: usize },

    #[error("Failed to parse document: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExplorerError {
    /// Whether an outbound call that failed with this error is worth retrying.
    ///
    /// Transport failures, timeouts, rate limits and upstream 5xx responses are
    /// transient. Authentication failures, bad requests and unknown models are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(_) => true,
            Self::Upstream { status, .. } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ExplorerError {
    fn from(e: reqwest::Error) -> Self {
        // The request already succeeded; sending it again yields the same body
        if e.is_decode() {
            Self::ResponseDecode(e.to_string())
        } else {
            Self::HttpError(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
