//! Complete RAG pipeline: Route -> Retrieve -> Generate

use std::sync::Arc;

use futures::channel::mpsc;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config::RetrievalConfig;
use crate::errors::ExplorerError;
use crate::errors::Result;
use crate::llm::build_document_prompt;
use crate::llm::build_general_prompt;
use crate::llm::ChatModel;
use crate::rag::append_source_footer;
use crate::rag::ContextAssembler;
use crate::rag::QuestionIntent;
use crate::rag::QuestionRouter;
use crate::rag::RetrievedChunk;
use crate::rag::Retriever;
use crate::rag::Source;
use crate::vectorstore::VectorStore;

/// Answer given when a document question has no relevant chunks
pub const NO_RELEVANT_DOCUMENTS_ANSWER: &str = "I couldn't find information relevant to your question in the uploaded documents. Try rephrasing the question, or upload a document that covers this topic.";

/// Answer given when a document question arrives before any upload
pub const NO_DOCUMENTS_ANSWER: &str =
    "No documents have been uploaded yet. Upload a PDF or TXT file, then ask again.";

const GENERAL_MESSAGE: &str = "Answered using general AI knowledge";
const FALLBACK_MESSAGE: &str = "No relevant documents found. Answered using general knowledge.";
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// How an answer was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    Documents,
    General,
    NoRelevantDocuments,
}

/// A question with retrieval options
#[derive(Debug, Clone, Deserialize)]
pub struct RagQuery {
    pub question: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub force_documents: bool,
    #[serde(default)]
    pub filename: Option<String>,
}

impl RagQuery {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
            force_documents: false,
            filename: None,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    #[must_use]
    pub fn force_documents(mut self) -> Self {
        self.force_documents = true;
        self
    }

    /// Reject empty questions and out-of-range `top_k`
    pub fn validate(&self, max_top_k: usize) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(ExplorerError::InvalidRequest(
                "Question must not be empty".to_string(),
            ));
        }
        if let Some(top_k) = self.top_k {
            if top_k == 0 || top_k > max_top_k {
                return Err(ExplorerError::InvalidRequest(format!(
                    "top_k must be between 1 and {max_top_k}, got {top_k}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    pub mode: AnswerMode,
    pub retrieved_docs: usize,
    pub question: String,
    pub top_k: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// RAG query response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    pub metadata: QueryMetadata,
}

/// First event of a streamed answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMetadata {
    #[serde(flatten)]
    pub metadata: QueryMetadata,
    pub sources: Vec<Source>,
}

/// Events of a streamed answer, in order: one `Metadata`, any number of
/// `Token`s, then `Done` or `Error`
#[derive(Debug, Clone)]
pub enum QueryEvent {
    Metadata(StreamMetadata),
    Token(String),
    Done { answer: String, token_count: usize },
    Error(String),
}

/// Decision reached before generation
#[derive(Debug)]
struct AnswerPlan {
    metadata: QueryMetadata,
    sources: Vec<Source>,
    /// `None` when the answer is a fixed refusal
    prompt: Option<String>,
    refusal: &'static str,
}

/// Complete RAG service
pub struct RagService {
    router: QuestionRouter,
    retriever: Retriever,
    context_assembler: ContextAssembler,
    llm: Arc<dyn ChatModel>,
    store: Arc<dyn VectorStore>,
    default_top_k: usize,
    max_top_k: usize,
}

impl RagService {
    pub fn new(
        config: &RetrievalConfig,
        retriever: Retriever,
        llm: Arc<dyn ChatModel>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            router: QuestionRouter::from_config(config),
            retriever,
            context_assembler: ContextAssembler::new(config.preview_length),
            llm,
            store,
            default_top_k: config.top_k,
            max_top_k: config.max_top_k,
        }
    }

    /// Answer a question in one response
    pub async fn query(&self, query: RagQuery) -> Result<RagResponse> {
        query.validate(self.max_top_k)?;
        info!("Processing query: {}", query.question);

        let plan = self.plan(&query).await?;
        let answer = match &plan.prompt {
            Some(prompt) => {
                info!("🤖 Generating answer with {}", self.llm.model_name());
                self.llm.complete(prompt).await?
            }
            None => plan.refusal.to_string(),
        };

        let answer = if plan.metadata.mode == AnswerMode::Documents {
            append_source_footer(answer, &plan.sources)
        } else {
            answer
        };

        Ok(RagResponse {
            answer,
            sources: plan.sources,
            metadata: plan.metadata,
        })
    }

    /// Answer a question as a stream of events
    ///
    /// The answer is produced by a spawned task. Dropping the receiver (for
    /// example when the client disconnects) stops that task at its next send.
    pub fn stream_query(self: Arc<Self>, query: RagQuery) -> mpsc::Receiver<QueryEvent> {
        let (mut tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            if let Err(e) = self.produce_stream(query, &mut tx).await {
                error!("❌ Stream query failed: {}", e);
                let _ = tx.send(QueryEvent::Error(e.to_string())).await;
            }
        });

        rx
    }

    async fn produce_stream(
        &self,
        query: RagQuery,
        tx: &mut mpsc::Sender<QueryEvent>,
    ) -> Result<()> {
        query.validate(self.max_top_k)?;
        info!("Processing streaming query: {}", query.question);

        let plan = self.plan(&query).await?;
        let metadata = QueryEvent::Metadata(StreamMetadata {
            metadata: plan.metadata,
            sources: plan.sources,
        });
        if tx.send(metadata).await.is_err() {
            return Ok(());
        }

        let Some(prompt) = plan.prompt else {
            let answer = plan.refusal.to_string();
            if tx.send(QueryEvent::Token(answer.clone())).await.is_ok() {
                let _ = tx
                    .send(QueryEvent::Done {
                        answer,
                        token_count: 1,
                    })
                    .await;
            }
            return Ok(());
        };

        let mut tokens = self.llm.stream(&prompt).await?.into_stream();
        let mut answer = String::new();
        let mut token_count = 0;
        while let Some(token) = tokens.next().await {
            let token = token?;
            answer.push_str(&token);
            token_count += 1;
            if tx.send(QueryEvent::Token(token)).await.is_err() {
                info!("Client disconnected after {} tokens", token_count);
                return Ok(());
            }
        }

        info!("✅ Streamed answer ({} tokens)", token_count);
        let _ = tx
            .send(QueryEvent::Done {
                answer,
                token_count,
            })
            .await;
        Ok(())
    }

    async fn plan(&self, query: &RagQuery) -> Result<AnswerPlan> {
        let top_k = query.top_k.unwrap_or(self.default_top_k);
        let intent = self.router.classify(&query.question);
        let strict = query.force_documents || intent == QuestionIntent::Documents;

        let stats = self.store.stats().await?;
        info!(
            "📝 Question type: {:?} (strict: {}), {} vectors stored",
            intent, strict, stats.total_vectors
        );

        if stats.total_vectors == 0 {
            return Ok(if strict {
                self.refuse(query, top_k, NO_DOCUMENTS_ANSWER)
            } else {
                self.general(query, top_k, GENERAL_MESSAGE)
            });
        }

        let chunks = self
            .retriever
            .retrieve(&query.question, top_k, query.filename.as_deref())
            .await?;

        Ok(match (chunks.is_empty(), strict) {
            (false, _) => self.documents(query, top_k, &chunks),
            (true, true) => {
                warn!("⚠️  No relevant documents for a document question");
                self.refuse(query, top_k, NO_RELEVANT_DOCUMENTS_ANSWER)
            }
            (true, false) => {
                debug!("No relevant documents, falling back to general knowledge");
                self.general(query, top_k, FALLBACK_MESSAGE)
            }
        })
    }

    fn documents(&self, query: &RagQuery, top_k: usize, chunks: &[RetrievedChunk]) -> AnswerPlan {
        let blocks = self.context_assembler.blocks(chunks);
        AnswerPlan {
            metadata: QueryMetadata {
                mode: AnswerMode::Documents,
                retrieved_docs: chunks.len(),
                question: query.question.clone(),
                top_k,
                message: None,
            },
            sources: self.context_assembler.sources(chunks),
            prompt: Some(build_document_prompt(&query.question, &blocks)),
            refusal: "",
        }
    }

    fn general(&self, query: &RagQuery, top_k: usize, message: &str) -> AnswerPlan {
        AnswerPlan {
            metadata: QueryMetadata {
                mode: AnswerMode::General,
                retrieved_docs: 0,
                question: query.question.clone(),
                top_k,
                message: Some(message.to_string()),
            },
            sources: Vec::new(),
            prompt: Some(build_general_prompt(&query.question)),
            refusal: "",
        }
    }

    fn refuse(&self, query: &RagQuery, top_k: usize, answer: &'static str) -> AnswerPlan {
        AnswerPlan {
            metadata: QueryMetadata {
                mode: AnswerMode::NoRelevantDocuments,
                retrieved_docs: 0,
                question: query.question.clone(),
                top_k,
                message: Some(answer.to_string()),
            },
            sources: Vec::new(),
            prompt: None,
            refusal: answer,
        }
    }
}
