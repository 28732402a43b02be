//! RAG (Retrieval-Augmented Generation) over uploaded documents
//!
//! A question is routed by keyword, answered from retrieved chunks when they
//! clear the relevance threshold, and otherwise answered from general
//! knowledge or refused, depending on how strictly it refers to documents.

pub mod context;
pub mod pipeline;
pub mod retriever;
pub mod router;

pub use context::append_source_footer;
pub use context::ContextAssembler;
pub use context::Source;
pub use pipeline::AnswerMode;
pub use pipeline::QueryEvent;
pub use pipeline::QueryMetadata;
pub use pipeline::RagQuery;
pub use pipeline::RagResponse;
pub use pipeline::RagService;
pub use pipeline::StreamMetadata;
pub use retriever::RetrievedChunk;
pub use retriever::Retriever;
pub use router::QuestionIntent;
pub use router::QuestionRouter;
