//! Document ingestion
//!
//! Uploaded PDF and TXT files are reduced to plain text, split into
//! overlapping chunks, embedded in batches and upserted into the vector store.

pub mod chunker;
pub mod loader;
pub mod pipeline;

pub use chunker::TextChunk;
pub use chunker::TextChunker;
pub use loader::DocumentKind;
pub use pipeline::FileIngestResult;
pub use pipeline::IngestStatus;
pub use pipeline::IngestSummary;
pub use pipeline::IngestionPipeline;
pub use pipeline::UploadedFile;
