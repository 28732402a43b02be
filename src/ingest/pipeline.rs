//! Ingestion pipeline: validate, save, extract, chunk, embed, upsert

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::chunker::TextChunker;
use super::loader::extract_text;
use super::loader::sanitize_filename;
use super::loader::DocumentKind;
use crate::embeddings::generator::EmbeddingService;
use crate::errors::ExplorerError;
use crate::errors::Result;
use crate::vectorstore::chunk_record_id;
use crate::vectorstore::ChunkMetadata;
use crate::vectorstore::VectorRecord;
use crate::vectorstore::VectorStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    Success,
    Warning,
    Error,
}

/// Outcome of ingesting one file
#[derive(Debug, Clone, Serialize)]
pub struct FileIngestResult {
    pub filename: String,
    pub status: IngestStatus,
    pub message: String,
    pub chunks: usize,
    pub upserted: usize,
}

impl FileIngestResult {
    fn failed(filename: String, error: &ExplorerError) -> Self {
        Self {
            filename,
            status: IngestStatus::Error,
            message: error.to_string(),
            chunks: 0,
            upserted: 0,
        }
    }
}

/// Outcome of one upload request
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub status: IngestStatus,
    pub message: String,
    pub total_chunks: usize,
    pub files: Vec<FileIngestResult>,
}

impl IngestSummary {
    pub fn from_results(files: Vec<FileIngestResult>) -> Self {
        let failed = files
            .iter()
            .filter(|f| f.status == IngestStatus::Error)
            .count();
        let processed = files.len() - failed;
        let total_chunks = files.iter().map(|f| f.chunks).sum();

        let (status, message) = if processed == 0 {
            (
                IngestStatus::Error,
                format!("Failed to process {} file(s)", files.len()),
            )
        } else if failed > 0 {
            (
                IngestStatus::Success,
                format!("Successfully processed {processed} file(s), {failed} failed"),
            )
        } else {
            (
                IngestStatus::Success,
                format!("Successfully processed {processed} file(s)"),
            )
        };

        Self {
            status,
            message,
            total_chunks,
            files,
        }
    }
}

/// A file sitting in the upload directory
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub filename: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

pub struct IngestionPipeline {
    chunker: TextChunker,
    embeddings: Arc<EmbeddingService>,
    store: Arc<dyn VectorStore>,
    upload_dir: PathBuf,
    max_file_size: usize,
}

impl IngestionPipeline {
    pub fn new(
        chunker: TextChunker,
        embeddings: Arc<EmbeddingService>,
        store: Arc<dyn VectorStore>,
        upload_dir: PathBuf,
        max_file_size: usize,
    ) -> Self {
        Self {
            chunker,
            embeddings,
            store,
            upload_dir,
            max_file_size,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Ingest every uploaded file independently
    pub async fn ingest_uploads(&self, files: Vec<(String, Vec<u8>)>) -> IngestSummary {
        let mut results = Vec::with_capacity(files.len());
        for (filename, bytes) in files {
            results.push(self.ingest_upload(&filename, bytes).await);
        }
        let summary = IngestSummary::from_results(results);
        info!("📦 {}", summary.message);
        summary
    }

    /// Validate, save and ingest one uploaded file
    pub async fn ingest_upload(&self, raw_filename: &str, bytes: Vec<u8>) -> FileIngestResult {
        let filename = match sanitize_filename(raw_filename) {
            Ok(name) => name,
            Err(e) => return FileIngestResult::failed(raw_filename.to_string(), &e),
        };

        match self.save_and_ingest(&filename, bytes).await {
            Ok(result) => result,
            Err(e) => {
                error!("❌ Failed to ingest {}: {}", filename, e);
                FileIngestResult::failed(filename, &e)
            }
        }
    }

    /// Ingest a file from disk without copying it to the upload directory
    pub async fn ingest_path(&self, path: &Path) -> FileIngestResult {
        let shown = path.display().to_string();
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                let e = ExplorerError::InvalidRequest(format!("Invalid path: {shown}"));
                return FileIngestResult::failed(shown, &e);
            }
        };

        match self.read_and_ingest(path, &filename).await {
            Ok(result) => result,
            Err(e) => {
                error!("❌ Failed to ingest {}: {}", shown, e);
                FileIngestResult::failed(filename, &e)
            }
        }
    }

    async fn read_and_ingest(&self, path: &Path, filename: &str) -> Result<FileIngestResult> {
        let kind = DocumentKind::from_filename(filename)?;
        let bytes = tokio::fs::read(path).await?;
        self.check_size(bytes.len())?;
        self.ingest_bytes(filename, kind, bytes).await
    }

    async fn save_and_ingest(&self, filename: &str, bytes: Vec<u8>) -> Result<FileIngestResult> {
        let kind = DocumentKind::from_filename(filename)?;
        self.check_size(bytes.len())?;

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let target = self.upload_dir.join(filename);
        tokio::fs::write(&target, &bytes).await?;
        info!("💾 Saved {} ({} bytes)", target.display(), bytes.len());

        self.ingest_bytes(filename, kind, bytes).await
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.max_file_size {
            return Err(ExplorerError::FileTooLarge {
                size,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }

    async fn ingest_bytes(
        &self,
        filename: &str,
        kind: DocumentKind,
        bytes: Vec<u8>,
    ) -> Result<FileIngestResult> {
        let text = tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
            .await
            .map_err(|e| ExplorerError::ParseError(format!("Extraction task failed: {e}")))??;

        let (chunks, upserted) = self.ingest_text(filename, &text).await?;
        if chunks == 0 {
            warn!("⚠️  No text extracted from {}", filename);
            return Ok(FileIngestResult {
                filename: filename.to_string(),
                status: IngestStatus::Warning,
                message: "No text could be extracted from the file".to_string(),
                chunks: 0,
                upserted: 0,
            });
        }

        Ok(FileIngestResult {
            filename: filename.to_string(),
            status: IngestStatus::Success,
            message: format!("Processed {chunks} chunks"),
            chunks,
            upserted,
        })
    }

    /// Chunk, embed and store already-extracted text
    ///
    /// Returns the number of chunks embedded and the number of vectors written.
    pub async fn ingest_text(&self, filename: &str, text: &str) -> Result<(usize, usize)> {
        let chunks: Vec<_> = self
            .chunker
            .split(text)
            .into_iter()
            .filter(|c| !c.is_blank())
            .collect();
        if chunks.is_empty() {
            return Ok((0, 0));
        }
        info!("✂️  Split {} into {} chunks", filename, chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embeddings.generate_batch(&texts).await?;

        let uploaded_at = Utc::now().to_rfc3339();
        let total_chunks = chunks.len() as u64;
        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(position, (chunk, values))| VectorRecord {
                id: chunk_record_id(filename, position),
                values,
                metadata: ChunkMetadata {
                    filename: filename.to_string(),
                    chunk_id: format!("{}_{}", position, chunk.start),
                    chunk_index: position as u64,
                    total_chunks,
                    text: chunk.text,
                    uploaded_at: Some(uploaded_at.clone()),
                },
            })
            .collect();

        // A re-upload replaces the document's earlier chunks
        let replaced = self.store.delete_by_filename(filename).await?;
        if replaced > 0 {
            info!("♻️  Replacing {} existing vectors for {}", replaced, filename);
        }

        let count = records.len();
        let upserted = self.store.upsert(records).await?;
        info!("✅ Ingested {}: {} chunks, {} vectors", filename, count, upserted);
        Ok((count, upserted))
    }

    /// List the files currently in the upload directory
    pub async fn uploaded_files(&self) -> Result<Vec<UploadedFile>> {
        let mut entries = match tokio::fs::read_dir(&self.upload_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            files.push(UploadedFile {
                filename: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }
}
