//! Context assembly from retrieved chunks

use serde::Deserialize;
use serde::Serialize;

use crate::llm::ContextBlock;
use crate::rag::RetrievedChunk;

/// A cited chunk as returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub filename: String,
    pub chunk_id: String,
    pub score: f32,
    pub preview: String,
}

/// Assembler for prompt context and source lists
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    preview_length: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(200)
    }
}

impl ContextAssembler {
    /// Create a new context assembler
    #[must_use]
    pub const fn new(preview_length: usize) -> Self {
        Self { preview_length }
    }

    #[must_use]
    pub fn blocks<'a>(&self, chunks: &'a [RetrievedChunk]) -> Vec<ContextBlock<'a>> {
        chunks
            .iter()
            .map(|c| ContextBlock {
                filename: &c.filename,
                text: &c.text,
            })
            .collect()
    }

    #[must_use]
    pub fn sources(&self, chunks: &[RetrievedChunk]) -> Vec<Source> {
        chunks
            .iter()
            .map(|c| Source {
                filename: c.filename.clone(),
                chunk_id: c.chunk_id.clone(),
                score: c.score,
                preview: preview(&c.text, self.preview_length),
            })
            .collect()
    }
}

/// First `max_chars` characters, with `...` appended when text was cut
#[must_use]
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Distinct source filenames in order of first appearance
#[must_use]
pub fn distinct_filenames(sources: &[Source]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for source in sources {
        if !names.contains(&source.filename.as_str()) {
            names.push(&source.filename);
        }
    }
    names
}

/// Append a `Source:`/`Sources:` line unless the answer already cites one
#[must_use]
pub fn append_source_footer(answer: String, sources: &[Source]) -> String {
    let names = distinct_filenames(sources);
    if names.is_empty() || answer.to_lowercase().contains("source:") {
        return answer;
    }

    match names.as_slice() {
        [single] => format!("{answer}\n\nSource: {single}"),
        _ => format!("{answer}\n\nSources: {}", names.join(", ")),
    }
}
