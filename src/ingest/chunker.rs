//! Fixed-size text chunking with overlap

use crate::config::IngestConfig;
use crate::errors::ExplorerError;
use crate::errors::Result;

/// A window of the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
    /// Char offset of the first character
    pub start: usize,
    /// Char offset one past the last character
    pub end: usize,
}

impl TextChunk {
    /// Whether the chunk has nothing worth embedding
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Splits text into windows of at most `chunk_size` characters that share
/// `overlap` characters with their predecessor.
///
/// A window ends early at its last paragraph break, line break or space when
/// that break lies past the overlap, so words are kept whole where possible.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ExplorerError::ConfigError(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(ExplorerError::ConfigError(format!(
                "chunk_overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn split(&self, text: &str) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let mut end = (start + self.chunk_size).min(total);
            if end < total {
                if let Some(at) = find_break(&chars[start..end], self.overlap) {
                    end = start + at;
                }
            }

            chunks.push(TextChunk {
                index: chunks.len(),
                text: chars[start..end].iter().collect(),
                start,
                end,
            });

            if end >= total {
                break;
            }
            start = end.saturating_sub(self.overlap).max(start + 1);
        }

        chunks
    }
}

/// Position just after the last paragraph break, line break or space in
/// `window`, preferring them in that order, if it lies beyond `min`
fn find_break(window: &[char], min: usize) -> Option<usize> {
    let paragraph = window
        .windows(2)
        .rposition(|pair| pair[0] == '\n' && pair[1] == '\n')
        .map(|i| i + 2);
    let line = window.iter().rposition(|c| *c == '\n').map(|i| i + 1);
    let space = window.iter().rposition(|c| *c == ' ').map(|i| i + 1);

    [paragraph, line, space]
        .into_iter()
        .flatten()
        .find(|at| *at > min)
}
