//! Text chunking - splits document content into overlapping passages
//!
//! Chunk boundaries are measured in characters so multi-byte text never
//! splits inside a code point.

use crate::error::{Error, Result};

/// A chunk of document text with its character offset
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkText {
    /// Character offset of the chunk start within the document
    pub offset: usize,
    pub text: String,
}

/// Sliding-window chunker with a fixed stride of `size - overlap` characters
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker, rejecting invalid size/overlap combinations
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::Validation("chunk_size must be positive".into()));
        }
        if overlap >= size {
            return Err(Error::Validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into overlapping chunks
    ///
    /// Deterministic and pure. Empty input yields an empty sequence, which
    /// is a valid result rather than an error. Every character of the input
    /// is covered by at least one chunk; consecutive chunk offsets differ by
    /// exactly `size - overlap` except for the final chunk, which may start
    /// closer to cover the tail.
    pub fn chunk(&self, text: &str) -> Vec<ChunkText> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte index of every char boundary, plus the end of the text
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        let char_count = boundaries.len() - 1;

        let stride = self.size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.size).min(char_count);
            chunks.push(ChunkText {
                offset: start,
                text: text[boundaries[start]..boundaries[end]].to_string(),
            });

            if end == char_count {
                break;
            }
            start += stride;
        }

        chunks
    }
}
