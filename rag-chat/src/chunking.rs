//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`]: fixed character windows with configurable overlap
//! - [`RecursiveChunker`]: prefers paragraph, then sentence, then word
//!   boundaries before falling back to fixed windows
//!
//! Sizes and offsets are measured in characters (Unicode scalar values), so a
//! chunk boundary never falls inside a multi-byte code point.

use std::ops::Range;

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// Separators tried by [`RecursiveChunker`], coarsest first.
const SEPARATORS: [&str; 5] = ["\n\n", ". ", "! ", "? ", " "];

/// A strategy for splitting documents into chunks.
///
/// Implementations are pure: the same document always yields the same chunks,
/// in document order, none of them empty.
pub trait Chunker: Send + Sync {
    /// Split a single document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;

    /// Split a sequence of documents, preserving document order.
    fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|document| self.chunk(document)).collect()
    }
}

/// Split documents into fixed-size windows of `chunk_size` characters that
/// advance by `chunk_size - chunk_overlap`.
///
/// # Errors
///
/// Returns [`RagError::InvalidConfig`] if `chunk_size == 0` or
/// `chunk_overlap >= chunk_size`.
pub fn split_documents(
    documents: &[Document],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Chunk>> {
    let chunker = FixedSizeChunker::new(chunk_size, chunk_overlap)?;
    Ok(chunker.split(documents))
}

fn validate_window(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::InvalidConfig("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::InvalidConfig(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`. Each chunk inherits
/// the parent document's metadata plus a `chunk_index` field. Window starts
/// advance by `chunk_size - chunk_overlap` until they reach the end of the
/// text, so with overlap the trailing chunks may be shorter than `chunk_size`.
///
/// # Example
///
/// ```rust,ignore
/// use rag_chat::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(512, 0)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of characters shared by consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if `chunk_size == 0` or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_window(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Maximum number of characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of characters shared by consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let mut spans = Vec::new();
        fixed_windows(
            &document.text,
            0..document.text.len(),
            self.chunk_size,
            self.chunk_overlap,
            &mut spans,
        );
        build_chunks(document, spans)
    }
}

/// Splits text hierarchically: paragraphs → sentences → words → characters.
///
/// First splits by paragraph separators (`\n\n`). Segments are merged greedily
/// while they fit in `chunk_size`. A segment that is still too large is split
/// by sentence boundaries (`. `, `! `, `? `), then by spaces, and finally by
/// fixed character windows. Each new chunk is seeded with up to
/// `chunk_overlap` trailing characters of the previous chunk when that keeps
/// it within `chunk_size`. Separators stay attached to the preceding segment,
/// so chunks remain contiguous substrings of the source text.
///
/// # Example
///
/// ```rust,ignore
/// use rag_chat::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(512, 64)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if `chunk_size == 0` or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_window(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let mut spans = Vec::new();
        split_and_merge(
            &document.text,
            0..document.text.len(),
            self.chunk_size,
            self.chunk_overlap,
            &SEPARATORS,
            &mut spans,
        );
        build_chunks(document, spans)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Push fixed character windows covering `span` (byte offsets into `text`).
fn fixed_windows(
    text: &str,
    span: Range<usize>,
    chunk_size: usize,
    chunk_overlap: usize,
    out: &mut Vec<Range<usize>>,
) {
    let piece = &text[span.clone()];
    let mut boundaries: Vec<usize> = piece.char_indices().map(|(i, _)| span.start + i).collect();
    boundaries.push(span.end);

    let char_count = boundaries.len() - 1;
    let step = chunk_size - chunk_overlap;
    let mut start = 0;

    while start < char_count {
        let end = (start + chunk_size).min(char_count);
        out.push(boundaries[start]..boundaries[end]);
        start += step;
    }
}

/// Split `span` at a separator, then merge segments into spans that respect
/// `chunk_size`. Segments that are still too large are split further using
/// the next separator, bottoming out at fixed windows.
fn split_and_merge(
    text: &str,
    span: Range<usize>,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
    out: &mut Vec<Range<usize>>,
) {
    if span.is_empty() {
        return;
    }
    if char_len(&text[span.clone()]) <= chunk_size {
        out.push(span);
        return;
    }
    let Some((separator, remaining)) = separators.split_first() else {
        fixed_windows(text, span, chunk_size, chunk_overlap, out);
        return;
    };

    let segments = split_keeping_separator(text, span.clone(), separator);
    if segments.len() <= 1 {
        split_and_merge(text, span, chunk_size, chunk_overlap, remaining, out);
        return;
    }

    let mut current: Option<Range<usize>> = None;
    for segment in segments {
        current = match current.take() {
            None => Some(segment),
            Some(cur) if char_len(&text[cur.start..segment.end]) <= chunk_size => {
                Some(cur.start..segment.end)
            }
            Some(cur) => {
                split_and_merge(text, cur, chunk_size, chunk_overlap, remaining, out);
                let start = overlap_start(text, &segment, out.last(), chunk_size, chunk_overlap);
                Some(start..segment.end)
            }
        };
    }

    if let Some(cur) = current {
        split_and_merge(text, cur, chunk_size, chunk_overlap, remaining, out);
    }
}

/// Start of the next chunk: `segment.start` pulled back by up to
/// `chunk_overlap` characters of the previous chunk, if the result still fits.
fn overlap_start(
    text: &str,
    segment: &Range<usize>,
    previous: Option<&Range<usize>>,
    chunk_size: usize,
    chunk_overlap: usize,
) -> usize {
    let Some(previous) = previous else {
        return segment.start;
    };
    if chunk_overlap == 0 || previous.end != segment.start {
        return segment.start;
    }

    let start = text[previous.start..segment.start]
        .char_indices()
        .rev()
        .take(chunk_overlap)
        .last()
        .map_or(segment.start, |(i, _)| previous.start + i);

    if char_len(&text[start..segment.end]) <= chunk_size { start } else { segment.start }
}

/// Split a span at a separator while keeping the separator attached to the
/// preceding segment.
fn split_keeping_separator(text: &str, span: Range<usize>, separator: &str) -> Vec<Range<usize>> {
    let mut result = Vec::new();
    let mut start = span.start;

    while let Some(pos) = text[start..span.end].find(separator) {
        let end = start + pos + separator.len();
        result.push(start..end);
        start = end;
    }

    if start < span.end {
        result.push(start..span.end);
    }

    result
}

/// Turn byte spans (ascending by start) into chunks with character offsets.
fn build_chunks(document: &Document, spans: Vec<Range<usize>>) -> Vec<Chunk> {
    let mut byte_cursor = 0;
    let mut char_cursor = 0;

    spans
        .into_iter()
        .enumerate()
        .map(|(chunk_index, span)| {
            char_cursor += char_len(&document.text[byte_cursor..span.start]);
            byte_cursor = span.start;

            let mut metadata = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), chunk_index.to_string());

            Chunk {
                id: format!("{}_{chunk_index}", document.id),
                text: document.text[span].to_string(),
                metadata,
                document_id: document.id.clone(),
                offset: char_cursor,
            }
        })
        .collect()
}
