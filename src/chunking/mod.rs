//! File chunking: overlapping character windows, or fixed line blocks.
//!
//! Ingestion uses character windows by default. Every window also records
//! the line span it covers, so answers can still cite line numbers.

pub mod lines;
pub mod window;

use uuid::Uuid;

use crate::config::{ChunkMode, IngestConfig};
use crate::error::Result;
use crate::models::Chunk;

pub use lines::chunk_lines;
pub use window::chunk_text;

/// Output of the chunking process, before it is tied to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutput {
    pub content: String,
    /// Character offset of the first character.
    pub start_offset: usize,
    /// Character offset one past the last character.
    pub end_offset: usize,
    /// 1-based start line in the original file.
    pub start_line: usize,
    /// 1-based end line in the original file.
    pub end_line: usize,
}

/// Byte positions of every `\n` in `text`.
pub(crate) fn line_starts(text: &str) -> Vec<usize> {
    text.match_indices('\n').map(|(i, _)| i).collect()
}

/// Chunk one file according to the configured mode.
pub fn chunk_file(file_path: &str, content: &str, config: &IngestConfig) -> Result<Vec<Chunk>> {
    let raw = match config.chunk_mode {
        ChunkMode::Chars => chunk_text(content, config.chunk_size, config.chunk_overlap)?,
        ChunkMode::Lines => chunk_lines(content, config.chunk_lines)?,
    };

    Ok(raw
        .into_iter()
        .map(|c| Chunk {
            id: Uuid::new_v4(),
            file_path: file_path.to_string(),
            start_offset: c.start_offset,
            end_offset: c.end_offset,
            start_line: c.start_line,
            end_line: c.end_line,
            content: c.content,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_file_empty() {
        let chunks = chunk_file("empty.rs", "", &IngestConfig::default()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_chunk_file_char_mode_tags_path() {
        let content = "fn main() {\n    println!(\"hello\");\n}";
        let chunks = chunk_file("src/main.rs", content, &IngestConfig::default()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].file_path, "src/main.rs");
        assert_eq!(chunks[0].content, content);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 3);
    }

    #[test]
    fn test_chunk_file_line_mode() {
        let config = IngestConfig {
            chunk_mode: ChunkMode::Lines,
            chunk_lines: 2,
            ..IngestConfig::default()
        };
        let chunks = chunk_file("a.py", "a\nb\nc\n", &config).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].start_line, 3);
    }

    #[test]
    fn test_chunk_ids_are_unique() {
        let text = "x".repeat(2000);
        let chunks = chunk_file("big.md", &text, &IngestConfig::default()).unwrap();
        assert!(chunks.len() > 1);
        assert_ne!(chunks[0].id, chunks[1].id);
    }
}
