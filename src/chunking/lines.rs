//! Fixed line-count chunker.
//!
//! Splits a file into consecutive blocks of `lines_per_chunk` lines and
//! records the 1-based line span of each block. Blocks never overlap.

use super::ChunkOutput;
use crate::error::{EngineError, Result};

/// Chunk content into blocks of `lines_per_chunk` lines.
pub fn chunk_lines(content: &str, lines_per_chunk: usize) -> Result<Vec<ChunkOutput>> {
    if lines_per_chunk == 0 {
        return Err(EngineError::InvalidChunking {
            chunk_size: 0,
            overlap: 0,
        });
    }
    if content.is_empty() {
        return Ok(Vec::new());
    }

    // Keep line terminators so concatenating blocks gives back the file
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let total_lines = lines.len();

    let mut chunks = Vec::with_capacity(total_lines.div_ceil(lines_per_chunk));
    let mut offset = 0usize;

    for (block, group) in lines.chunks(lines_per_chunk).enumerate() {
        let text: String = group.concat();
        let chars = text.chars().count();
        let first = block * lines_per_chunk;
        chunks.push(ChunkOutput {
            content: text,
            start_offset: offset,
            end_offset: offset + chars,
            start_line: first + 1,
            end_line: (first + lines_per_chunk).min(total_lines),
        });
        offset += chars;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_empty() {
        assert!(chunk_lines("", 40).unwrap().is_empty());
    }

    #[test]
    fn test_lines_small_file() {
        let content = "line 1\nline 2\nline 3";
        let chunks = chunk_lines(content, 40).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 3);
        assert_eq!(chunks[0].content, content);
    }

    #[test]
    fn test_lines_split_and_one_based() {
        let content: String = (1..=95).map(|i| format!("row {i}\n")).collect();
        let chunks = chunk_lines(&content, 40).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (1, 40));
        assert_eq!((chunks[1].start_line, chunks[1].end_line), (41, 80));
        assert_eq!((chunks[2].start_line, chunks[2].end_line), (81, 95));
        assert!(chunks[1].content.starts_with("row 41\n"));
    }

    #[test]
    fn test_lines_offsets_are_contiguous() {
        let content = "a\nbb\nccc\ndddd\n";
        let chunks = chunk_lines(content, 2).unwrap();
        assert_eq!(chunks[0].end_offset, chunks[1].start_offset);
        let rebuilt: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(rebuilt, content);
    }

    #[test]
    fn test_lines_zero_rejected() {
        assert!(chunk_lines("x", 0).is_err());
    }
}
