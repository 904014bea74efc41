//! Fixed-size overlapping character windows.
//!
//! Window `i` starts at character `i * (chunk_size - overlap)` and spans
//! `chunk_size` characters, the last one truncated to the end of the text.
//! Offsets count `char`s, never bytes.

use super::{line_starts, ChunkOutput};
use crate::error::{EngineError, Result};

/// Split `text` into overlapping character windows.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<ChunkOutput>> {
    if chunk_size == 0 || overlap >= chunk_size {
        return Err(EngineError::InvalidChunking {
            chunk_size,
            overlap,
        });
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }

    // Byte position of every char, plus the end of the text
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = bounds.len() - 1;
    let newlines = line_starts(text);
    let step = chunk_size - overlap;

    let chunks = (0..char_len)
        .step_by(step)
        .map(|start| {
            let end = (start + chunk_size).min(char_len);
            let start_byte = bounds[start];
            let last_byte = bounds[end - 1];
            ChunkOutput {
                content: text[start_byte..bounds[end]].to_string(),
                start_offset: start,
                end_offset: end,
                start_line: line_of(&newlines, start_byte),
                end_line: line_of(&newlines, last_byte),
            }
        })
        .collect();

    Ok(chunks)
}

/// 1-based line number containing the byte at `byte`.
fn line_of(newlines: &[usize], byte: usize) -> usize {
    newlines.partition_point(|&nl| nl < byte) + 1
}
