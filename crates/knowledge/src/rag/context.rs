//! Context block assembly.

use crate::types::ChunkRecord;

/// Separator between chunks in the context block.
const CHUNK_SEPARATOR: &str = "\n\n";

/// Build the context block handed to the generator.
///
/// Chunks keep their retrieval order. Each one is labelled with its source
/// title and chunk number so the answer can cite it.
pub fn build_context(chunks: &[ChunkRecord]) -> String {
    chunks
        .iter()
        .map(format_chunk)
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}

fn format_chunk(chunk: &ChunkRecord) -> String {
    format!(
        "From '{}' (chunk {}):\n{}",
        chunk.title, chunk.chunk_number, chunk.chunk_text
    )
}
