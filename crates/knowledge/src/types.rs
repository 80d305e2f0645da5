//! Query pipeline type definitions.

use serde::{Deserialize, Serialize};
use wikiqa_core::config::{MAX_CHUNKS, MIN_CHUNKS};
use wikiqa_core::{AppError, AppResult};

/// A validated question for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    chunk_limit: u32,
}

impl Query {
    /// Create a query from raw user input.
    ///
    /// The text is trimmed and must not be blank. The chunk limit is clamped
    /// to `MIN_CHUNKS..=MAX_CHUNKS`.
    pub fn new(text: impl AsRef<str>, chunk_limit: u32) -> AppResult<Self> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(AppError::EmptyQuery);
        }

        Ok(Self {
            text: text.to_string(),
            chunk_limit: chunk_limit.clamp(MIN_CHUNKS, MAX_CHUNKS),
        })
    }

    /// Question text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Maximum number of chunks to retrieve.
    pub fn chunk_limit(&self) -> u32 {
        self.chunk_limit
    }
}

/// A chunk returned by hybrid search, in backend relevance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    /// Title of the source document
    pub title: String,

    /// Chunk text
    pub chunk_text: String,

    /// Position of the chunk within its document
    pub chunk_number: i64,

    /// Dissimilarity to the query, lower is more relevant.
    ///
    /// This is the backend's vector distance when it reports one. Hybrid
    /// searches often only report a fused score, in which case the value is
    /// `1 - score`: still ordered, but not a geometric distance, and with
    /// ranked fusion every hit sits close to 1.0.
    pub relevance_distance: f32,
}

/// Hybrid search request sent to a chunk store.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridSearch {
    /// Free-text query used for both keyword and vector matching
    pub query: String,

    /// Maximum number of records to return
    pub limit: u32,
}

impl HybridSearch {
    /// Build the search request for a query.
    pub fn for_query(query: &Query) -> Self {
        Self {
            query: query.text().to_string(),
            limit: query.chunk_limit(),
        }
    }
}

/// Attribution for one chunk the answer was grounded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    /// Title of the source document
    pub title: String,

    /// Position of the chunk within its document
    pub chunk_number: i64,

    /// Dissimilarity to the query, lower is more relevant; may be derived
    /// from a fused hybrid score (see [`ChunkRecord::relevance_distance`])
    pub relevance_distance: f32,
}

impl From<&ChunkRecord> for SourceRef {
    fn from(chunk: &ChunkRecord) -> Self {
        Self {
            title: chunk.title.clone(),
            chunk_number: chunk.chunk_number,
            relevance_distance: chunk.relevance_distance,
        }
    }
}

/// Answer plus the sources it was grounded in.
///
/// `sources` is in the same order as the chunks returned by retrieval, so
/// consumers can correlate claims in the answer with evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Generated answer, verbatim
    pub answer: String,

    /// One entry per retrieved chunk
    pub sources: Vec<SourceRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_trims_text() {
        let query = Query::new("  When is the election?\n", 3).unwrap();
        assert_eq!(query.text(), "When is the election?");
        assert_eq!(query.chunk_limit(), 3);
    }

    #[test]
    fn test_blank_query_rejected() {
        assert!(matches!(Query::new("", 3), Err(AppError::EmptyQuery)));
        assert!(matches!(Query::new(" \t\n", 3), Err(AppError::EmptyQuery)));
    }

    #[test]
    fn test_chunk_limit_clamped() {
        assert_eq!(Query::new("q", 0).unwrap().chunk_limit(), 1);
        assert_eq!(Query::new("q", 9).unwrap().chunk_limit(), 5);
        assert_eq!(Query::new("q", 4).unwrap().chunk_limit(), 4);
    }

    #[test]
    fn test_source_ref_from_chunk() {
        let chunk = ChunkRecord {
            title: "Election Day".to_string(),
            chunk_text: "...federal election day...".to_string(),
            chunk_number: 1,
            relevance_distance: 0.30,
        };

        let source = SourceRef::from(&chunk);
        assert_eq!(source.title, "Election Day");
        assert_eq!(source.chunk_number, 1);
        assert_eq!(source.relevance_distance, 0.30);
    }

    #[test]
    fn test_answer_result_json_shape() {
        let result = AnswerResult {
            answer: "Answer".to_string(),
            sources: vec![SourceRef {
                title: "2024 US Election".to_string(),
                chunk_number: 3,
                relevance_distance: 0.12,
            }],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["sources"][0]["chunkNumber"], 3);
        assert_eq!(json["sources"][0]["title"], "2024 US Election");
        assert!(json["sources"][0].get("relevanceDistance").is_some());
    }
}
