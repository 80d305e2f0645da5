//! Chunk store abstraction.
//!
//! Defines the contract the retriever relies on: a hybrid search over an
//! indexed collection of text chunks.

use crate::types::{ChunkRecord, HybridSearch};
use wikiqa_core::AppResult;

/// Trait for chunk store backends.
///
/// Implementations must:
/// - return at most `search.limit` records
/// - return records in the backend's relevance order
/// - surface unreachable backends and rejected credentials as
///   `AppError::Connection`, other failures as `AppError::Retrieval`
///
/// A store handle is shared across sequential queries; any locking or
/// connection pooling is the implementation's concern.
#[async_trait::async_trait]
pub trait ChunkStore: Send + Sync {
    /// Get the backend name (e.g., "weaviate").
    fn backend_name(&self) -> &str;

    /// Run one hybrid (keyword + vector) search.
    async fn hybrid_search(&self, search: &HybridSearch) -> AppResult<Vec<ChunkRecord>>;

    /// Check that the backend is reachable and ready to serve queries.
    async fn ping(&self) -> AppResult<()>;
}
