//! Retriever: typed adapter over the chunk store's hybrid search.

use crate::store::ChunkStore;
use crate::types::{ChunkRecord, HybridSearch, Query};
use std::sync::Arc;
use wikiqa_core::{AppError, AppResult};

/// Issues one hybrid search per query and returns the ranked chunks.
///
/// No filtering, deduplication, re-ranking or retry happens here.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn ChunkStore>,
}

impl Retriever {
    /// Create a retriever over a shared store handle.
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        Self { store }
    }

    /// Retrieve up to `query.chunk_limit()` chunks in backend order.
    ///
    /// A store that returns more than the limit has broken its contract and
    /// yields `AppError::Retrieval`.
    pub async fn retrieve(&self, query: &Query) -> AppResult<Vec<ChunkRecord>> {
        let search = HybridSearch::for_query(query);

        let chunks = self
            .store
            .hybrid_search(&search)
            .await
            .map_err(into_retrieval_error)?;

        // Sources must mirror exactly what the store returned
        if chunks.len() > search.limit as usize {
            return Err(AppError::Retrieval(format!(
                "{} returned {} chunks for a limit of {}",
                self.store.backend_name(),
                chunks.len(),
                search.limit
            )));
        }

        tracing::debug!(
            hits = chunks.len(),
            distances = ?chunks.iter().map(|c| c.relevance_distance).collect::<Vec<_>>(),
            "Retrieved chunks"
        );

        Ok(chunks)
    }
}

/// Everything that goes wrong while searching is a retrieval failure,
/// unless it is already a connection failure.
fn into_retrieval_error(err: AppError) -> AppError {
    match err {
        AppError::Connection { .. } | AppError::Retrieval(_) => err,
        other => AppError::Retrieval(other.to_string()),
    }
}
