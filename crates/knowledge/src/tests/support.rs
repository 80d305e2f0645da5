//! Deterministic stand-ins for the chunk store and generation backend.

use crate::store::ChunkStore;
use crate::types::{ChunkRecord, HybridSearch};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use wikiqa_core::{AppError, AppResult};
use wikiqa_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};

type ErrorFactory = Box<dyn Fn() -> AppError + Send + Sync>;

/// Build a chunk record.
pub fn chunk(title: &str, text: &str, number: i64, distance: f32) -> ChunkRecord {
    ChunkRecord {
        title: title.to_string(),
        chunk_text: text.to_string(),
        chunk_number: number,
        relevance_distance: distance,
    }
}

/// The two chunks of the election example.
pub fn election_chunks() -> Vec<ChunkRecord> {
    vec![
        chunk("2024 US Election", "...held November 5, 2024...", 3, 0.12),
        chunk("Election Day", "...federal election day...", 1, 0.30),
    ]
}

/// Chunk store returning fixed records in a fixed order.
pub struct StubStore {
    chunks: Vec<ChunkRecord>,
    honor_limit: bool,
    error: Option<ErrorFactory>,
    calls: AtomicUsize,
    searches: Mutex<Vec<HybridSearch>>,
}

impl StubStore {
    /// Return up to `limit` of `chunks`, like a well-behaved backend.
    pub fn returning(chunks: Vec<ChunkRecord>) -> Self {
        Self {
            chunks,
            honor_limit: true,
            error: None,
            calls: AtomicUsize::new(0),
            searches: Mutex::new(Vec::new()),
        }
    }

    /// Return every chunk regardless of the requested limit.
    pub fn overfull(chunks: Vec<ChunkRecord>) -> Self {
        Self {
            honor_limit: false,
            ..Self::returning(chunks)
        }
    }

    /// Fail every search with the produced error.
    pub fn failing(error: impl Fn() -> AppError + Send + Sync + 'static) -> Self {
        Self {
            error: Some(Box::new(error)),
            ..Self::returning(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn searches(&self) -> Vec<HybridSearch> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChunkStore for StubStore {
    fn backend_name(&self) -> &str {
        "stub"
    }

    async fn hybrid_search(&self, search: &HybridSearch) -> AppResult<Vec<ChunkRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.searches.lock().unwrap().push(search.clone());

        if let Some(ref error) = self.error {
            return Err(error());
        }

        let limit = if self.honor_limit {
            search.limit as usize
        } else {
            usize::MAX
        };
        Ok(self.chunks.iter().take(limit).cloned().collect())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Generation backend returning a fixed answer.
pub struct StubLlm {
    answer: String,
    error: Option<ErrorFactory>,
    prompts: Mutex<Vec<LlmRequest>>,
}

impl StubLlm {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            error: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: impl Fn() -> AppError + Send + Sync + 'static) -> Self {
        Self {
            error: Some(Box::new(error)),
            ..Self::answering("")
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for StubLlm {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.clone());

        if let Some(ref error) = self.error {
            return Err(error());
        }

        Ok(LlmResponse {
            content: self.answer.clone(),
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
        })
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
