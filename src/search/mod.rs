//! Retrieval backends. Each tier builds its own index over the resume text
//! and answers top-K queries with [`Chunk`]s ranked by descending score.

pub mod lexical;
pub mod semantic;
pub mod vector;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{BackendKind, Chunk};

/// A retrieval strategy the orchestrator can initialize and query.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Whether `initialize` has completed successfully.
    fn is_ready(&self) -> bool;

    /// Build the index over the full resume text.
    async fn initialize(&self, content: &str) -> Result<()>;

    /// Return at most `top_k` chunks at or above the backend's minimum score.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Chunk>>;
}

/// Sort descending by score, drop entries under `min_score`, keep `top_k`.
pub(crate) fn rank_and_trim(mut chunks: Vec<Chunk>, top_k: usize, min_score: f32) -> Vec<Chunk> {
    chunks.retain(|c| c.score >= min_score);
    chunks.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    chunks.truncate(top_k);
    chunks
}
