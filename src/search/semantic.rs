use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::chunking::{semantic_chunks, split_sections};
use crate::config::SearchConfig;
use crate::llm::embeddings::Embedder;
use crate::models::{BackendKind, Chunk, Section};
use crate::search::vector::VectorStore;
use crate::search::SearchBackend;

/// Semantic search tier: overlapping windows embedded into a vector store.
pub struct SemanticSearch {
    embedder: Arc<dyn Embedder>,
    store: VectorStore,
    sections: RwLock<Option<Vec<Section>>>,
    chunk_size: usize,
    chunk_overlap: usize,
    min_score: f32,
}

impl SemanticSearch {
    pub fn new(embedder: Arc<dyn Embedder>, config: &SearchConfig) -> Self {
        Self {
            embedder,
            store: VectorStore::new(),
            sections: RwLock::new(None),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            min_score: config.min_similarity,
        }
    }
}

#[async_trait]
impl SearchBackend for SemanticSearch {
    fn kind(&self) -> BackendKind {
        BackendKind::Semantic
    }

    fn is_ready(&self) -> bool {
        self.sections.read().is_some()
    }

    async fn initialize(&self, content: &str) -> Result<()> {
        let sections = split_sections(content);
        let chunks: Vec<(usize, String)> =
            semantic_chunks(&sections, self.chunk_size, self.chunk_overlap)
                .into_iter()
                .map(|c| (c.section_index, c.content))
                .collect();

        if chunks.is_empty() {
            anyhow::bail!("Resume content produced no chunks");
        }

        let texts: Vec<String> = chunks.iter().map(|(_, text)| text.clone()).collect();
        let embeddings = self
            .embedder
            .embed(&texts)
            .await
            .context("Failed to embed resume chunks")?;

        if embeddings.len() != chunks.len() {
            anyhow::bail!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            );
        }

        self.store.replace(&chunks, embeddings);
        tracing::info!(
            "Vector store ready: {} chunks across {} sections",
            self.store.entry_count(),
            sections.len()
        );
        *self.sections.write() = Some(sections);
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Chunk>> {
        if !self.is_ready() {
            anyhow::bail!("Vector store has not been initialized");
        }

        let query_embedding = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .context("Failed to embed question")?
            .into_iter()
            .next()
            .context("No embedding returned")?;

        let hits = self.store.search(&query_embedding, top_k, self.min_score);

        let sections = self.sections.read();
        let sections = sections.as_deref().unwrap_or_default();

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let section = sections.get(hit.section_index)?;
                Some(Chunk {
                    text: hit.content,
                    section: section.label.clone(),
                    full_section: section.text.clone(),
                    score: hit.score,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Bag-of-keywords embedder: one dimension per vocabulary word.
    struct KeywordEmbedder {
        calls: AtomicUsize,
    }

    const VOCAB: &[&str] = &["rust", "go", "university", "degree", "acme", "engineer"];

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let lower = t.to_lowercase();
                    VOCAB
                        .iter()
                        .map(|w| if lower.contains(w) { 1.0 } else { 0.0 })
                        .collect()
                })
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            anyhow::bail!("connection refused")
        }
    }

    const RESUME: &str = "SKILLS\nRust and Go\n\nEDUCATION\nUniversity degree in physics\n\nEXPERIENCE\nAcme engineer";

    fn backend(embedder: Arc<dyn Embedder>) -> SemanticSearch {
        SemanticSearch::new(embedder, &SearchConfig::default())
    }

    #[tokio::test]
    async fn test_search_returns_matching_section() {
        let embedder = Arc::new(KeywordEmbedder {
            calls: AtomicUsize::new(0),
        });
        let search = backend(embedder.clone());
        search.initialize(RESUME).await.unwrap();
        assert!(search.is_ready());

        let hits = search.search("which university degree?", 15).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].section, "EDUCATION");
        assert_eq!(hits[0].full_section, "EDUCATION\nUniversity degree in physics");
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_results_respect_threshold_and_limit() {
        let search = backend(Arc::new(KeywordEmbedder {
            calls: AtomicUsize::new(0),
        }));
        search.initialize(RESUME).await.unwrap();

        let hits = search.search("rust go university acme", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.score >= 0.1));
        assert!(hits[0].score >= hits[1].score);

        // Nothing in the vocabulary: every similarity is zero
        assert!(search.search("hobbies", 15).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_embedder_fails_initialize() {
        let search = backend(Arc::new(FailingEmbedder));
        assert!(search.initialize(RESUME).await.is_err());
        assert!(!search.is_ready());
        assert!(search.search("rust", 5).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_content_fails_initialize() {
        let search = backend(Arc::new(FailingEmbedder));
        let err = search.initialize("").await.unwrap_err();
        assert!(err.to_string().contains("no chunks"));
    }
}
