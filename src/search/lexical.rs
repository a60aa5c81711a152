use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::*;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy};

use crate::chunking::{lexical_chunks, split_sections};
use crate::config::SearchConfig;
use crate::models::{BackendKind, Chunk, Section};
use crate::search::{rank_and_trim, SearchBackend};

/// BM25 scores are unbounded; `s / (s + BM25_SATURATION)` maps them into
/// `[0, 1)` so they can be compared against the text similarity threshold.
const BM25_SATURATION: f32 = 1.0;

const WRITER_MEMORY_BYTES: usize = 20_000_000;

/// Lexical search tier: BM25 over paragraph chunks in an in-memory tantivy index.
pub struct LexicalSearch {
    chunk_budget: usize,
    min_score: f32,
    index: RwLock<Option<Arc<LexicalIndex>>>,
}

struct LexicalIndex {
    index: Index,
    reader: IndexReader,
    // Field handles
    f_section: Field,
    f_section_index: Field,
    f_content: Field,
    sections: Vec<Section>,
}

impl LexicalSearch {
    pub fn new(chunk_budget: usize, min_score: f32) -> Self {
        Self {
            chunk_budget,
            min_score,
            index: RwLock::new(None),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.chunk_size, config.text_min_similarity)
    }
}

#[async_trait]
impl SearchBackend for LexicalSearch {
    fn kind(&self) -> BackendKind {
        BackendKind::Lexical
    }

    fn is_ready(&self) -> bool {
        self.index.read().is_some()
    }

    async fn initialize(&self, content: &str) -> Result<()> {
        let content = content.to_string();
        let budget = self.chunk_budget;
        let built = tokio::task::spawn_blocking(move || LexicalIndex::build(&content, budget))
            .await
            .context("Lexical index build task failed")??;

        tracing::info!(
            "Lexical index ready: {} sections indexed",
            built.sections.len()
        );
        *self.index.write() = Some(Arc::new(built));
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Chunk>> {
        let index = self
            .index
            .read()
            .clone()
            .context("Lexical index has not been initialized")?;

        if top_k == 0 {
            return Ok(Vec::new());
        }

        let q = query.to_string();
        let hits = tokio::task::spawn_blocking(move || index.search(&q, top_k))
            .await
            .context("Lexical search task failed")??;

        Ok(rank_and_trim(hits, top_k, self.min_score))
    }
}

impl LexicalIndex {
    fn build(content: &str, chunk_budget: usize) -> Result<Self> {
        let sections = split_sections(content);
        let chunks = lexical_chunks(&sections, chunk_budget);
        if chunks.is_empty() {
            anyhow::bail!("Resume content produced no chunks");
        }

        let mut schema_builder = Schema::builder();
        let f_section = schema_builder.add_text_field("section", TEXT | STORED);
        let f_section_index =
            schema_builder.add_u64_field("section_index", NumericOptions::default() | STORED);
        let f_content = schema_builder.add_text_field("content", TEXT | STORED);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);
        let mut writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_MEMORY_BYTES)
            .context("Failed to create index writer")?;

        for chunk in &chunks {
            writer.add_document(doc!(
                f_section => sections[chunk.section_index].label.clone(),
                f_section_index => chunk.section_index as u64,
                f_content => chunk.content.clone(),
            ))?;
        }
        writer.commit().context("Failed to commit index")?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .context("Failed to create reader")?;

        Ok(Self {
            index,
            reader,
            f_section,
            f_section_index,
            f_content,
            sections,
        })
    }

    /// Raw BM25 hits with normalized scores, best first.
    fn search(&self, query_str: &str, limit: usize) -> Result<Vec<Chunk>> {
        let searcher = self.reader.searcher();

        let query_parser = QueryParser::for_index(&self.index, vec![self.f_content, self.f_section]);
        // Questions carry punctuation the strict grammar rejects ("skills?")
        let (query, errors) = query_parser.parse_query_lenient(query_str);
        if !errors.is_empty() {
            tracing::debug!("Lenient query parse dropped {} fragments", errors.len());
        }

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .context("Search failed")?;

        let mut hits = Vec::with_capacity(top_docs.len());

        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .context("Failed to retrieve document")?;

            let section_index = doc
                .get_first(self.f_section_index)
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as usize;

            let Some(section) = self.sections.get(section_index) else {
                continue;
            };

            let text = doc
                .get_first(self.f_content)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            let label = doc
                .get_first(self.f_section)
                .and_then(|v| v.as_str())
                .unwrap_or(section.label.as_str())
                .to_string();

            hits.push(Chunk {
                text,
                section: label,
                full_section: section.text.clone(),
                score: score / (score + BM25_SATURATION),
            });
        }

        Ok(hits)
    }
}
