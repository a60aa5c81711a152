use parking_lot::RwLock;

/// A stored vector entry
#[derive(Debug, Clone)]
struct VectorEntry {
    section_index: usize,
    content: String,
    embedding: Vec<f32>,
}

/// In-memory vector store with cosine similarity search.
#[derive(Debug, Default)]
pub struct VectorStore {
    entries: RwLock<Vec<VectorEntry>>,
}

#[derive(Debug, Clone)]
pub struct VectorHit {
    pub section_index: usize,
    pub content: String,
    pub score: f32,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the store contents. `embeddings` must be parallel with `chunks`.
    pub fn replace(&self, chunks: &[(usize, String)], embeddings: Vec<Vec<f32>>) {
        let entries: Vec<VectorEntry> = chunks
            .iter()
            .zip(embeddings)
            .map(|((section_index, content), embedding)| VectorEntry {
                section_index: *section_index,
                content: content.clone(),
                embedding,
            })
            .collect();

        *self.entries.write() = entries;
    }

    /// Search by cosine similarity against a query embedding.
    pub fn search(&self, query_embedding: &[f32], limit: usize, min_score: f32) -> Vec<VectorHit> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &VectorEntry)> = entries
            .iter()
            .map(|e| (cosine_similarity(query_embedding, &e.embedding), e))
            .filter(|(score, _)| *score >= min_score)
            .collect();

        // Sort descending by score
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(score, e)| VectorHit {
                section_index: e.section_index,
                content: e.content.clone(),
                score,
            })
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
