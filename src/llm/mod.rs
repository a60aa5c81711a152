//! Model-backed collaborators: text embeddings and answer generation.

pub mod answer;
pub mod embeddings;
