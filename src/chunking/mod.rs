//! Resume chunking: section detection, then fixed windows for the semantic
//! tier or paragraphs for the lexical tier.

pub mod fallback;
pub mod sections;
pub mod window;

use crate::models::Section;

pub use sections::split_sections;

/// Output of the chunking process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutput {
    pub content: String,
    /// Index into the section list the chunk was cut from.
    pub section_index: usize,
}

/// Overlapping fixed-size windows over every section.
pub fn semantic_chunks(sections: &[Section], size: usize, overlap: usize) -> Vec<ChunkOutput> {
    sections
        .iter()
        .enumerate()
        .flat_map(|(section_index, section)| {
            window::chunk_windows(&section.text, size, overlap)
                .into_iter()
                .map(move |content| ChunkOutput {
                    content,
                    section_index,
                })
        })
        .collect()
}

/// Paragraph chunks over every section.
pub fn lexical_chunks(sections: &[Section], budget: usize) -> Vec<ChunkOutput> {
    sections
        .iter()
        .enumerate()
        .flat_map(|(section_index, section)| {
            fallback::chunk_paragraphs(&section.text, budget)
                .into_iter()
                .map(move |content| ChunkOutput {
                    content,
                    section_index,
                })
        })
        .collect()
}
