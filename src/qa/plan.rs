//! Pure decision logic for the orchestrator: which backend to commit to,
//! and how to turn retrieved chunks into an answer.

use crate::classify::SectionClassifier;
use crate::models::Chunk;

/// What `answer` should return for a set of retrieved chunks.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerPlan {
    /// Nothing relevant was retrieved.
    NoInformation,
    /// The question targets a section and a chunk from it was retrieved.
    Section { keyword: String, full_section: String },
    /// Answer from all retrieved chunks; `top_chunk` is the verbatim fallback.
    Context { context: String, top_chunk: String },
}

/// Index of the backend to commit to: the first one whose initialization
/// succeeded, in strategy order.
pub fn select_backend<E>(outcomes: &[Result<(), E>]) -> Option<usize> {
    outcomes.iter().position(Result::is_ok)
}

/// Decide how to answer `question` from `chunks` (ranked best first).
pub fn plan_answer(
    question: &str,
    chunks: &[Chunk],
    classifier: &dyn SectionClassifier,
) -> AnswerPlan {
    let Some(top) = chunks.first() else {
        return AnswerPlan::NoInformation;
    };

    if let Some(keyword) = classifier.section_keyword(question) {
        if let Some(chunk) = find_section_chunk(chunks, &keyword) {
            return AnswerPlan::Section {
                full_section: chunk.full_section.clone(),
                keyword,
            };
        }
    }

    AnswerPlan::Context {
        context: chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"),
        top_chunk: top.text.clone(),
    }
}

/// First chunk, in rank order, whose section label or text mentions `keyword`.
pub fn find_section_chunk<'a>(chunks: &'a [Chunk], keyword: &str) -> Option<&'a Chunk> {
    let keyword = keyword.to_lowercase();
    chunks.iter().find(|c| {
        c.section.to_lowercase().contains(&keyword) || c.text.to_lowercase().contains(&keyword)
    })
}
