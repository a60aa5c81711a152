use serde::{Deserialize, Serialize};
use std::fmt;

/// The resume data file. Only `resume_content` is read.
#[derive(Debug, Clone, Deserialize)]
pub struct ResumeDocument {
    pub resume_content: String,
}

/// A labelled section of the resume, heading line included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub label: String,
    pub text: String,
}

/// A retrieved piece of resume text
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub text: String,
    /// Label of the section this chunk came from
    pub section: String,
    /// Full text of that section
    pub full_section: String,
    pub score: f32,
}

/// Which retrieval tier serves questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Semantic,
    Lexical,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Semantic => f.write_str("semantic"),
            BackendKind::Lexical => f.write_str("lexical"),
        }
    }
}

/// Read-only view of the orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QaStatus {
    pub initialized: bool,
    pub using_fallback: bool,
    pub backend: Option<BackendKind>,
}

/// Ask request
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Ask response
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
}
