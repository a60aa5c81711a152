//! Section-question detection.
//!
//! "Tell me about your skills" should be answered with the whole Skills
//! section rather than a single retrieved chunk. A classifier maps the
//! question to the lower-cased section keyword it asks about, if any.

use regex::Regex;

/// Decides whether a question asks for a whole resume section.
pub trait SectionClassifier: Send + Sync {
    /// The lower-cased section keyword the question targets, if any.
    fn section_keyword(&self, question: &str) -> Option<String>;
}

const SECTION_PATTERN: &str = r"(?i)(?:what|tell me about|information on|details about|list|share) .* (skills|experience|education|certifications|profile|about|contact|competencies|work|job|technical)";

/// Keyword classifier driven by a single case-insensitive pattern.
#[derive(Debug, Clone)]
pub struct RegexSectionClassifier {
    pattern: Regex,
}

impl RegexSectionClassifier {
    /// Classifier with a custom pattern. Capture group 1 must hold the keyword.
    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Default for RegexSectionClassifier {
    fn default() -> Self {
        Self {
            pattern: Regex::new(SECTION_PATTERN).expect("section pattern is valid"),
        }
    }
}

impl SectionClassifier for RegexSectionClassifier {
    fn section_keyword(&self, question: &str) -> Option<String> {
        self.pattern
            .captures(question)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_lowercase())
    }
}
