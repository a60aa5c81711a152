//! Resume section detection.
//!
//! A line starts a new section when it is a markdown heading, when it is
//! exactly a well-known resume heading ("Skills", "Work Experience:"), or
//! when it is an all-caps / colon-terminated line that mentions a section
//! keyword ("TECHNICAL SKILLS", "Professional Certifications:").
//! Text before the first heading is collected under [`PREAMBLE_LABEL`].

use crate::models::Section;

/// Label for text that precedes the first detected heading.
pub const PREAMBLE_LABEL: &str = "Overview";

const MAX_HEADING_CHARS: usize = 48;

const KNOWN_HEADINGS: &[&str] = &[
    "about",
    "about me",
    "summary",
    "professional summary",
    "profile",
    "professional profile",
    "skills",
    "technical skills",
    "core competencies",
    "competencies",
    "experience",
    "work experience",
    "professional experience",
    "employment",
    "employment history",
    "work history",
    "education",
    "certifications",
    "certificates",
    "licenses & certifications",
    "projects",
    "contact",
    "contact information",
    "languages",
    "awards",
    "publications",
    "interests",
    "volunteering",
];

const SECTION_KEYWORDS: &[&str] = &[
    "about",
    "summary",
    "profile",
    "skills",
    "competencies",
    "experience",
    "employment",
    "history",
    "education",
    "certifications",
    "certificates",
    "projects",
    "contact",
    "languages",
    "awards",
    "publications",
    "qualifications",
    "training",
];

/// Split resume text into labelled sections, in document order.
pub fn split_sections(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut label: Option<String> = None;
    let mut lines: Vec<&str> = Vec::new();

    for line in content.lines() {
        if let Some(heading) = heading_label(line) {
            push_section(&mut sections, label.take(), &lines);
            lines.clear();
            label = Some(heading);
        }
        lines.push(line);
    }
    push_section(&mut sections, label, &lines);

    sections
}

fn push_section(sections: &mut Vec<Section>, label: Option<String>, lines: &[&str]) {
    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        return;
    }
    sections.push(Section {
        label: label.unwrap_or_else(|| PREAMBLE_LABEL.to_string()),
        text,
    });
}

/// Return the heading label if `line` opens a section.
fn heading_label(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let is_markdown = trimmed.starts_with('#');
    let stripped = trimmed
        .trim_start_matches('#')
        .trim()
        .trim_end_matches(':')
        .trim();

    if stripped.is_empty() || stripped.chars().count() > MAX_HEADING_CHARS {
        return None;
    }

    let lower = stripped.to_lowercase();
    if is_markdown || KNOWN_HEADINGS.contains(&lower.as_str()) {
        return Some(stripped.to_string());
    }

    // Lists like "AWS, GCP, SQL" are content, not headings
    if stripped.contains(',') {
        return None;
    }

    let letters: Vec<char> = stripped.chars().filter(|c| c.is_alphabetic()).collect();
    let all_caps = letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase());
    let colon_terminated = trimmed.ends_with(':');

    if (all_caps || colon_terminated) && mentions_keyword(&lower) {
        return Some(stripped.to_string());
    }

    None
}

fn mentions_keyword(lower: &str) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| SECTION_KEYWORDS.contains(&word))
}
