//! Paragraph chunker for the lexical fallback tier.
//!
//! Three-tier splitting strategy:
//! 1. Split at blank lines (natural paragraph boundaries)
//! 2. If a paragraph exceeds the character budget, split at single newlines
//! 3. Last resort: split an oversized line into windows

use super::window::chunk_windows;

/// Chunk section text into paragraphs of at most `budget` characters.
pub fn chunk_paragraphs(content: &str, budget: usize) -> Vec<String> {
    if content.trim().is_empty() || budget == 0 {
        return Vec::new();
    }

    let lines: Vec<&str> = content.lines().collect();
    let mut chunks = Vec::new();

    for seg in split_at_blank_lines(&lines) {
        let seg_chars: usize = seg.iter().map(|l| l.chars().count()).sum::<usize>() + seg.len() - 1;
        if seg_chars <= budget {
            chunks.push(seg.join("\n"));
        } else {
            split_large_segment(&seg, budget, &mut chunks);
        }
    }

    chunks
}

fn split_at_blank_lines<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut segments = Vec::new();
    let mut current: Vec<&'a str> = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.trim_end());
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

fn split_large_segment(lines: &[&str], budget: usize, chunks: &mut Vec<String>) {
    let mut current: Vec<&str> = Vec::new();
    let mut chars = 0usize;

    for line in lines {
        let line_chars = line.chars().count();

        if line_chars > budget {
            if !current.is_empty() {
                chunks.push(current.join("\n"));
                current.clear();
                chars = 0;
            }
            chunks.extend(chunk_windows(line, budget, 0));
            continue;
        }

        // +1 for the joining newline
        if !current.is_empty() && chars + 1 + line_chars > budget {
            chunks.push(current.join("\n"));
            current.clear();
            chars = 0;
        }
        if !current.is_empty() {
            chars += 1;
        }
        chars += line_chars;
        current.push(line);
    }

    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_empty() {
        assert!(chunk_paragraphs("", 100).is_empty());
        assert!(chunk_paragraphs("   \n\n  ", 100).is_empty());
    }

    #[test]
    fn test_splits_at_blank_lines() {
        let chunks = chunk_paragraphs("Skills\nGo, Rust\n\n\nLanguages\nEnglish", 1000);
        assert_eq!(chunks, vec!["Skills\nGo, Rust", "Languages\nEnglish"]);
    }

    #[test]
    fn test_large_paragraph_split_by_lines() {
        let lines: Vec<String> = (0..40).map(|i| format!("bullet point number {i}")).collect();
        let content = lines.join("\n");
        let chunks = chunk_paragraphs(&content, 200);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 200));
        assert!(chunks[0].starts_with("bullet point number 0"));
    }

    #[test]
    fn test_oversized_line_windowed() {
        let line = "word ".repeat(100);
        let chunks = chunk_paragraphs(&line, 120);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 120));
    }
}
