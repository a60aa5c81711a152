//! Fixed-size sliding windows with overlap, used for embedding chunks.
//!
//! Each window holds at most `size` characters. A window prefers to end at a
//! paragraph break, then a line break, then any whitespace, as long as that
//! keeps it at least half full. The next window starts `overlap` characters
//! before the previous end, moved forward to the next word start.

/// Split `text` into overlapping windows of at most `size` characters.
pub fn chunk_windows(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() || size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= size {
        return vec![text.to_string()];
    }

    let overlap = overlap.min(size / 2);
    let mut windows = Vec::new();
    let mut start = 0usize;

    loop {
        let hard_end = (start + size).min(chars.len());
        let end = if hard_end == chars.len() {
            hard_end
        } else {
            break_point(&chars, start, hard_end)
        };

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            windows.push(piece.to_string());
        }

        if end >= chars.len() {
            break;
        }

        let raw_next = end.saturating_sub(overlap).max(start + 1);
        let mut next = raw_next;
        while next < end && !chars[next - 1].is_whitespace() {
            next += 1;
        }
        start = if next >= end { raw_next } else { next };
    }

    windows
}

/// Position just after the best separator in the upper half of the window.
fn break_point(chars: &[char], start: usize, hard_end: usize) -> usize {
    let floor = start + (hard_end - start) / 2;

    if let Some(i) = (floor..hard_end)
        .rev()
        .find(|&i| chars[i] == '\n' && i > 0 && chars[i - 1] == '\n')
    {
        return i + 1;
    }
    if let Some(i) = (floor..hard_end).rev().find(|&i| chars[i] == '\n') {
        return i + 1;
    }
    if let Some(i) = (floor..hard_end).rev().find(|&i| chars[i].is_whitespace()) {
        return i + 1;
    }
    hard_end
}
