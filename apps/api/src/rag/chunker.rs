//! Recursive character splitter.
//!
//! Tries each separator in order, splitting on the first one present in the text, and
//! recursing into any piece still longer than `chunk_size` with the remaining separators.
//! Adjacent small pieces are merged back into chunks of at most `chunk_size` characters,
//! keeping roughly `chunk_overlap` characters of trailing context between chunks.
//! Separators stay attached to the start of the piece that follows them.
//!
//! All lengths are counted in characters, not bytes.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separators: Vec<&'static str>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            separators: vec!["\n\n", "\n", ". ", " ", ""],
        }
    }
}

/// Splits `text` into overlapping chunks. Returns no chunks for blank text.
pub fn chunk_text(text: &str, config: &ChunkerConfig) -> Vec<String> {
    split_recursive(text, &config.separators, config)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_recursive(text: &str, separators: &[&'static str], config: &ChunkerConfig) -> Vec<String> {
    // Pick the first separator that occurs in the text; "" always matches.
    let mut separator = separators.last().copied().unwrap_or("");
    let mut remaining: &[&'static str] = &[];
    for (i, &sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            separator = sep;
            break;
        }
        if text.contains(sep) {
            separator = sep;
            remaining = &separators[i + 1..];
            break;
        }
    }

    let mut chunks = Vec::new();
    let mut small: Vec<&str> = Vec::new();

    for piece in split_keeping_separator(text, separator) {
        if char_len(piece) < config.chunk_size {
            small.push(piece);
            continue;
        }
        if !small.is_empty() {
            chunks.extend(merge_pieces(&small, config));
            small.clear();
        }
        if remaining.is_empty() {
            chunks.push(piece.to_string());
        } else {
            chunks.extend(split_recursive(piece, remaining, config));
        }
    }
    if !small.is_empty() {
        chunks.extend(merge_pieces(&small, config));
    }

    chunks
}

/// Splits on `separator`, attaching each separator to the start of the following piece.
/// An empty separator splits into single characters. Empty pieces are dropped.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

/// Greedily merges pieces into chunks, carrying up to `chunk_overlap` characters forward.
fn merge_pieces(pieces: &[&str], config: &ChunkerConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let len = char_len(piece);

        if total + len > config.chunk_size && !window.is_empty() {
            push_chunk(&mut chunks, &window);
            while total > config.chunk_overlap || (total + len > config.chunk_size && total > 0) {
                match window.pop_front() {
                    Some(front) => total -= char_len(front),
                    None => break,
                }
            }
        }

        window.push_back(piece);
        total += len;
    }
    push_chunk(&mut chunks, &window);

    chunks
}

fn push_chunk(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
