//! Inline `**bold**` markup.
//!
//! Matching is non-greedy and stays on one line: an opening `**` whose partner
//! only appears after a line break is left as literal text, and the scan
//! resumes one character later.

use memchr::memchr;
use memchr::memmem::Finder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain(String),
    Emphasis(String),
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Plain(text) | Segment::Emphasis(text) => text,
        }
    }

    pub fn is_emphasis(&self) -> bool {
        matches!(self, Segment::Emphasis(_))
    }

    fn with_text(&self, text: String) -> Segment {
        match self {
            Segment::Plain(_) => Segment::Plain(text),
            Segment::Emphasis(_) => Segment::Emphasis(text),
        }
    }
}

/// Split `text` into plain and emphasized runs.
///
/// Text without a complete `**` pair comes back as a single plain segment
/// equal to the input.
pub fn format_bold(text: &str) -> Vec<Segment> {
    let bytes = text.as_bytes();
    let marker = Finder::new(b"**");
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut search_from = 0;

    while let Some(rel) = marker.find(&bytes[search_from..]) {
        let open = search_from + rel;
        let inner_start = open + 2;
        let line_end = memchr(b'\n', &bytes[inner_start..])
            .map_or(bytes.len(), |pos| inner_start + pos);

        match marker.find(&bytes[inner_start..line_end]) {
            Some(close_rel) => {
                let close = inner_start + close_rel;
                if open > plain_start {
                    segments.push(Segment::Plain(text[plain_start..open].to_string()));
                }
                segments.push(Segment::Emphasis(text[inner_start..close].to_string()));
                plain_start = close + 2;
                search_from = plain_start;
            }
            // `*` is ASCII, so open + 1 is always a char boundary.
            None => search_from = open + 1,
        }
    }

    if plain_start < text.len() || segments.is_empty() {
        segments.push(Segment::Plain(text[plain_start..].to_string()));
    }
    segments
}

/// Number of characters the segments display (markers excluded).
pub fn visible_len(segments: &[Segment]) -> usize {
    segments.iter().map(|seg| seg.text().chars().count()).sum()
}

/// The first `count` visible characters, keeping each run's emphasis.
pub fn reveal(segments: &[Segment], count: usize) -> Vec<Segment> {
    let mut remaining = count;
    let mut revealed = Vec::new();

    for segment in segments {
        if remaining == 0 {
            break;
        }
        let len = segment.text().chars().count();
        if len <= remaining {
            revealed.push(segment.clone());
            remaining -= len;
        } else {
            let partial: String = segment.text().chars().take(remaining).collect();
            revealed.push(segment.with_text(partial));
            remaining = 0;
        }
    }
    revealed
}
