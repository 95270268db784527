//! Transcript layout for the chat panel.
//!
//! Lines are pre-wrapped here instead of relying on `Paragraph::wrap`, so the
//! renderer knows the exact line count for scrolling. Wrapping happens at
//! word boundaries; words wider than the panel are split by display width.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::app::UiState;
use crate::core::constants::TYPING_INDICATOR;
use crate::core::markup::{format_bold, reveal, Segment};
use crate::core::message::{Message, Sender};

const USER_PREFIX: &str = "You: ";

#[derive(Debug, Clone, Copy)]
pub struct TranscriptStyle {
    pub user: Style,
    pub assistant: Style,
    pub indicator: Style,
}

impl Default for TranscriptStyle {
    fn default() -> Self {
        Self {
            user: Style::default().fg(Color::Cyan),
            assistant: Style::default().fg(Color::White),
            indicator: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        }
    }
}

/// Build every visible transcript line for a panel `width` columns wide.
pub fn build_lines(ui: &UiState, width: u16, style: &TranscriptStyle) -> Vec<Line<'static>> {
    let width = usize::from(width).max(1);
    let mut lines = Vec::new();

    for (index, message) in ui.messages.iter().enumerate() {
        if index > 0 {
            lines.push(Line::default());
        }
        let segments = message_segments(message, ui.revealed_chars(index));
        let base = match message.sender {
            Sender::User => style.user,
            Sender::Assistant => style.assistant,
        };
        lines.extend(wrap_segments(&segments, base, width));
    }

    if ui.awaiting_reply {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(TYPING_INDICATOR, style.indicator)));
    }

    lines
}

/// Segments to draw for a message, cut to `revealed` visible characters while it is typing.
fn message_segments(message: &Message, revealed: Option<usize>) -> Vec<Segment> {
    let mut segments = format_bold(&message.text);
    if let Some(count) = revealed {
        segments = reveal(&segments, count);
    }
    if message.sender.is_user() {
        segments.insert(0, Segment::Emphasis(USER_PREFIX.to_string()));
    }
    segments
}

struct LineBuilder {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    used: usize,
    width: usize,
    /// Whitespace held back until the next word is known to fit on the same line.
    pending_space: Option<(String, Style)>,
    after_wrap: bool,
}

impl LineBuilder {
    fn new(width: usize) -> Self {
        Self {
            lines: Vec::new(),
            spans: Vec::new(),
            used: 0,
            width,
            pending_space: None,
            after_wrap: false,
        }
    }

    fn push(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        self.used += text.width();
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.content.to_mut().push_str(text),
            _ => self.spans.push(Span::styled(text.to_string(), style)),
        }
    }

    fn break_line(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        self.used = 0;
    }

    fn wrap(&mut self) {
        self.pending_space = None;
        self.break_line();
        self.after_wrap = true;
    }

    fn newline(&mut self) {
        self.pending_space = None;
        self.break_line();
        self.after_wrap = false;
    }

    fn remaining(&self) -> usize {
        self.width.saturating_sub(self.used)
    }

    fn push_space(&mut self, space: &str, style: Style) {
        if self.used == 0 {
            // Indentation survives; spaces at a wrap point do not.
            if !self.after_wrap && space.width() <= self.remaining() {
                self.push(space, style);
            }
            return;
        }
        match self.pending_space.as_mut() {
            Some((pending, _)) => pending.push_str(space),
            None => self.pending_space = Some((space.to_string(), style)),
        }
    }

    /// Place one word, wrapping first if it would overflow.
    fn push_word(&mut self, word: &str, style: Style) {
        let word_width = word.width();
        let pending_width = self
            .pending_space
            .as_ref()
            .map(|(space, _)| space.width())
            .unwrap_or(0);

        if pending_width + word_width <= self.remaining() {
            if let Some((space, space_style)) = self.pending_space.take() {
                self.push(&space, space_style);
            }
            self.push(word, style);
            return;
        }

        if self.used > 0 {
            self.wrap();
        }
        if word_width <= self.remaining() {
            self.push(word, style);
            return;
        }
        for ch in word.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if ch_width > self.remaining() && self.used > 0 {
                self.wrap();
            }
            let mut buf = [0u8; 4];
            self.push(ch.encode_utf8(&mut buf), style);
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.break_line();
        self.lines
    }
}

fn wrap_segments(segments: &[Segment], base: Style, width: usize) -> Vec<Line<'static>> {
    let mut builder = LineBuilder::new(width);

    for segment in segments {
        let style = if segment.is_emphasis() {
            base.add_modifier(Modifier::BOLD)
        } else {
            base
        };

        let mut first = true;
        for paragraph in segment.text().split('\n') {
            if !first {
                builder.newline();
            }
            first = false;
            for token in split_keep_whitespace(paragraph) {
                if token.starts_with(char::is_whitespace) {
                    builder.push_space(token, style);
                } else {
                    builder.push_word(token, style);
                }
            }
        }
    }

    builder.finish()
}

/// Split into alternating runs of whitespace and non-whitespace.
fn split_keep_whitespace(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let is_space = first.is_whitespace();
        let end = rest
            .char_indices()
            .find(|(_, ch)| ch.is_whitespace() != is_space)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let (token, tail) = rest.split_at(end);
        rest = tail;
        Some(token)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::create_test_app;
    use std::time::{Duration, Instant};

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let segments = vec![Segment::Plain("the quick brown fox".into())];
        let lines = wrap_segments(&segments, Style::default(), 10);
        assert_eq!(plain(&lines), ["the quick", "brown fox"]);
    }

    #[test]
    fn splits_words_longer_than_width() {
        let segments = vec![Segment::Plain("abcdefghij".into())];
        let lines = wrap_segments(&segments, Style::default(), 4);
        assert_eq!(plain(&lines), ["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wide_characters_count_double() {
        let segments = vec![Segment::Plain("田田田".into())];
        let lines = wrap_segments(&segments, Style::default(), 4);
        assert_eq!(plain(&lines), ["田田", "田"]);
    }

    #[test]
    fn emphasis_is_bold_and_newlines_break() {
        let segments = format_bold("use **mulch**\nthen water");
        let lines = wrap_segments(&segments, Style::default(), 40);
        assert_eq!(plain(&lines), ["use mulch", "then water"]);
        let bold = &lines[0].spans[1];
        assert_eq!(bold.content, "mulch");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn user_lines_are_prefixed_and_indicator_follows() {
        let mut app = create_test_app();
        app.add_user_message("hello");
        app.ui.awaiting_reply = true;

        let lines = build_lines(&app.ui, 40, &TranscriptStyle::default());
        assert_eq!(plain(&lines), ["You: hello", "", "..."]);
    }

    #[test]
    fn partially_revealed_reply_hides_markers() {
        let mut app = create_test_app();
        let start = Instant::now();
        app.add_assistant_message("**Yes** sow now", None, start);
        app.tick(start + Duration::from_millis(60));

        let lines = build_lines(&app.ui, 40, &TranscriptStyle::default());
        assert_eq!(plain(&lines), ["Yes"]);
    }
}
