use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders};
use tui_textarea::TextArea;

use crate::core::markup::{format_bold, visible_len};
use crate::core::message::Message;
use crate::core::typewriter::Typewriter;
use crate::utils::color::ColorDepth;

/// The assistant message currently being typed out.
#[derive(Debug, Clone)]
pub struct Reveal {
    pub index: usize,
    pub typewriter: Typewriter,
    /// Session that produced the message; `None` for local greetings and errors.
    pub generation: Option<u64>,
}

pub struct UiState {
    pub messages: VecDeque<Message>,
    pub reveal: Option<Reveal>,
    textarea: TextArea<'static>,
    pub chat_visible: bool,
    /// Show the "..." indicator until the first reply frame.
    pub awaiting_reply: bool,
    /// Top transcript line while the user has scrolled away; `None` follows the bottom.
    pub scroll_top: Option<u16>,
    /// Largest valid `scroll_top`, recorded by the renderer each frame.
    pub max_scroll_top: u16,
    pub transcript_height: u16,
    pub greeting: String,
    pub welcome_due: Option<Instant>,
    /// Re-add the greeting once the session started by a clear has settled.
    pub greet_when_settled: bool,
    pub status: Option<String>,
    pub exit_requested: bool,
    pub color_depth: ColorDepth,
}

impl UiState {
    pub fn new(greeting: String, welcome_due: Option<Instant>) -> Self {
        let mut ui = Self {
            messages: VecDeque::new(),
            reveal: None,
            textarea: TextArea::default(),
            chat_visible: false,
            awaiting_reply: false,
            scroll_top: None,
            max_scroll_top: 0,
            transcript_height: 0,
            greeting,
            welcome_due,
            greet_when_settled: false,
            status: None,
            exit_requested: false,
            color_depth: ColorDepth::Truecolor,
        };
        ui.configure_textarea();
        ui
    }

    fn configure_textarea(&mut self) {
        self.textarea.set_block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        self.textarea.set_cursor_line_style(Style::default());
        self.textarea
            .set_placeholder_text("Ask about crops, soil, weather...");
    }

    pub fn textarea(&self) -> &TextArea<'static> {
        &self.textarea
    }

    pub fn get_input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    #[cfg(test)]
    pub fn set_input_text(&mut self, text: &str) {
        self.clear_input();
        self.textarea.insert_str(text);
    }

    pub fn clear_input(&mut self) {
        self.textarea = TextArea::default();
        self.configure_textarea();
    }

    pub fn apply_textarea_edit<F>(&mut self, f: F)
    where
        F: FnOnce(&mut TextArea<'static>),
    {
        f(&mut self.textarea);
    }

    pub fn insert_into_input(&mut self, text: &str) {
        // Single-line input: pasted newlines become spaces.
        let flattened = text.replace('\n', " ");
        self.textarea.insert_str(flattened);
    }

    pub fn push_user_message(&mut self, text: &str) {
        self.messages.push_back(Message::user(text));
    }

    /// Append an assistant message and start typing it out. A reveal still
    /// running for an earlier message is completed first; that message is
    /// returned so the caller can log it.
    pub fn push_assistant_message(
        &mut self,
        text: &str,
        generation: Option<u64>,
        interval: Duration,
        now: Instant,
    ) -> Option<Message> {
        let finished = self.finish_reveal();
        self.messages.push_back(Message::assistant(text));
        self.reveal = Some(Reveal {
            index: self.messages.len() - 1,
            typewriter: Typewriter::new(interval, now),
            generation,
        });
        finished
    }

    /// Extend the message being revealed. Returns false if nothing is being revealed.
    pub fn append_to_reveal(&mut self, chunk: &str) -> bool {
        let Some(reveal) = self.reveal.as_ref() else {
            return false;
        };
        match self.messages.get_mut(reveal.index) {
            Some(message) => {
                message.text.push_str(chunk);
                true
            }
            None => false,
        }
    }

    /// Jump the current reveal to the end.
    pub fn finish_reveal(&mut self) -> Option<Message> {
        let reveal = self.reveal.take()?;
        self.messages.get(reveal.index).cloned()
    }

    /// Visible characters of the message at `index`; fully revealed messages report `None`.
    pub fn revealed_chars(&self, index: usize) -> Option<usize> {
        self.reveal
            .as_ref()
            .filter(|reveal| reveal.index == index)
            .map(|reveal| reveal.typewriter.revealed())
    }

    /// Advance the typewriter. Returns the reveal that just completed, with its message.
    pub fn tick_reveal(&mut self, now: Instant) -> Option<(Reveal, Message)> {
        let reveal = self.reveal.as_mut()?;
        let message = self.messages.get(reveal.index)?;
        let total = visible_len(&format_bold(&message.text));
        if !reveal.typewriter.advance(now, total) {
            return None;
        }
        let message = message.clone();
        self.reveal.take().map(|reveal| (reveal, message))
    }

    pub fn clear_transcript(&mut self) {
        self.messages.clear();
        self.reveal = None;
        self.awaiting_reply = false;
        self.scroll_top = None;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        let current = self.scroll_top.unwrap_or(self.max_scroll_top);
        self.scroll_top = Some(current.saturating_sub(lines));
    }

    pub fn scroll_down(&mut self, lines: u16) {
        if let Some(top) = self.scroll_top {
            let next = top.saturating_add(lines);
            self.scroll_top = if next >= self.max_scroll_top {
                None
            } else {
                Some(next)
            };
        }
    }

    pub fn follow_bottom(&mut self) {
        self.scroll_top = None;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }
}
