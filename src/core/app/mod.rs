use std::time::{Duration, Instant};

use tracing::warn;

use crate::core::background::{Background, BackgroundConfig};
use crate::core::constants::WELCOME_DELAY;
use crate::core::message::Message;
use crate::core::session::ReplyState;
use crate::utils::color::detect_color_depth;
use crate::utils::logging::LoggingState;

pub mod actions;
pub mod session;
pub mod ui_state;

pub use actions::{
    apply_actions, AppAction, AppActionContext, AppActionDispatcher, AppActionEnvelope, AppCommand,
};
pub use session::SessionContext;
pub use ui_state::UiState;

/// Resolved startup settings (config file merged with CLI flags).
pub struct AppInitConfig {
    pub server_url: String,
    pub log_file: Option<String>,
    pub greeting: String,
    pub typewriter_interval: Duration,
    pub background: Option<BackgroundConfig>,
}

pub struct App {
    pub session: SessionContext,
    pub ui: UiState,
    pub backdrop: Option<Background>,
}

impl App {
    pub fn new(init: AppInitConfig, now: Instant) -> Result<Self, Box<dyn std::error::Error>> {
        let client = reqwest::Client::builder().build()?;
        let logging = LoggingState::new(init.log_file)?;

        let mut ui = UiState::new(init.greeting, Some(now + WELCOME_DELAY));
        ui.color_depth = detect_color_depth();

        Ok(Self {
            session: SessionContext::new(
                client,
                init.server_url,
                logging,
                init.typewriter_interval,
            ),
            ui,
            // Sized properly on the first frame.
            backdrop: init
                .background
                .map(|config| Background::new(config, 0.0, 0.0)),
        })
    }

    pub fn request_exit(&mut self) {
        self.ui.exit_requested = true;
    }

    pub fn get_logging_status(&self) -> String {
        self.session.logging.get_status_string()
    }

    /// Connection status shown in the panel title.
    pub fn link_label(&self) -> &'static str {
        self.session
            .active
            .as_ref()
            .map(|session| session.link.label())
            .unwrap_or("idle")
    }

    /// Add an assistant message with the typewriter effect.
    pub fn add_assistant_message(&mut self, text: &str, generation: Option<u64>, now: Instant) {
        let finished = self.ui.push_assistant_message(
            text,
            generation,
            self.session.typewriter_interval,
            now,
        );
        if let Some(message) = finished {
            self.log(&message);
        }
    }

    /// Show the reply being typed out in full and log it. The session stops
    /// extending it, so the next frame starts a new message.
    pub fn finish_reveal(&mut self) {
        if let Some(session) = self.session.active.as_mut() {
            session.reply = ReplyState::Idle;
        }
        if let Some(message) = self.ui.finish_reveal() {
            self.log(&message);
        }
    }

    pub fn add_user_message(&mut self, text: &str) {
        self.ui.push_user_message(text);
        self.log(&Message::user(text));
        self.ui.follow_bottom();
    }

    pub fn show_greeting(&mut self, now: Instant) {
        let greeting = self.ui.greeting.clone();
        self.add_assistant_message(&greeting, None, now);
    }

    /// Per-frame housekeeping: the typewriter and the startup greeting.
    /// Returns true if anything visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;

        if let Some(due) = self.ui.welcome_due {
            if now >= due {
                self.ui.welcome_due = None;
                if self.ui.messages.is_empty() {
                    self.show_greeting(now);
                    changed = true;
                }
            }
        }

        if let Some(reveal) = self.ui.reveal.as_ref() {
            let before = reveal.typewriter.revealed();
            match self.ui.tick_reveal(now) {
                Some((reveal, message)) => {
                    if let Some(generation) = reveal.generation {
                        if let Some(session) = self.session.current_mut(generation) {
                            session.reply = ReplyState::Idle;
                        }
                    }
                    self.log(&message);
                    changed = true;
                }
                None => {
                    let after = self
                        .ui
                        .reveal
                        .as_ref()
                        .map(|reveal| reveal.typewriter.revealed());
                    changed |= after != Some(before);
                }
            }
        }

        changed
    }

    fn log(&self, message: &Message) {
        if let Err(err) = self.session.logging.log_message(message) {
            warn!(error = %err, "failed to write transcript log");
        }
    }

    pub fn pulse_backdrop(&mut self) {
        if let Some(backdrop) = self.backdrop.as_mut() {
            backdrop.create_pulse();
        }
    }

    #[cfg(test)]
    pub fn new_test_app() -> Self {
        Self {
            session: SessionContext::new(
                reqwest::Client::new(),
                "http://localhost:8000".to_string(),
                LoggingState::disabled(),
                Duration::from_millis(20),
            ),
            ui: UiState::new(crate::core::constants::WELCOME_MESSAGE.to_string(), None),
            backdrop: None,
        }
    }
}
