mod input;
mod socket;

use std::time::Instant;

use ratatui::crossterm::event::KeyEvent;
use tokio::sync::mpsc;

use super::App;
use crate::core::chat_socket::{EndParams, SessionParams};

pub enum AppAction {
    ToggleChat,
    HideChat,
    SubmitInput,
    ClearConversation,
    /// Positive values scroll towards older messages.
    ScrollTranscript {
        lines: i32,
    },
    InsertIntoInput {
        text: String,
    },
    /// A key the input box should handle (characters, cursor movement, deletion).
    EditInput {
        key: KeyEvent,
    },
    SessionOpened {
        conversation_id: String,
        outbound: mpsc::UnboundedSender<String>,
        generation: u64,
    },
    FrameReceived {
        text: String,
        generation: u64,
    },
    SessionClosed {
        generation: u64,
    },
    SessionFailed {
        error: String,
        generation: u64,
    },
    Quit,
}

/// When the action was dispatched; typewriter reveals and greetings start from it.
#[derive(Debug, Clone, Copy)]
pub struct AppActionContext {
    pub now: Instant,
}

impl Default for AppActionContext {
    fn default() -> Self {
        Self { now: Instant::now() }
    }
}

pub struct AppActionEnvelope {
    pub action: AppAction,
    pub context: AppActionContext,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppActionEnvelope>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppActionEnvelope>) -> Self {
        Self { tx }
    }

    pub fn dispatch_many<I>(&self, actions: I, ctx: AppActionContext)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions.into_iter() {
            let _ = self.tx.send(AppActionEnvelope {
                action,
                context: ctx,
            });
        }
    }
}

/// Side effects the event loop performs after actions are applied.
pub enum AppCommand {
    OpenSession(SessionParams),
    EndConversation(EndParams),
}

pub fn apply_actions(
    app: &mut App,
    envelopes: impl IntoIterator<Item = AppActionEnvelope>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for envelope in envelopes {
        commands.extend(apply_action(app, envelope.action, envelope.context));
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction, ctx: AppActionContext) -> Vec<AppCommand> {
    match action {
        AppAction::ToggleChat
        | AppAction::HideChat
        | AppAction::SubmitInput
        | AppAction::ClearConversation
        | AppAction::ScrollTranscript { .. }
        | AppAction::InsertIntoInput { .. }
        | AppAction::EditInput { .. }
        | AppAction::Quit => input::handle_input_action(app, action, ctx),

        AppAction::SessionOpened { .. }
        | AppAction::FrameReceived { .. }
        | AppAction::SessionClosed { .. }
        | AppAction::SessionFailed { .. } => socket::handle_socket_action(app, action, ctx),
    }
}
