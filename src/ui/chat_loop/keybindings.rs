//! Maps key presses to app actions or textarea edits.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::app::AppAction;

pub enum KeyRoute {
    Action(AppAction),
    /// Forward to the input box.
    Edit(KeyEvent),
    Ignore,
}

/// `page` is the number of transcript lines PageUp/PageDown move by.
pub fn route_key(key: &KeyEvent, chat_visible: bool, page: u16) -> KeyRoute {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => return KeyRoute::Action(AppAction::Quit),
        KeyCode::Char('o') if ctrl => return KeyRoute::Action(AppAction::ToggleChat),
        _ => {}
    }

    if !chat_visible {
        return KeyRoute::Ignore;
    }

    let page = i32::from(page.max(1));
    let action = match key.code {
        KeyCode::Char('l') if ctrl => AppAction::ClearConversation,
        KeyCode::Esc => AppAction::HideChat,
        KeyCode::Enter => AppAction::SubmitInput,
        KeyCode::PageUp => AppAction::ScrollTranscript { lines: page },
        KeyCode::PageDown => AppAction::ScrollTranscript { lines: -page },
        KeyCode::Up => AppAction::ScrollTranscript { lines: 1 },
        KeyCode::Down => AppAction::ScrollTranscript { lines: -1 },
        _ => return KeyRoute::Edit(*key),
    };
    KeyRoute::Action(action)
}
