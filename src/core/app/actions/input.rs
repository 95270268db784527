use tracing::{debug, warn};
use tui_textarea::Input as TAInput;

use super::{App, AppAction, AppActionContext, AppCommand};

pub(super) fn handle_input_action(
    app: &mut App,
    action: AppAction,
    _ctx: AppActionContext,
) -> Vec<AppCommand> {
    match action {
        AppAction::ToggleChat => toggle_chat(app),
        AppAction::HideChat => {
            app.ui.chat_visible = false;
            Vec::new()
        }
        AppAction::SubmitInput => {
            submit_input(app);
            Vec::new()
        }
        AppAction::ClearConversation => clear_conversation(app),
        AppAction::ScrollTranscript { lines } => {
            let amount = lines.unsigned_abs().min(u16::MAX as u32) as u16;
            if lines > 0 {
                app.ui.scroll_up(amount);
            } else {
                app.ui.scroll_down(amount);
            }
            Vec::new()
        }
        AppAction::InsertIntoInput { text } => {
            app.ui.insert_into_input(&text);
            Vec::new()
        }
        AppAction::EditInput { key } => {
            app.ui.apply_textarea_edit(|ta| {
                ta.input(TAInput::from(key));
            });
            Vec::new()
        }
        AppAction::Quit => {
            app.finish_reveal();
            app.request_exit();
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn toggle_chat(app: &mut App) -> Vec<AppCommand> {
    app.ui.chat_visible = !app.ui.chat_visible;
    if !app.ui.chat_visible {
        return Vec::new();
    }

    app.pulse_backdrop();
    if app.session.has_live_session() {
        return Vec::new();
    }
    vec![AppCommand::OpenSession(app.session.begin_session())]
}

fn submit_input(app: &mut App) {
    let input = app.ui.get_input_text();
    let message = input.trim();
    if message.is_empty() {
        return;
    }

    let Some(session) = app.session.active.as_mut() else {
        app.ui.set_status("Not connected");
        return;
    };
    if !session.send(message) {
        debug!(generation = session.generation, "send skipped; stream not open");
        app.ui.set_status("Not connected");
        return;
    }

    let message = message.to_string();
    app.ui.clear_input();
    app.finish_reveal();
    app.add_user_message(&message);
    app.ui.awaiting_reply = true;
    app.ui.status = None;
}

fn clear_conversation(app: &mut App) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    if let Some(end) = app.session.end_session() {
        commands.push(AppCommand::EndConversation(end));
    }

    app.finish_reveal();
    app.ui.clear_transcript();
    app.ui.welcome_due = None;
    app.ui.greet_when_settled = true;
    if let Err(err) = app.session.logging.log_marker("Conversation cleared") {
        warn!(error = %err, "failed to write transcript log");
    }

    commands.push(AppCommand::OpenSession(app.session.begin_session()));
    commands
}
