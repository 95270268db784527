use tracing::{debug, info};

use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::constants::CONNECTION_ERROR_MESSAGE;
use crate::core::session::ReplyState;

pub(super) fn handle_socket_action(
    app: &mut App,
    action: AppAction,
    ctx: AppActionContext,
) -> Vec<AppCommand> {
    match action {
        AppAction::SessionOpened {
            conversation_id,
            outbound,
            generation,
        } => {
            let Some(session) = app.session.current_mut(generation) else {
                debug!(generation, "ignoring open from stale session");
                return Vec::new();
            };
            info!(generation, %conversation_id, "conversation ready");
            session.mark_open(conversation_id, outbound);
            app.ui.status = None;
            greet_if_cleared(app, ctx);
        }
        AppAction::FrameReceived { text, generation } => {
            append_frame(app, &text, generation, ctx);
        }
        AppAction::SessionClosed { generation } => {
            let Some(session) = app.session.current_mut(generation) else {
                return Vec::new();
            };
            session.mark_closed();
            app.ui.awaiting_reply = false;
            app.ui.set_status("Connection closed");
        }
        AppAction::SessionFailed { error, generation } => {
            let Some(session) = app.session.current_mut(generation) else {
                debug!(generation, "ignoring failure from stale session");
                return Vec::new();
            };
            session.mark_failed();
            app.ui.awaiting_reply = false;
            app.ui.set_status(error);
            app.add_assistant_message(CONNECTION_ERROR_MESSAGE, None, ctx.now);
            greet_if_cleared(app, ctx);
        }
        _ => {}
    }
    Vec::new()
}

fn greet_if_cleared(app: &mut App, ctx: AppActionContext) {
    if std::mem::take(&mut app.ui.greet_when_settled) {
        app.show_greeting(ctx.now);
    }
}

/// A frame either extends the reply being typed out or starts a new one.
fn append_frame(app: &mut App, text: &str, generation: u64, ctx: AppActionContext) {
    let interval = app.session.typewriter_interval;
    let Some(session) = app.session.current_mut(generation) else {
        debug!(generation, "dropping frame from stale session");
        return;
    };

    app.ui.awaiting_reply = false;

    let extends_reply = session.is_receiving()
        && app
            .ui
            .reveal
            .as_ref()
            .is_some_and(|reveal| reveal.generation == Some(generation));
    if extends_reply && app.ui.append_to_reveal(text) {
        return;
    }

    session.reply = ReplyState::Receiving;
    let finished = app
        .ui
        .push_assistant_message(text, Some(generation), interval, ctx.now);
    if let Some(message) = finished {
        if let Err(err) = app.session.logging.log_message(&message) {
            debug!(error = %err, "failed to write transcript log");
        }
    }
}
