//! Event polling, dispatching, and UI rendering loop.
//!
//! Terminal input, socket events, and the animation clock are multiplexed on
//! one cooperative loop. Input and socket events become [`AppAction`]s; the
//! [`AppCommand`]s that applying them returns are carried out here.

use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use ratatui::layout::Rect;
use ratatui::prelude::Size;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::app::{
    apply_actions, App, AppAction, AppActionContext, AppActionDispatcher, AppActionEnvelope,
    AppCommand,
};
use crate::core::chat_socket::{ChatSocketService, SocketEvent};
use crate::core::constants::MAX_FPS;
use crate::ui::backdrop::world_size;
use crate::ui::renderer::ui;

use super::keybindings::{route_key, KeyRoute};
use super::lifecycle::{restore_terminal, setup_terminal, SharedTerminal};
use super::setup::{bootstrap_app, ChatOptions};
use super::AppHandle;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

fn action_context() -> AppActionContext {
    AppActionContext {
        now: Instant::now(),
    }
}

async fn is_exit_requested(app: &AppHandle) -> bool {
    app.read(|app| app.ui.exit_requested).await
}

async fn current_terminal_size(terminal: &SharedTerminal) -> Size {
    let terminal_guard = terminal.lock().await;
    terminal_guard.size().unwrap_or_default()
}

async fn try_draw_frame(
    app: &AppHandle,
    terminal: &SharedTerminal,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    let mut terminal_guard = terminal.lock().await;
    (app.update(|app| terminal_guard.draw(|f| ui(f, app))).await)?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

/// Tracks when the animation last advanced and when a random pulse was last rolled.
struct FrameClock {
    frame_duration: Duration,
    last_frame: Instant,
    last_pulse_roll: Instant,
}

impl FrameClock {
    fn new(frame_duration: Duration, now: Instant) -> Self {
        Self {
            frame_duration,
            last_frame: now - frame_duration,
            last_pulse_roll: now,
        }
    }

    /// Advance the backdrop and typewriter if a frame is due. Returns true if a redraw is needed.
    fn tick(&mut self, app: &mut App, term_size: Size, now: Instant) -> bool {
        if now.duration_since(self.last_frame) < self.frame_duration {
            return false;
        }
        self.last_frame = now;

        let mut redraw = app.tick(now);

        if let Some(backdrop) = app.backdrop.as_mut() {
            let (width, height) = world_size(Rect::new(0, 0, term_size.width, term_size.height));
            if backdrop.size() != (width, height) {
                debug!(width, height, "resizing backdrop");
                backdrop.resize(width, height);
            }
            if now.duration_since(self.last_pulse_roll) >= backdrop.config().random_pulse_every {
                self.last_pulse_roll = now;
                backdrop.roll_random_pulse();
            }
            backdrop.step();
            redraw = true;
        }

        redraw
    }
}

struct EventProcessingOutcome {
    events_processed: bool,
    request_redraw: bool,
}

/// `chat_visible` and `page` are read once per batch; toggles within the batch are tracked locally.
fn process_ui_events(
    (mut chat_visible, page): (bool, u16),
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    dispatcher: &AppActionDispatcher,
) -> EventProcessingOutcome {
    let mut outcome = EventProcessingOutcome {
        events_processed: false,
        request_redraw: false,
    };

    while let Ok(ev) = event_rx.try_recv() {
        outcome.events_processed = true;
        match ev {
            UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                match route_key(&key, chat_visible, page) {
                    KeyRoute::Action(action) => {
                        match action {
                            AppAction::ToggleChat => chat_visible = !chat_visible,
                            AppAction::HideChat => chat_visible = false,
                            _ => {}
                        }
                        dispatcher.dispatch_many([action], action_context());
                    }
                    KeyRoute::Edit(key) => dispatcher
                        .dispatch_many([AppAction::EditInput { key }], action_context()),
                    KeyRoute::Ignore => {}
                }
            }
            UiEvent::Crossterm(Event::Paste(text)) => {
                let sanitized = sanitize_pasted_text(&text);
                if chat_visible && !sanitized.is_empty() {
                    dispatcher.dispatch_many(
                        [AppAction::InsertIntoInput { text: sanitized }],
                        action_context(),
                    );
                }
            }
            UiEvent::Crossterm(_) => {}
        }
    }

    if outcome.events_processed {
        outcome.request_redraw = true;
    }

    outcome
}

pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    let without_crlf = text.replace("\r\n", "\n");
    let without_cr = without_crlf.replace('\r', "\n");
    let expanded_tabs = without_cr.replace('\t', "    ");
    expanded_tabs
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

fn process_socket_updates(
    dispatcher: &AppActionDispatcher,
    rx: &mut mpsc::UnboundedReceiver<(SocketEvent, u64)>,
) -> bool {
    let mut actions = Vec::new();

    while let Ok((event, generation)) = rx.try_recv() {
        actions.push(match event {
            SocketEvent::Opened {
                conversation_id,
                outbound,
            } => AppAction::SessionOpened {
                conversation_id,
                outbound,
                generation,
            },
            SocketEvent::Frame(text) => AppAction::FrameReceived { text, generation },
            SocketEvent::Closed => AppAction::SessionClosed { generation },
            SocketEvent::Failed(error) => AppAction::SessionFailed { error, generation },
        });
    }

    if actions.is_empty() {
        return false;
    }
    dispatcher.dispatch_many(actions, action_context());
    true
}

async fn drain_action_queue(
    app: &AppHandle,
    socket_service: &ChatSocketService,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(envelope) = action_rx.try_recv() {
        pending.push(envelope);
    }

    if pending.is_empty() {
        return false;
    }

    let commands = app.update(|app| apply_actions(app, pending)).await;
    for cmd in commands {
        match cmd {
            AppCommand::OpenSession(params) => socket_service.spawn_session(params),
            AppCommand::EndConversation(params) => socket_service.spawn_end(params),
        }
    }
    true
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

pub async fn run_chat(options: ChatOptions) -> Result<(), Box<dyn Error>> {
    let app = bootstrap_app(&options)?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppActionEnvelope>();
    let action_dispatcher = AppActionDispatcher::new(action_tx);
    if options.open {
        action_dispatcher.dispatch_many([AppAction::ToggleChat], AppActionContext::default());
    }

    let terminal = setup_terminal()?;

    let (socket_service, mut socket_rx) = ChatSocketService::new();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;
    let mut frame_clock = FrameClock::new(frame_duration, Instant::now());

    info!("chat loop started");

    let result: Result<(), Box<dyn Error>> = 'main_loop: loop {
        if is_exit_requested(&app).await {
            break 'main_loop Ok(());
        }

        let term_size = current_terminal_size(&terminal).await;

        let now = Instant::now();
        if app
            .update(|app| frame_clock.tick(app, term_size, now))
            .await
        {
            request_redraw = true;
        }

        if let Err(err) = try_draw_frame(
            &app,
            &terminal,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        )
        .await
        {
            break 'main_loop Err(err.into());
        }

        let app_state = app
            .read(|app| (app.ui.chat_visible, app.ui.transcript_height))
            .await;
        let event_outcome = process_ui_events(app_state, &mut event_rx, &action_dispatcher);
        if event_outcome.request_redraw {
            request_redraw = true;
        }

        let received_any = process_socket_updates(&action_dispatcher, &mut socket_rx);
        if received_any {
            request_redraw = true;
        }

        let actions_applied = drain_action_queue(&app, &socket_service, &mut action_rx).await;
        if actions_applied {
            request_redraw = true;
        }

        let idle = !event_outcome.events_processed && !received_any && !actions_applied;
        if idle {
            tokio::time::sleep(Duration::from_millis(8)).await;
        }
    };

    event_reader_handle.abort();
    app.update(|app| {
        app.finish_reveal();
        if let Some(session) = app.session.active.as_mut() {
            session.cancel();
        }
    })
    .await;
    restore_terminal(&terminal).await?;
    info!("chat loop finished");

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::background::{Background, BackgroundConfig};
    use crate::utils::test_utils::create_test_app;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    const TERM: Size = Size {
        width: 80,
        height: 24,
    };

    fn new_dispatcher() -> (
        AppActionDispatcher,
        mpsc::UnboundedReceiver<AppActionEnvelope>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (AppActionDispatcher::new(tx), rx)
    }

    #[test]
    fn sanitize_pasted_text_normalizes_line_endings_and_controls() {
        assert_eq!(sanitize_pasted_text("a\r\nb\rc\td\u{7}"), "a\nb\nc    d");
    }

    #[test]
    fn socket_events_become_tagged_actions() {
        let (dispatcher, mut action_rx) = new_dispatcher();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send((SocketEvent::Frame("hi".into()), 4)).expect("send");
        tx.send((SocketEvent::Closed, 4)).expect("send");

        assert!(process_socket_updates(&dispatcher, &mut rx));
        let first = action_rx.try_recv().expect("frame action");
        assert!(matches!(
            first.action,
            AppAction::FrameReceived { ref text, generation: 4 } if text == "hi"
        ));
        let second = action_rx.try_recv().expect("closed action");
        assert!(matches!(
            second.action,
            AppAction::SessionClosed { generation: 4 }
        ));
        assert!(!process_socket_updates(&dispatcher, &mut rx));
    }

    #[test]
    fn keys_typed_after_toggle_in_same_batch_reach_the_input() {
        let (dispatcher, mut action_rx) = new_dispatcher();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        event_tx
            .send(UiEvent::Crossterm(Event::Key(KeyEvent::new(
                KeyCode::Char('o'),
                KeyModifiers::CONTROL,
            ))))
            .expect("send");
        event_tx
            .send(UiEvent::Crossterm(Event::Key(KeyEvent::new(
                KeyCode::Char('h'),
                KeyModifiers::NONE,
            ))))
            .expect("send");

        let outcome = process_ui_events((false, 10), &mut event_rx, &dispatcher);
        assert!(outcome.request_redraw);
        assert!(matches!(
            action_rx.try_recv().map(|env| env.action),
            Ok(AppAction::ToggleChat)
        ));
        assert!(matches!(
            action_rx.try_recv().map(|env| env.action),
            Ok(AppAction::EditInput { .. })
        ));
    }

    #[test]
    fn paste_is_ignored_while_panel_hidden() {
        let (dispatcher, mut action_rx) = new_dispatcher();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        event_tx
            .send(UiEvent::Crossterm(Event::Paste("seed".into())))
            .expect("send");
        process_ui_events((false, 10), &mut event_rx, &dispatcher);
        assert!(action_rx.try_recv().is_err());
    }

    #[test]
    fn frame_clock_resizes_and_steps_backdrop() {
        let mut app = create_test_app();
        app.backdrop = Some(Background::new(BackgroundConfig::default(), 0.0, 0.0));
        let start = Instant::now();
        let mut clock = FrameClock::new(Duration::from_millis(16), start);

        assert!(clock.tick(&mut app, TERM, start));
        let backdrop = app.backdrop.as_ref().expect("backdrop");
        assert_eq!(backdrop.size(), (640.0, 384.0));
        assert_eq!(backdrop.particles().len(), 120);
        // Stepped: every particle sits on its orbit around the new centre.
        let (cx, cy) = backdrop.center();
        assert!(backdrop.particles().iter().all(|p| {
            let expected_x = cx + (p.angle + p.angle_offset).cos() * p.orbit_radius;
            (p.x - expected_x).abs() < 1e-9
        }));

        // Not yet due.
        assert!(!clock.tick(&mut app, TERM, start + Duration::from_millis(5)));
    }

    #[tokio::test]
    async fn drain_applies_actions_and_spawns_sessions() {
        let app = AppHandle::new(create_test_app());
        let (service, _socket_rx) = ChatSocketService::new();
        let (dispatcher, mut action_rx) = new_dispatcher();
        dispatcher.dispatch_many([AppAction::ToggleChat], AppActionContext::default());

        assert!(drain_action_queue(&app, &service, &mut action_rx).await);
        assert!(app.read(|app| app.ui.chat_visible).await);
        assert_eq!(app.read(|app| app.session.generation).await, 1);
        assert!(!drain_action_queue(&app, &service, &mut action_rx).await);
    }
}
