use crate::core::app::App;
use crate::ui::backdrop;
use crate::ui::transcript::{build_lines, TranscriptStyle};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const PANEL_MAX_WIDTH: u16 = 84;
const PANEL_TITLE: &str = "WE AI Agriculture Assistant";

pub fn ui(f: &mut Frame, app: &mut App) {
    let area = f.area();

    if let Some(background) = app.backdrop.as_ref() {
        backdrop::draw(f, area, background, app.ui.color_depth);
    }

    if app.ui.chat_visible {
        draw_chat_panel(f, app, panel_area(area));
    } else {
        draw_hint(f, area);
    }
}

/// Centered panel, full height minus a one-line margin.
pub fn panel_area(area: Rect) -> Rect {
    let width = area.width.min(PANEL_MAX_WIDTH);
    let height = area.height.saturating_sub(2).max(area.height.min(6));
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_hint(f: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let hint = Line::from(vec![
        Span::styled(" Ctrl+O ", Style::default().fg(Color::Black).bg(Color::Cyan)),
        Span::raw(" open chat   "),
        Span::styled(" Ctrl+C ", Style::default().fg(Color::Black).bg(Color::Cyan)),
        Span::raw(" quit"),
    ]);
    let line_area = Rect {
        y: area.y + area.height - 1,
        height: 1,
        ..area
    };
    f.render_widget(Clear, line_area);
    f.render_widget(Paragraph::new(hint), line_area);
}

fn draw_chat_panel(f: &mut Frame, app: &mut App, area: Rect) {
    f.render_widget(Clear, area);

    let accent = Style::default().fg(Color::Cyan);
    let title = Line::from(vec![
        Span::styled(format!(" {PANEL_TITLE} "), accent.add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("• {} ", app.link_label()),
            Style::default().fg(Color::Gray),
        ),
    ]);
    let footer = match app.ui.status.as_deref() {
        Some(status) => format!(" {status} "),
        None => format!(
            " Enter send • Ctrl+L clear • Esc hide • Log: {} ",
            app.get_logging_status()
        ),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(accent)
        .title(title)
        .title_bottom(Line::from(Span::styled(footer, Style::default().fg(Color::Gray))));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(inner);
    let (transcript_area, input_area) = (chunks[0], chunks[1]);

    let lines = build_lines(&app.ui, transcript_area.width, &TranscriptStyle::default());
    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let max_top = total.saturating_sub(transcript_area.height);
    app.ui.max_scroll_top = max_top;
    app.ui.transcript_height = transcript_area.height;
    let top = app.ui.scroll_top.map_or(max_top, |top| top.min(max_top));

    f.render_widget(Paragraph::new(lines).scroll((top, 0)), transcript_area);

    f.render_widget(app.ui.textarea(), input_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::create_test_app;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &mut App, width: u16, height: u16) -> Vec<String> {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|f| ui(f, app)).expect("draw");
        let buffer = terminal.backend().buffer();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn hidden_panel_shows_hint() {
        let mut app = create_test_app();
        let rows = render(&mut app, 60, 10);
        assert!(rows[9].contains("open chat"));
    }

    #[test]
    fn panel_shows_title_transcript_and_status() {
        let mut app = create_test_app();
        app.ui.chat_visible = true;
        app.add_user_message("hello there");

        let rows = render(&mut app, 60, 16);
        let screen = rows.join("\n");
        assert!(screen.contains(PANEL_TITLE));
        assert!(screen.contains("idle"));
        assert!(screen.contains("You: hello there"));
        assert!(screen.contains("Log: off"));
    }

    #[test]
    fn transcript_follows_bottom_and_records_scroll_range() {
        let mut app = create_test_app();
        app.ui.chat_visible = true;
        for i in 0..20 {
            app.add_user_message(&format!("line {i}"));
        }

        let rows = render(&mut app, 40, 12);
        let screen = rows.join("\n");
        assert!(screen.contains("You: line 19"));
        assert!(!screen.contains("You: line 0 "));
        assert!(app.ui.max_scroll_top > 0);

        app.ui.scroll_top = Some(0);
        let rows = render(&mut app, 40, 12);
        assert!(rows.join("\n").contains("You: line 0"));
    }

    #[test]
    fn panel_area_is_centered_and_capped() {
        let area = Rect::new(0, 0, 200, 50);
        let panel = panel_area(area);
        assert_eq!(panel.width, PANEL_MAX_WIDTH);
        assert_eq!(panel.x, (200 - PANEL_MAX_WIDTH) / 2);
        assert_eq!(panel.height, 48);

        let tiny = panel_area(Rect::new(0, 0, 20, 4));
        assert_eq!(tiny.width, 20);
        assert_eq!(tiny.height, 4);
    }
}
