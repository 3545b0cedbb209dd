use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::unicode::display_width;

/// Key hints for the current mode
fn hints(mode: Mode) -> &'static str {
    match mode {
        Mode::Idle => "\u{2193} focus  q quit",
        Mode::SectionFocused => "\u{2191}\u{2193} section  Tab enter  \u{2190}\u{2192} filter  Esc back",
        Mode::ItemLevel => "type add  g grab  e edit  ^D delete  ^Enter done  Tab tasks  Esc back",
        Mode::Typing => "Enter next  Esc cancel",
        Mode::Grabbing => "\u{2191}\u{2193} move  g/Enter drop  Esc cancel",
        Mode::Editing => "Tab field  Enter pick  ^Enter save  Esc discard",
        Mode::PopupOpen => "Enter select  Esc back",
    }
}

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let mode = app.mode();

    let mut spans = Vec::new();
    if let Some(status) = &app.status {
        let color = if status.is_error {
            app.theme.red
        } else {
            app.theme.text
        };
        spans.push(Span::styled(status.text.clone(), Style::default().fg(color).bg(bg)));
    }

    let pending = app.outbox.in_flight();
    if pending > 0 {
        spans.push(Span::styled(
            format!(" saving {}", pending),
            Style::default().fg(app.theme.pending).bg(bg),
        ));
    }

    if app.show_key_hints {
        let hint = hints(mode);
        let content_width: usize = spans.iter().map(|s| display_width(&s.content)).sum();
        let hint_width = display_width(hint);
        if content_width + hint_width < width {
            let padding = width - content_width - hint_width;
            spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
            spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
        }
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
