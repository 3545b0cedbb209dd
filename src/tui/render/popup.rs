use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::model::DaySet;
use crate::tui::app::App;
use crate::tui::popup::Popup;

/// Centered box for the open collector
pub fn render_popup(frame: &mut Frame, app: &App, popup: &Popup, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;
    let mut lines: Vec<Line> = Vec::new();

    match popup {
        Popup::Choice {
            options, selected, ..
        } => {
            for (i, (label, _)) in options.iter().enumerate() {
                let style = if i == *selected {
                    Style::default()
                        .fg(theme.text_bright)
                        .bg(theme.selection_bg)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme.text).bg(bg)
                };
                let marker = if i == *selected { "\u{25B8} " } else { "  " };
                lines.push(Line::from(Span::styled(format!("{}{}", marker, label), style)));
            }
        }
        Popup::Entry { input, .. } => {
            lines.push(Line::from(vec![
                Span::styled(input.clone(), Style::default().fg(theme.text_bright).bg(bg)),
                Span::styled("\u{258C}", Style::default().fg(theme.highlight).bg(bg)),
            ]));
        }
        Popup::Days { days, focus, .. } => {
            let spans: Vec<Span> = (0..7)
                .map(|i| {
                    let on = days.contains(i);
                    let mut style = Style::default().fg(if on { theme.green } else { theme.dim });
                    if i == *focus {
                        style = style.bg(theme.selection_bg).add_modifier(Modifier::BOLD);
                    }
                    let mark = if on { "\u{25CF}" } else { "\u{25CB}" };
                    Span::styled(format!(" {}{} ", mark, DaySet::day_name(i)), style)
                })
                .collect();
            lines.push(Line::from(spans));
        }
    }

    if let Some(error) = popup.error() {
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(theme.red).bg(bg),
        )));
    }

    let title = popup.title();
    let content_width = lines.iter().map(Line::width).max().unwrap_or(0);
    let width = (content_width.max(title.chars().count()) + 4).min(area.width as usize) as u16;
    let height = (lines.len() + 2).min(area.height as usize) as u16;
    let rect = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.selection_border).bg(bg))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(theme.text_bright).bg(bg),
        ));
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .style(Style::default().bg(bg)),
        rect,
    );
}
