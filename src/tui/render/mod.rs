pub mod outline_view;
pub mod popup;
pub mod status_row;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::App;

/// Draw the outline, any open collector, and the status row
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: outline | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    outline_view::render_outline(frame, app, chunks[0]);

    // Collector popup (rendered on top of the outline)
    if let Some(popup) = app.active_cursor().and_then(|c| c.session.as_ref()).and_then(|s| s.popup()) {
        popup::render_popup(frame, app, popup, chunks[0]);
    }

    status_row::render_status_row(frame, app, chunks[1]);
}
