use chrono::NaiveDate;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::model::{Field, Fields, InsertSlot, Item, ItemKind, SectionKind, Value, Workspace};
use crate::tui::app::App;
use crate::tui::theme::Theme;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

/// An App whose Projects section holds confirmed projects with these names.
pub fn app_with_projects(names: &[&str]) -> App {
    let mut workspace = Workspace::new(today());
    for (i, name) in names.iter().enumerate() {
        let mut fields = Fields::new();
        fields.insert(Field::Name, Value::Text(name.to_string()));
        fields.insert(Field::Goal, Value::Null);
        fields.insert(Field::Deadline, Value::Null);
        let mut item = Item::new(workspace.alloc_local(), ItemKind::Project, fields);
        item.remote = Some(format!("projects-{}", i + 1));
        workspace
            .section_mut(SectionKind::Projects)
            .insert(InsertSlot::Bottom, item);
    }
    App::new(workspace, Theme::default())
}
