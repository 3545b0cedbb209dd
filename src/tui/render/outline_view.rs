use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::{Collection, Field, Item, SectionKind, Value, Workspace};
use crate::tui::app::App;
use crate::tui::position::Position;
use crate::tui::session::{Cursor, EditSession, Session};
use crate::tui::theme::Theme;
use crate::util::unicode::truncate_to_width;

/// Lines being built, plus the row the cursor sits on
struct Outline<'a> {
    lines: Vec<Line<'a>>,
    cursor_line: Option<usize>,
    width: usize,
}

impl Outline<'_> {
    fn mark_cursor(&mut self) {
        self.cursor_line = Some(self.lines.len());
    }
}

/// Render every section, with the entered one showing its cursor and slots
pub fn render_outline(frame: &mut Frame, app: &App, area: Rect) {
    let mut out = Outline {
        lines: Vec::new(),
        cursor_line: None,
        width: area.width as usize,
    };

    for section in SectionKind::ALL {
        let focused = app.focus == Some(section);
        let collection = app.workspace.section(section);
        section_header(&mut out, app, section, collection, focused);

        let cursor = if focused { app.cursor.as_ref() } else { None };
        collection_lines(&mut out, app, collection, cursor, 2);
        out.lines.push(Line::from(""));
    }

    // Keep the cursor row on screen
    let height = area.height as usize;
    let scroll = match out.cursor_line {
        Some(line) if line >= height => line + 1 - height,
        _ => 0,
    };

    let paragraph = Paragraph::new(out.lines)
        .style(Style::default().bg(app.theme.background))
        .scroll((scroll as u16, 0));
    frame.render_widget(paragraph, area);
}

fn section_header(
    out: &mut Outline,
    app: &App,
    section: SectionKind,
    collection: &Collection,
    focused: bool,
) {
    let theme = &app.theme;
    let entered = focused && app.cursor.is_some();
    let style = if focused {
        Style::default()
            .fg(theme.highlight)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text_bright)
    };
    let marker = if focused && !entered { "\u{25B8} " } else { "  " };
    if focused && !entered {
        out.mark_cursor();
    }
    out.lines.push(Line::from(vec![
        Span::styled(format!("{}{}", marker, section.title()), style),
        Span::styled(
            format!("  {} \u{00B7} {}", collection.filter().label(), collection.visible_len()),
            Style::default().fg(theme.dim),
        ),
    ]));
}

fn collection_lines(
    out: &mut Outline,
    app: &App,
    collection: &Collection,
    cursor: Option<&Cursor>,
    indent: usize,
) {
    let theme = &app.theme;
    let position = cursor.map(|c| c.position);
    let session = cursor.and_then(|c| c.session.as_ref());
    let wizard_origin = match session {
        Some(Session::Wizard(w)) => Some(w.origin),
        _ => None,
    };
    let slot_shown = |slot: Position| position == Some(slot) || wizard_origin == Some(slot);

    if slot_shown(Position::TOP) {
        slot_line(out, theme, collection, session, indent, true);
    }

    for (index, item) in collection.visible_items().enumerate() {
        let here = Position::item(index);
        let selected = position == Some(here) && wizard_origin.is_none();
        match session {
            Some(Session::Edit(edit)) if edit.item == item.local => {
                out.mark_cursor();
                edit_line(out, theme, edit, &app.workspace, indent);
            }
            _ => {
                if selected {
                    out.mark_cursor();
                }
                let held = matches!(session, Some(Session::Grab(g)) if g.item == item.local);
                item_line(out, theme, &app.workspace, item, indent, selected, held);
            }
        }

        if let Some(child) = &app.child
            && cursor.is_some()
            && child.target.parent == Some(item.local)
        {
            if let Some(tasks) = app.workspace.children_of(item.local) {
                collection_lines(out, app, tasks, Some(child), indent + 4);
            } else {
                let empty = Collection::new(child.target.kind, Some(item.local), app.workspace.today());
                collection_lines(out, app, &empty, Some(child), indent + 4);
            }
        }

        if slot_shown(Position::after(index)) {
            slot_line(out, theme, collection, session, indent, true);
        }
    }

    if cursor.is_some() {
        slot_line(out, theme, collection, session, indent, slot_shown(Position::BOTTOM));
    }
}

/// An insert slot: the wizard's name buffer, or a prompt when selected
fn slot_line(
    out: &mut Outline,
    theme: &Theme,
    collection: &Collection,
    session: Option<&Session>,
    indent: usize,
    active: bool,
) {
    let pad = " ".repeat(indent);
    if !active {
        out.lines.push(Line::from(Span::styled(
            format!("{}  +", pad),
            Style::default().fg(theme.dim),
        )));
        return;
    }
    match session {
        Some(Session::Wizard(wizard)) => {
            out.mark_cursor();
            let mut spans = vec![
                Span::styled(format!("{}\u{25B8} ", pad), Style::default().fg(theme.highlight)),
                Span::styled(wizard.buffer.clone(), Style::default().fg(theme.text_bright)),
            ];
            if wizard.is_naming() {
                spans.push(Span::styled("\u{258C}", Style::default().fg(theme.highlight)));
            } else {
                spans.push(Span::styled(
                    format!("  {}\u{2026}", wizard.field().label()),
                    Style::default().fg(theme.dim),
                ));
            }
            out.lines.push(Line::from(spans));
        }
        _ => {
            out.mark_cursor();
            out.lines.push(Line::from(vec![
                Span::styled(format!("{}\u{25B8} ", pad), Style::default().fg(theme.highlight)),
                Span::styled(
                    format!("+ type to add a {}", collection.kind().label()),
                    Style::default().fg(theme.dim),
                ),
            ]));
        }
    }
}

fn item_line(
    out: &mut Outline,
    theme: &Theme,
    workspace: &Workspace,
    item: &Item,
    indent: usize,
    selected: bool,
    held: bool,
) {
    let pad = " ".repeat(indent);
    let marker = match (held, selected) {
        (true, _) => "\u{2261} ",
        (false, true) => "\u{25B8} ",
        (false, false) => "  ",
    };
    let check = if item.completed { "[x] " } else { "[ ] " };
    let name_style = match (held, selected) {
        (true, _) => Style::default()
            .fg(theme.text_bright)
            .bg(theme.selection_bg)
            .add_modifier(Modifier::BOLD),
        (false, true) => Style::default().fg(theme.text_bright),
        (false, false) => Style::default().fg(theme.text),
    };
    let budget = out.width.saturating_sub(indent + 6).max(8);

    let mut spans = vec![
        Span::styled(format!("{}{}", pad, marker), Style::default().fg(theme.highlight)),
        Span::styled(check, Style::default().fg(if item.completed { theme.green } else { theme.dim })),
        Span::styled(truncate_to_width(item.name(), budget / 2), name_style),
    ];

    let meta: Vec<String> = item
        .kind
        .steps()
        .iter()
        .skip(1)
        .filter_map(|field| field_summary(workspace, *field, item.field(*field)))
        .collect();
    if !meta.is_empty() {
        spans.push(Span::styled(
            format!("  {}", truncate_to_width(&meta.join(" \u{00B7} "), budget / 2)),
            Style::default().fg(theme.dim),
        ));
    }
    if let Some(tasks) = workspace.children_of(item.local)
        && !tasks.is_empty()
    {
        spans.push(Span::styled(
            format!("  ({} tasks)", tasks.len()),
            Style::default().fg(theme.dim),
        ));
    }
    if item.is_temporary() {
        spans.push(Span::styled(
            format!("  {}", item.display_id()),
            Style::default().fg(theme.pending),
        ));
    }
    out.lines.push(Line::from(spans));
}

/// One form line per editable field, focused field highlighted
fn edit_line(
    out: &mut Outline,
    theme: &Theme,
    edit: &EditSession,
    workspace: &Workspace,
    indent: usize,
) {
    let pad = " ".repeat(indent);
    for (i, field) in edit.kind.editable_fields().iter().enumerate() {
        let focused = i == edit.focus;
        let value = edit.draft.get(field).unwrap_or(&Value::Null);
        let text = match (field, value) {
            (_, Value::Text(s)) => s.clone(),
            (_, Value::Null) => "\u{2014}".to_string(),
            _ => field_summary(workspace, *field, value).unwrap_or_default(),
        };
        let label_style = if focused {
            Style::default().fg(theme.highlight)
        } else {
            Style::default().fg(theme.dim)
        };
        let value_style = if focused {
            Style::default()
                .fg(theme.text_bright)
                .bg(theme.selection_bg)
        } else {
            Style::default().fg(theme.text)
        };
        let marker = if focused { "\u{25B8} " } else { "  " };
        let mut spans = vec![
            Span::styled(format!("{}{}{:<10}", pad, marker, field.label()), label_style),
            Span::styled(text, value_style),
        ];
        if focused && field.is_text() {
            spans.push(Span::styled("\u{258C}", Style::default().fg(theme.highlight)));
        }
        out.lines.push(Line::from(spans));
    }
    if let Some(error) = &edit.error {
        out.lines.push(Line::from(Span::styled(
            format!("{}  {}", pad, error),
            Style::default().fg(theme.red),
        )));
    }
}

/// Short display for a non-name field, or None when it is empty
fn field_summary(workspace: &Workspace, field: Field, value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Goal(id) => Some(workspace.goal_name(id).unwrap_or(id).to_string()),
        Value::Flag(true) if field == Field::Recurring => Some("recurring".to_string()),
        Value::Flag(false) if field == Field::Recurring => None,
        Value::Date(_) if field == Field::Deadline => Some(format!("due {}", value.display())),
        other => Some(other.display()),
    }
}
