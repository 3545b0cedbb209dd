use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::{Field, RecordPatch, ValidationError, Value};
use crate::tui::app::App;
use crate::tui::popup::Popup;
use crate::tui::session::{Session, SessionError};
use crate::util::unicode::pop_grapheme;

use super::{is_commit, typed_char};

/// Open the inline editor on the item under the cursor
pub(super) fn enter_edit(app: &mut App) {
    let Some((cursor, workspace, _)) = app.split_mut() else {
        return;
    };
    let Some(index) = cursor.position.item_index() else {
        tracing::warn!(target: "planner::session", error = %SessionError::NoItem("edit"), "edit not started");
        return;
    };
    let Some(item) = workspace
        .collection(cursor.target)
        .and_then(|c| c.visible_item(index))
    else {
        return;
    };
    let (local, kind, fields) = (item.local, item.kind, item.fields.clone());
    if let Err(e) = cursor.start_edit(local, kind, &fields) {
        tracing::warn!(target: "planner::session", error = %e, "edit not started");
    }
}

pub(super) fn handle_edit(app: &mut App, key: KeyEvent) {
    if is_commit(&key) {
        commit_edit(app);
        return;
    }
    let Some((cursor, workspace, _)) = app.split_mut() else {
        return;
    };
    if key.code == KeyCode::Esc {
        cursor.cancel();
        return;
    }
    let Some(edit) = cursor.edit_mut() else {
        return;
    };
    let field = edit.focused_field();

    match (key.modifiers, key.code) {
        (KeyModifiers::NONE, KeyCode::Tab) | (_, KeyCode::Down) => edit.focus_next(),
        (KeyModifiers::SHIFT, KeyCode::Tab) | (_, KeyCode::Up) => edit.focus_prev(),
        (KeyModifiers::NONE, KeyCode::Enter) => {
            if !field.is_text() {
                let current = edit.draft.get(&field).cloned().unwrap_or(Value::Null);
                edit.popup = Popup::open_for(field, &current, workspace);
            }
        }
        (_, KeyCode::Backspace) if field.is_text() => {
            let mut text = edit
                .draft
                .get(&field)
                .and_then(Value::as_text)
                .unwrap_or("")
                .to_string();
            pop_grapheme(&mut text);
            edit.draft.insert(field, text_value(field, text));
            edit.error = None;
        }
        _ => {
            if field.is_text()
                && let Some(c) = typed_char(&key)
            {
                let mut text = edit
                    .draft
                    .get(&field)
                    .and_then(Value::as_text)
                    .unwrap_or("")
                    .to_string();
                text.push(c);
                edit.draft.insert(field, Value::Text(text));
                edit.error = None;
            }
        }
    }
}

/// Empty links are stored as no link; the name stays text so commit can reject it
fn text_value(field: Field, text: String) -> Value {
    if text.is_empty() && field != Field::Name {
        Value::Null
    } else {
        Value::Text(text)
    }
}

/// Validate the draft and apply every changed field as one update
fn commit_edit(app: &mut App) {
    let Some((cursor, workspace, outbox)) = app.split_mut() else {
        return;
    };
    let Some(edit) = cursor.edit_mut() else {
        return;
    };

    let name = edit
        .draft
        .get(&Field::Name)
        .and_then(Value::as_text)
        .unwrap_or("")
        .trim()
        .to_string();
    if name.is_empty() {
        let error = ValidationError::Required("name");
        edit.error = Some(error.to_string());
        app.set_error(error.to_string());
        return;
    }
    edit.draft.insert(Field::Name, Value::Text(name));

    let changed = edit.changed();
    let local = edit.item;
    let Some(Session::Edit(_)) = cursor.session.take() else {
        return;
    };
    if changed.is_empty() {
        return;
    }
    let Some(item) = workspace.find_mut(local) else {
        tracing::warn!(target: "planner::session", %local, "edited item vanished before commit");
        return;
    };
    for (field, value) in &changed {
        item.fields.insert(*field, value.clone());
    }
    outbox.update(
        item,
        RecordPatch {
            completed: None,
            fields: changed,
        },
    );
    tracing::debug!(target: "planner::session", %local, "edit committed");
    app.resync_cursors();
}
