use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::{Field, ItemKind, Value};
use crate::tui::app::App;
use crate::tui::popup::Popup;
use crate::tui::position::{Position, Slot};
use crate::tui::session::Session;
use crate::tui::wizard::WizardStep;
use crate::util::unicode::pop_grapheme;

use super::typed_char;

/// Only the default view (open / upcoming) takes new items
fn creation_allowed(app: &App) -> Option<ItemKind> {
    let target = app.active_cursor()?.target;
    // A task list nobody has opened yet is still in its default view
    let accepts = app
        .collection(target)
        .is_none_or(|c| c.filter().accepts_new_items());
    if !accepts {
        tracing::debug!(target: "planner::session", kind = %target.kind, "creation ignored outside the default view");
        return None;
    }
    Some(target.kind)
}

/// First printable key on an insert slot: open a wizard with it
pub(super) fn start_typing(app: &mut App, first: char) {
    let Some(kind) = creation_allowed(app) else {
        return;
    };
    let Some(cursor) = app.active_cursor_mut() else {
        return;
    };
    match cursor.start_wizard(kind) {
        Ok(()) => {
            if let Some(wizard) = cursor.wizard_mut() {
                wizard.buffer.push(first);
            }
        }
        Err(e) => tracing::warn!(target: "planner::session", error = %e, "wizard not started"),
    }
}

/// Enter at item level: a wizard on a fresh slot below the current item
pub(super) fn insert_below(app: &mut App) {
    let Some(kind) = creation_allowed(app) else {
        return;
    };
    let Some(cursor) = app.active_cursor_mut() else {
        return;
    };
    if let Err(e) = cursor.insert_after(kind) {
        tracing::warn!(target: "planner::session", error = %e, "wizard not started");
    }
}

/// Name entry
pub(super) fn handle_typing(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) => {
            if let Some(cursor) = app.active_cursor_mut() {
                cursor.cancel();
            }
        }
        (KeyModifiers::NONE, KeyCode::Enter) => submit_name(app),
        (_, KeyCode::Backspace) => {
            if let Some(wizard) = app.active_cursor_mut().and_then(|c| c.wizard_mut()) {
                pop_grapheme(&mut wizard.buffer);
            }
        }
        _ => {
            if let Some(c) = typed_char(&key)
                && let Some(wizard) = app.active_cursor_mut().and_then(|cur| cur.wizard_mut())
            {
                wizard.buffer.push(c);
            }
        }
    }
}

fn submit_name(app: &mut App) {
    let Some(wizard) = app.active_cursor_mut().and_then(|c| c.wizard_mut()) else {
        return;
    };
    let step = wizard.submit_name();
    continue_wizard(app, step);
}

/// Act on what the wizard asked for next
pub(super) fn continue_wizard(app: &mut App, step: WizardStep) {
    match step {
        WizardStep::Ask(field) => open_step_popup(app, field),
        WizardStep::Done => commit_wizard(app),
        WizardStep::Abort => {
            if let Some(cursor) = app.active_cursor_mut() {
                cursor.cancel();
            }
        }
    }
}

/// Open the collector for a wizard step, preloaded with any earlier answer
pub(super) fn open_step_popup(app: &mut App, field: Field) {
    let Some((cursor, workspace, _)) = app.split_mut() else {
        return;
    };
    let Some(wizard) = cursor.wizard_mut() else {
        return;
    };
    let current = wizard.collected.get(&field).cloned().unwrap_or(Value::Null);
    wizard.popup = Popup::open_for(field, &current, workspace);
}

/// Insert the new item at the wizard's origin slot and enqueue the create
fn commit_wizard(app: &mut App) {
    let Some((cursor, workspace, outbox)) = app.split_mut() else {
        return;
    };
    let Some(Session::Wizard(wizard)) = cursor.session.take() else {
        return;
    };
    let target = cursor.target;
    let slot = match wizard.origin.slot() {
        Slot::Insert(slot) => slot,
        Slot::Item(_) => {
            tracing::warn!(target: "planner::session", "wizard origin is not a slot");
            cursor.position = wizard.origin;
            return;
        }
    };

    let local = workspace.alloc_local();
    let item = wizard.build(local);
    let Some(collection) = workspace.collection_mut(target) else {
        tracing::warn!(target: "planner::session", kind = %target.kind, "collection gone; dropping new item");
        cursor.position = Position::BOTTOM;
        return;
    };
    let index = collection.insert(slot, item);
    let inserted = &collection.items()[index];
    outbox.create(target, inserted);
    tracing::info!(target: "planner::session", %local, kind = %target.kind, "created");

    cursor.position = if wizard.origin == Position::BOTTOM {
        // Stay on the bottom slot so the next key starts another entry
        Position::BOTTOM
    } else {
        collection
            .visible_index_of(local)
            .map_or(Position::BOTTOM, Position::item)
    };
}
