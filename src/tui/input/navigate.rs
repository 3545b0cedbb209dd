use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::{CollectionRef, ItemKind, RecordPatch, SectionKind};
use crate::tui::app::App;
use crate::tui::position::{Direction, Position};

use super::edit::enter_edit;
use super::grab::enter_grab;
use super::typing::{insert_below, start_typing};
use super::{is_commit, typed_char};

pub(super) fn handle_idle(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Down) | (_, KeyCode::Up) | (KeyModifiers::NONE, KeyCode::Tab) => {
            app.focus = Some(SectionKind::Goals);
        }
        (_, KeyCode::Char('q')) => app.should_quit = true,
        _ => {}
    }
}

pub(super) fn handle_section(app: &mut App, key: KeyEvent) {
    let Some(section) = app.focus else {
        return;
    };
    match (key.modifiers, key.code) {
        (_, KeyCode::Up) => {
            let index = section.index().saturating_sub(1);
            app.focus = SectionKind::from_index(index);
        }
        (_, KeyCode::Down) => {
            let index = (section.index() + 1).min(SectionKind::ALL.len() - 1);
            app.focus = SectionKind::from_index(index);
        }
        (_, KeyCode::Left) | (_, KeyCode::Right) => {
            app.workspace.section_mut(section).toggle_filter();
        }
        (KeyModifiers::NONE, KeyCode::Tab) | (KeyModifiers::NONE, KeyCode::Enter) => {
            app.enter_section();
        }
        (_, KeyCode::Esc) => app.focus = None,
        (_, KeyCode::Char('q')) => app.should_quit = true,
        _ => {}
    }
}

pub(super) fn handle_item_level(app: &mut App, key: KeyEvent) {
    let Some(cursor) = app.active_cursor() else {
        return;
    };
    let target = cursor.target;
    let position = cursor.position;
    let len = app.visible_len(target);

    // On an insert slot, text starts a new item
    if position.is_insert_slot()
        && let Some(c) = typed_char(&key)
    {
        start_typing(app, c);
        return;
    }

    if is_commit(&key) {
        toggle_completion(app);
        return;
    }

    match (key.modifiers, key.code) {
        (KeyModifiers::NONE, KeyCode::Tab) => {
            if app.child.is_none() {
                app.enter_children();
            }
        }
        (KeyModifiers::SHIFT, KeyCode::Tab) => {
            if app.child.is_some() {
                app.leave_children();
            } else {
                app.leave_section();
            }
        }
        (_, KeyCode::Esc) => app.leave_section(),
        (_, KeyCode::Up) => move_position(app, Direction::Up, len),
        (_, KeyCode::Down) => move_position(app, Direction::Down, len),
        (_, KeyCode::Left) | (_, KeyCode::Right) => toggle_filter(app, target),
        (KeyModifiers::NONE, KeyCode::Enter) => insert_below(app),
        (KeyModifiers::CONTROL, KeyCode::Char('d')) | (_, KeyCode::Backspace) | (_, KeyCode::Delete) => {
            delete_item(app);
        }
        (KeyModifiers::NONE, KeyCode::Char(' ')) => {
            if target.kind == ItemKind::AdminTask {
                toggle_completion(app);
            }
        }
        (KeyModifiers::NONE, KeyCode::Char('g')) => enter_grab(app),
        (KeyModifiers::NONE, KeyCode::Char('e')) => enter_edit(app),
        _ => {}
    }
}

fn move_position(app: &mut App, direction: Direction, len: usize) {
    if let Some(cursor) = app.active_cursor_mut() {
        cursor.position = cursor.position.advance(direction, len);
    }
}

fn toggle_filter(app: &mut App, target: CollectionRef) {
    let Some(collection) = app.workspace.collection_mut(target) else {
        return;
    };
    collection.toggle_filter();
    let len = collection.visible_len();
    if let Some(cursor) = app.active_cursor_mut() {
        cursor.position = Position::enter(len);
    }
}

/// Flip `completed` on the item under the cursor and sync it
pub(super) fn toggle_completion(app: &mut App) {
    let Some((cursor, workspace, outbox)) = app.split_mut() else {
        return;
    };
    let Some(index) = cursor.position.item_index() else {
        return;
    };
    let Some(local) = workspace
        .collection(cursor.target)
        .and_then(|c| c.visible_item(index))
        .map(|item| item.local)
    else {
        return;
    };
    let Some(item) = workspace.find_mut(local) else {
        return;
    };
    item.completed = !item.completed;
    let completed = item.completed;
    outbox.update(item, RecordPatch::completed(completed));
    tracing::debug!(target: "planner::session", %local, completed, "toggled completion");
    app.resync_cursors();
}

/// Remove the item under the cursor (and its tasks) and sync the delete
pub(super) fn delete_item(app: &mut App) {
    let Some((cursor, workspace, outbox)) = app.split_mut() else {
        return;
    };
    let Some(index) = cursor.position.item_index() else {
        return;
    };
    let target = cursor.target;
    let Some(collection) = workspace.collection_mut(target) else {
        return;
    };
    let Some(local) = collection.visible_item(index).map(|item| item.local) else {
        return;
    };
    let Some((full_index, item)) = collection.remove(local) else {
        return;
    };
    let children = workspace.take_children(local);
    outbox.remove(target, full_index, item, children);
    app.resync_cursors();
}
