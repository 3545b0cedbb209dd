use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::App;
use crate::tui::position::Position;
use crate::tui::session::{Session, SessionError};

/// Start holding the item under the cursor
pub(super) fn enter_grab(app: &mut App) {
    let Some((cursor, workspace, _)) = app.split_mut() else {
        return;
    };
    let Some(index) = cursor.position.item_index() else {
        tracing::warn!(target: "planner::session", error = %SessionError::NoItem("grab"), "grab not started");
        return;
    };
    let Some(collection) = workspace.collection(cursor.target) else {
        return;
    };
    let Some(item) = collection.visible_item(index) else {
        return;
    };
    let local = item.local;
    let snapshot = collection.order();
    if let Err(e) = cursor.start_grab(local, index, snapshot) {
        tracing::warn!(target: "planner::session", error = %e, "grab not started");
    }
}

pub(super) fn handle_grab(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Up) | (KeyModifiers::NONE, KeyCode::Char('k')) => move_held(app, -1),
        (_, KeyCode::Down) | (KeyModifiers::NONE, KeyCode::Char('j')) => move_held(app, 1),
        (KeyModifiers::NONE, KeyCode::Char('g')) | (KeyModifiers::NONE, KeyCode::Enter) => {
            release(app)
        }
        (_, KeyCode::Esc) => cancel_grab(app),
        _ => {}
    }
}

/// Swap the held item with its visible neighbour. No wraparound.
fn move_held(app: &mut App, delta: isize) {
    let Some((cursor, workspace, _)) = app.split_mut() else {
        return;
    };
    let target = cursor.target;
    let Some(grab) = cursor.grab_mut() else {
        return;
    };
    let Some(collection) = workspace.collection_mut(target) else {
        return;
    };
    let from = grab.current_index;
    let Some(to) = from.checked_add_signed(delta) else {
        return;
    };
    if to >= collection.visible_len() || !collection.swap_visible(from, to) {
        return;
    }
    grab.current_index = to;
    cursor.position = Position::item(to);
}

/// Drop the item where it is; persist the order if it moved
fn release(app: &mut App) {
    let Some((cursor, workspace, outbox)) = app.split_mut() else {
        return;
    };
    let Some(Session::Grab(grab)) = cursor.session.take() else {
        return;
    };
    cursor.position = Position::item(grab.current_index);
    if grab.current_index == grab.original_index {
        return;
    }
    let Some(collection) = workspace.collection(cursor.target) else {
        return;
    };
    outbox.reorder(
        cursor.target,
        grab.item,
        collection.order(),
        grab.snapshot,
        grab.original_index,
    );
    tracing::debug!(
        target: "planner::session",
        item = %grab.item,
        from = grab.original_index,
        to = grab.current_index,
        "grab released"
    );
}

/// Put everything back the way it was before the grab
fn cancel_grab(app: &mut App) {
    let Some((cursor, workspace, _)) = app.split_mut() else {
        return;
    };
    let target = cursor.target;
    if let Some(Session::Grab(grab)) = cursor.cancel()
        && let Some(collection) = workspace.collection_mut(target)
    {
        collection.apply_order(&grab.snapshot);
    }
}
