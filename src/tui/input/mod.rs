mod edit;
mod grab;
mod navigate;
mod popups;
mod typing;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Mode};

use edit::handle_edit;
use grab::handle_grab;
use navigate::{handle_idle, handle_item_level, handle_section};
use popups::handle_popup;
use typing::handle_typing;

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    let key = normalize_key(key);

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }
    app.status = None;

    match app.mode() {
        Mode::Idle => handle_idle(app, key),
        Mode::SectionFocused => handle_section(app, key),
        Mode::ItemLevel => handle_item_level(app, key),
        Mode::Typing => handle_typing(app, key),
        Mode::Grabbing => handle_grab(app, key),
        Mode::Editing => handle_edit(app, key),
        Mode::PopupOpen => handle_popup(app, key),
    }
}

/// Terminals disagree on Shift+Tab and shifted letters; fold them into one
/// shape so handlers can match `(modifiers, code)` directly.
pub(super) fn normalize_key(mut key: KeyEvent) -> KeyEvent {
    match key.code {
        KeyCode::BackTab => {
            key.code = KeyCode::Tab;
            key.modifiers.insert(KeyModifiers::SHIFT);
        }
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::SHIFT) => {
            // Shift+p → Char('P') with SHIFT removed
            if c.is_ascii_lowercase() {
                key.code = KeyCode::Char(c.to_ascii_uppercase());
            }
            key.modifiers.remove(KeyModifiers::SHIFT);
        }
        _ => {}
    }
    key
}

/// Ctrl, Alt or Cmd held with Enter
fn is_commit(key: &KeyEvent) -> bool {
    key.code == KeyCode::Enter
        && key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

/// A character meant as text, not a shortcut
fn typed_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) =>
        {
            Some(c)
        }
        _ => None,
    }
}
