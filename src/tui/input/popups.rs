use crossterm::event::KeyEvent;

use crate::model::Field;
use crate::tui::app::App;
use crate::tui::popup::PopupResult;
use crate::tui::session::Session;

use super::typing::{continue_wizard, open_step_popup};

/// A collector popup is open: it sees every key until it resolves
pub(super) fn handle_popup(app: &mut App, key: KeyEvent) {
    let Some(cursor) = app.active_cursor_mut() else {
        return;
    };
    match &mut cursor.session {
        Some(Session::Wizard(wizard)) => {
            let Some(popup) = wizard.popup.as_mut() else {
                return;
            };
            match popup.handle_key(key) {
                PopupResult::Pending => {}
                PopupResult::Select(value) => {
                    wizard.popup = None;
                    let step = wizard.accept(value);
                    continue_wizard(app, step);
                }
                PopupResult::Cancel => {
                    wizard.popup = None;
                    match wizard.step_back() {
                        // Back to typing the name
                        Field::Name => {}
                        field => open_step_popup(app, field),
                    }
                }
            }
        }
        Some(Session::Edit(edit)) => {
            let Some(popup) = edit.popup.as_mut() else {
                return;
            };
            match popup.handle_key(key) {
                PopupResult::Pending => {}
                PopupResult::Select(value) => {
                    let field = popup.field();
                    edit.draft.insert(field, value);
                    edit.popup = None;
                }
                PopupResult::Cancel => edit.popup = None,
            }
        }
        _ => {}
    }
}
