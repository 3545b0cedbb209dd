use crate::model::{CollectionRef, Field, Fields, ItemKind, LocalId, Value};

use super::popup::Popup;
use super::position::Position;
use super::wizard::WizardSession;

/// A session request that conflicts with the current state.
/// Logged and dropped; never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("cannot start {requested} while {active} is active")]
    Busy {
        active: &'static str,
        requested: &'static str,
    },
    #[error("{0} needs an insert slot")]
    NotASlot(&'static str),
    #[error("{0} needs an item under the cursor")]
    NoItem(&'static str),
}

/// Held item while reordering
#[derive(Debug, Clone, PartialEq)]
pub struct GrabSession {
    pub item: LocalId,
    pub original_index: usize,
    pub current_index: usize,
    /// Full order before the grab, for cancel
    pub snapshot: Vec<LocalId>,
}

/// Inline multi-field edit of one item
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub item: LocalId,
    pub kind: ItemKind,
    /// Index into `kind.editable_fields()`
    pub focus: usize,
    pub draft: Fields,
    pub original: Fields,
    pub popup: Option<Popup>,
    pub error: Option<String>,
}

impl EditSession {
    pub fn new(item: LocalId, kind: ItemKind, fields: &Fields) -> Self {
        let draft: Fields = kind
            .editable_fields()
            .iter()
            .map(|f| (*f, fields.get(f).cloned().unwrap_or(Value::Null)))
            .collect();
        EditSession {
            item,
            kind,
            focus: 0,
            original: draft.clone(),
            draft,
            popup: None,
            error: None,
        }
    }

    pub fn focused_field(&self) -> Field {
        let fields = self.kind.editable_fields();
        fields[self.focus % fields.len()]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.kind.editable_fields().len();
    }

    pub fn focus_prev(&mut self) {
        let len = self.kind.editable_fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    /// Draft entries that differ from what the item had
    pub fn changed(&self) -> Fields {
        self.draft
            .iter()
            .filter(|(field, value)| self.original.get(*field) != Some(*value))
            .map(|(field, value)| (*field, value.clone()))
            .collect()
    }
}

/// The single active session of a cursor
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Wizard(WizardSession),
    Grab(GrabSession),
    Edit(EditSession),
}

impl Session {
    pub fn name(&self) -> &'static str {
        match self {
            Session::Wizard(_) => "wizard",
            Session::Grab(_) => "grab",
            Session::Edit(_) => "edit",
        }
    }

    pub fn popup(&self) -> Option<&Popup> {
        match self {
            Session::Wizard(w) => w.popup.as_ref(),
            Session::Edit(e) => e.popup.as_ref(),
            Session::Grab(_) => None,
        }
    }
}

/// Position plus at most one session, for one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub target: CollectionRef,
    pub position: Position,
    pub session: Option<Session>,
}

impl Cursor {
    pub fn new(target: CollectionRef, position: Position) -> Self {
        Cursor {
            target,
            position,
            session: None,
        }
    }

    fn busy(&self, requested: &'static str) -> Result<(), SessionError> {
        match &self.session {
            Some(active) => Err(SessionError::Busy {
                active: active.name(),
                requested,
            }),
            None => Ok(()),
        }
    }

    /// Begin typing a new item at the current insert slot
    pub fn start_wizard(&mut self, kind: ItemKind) -> Result<(), SessionError> {
        self.busy("wizard")?;
        if !self.position.is_insert_slot() {
            return Err(SessionError::NotASlot("wizard"));
        }
        tracing::debug!(target: "planner::session", kind = %kind, pos = self.position.raw(), "wizard started");
        self.session = Some(Session::Wizard(WizardSession::new(kind, self.position)));
        Ok(())
    }

    /// Open a slot below the current item and start a wizard there.
    /// On a slot this is `start_wizard`.
    pub fn insert_after(&mut self, kind: ItemKind) -> Result<(), SessionError> {
        self.busy("wizard")?;
        let prior = self.position;
        self.position = prior.insert_after_current();
        if let Err(e) = self.start_wizard(kind) {
            self.position = prior;
            return Err(e);
        }
        if let Some(wizard) = self.wizard_mut() {
            wizard.prior = prior;
        }
        Ok(())
    }

    pub fn start_grab(
        &mut self,
        item: LocalId,
        index: usize,
        snapshot: Vec<LocalId>,
    ) -> Result<(), SessionError> {
        self.busy("grab")?;
        tracing::debug!(target: "planner::session", %item, index, "grab started");
        self.session = Some(Session::Grab(GrabSession {
            item,
            original_index: index,
            current_index: index,
            snapshot,
        }));
        Ok(())
    }

    pub fn start_edit(
        &mut self,
        item: LocalId,
        kind: ItemKind,
        fields: &Fields,
    ) -> Result<(), SessionError> {
        self.busy("edit")?;
        tracing::debug!(target: "planner::session", %item, "edit started");
        self.session = Some(Session::Edit(EditSession::new(item, kind, fields)));
        Ok(())
    }

    /// Drop the session and put the position back where it was before it
    /// started. The caller restores collection state for grabs.
    pub fn cancel(&mut self) -> Option<Session> {
        let session = self.session.take()?;
        match &session {
            Session::Wizard(w) => self.position = w.prior,
            Session::Grab(g) => self.position = Position::item(g.original_index),
            Session::Edit(_) => {}
        }
        tracing::debug!(target: "planner::session", session = session.name(), "cancelled");
        Some(session)
    }

    pub fn wizard_mut(&mut self) -> Option<&mut WizardSession> {
        match &mut self.session {
            Some(Session::Wizard(w)) => Some(w),
            _ => None,
        }
    }

    pub fn grab_mut(&mut self) -> Option<&mut GrabSession> {
        match &mut self.session {
            Some(Session::Grab(g)) => Some(g),
            _ => None,
        }
    }

    pub fn edit_mut(&mut self) -> Option<&mut EditSession> {
        match &mut self.session {
            Some(Session::Edit(e)) => Some(e),
            _ => None,
        }
    }
}
