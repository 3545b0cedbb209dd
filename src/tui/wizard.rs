use crate::model::{Field, Fields, Item, ItemKind, LocalId, Value};

use super::popup::Popup;
use super::position::Position;

/// What the wizard wants next after a step resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    /// Collect this field next
    Ask(Field),
    /// Every step is answered; build the item
    Done,
    /// Name was blank; drop the wizard
    Abort,
}

/// A creation wizard in progress.
///
/// Step 0 is always the name, typed into `buffer`. Later steps are answered
/// through `popup`.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardSession {
    pub kind: ItemKind,
    pub step: usize,
    pub buffer: String,
    pub collected: Fields,
    /// Slot the new item goes into
    pub origin: Position,
    /// Where the cursor was before the wizard; cancel goes back here
    pub prior: Position,
    pub popup: Option<Popup>,
}

impl WizardSession {
    pub fn new(kind: ItemKind, origin: Position) -> Self {
        WizardSession {
            kind,
            step: 0,
            buffer: String::new(),
            collected: Fields::new(),
            origin,
            prior: origin,
            popup: None,
        }
    }

    pub fn field(&self) -> Field {
        self.kind.steps()[self.step]
    }

    pub fn is_naming(&self) -> bool {
        self.step == 0
    }

    fn next_applicable(&self, from: usize) -> Option<usize> {
        let steps = self.kind.steps();
        (from + 1..steps.len()).find(|i| self.kind.step_applies(steps[*i], &self.collected))
    }

    fn prev_applicable(&self, from: usize) -> usize {
        let steps = self.kind.steps();
        (1..from)
            .rev()
            .find(|i| self.kind.step_applies(steps[*i], &self.collected))
            .unwrap_or(0)
    }

    fn advance(&mut self) -> WizardStep {
        match self.next_applicable(self.step) {
            Some(next) => {
                self.step = next;
                WizardStep::Ask(self.field())
            }
            None => WizardStep::Done,
        }
    }

    /// Enter on the name step
    pub fn submit_name(&mut self) -> WizardStep {
        let name = self.buffer.trim();
        if name.is_empty() {
            return WizardStep::Abort;
        }
        self.collected
            .insert(Field::Name, Value::Text(name.to_string()));
        self.advance()
    }

    /// A collector resolved with a value
    pub fn accept(&mut self, value: Value) -> WizardStep {
        self.collected.insert(self.field(), value);
        self.advance()
    }

    /// A collector was cancelled: forget this step and go back one. The
    /// earlier answer stays so its collector opens preloaded.
    /// Returns the step now being asked; `Field::Name` means typing again.
    pub fn step_back(&mut self) -> Field {
        let field = self.field();
        self.collected.shift_remove(&field);
        self.step = self.prev_applicable(self.step);
        if self.step == 0 {
            self.collected.shift_remove(&Field::Name);
        }
        self.field()
    }

    /// Build the item. Every step field is present, `Null` when skipped.
    pub fn build(&self, local: LocalId) -> Item {
        let fields: Fields = self
            .kind
            .steps()
            .iter()
            .map(|f| (*f, self.collected.get(f).cloned().unwrap_or(Value::Null)))
            .collect();
        Item::new(local, self.kind, fields)
    }
}
