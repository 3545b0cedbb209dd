use std::fmt;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::{Field, Value};

/// Ordered field map. Keys are fixed per item kind.
pub type Fields = IndexMap<Field, Value>;

/// In-process handle for an item. Allocated once, never reused, and stable
/// across reorders, so in-flight writes can always find their record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalId(pub u64);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmp-{}", self.0)
    }
}

/// The seven item kinds. Each has its own backend collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Goal,
    Project,
    ProjectTask,
    Routine,
    RoutineTask,
    AdminTask,
    Event,
}

impl ItemKind {
    pub const ALL: [ItemKind; 7] = [
        ItemKind::Goal,
        ItemKind::Project,
        ItemKind::ProjectTask,
        ItemKind::Routine,
        ItemKind::RoutineTask,
        ItemKind::AdminTask,
        ItemKind::Event,
    ];

    /// Backend collection name (URL segment / document key)
    pub fn endpoint(self) -> &'static str {
        match self {
            ItemKind::Goal => "goals",
            ItemKind::Project => "projects",
            ItemKind::ProjectTask => "project_tasks",
            ItemKind::Routine => "routines",
            ItemKind::RoutineTask => "routine_tasks",
            ItemKind::AdminTask => "admin_tasks",
            ItemKind::Event => "events",
        }
    }

    pub fn from_endpoint(s: &str) -> Option<ItemKind> {
        ItemKind::ALL.into_iter().find(|k| k.endpoint() == s)
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Goal => "goal",
            ItemKind::Project => "project",
            ItemKind::ProjectTask => "task",
            ItemKind::Routine => "routine",
            ItemKind::RoutineTask => "task",
            ItemKind::AdminTask => "admin task",
            ItemKind::Event => "event",
        }
    }

    /// Wizard step sequence. Name is always first.
    pub fn steps(self) -> &'static [Field] {
        match self {
            ItemKind::Goal => &[Field::Name],
            ItemKind::Project => &[Field::Name, Field::Goal, Field::Deadline],
            ItemKind::ProjectTask | ItemKind::RoutineTask => &[Field::Name, Field::Duration],
            ItemKind::Routine => &[
                Field::Name,
                Field::Goal,
                Field::DateRange,
                Field::Days,
                Field::TimeSlot,
            ],
            ItemKind::AdminTask => &[Field::Name, Field::Goal, Field::Deadline],
            ItemKind::Event => &[
                Field::Name,
                Field::Goal,
                Field::Recurring,
                Field::Days,
                Field::Date,
                Field::TimeRange,
                Field::Link,
            ],
        }
    }

    /// Fields cycled by the inline editor
    pub fn editable_fields(self) -> &'static [Field] {
        self.steps()
    }

    /// Whether a wizard step applies given the values collected so far.
    /// Event days are only asked for recurring events.
    pub fn step_applies(self, field: Field, collected: &Fields) -> bool {
        match (self, field) {
            (ItemKind::Event, Field::Days) => {
                matches!(collected.get(&Field::Recurring), Some(Value::Flag(true)))
            }
            _ => true,
        }
    }

    pub fn child_kind(self) -> Option<ItemKind> {
        match self {
            ItemKind::Project => Some(ItemKind::ProjectTask),
            ItemKind::Routine => Some(ItemKind::RoutineTask),
            _ => None,
        }
    }

    pub fn parent_kind(self) -> Option<ItemKind> {
        match self {
            ItemKind::ProjectTask => Some(ItemKind::Project),
            ItemKind::RoutineTask => Some(ItemKind::Routine),
            _ => None,
        }
    }

    /// Events filter by date (upcoming / passed) instead of completion
    pub fn filters_by_date(self) -> bool {
        self == ItemKind::Event
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

static NULL: Value = Value::Null;

/// One entry in a collection
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub local: LocalId,
    /// Server id once confirmed. `None` marks a temporary item.
    pub remote: Option<String>,
    pub kind: ItemKind,
    pub order: i64,
    pub completed: bool,
    pub fields: Fields,
    pub parent: Option<LocalId>,
}

impl Item {
    pub fn new(local: LocalId, kind: ItemKind, fields: Fields) -> Self {
        Item {
            local,
            remote: None,
            kind,
            order: 0,
            completed: false,
            fields,
            parent: None,
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.remote.is_none()
    }

    /// Server id, or the `tmp-N` handle while the create is in flight
    pub fn display_id(&self) -> String {
        match &self.remote {
            Some(id) => id.clone(),
            None => self.local.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        self.fields
            .get(&Field::Name)
            .and_then(Value::as_text)
            .unwrap_or("")
    }

    pub fn field(&self, field: Field) -> &Value {
        self.fields.get(&field).unwrap_or(&NULL)
    }

    /// A one-off event whose date is before `today`. Recurring events never pass.
    pub fn has_passed(&self, today: NaiveDate) -> bool {
        if matches!(self.field(Field::Recurring), Value::Flag(true)) {
            return false;
        }
        match self.field(Field::Date) {
            Value::Date(d) => *d < today,
            _ => false,
        }
    }
}
