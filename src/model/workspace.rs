use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::collection::Collection;
use super::item::{Item, ItemKind, LocalId};
use super::record::{RemoteRecord, Snapshot};

/// The top-level sections of the outline, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Goals,
    Projects,
    Routines,
    Admin,
    Events,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Goals,
        SectionKind::Projects,
        SectionKind::Routines,
        SectionKind::Admin,
        SectionKind::Events,
    ];

    pub fn index(self) -> usize {
        match self {
            SectionKind::Goals => 0,
            SectionKind::Projects => 1,
            SectionKind::Routines => 2,
            SectionKind::Admin => 3,
            SectionKind::Events => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<SectionKind> {
        SectionKind::ALL.get(index).copied()
    }

    pub fn item_kind(self) -> ItemKind {
        match self {
            SectionKind::Goals => ItemKind::Goal,
            SectionKind::Projects => ItemKind::Project,
            SectionKind::Routines => ItemKind::Routine,
            SectionKind::Admin => ItemKind::AdminTask,
            SectionKind::Events => ItemKind::Event,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Goals => "Goals",
            SectionKind::Projects => "Projects",
            SectionKind::Routines => "Routines",
            SectionKind::Admin => "Admin",
            SectionKind::Events => "Events",
        }
    }
}

/// Identifies one collection: a section's list, or a parent's task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    pub kind: ItemKind,
    pub parent: Option<LocalId>,
}

impl CollectionRef {
    pub fn section(section: SectionKind) -> Self {
        CollectionRef {
            kind: section.item_kind(),
            parent: None,
        }
    }

    pub fn children(kind: ItemKind, parent: LocalId) -> Self {
        CollectionRef {
            kind,
            parent: Some(parent),
        }
    }
}

/// All collections, plus the handle allocator
#[derive(Debug, Clone)]
pub struct Workspace {
    sections: Vec<Collection>,
    /// Task lists keyed by their parent project/routine
    children: HashMap<LocalId, Collection>,
    next_local: u64,
    today: NaiveDate,
}

impl Workspace {
    pub fn new(today: NaiveDate) -> Self {
        Workspace {
            sections: SectionKind::ALL
                .iter()
                .map(|s| Collection::new(s.item_kind(), None, today))
                .collect(),
            children: HashMap::new(),
            next_local: 1,
            today,
        }
    }

    /// Populate from a backend snapshot. Tasks whose parent is unknown are dropped.
    pub fn from_snapshot(snapshot: &Snapshot, today: NaiveDate) -> Self {
        let mut ws = Workspace::new(today);
        let mut by_remote: HashMap<(ItemKind, String), LocalId> = HashMap::new();

        for section in SectionKind::ALL {
            let kind = section.item_kind();
            let items: Vec<Item> = snapshot
                .records(kind)
                .iter()
                .map(|record| {
                    let item = ws.item_from_record(kind, record, None);
                    by_remote.insert((kind, record.id.clone()), item.local);
                    item
                })
                .collect();
            ws.sections[section.index()] = Collection::from_items(kind, None, items, today);
        }

        for kind in [ItemKind::ProjectTask, ItemKind::RoutineTask] {
            let Some(parent_kind) = kind.parent_kind() else {
                continue;
            };
            let mut grouped: HashMap<LocalId, Vec<Item>> = HashMap::new();
            for record in snapshot.records(kind) {
                let parent = record
                    .parent_id
                    .as_ref()
                    .and_then(|pid| by_remote.get(&(parent_kind, pid.clone())))
                    .copied();
                match parent {
                    Some(parent) => {
                        let item = ws.item_from_record(kind, record, Some(parent));
                        grouped.entry(parent).or_default().push(item);
                    }
                    None => {
                        tracing::warn!(kind = %kind, id = %record.id, "dropping task with unknown parent");
                    }
                }
            }
            for (parent, items) in grouped {
                ws.children.insert(
                    parent,
                    Collection::from_items(kind, Some(parent), items, today),
                );
            }
        }
        ws
    }

    fn item_from_record(
        &mut self,
        kind: ItemKind,
        record: &RemoteRecord,
        parent: Option<LocalId>,
    ) -> Item {
        let mut item = Item::new(self.alloc_local(), kind, record.fields.clone());
        item.remote = Some(record.id.clone());
        item.order = record.order;
        item.completed = record.completed;
        item.parent = parent;
        item
    }

    pub fn alloc_local(&mut self) -> LocalId {
        let id = LocalId(self.next_local);
        self.next_local += 1;
        id
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
        for c in self.sections.iter_mut().chain(self.children.values_mut()) {
            c.set_today(today);
        }
    }

    pub fn section(&self, section: SectionKind) -> &Collection {
        &self.sections[section.index()]
    }

    pub fn section_mut(&mut self, section: SectionKind) -> &mut Collection {
        &mut self.sections[section.index()]
    }

    pub fn collection(&self, target: CollectionRef) -> Option<&Collection> {
        match target.parent {
            None => self
                .sections
                .iter()
                .find(|c| c.kind() == target.kind),
            Some(parent) => self.children.get(&parent),
        }
    }

    /// Child collections are created on first access, as long as the parent exists.
    pub fn collection_mut(&mut self, target: CollectionRef) -> Option<&mut Collection> {
        match target.parent {
            None => self
                .sections
                .iter_mut()
                .find(|c| c.kind() == target.kind),
            Some(parent) => {
                self.find(parent)?;
                let today = self.today;
                Some(
                    self.children
                        .entry(parent)
                        .or_insert_with(|| Collection::new(target.kind, Some(parent), today)),
                )
            }
        }
    }

    pub fn children_of(&self, parent: LocalId) -> Option<&Collection> {
        self.children.get(&parent)
    }

    /// Detach a parent's task list (used when the parent is deleted)
    pub fn take_children(&mut self, parent: LocalId) -> Option<Collection> {
        self.children.remove(&parent)
    }

    pub fn restore_children(&mut self, parent: LocalId, children: Collection) {
        self.children.insert(parent, children);
    }

    /// Locate an item anywhere in the workspace
    pub fn find(&self, local: LocalId) -> Option<(CollectionRef, &Item)> {
        for c in self.sections.iter().chain(self.children.values()) {
            if let Some(item) = c.get(local) {
                let target = CollectionRef {
                    kind: c.kind(),
                    parent: c.parent(),
                };
                return Some((target, item));
            }
        }
        None
    }

    /// Every item in every collection, sections first
    pub fn all_items(&self) -> impl Iterator<Item = &Item> {
        self.sections
            .iter()
            .chain(self.children.values())
            .flat_map(|c| c.items().iter())
    }

    pub fn find_mut(&mut self, local: LocalId) -> Option<&mut Item> {
        self.sections
            .iter_mut()
            .chain(self.children.values_mut())
            .find_map(|c| c.get_mut(local))
    }

    /// Goals selectable in the goal picker: confirmed and not completed
    pub fn pickable_goals(&self) -> Vec<(String, String)> {
        self.section(SectionKind::Goals)
            .items()
            .iter()
            .filter(|g| !g.completed)
            .filter_map(|g| g.remote.clone().map(|id| (id, g.name().to_string())))
            .collect()
    }

    pub fn goal_name(&self, remote: &str) -> Option<&str> {
        self.section(SectionKind::Goals)
            .items()
            .iter()
            .find(|g| g.remote.as_deref() == Some(remote))
            .map(Item::name)
    }
}
