use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::item::{Item, ItemKind, LocalId};

/// Which subset of a collection is addressable by position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewFilter {
    Active,
    Completed,
    Upcoming,
    Passed,
}

impl ViewFilter {
    pub fn default_for(kind: ItemKind) -> Self {
        if kind.filters_by_date() {
            ViewFilter::Upcoming
        } else {
            ViewFilter::Active
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewFilter::Active => ViewFilter::Completed,
            ViewFilter::Completed => ViewFilter::Active,
            ViewFilter::Upcoming => ViewFilter::Passed,
            ViewFilter::Passed => ViewFilter::Upcoming,
        }
    }

    /// New items land in the default view only
    pub fn accepts_new_items(self) -> bool {
        matches!(self, ViewFilter::Active | ViewFilter::Upcoming)
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewFilter::Active => "active",
            ViewFilter::Completed => "completed",
            ViewFilter::Upcoming => "upcoming",
            ViewFilter::Passed => "passed",
        }
    }
}

/// Where a new item goes, in visible-index terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertSlot {
    Top,
    Bottom,
    /// After the visible item at this index
    After(usize),
}

/// An ordered list of items of one kind.
///
/// `order` always equals the item's index; every mutation renumbers. This
/// keeps rollbacks exact: removing an inserted item restores every other
/// item's order too.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    kind: ItemKind,
    parent: Option<LocalId>,
    items: Vec<Item>,
    filter: ViewFilter,
    today: NaiveDate,
}

impl Collection {
    pub fn new(kind: ItemKind, parent: Option<LocalId>, today: NaiveDate) -> Self {
        Collection {
            kind,
            parent,
            items: Vec::new(),
            filter: ViewFilter::default_for(kind),
            today,
        }
    }

    /// Build from loaded items, sorted by their server order
    pub fn from_items(
        kind: ItemKind,
        parent: Option<LocalId>,
        mut items: Vec<Item>,
        today: NaiveDate,
    ) -> Self {
        items.sort_by_key(|item| item.order);
        let mut collection = Collection {
            kind,
            parent,
            items,
            filter: ViewFilter::default_for(kind),
            today,
        };
        collection.renumber();
        collection
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn parent(&self) -> Option<LocalId> {
        self.parent
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn filter(&self) -> ViewFilter {
        self.filter
    }

    pub fn toggle_filter(&mut self) {
        self.filter = self.filter.toggled();
    }

    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn is_visible(&self, item: &Item) -> bool {
        match self.filter {
            ViewFilter::Active => !item.completed,
            ViewFilter::Completed => item.completed,
            ViewFilter::Upcoming => !item.has_passed(self.today),
            ViewFilter::Passed => item.has_passed(self.today),
        }
    }

    /// Full-array indices of the visible items, in order
    pub fn visible_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.is_visible(item))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn visible_len(&self) -> usize {
        self.items.iter().filter(|item| self.is_visible(item)).count()
    }

    pub fn visible_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| self.is_visible(item))
    }

    pub fn visible_item(&self, index: usize) -> Option<&Item> {
        self.visible_items().nth(index)
    }

    /// Map a visible index to its full-array index
    pub fn full_index(&self, visible: usize) -> Option<usize> {
        self.visible_indices().get(visible).copied()
    }

    pub fn visible_index_of(&self, local: LocalId) -> Option<usize> {
        self.visible_items().position(|item| item.local == local)
    }

    pub fn index_of(&self, local: LocalId) -> Option<usize> {
        self.items.iter().position(|item| item.local == local)
    }

    pub fn get(&self, local: LocalId) -> Option<&Item> {
        self.items.iter().find(|item| item.local == local)
    }

    pub fn get_mut(&mut self, local: LocalId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.local == local)
    }

    /// Insert a new item at a visible slot. Returns its full index.
    pub fn insert(&mut self, slot: InsertSlot, mut item: Item) -> usize {
        let visible = self.visible_indices();
        let bottom = visible.last().map_or(self.items.len(), |last| last + 1);
        let index = match slot {
            InsertSlot::Top => visible.first().copied().unwrap_or(0),
            InsertSlot::Bottom => bottom,
            InsertSlot::After(i) => visible.get(i).map_or(bottom, |full| full + 1),
        };
        item.parent = self.parent;
        item.kind = self.kind;
        self.items.insert(index, item);
        self.renumber();
        index
    }

    /// Swap two visible items, translating to full indices first.
    /// Returns false when either index is out of range.
    pub fn swap_visible(&mut self, a: usize, b: usize) -> bool {
        let visible = self.visible_indices();
        match (visible.get(a), visible.get(b)) {
            (Some(&fa), Some(&fb)) => {
                self.items.swap(fa, fb);
                self.renumber();
                true
            }
            _ => false,
        }
    }

    /// Remove an item, returning its full index and the item
    pub fn remove(&mut self, local: LocalId) -> Option<(usize, Item)> {
        let index = self.index_of(local)?;
        let item = self.items.remove(index);
        self.renumber();
        Some((index, item))
    }

    /// Put a removed item back at its old full index (clamped)
    pub fn restore(&mut self, index: usize, item: Item) {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        self.renumber();
    }

    /// Current full order as handles
    pub fn order(&self) -> Vec<LocalId> {
        self.items.iter().map(|item| item.local).collect()
    }

    /// Rearrange to match `order`. Items missing from `order` keep their
    /// relative order after the listed ones; unknown handles are ignored.
    pub fn apply_order(&mut self, order: &[LocalId]) {
        let mut remaining = std::mem::take(&mut self.items);
        let mut sorted = Vec::with_capacity(remaining.len());
        for local in order {
            if let Some(pos) = remaining.iter().position(|item| item.local == *local) {
                sorted.push(remaining.remove(pos));
            }
        }
        sorted.extend(remaining);
        self.items = sorted;
        self.renumber();
    }

    /// Move one item to sit right after `anchor`, or first when `anchor` is
    /// `None` or gone. Everything else keeps its place.
    pub fn move_after(&mut self, local: LocalId, anchor: Option<LocalId>) -> bool {
        let Some((_, item)) = self.remove(local) else {
            return false;
        };
        let index = anchor
            .and_then(|a| self.index_of(a))
            .map_or(0, |i| i + 1);
        self.restore(index, item);
        true
    }

    /// Record a confirmed server id. Returns false if the item is gone.
    pub fn set_remote(&mut self, local: LocalId, remote: &str) -> bool {
        match self.get_mut(local) {
            Some(item) => {
                item.remote = Some(remote.to_string());
                true
            }
            None => false,
        }
    }

    fn renumber(&mut self) {
        for (i, item) in self.items.iter_mut().enumerate() {
            item.order = i as i64;
        }
    }
}
