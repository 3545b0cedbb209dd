use crate::model::InsertSlot;

/// Arrow direction for position movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// What a position points at, decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Visible item index
    Item(usize),
    /// An empty row where typing starts a new item
    Insert(InsertSlot),
}

/// Encoded cursor inside one collection's visible items.
///
/// `p >= 0` is an item, `-1` the bottom slot, `-2` the top slot and
/// `p <= -3` the slot after item `|p| - 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position(i64);

impl Position {
    pub const BOTTOM: Position = Position(-1);
    pub const TOP: Position = Position(-2);

    pub fn item(index: usize) -> Self {
        Position(index as i64)
    }

    pub fn after(index: usize) -> Self {
        Position(-(index as i64) - 3)
    }

    pub fn from_raw(raw: i64) -> Self {
        Position(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    pub fn slot(self) -> Slot {
        match self.0 {
            p if p >= 0 => Slot::Item(p as usize),
            -1 => Slot::Insert(InsertSlot::Bottom),
            -2 => Slot::Insert(InsertSlot::Top),
            p => Slot::Insert(InsertSlot::After(insert_after_index(p))),
        }
    }

    pub fn item_index(self) -> Option<usize> {
        match self.slot() {
            Slot::Item(i) => Some(i),
            Slot::Insert(_) => None,
        }
    }

    pub fn is_insert_slot(self) -> bool {
        self.0 < 0
    }

    /// Position on entering a collection
    pub fn enter(len: usize) -> Self {
        if len > 0 {
            Position(0)
        } else {
            Position::BOTTOM
        }
    }

    /// Move one step. Down from the last item lands on the bottom slot, and
    /// down from there wraps to the first item, so `len + 1` downs from 0
    /// come back to 0.
    pub fn advance(self, direction: Direction, len: usize) -> Self {
        let len = len as i64;
        match (direction, self.slot()) {
            (Direction::Down, Slot::Item(i)) => {
                let next = i as i64 + 1;
                if next < len { Position(next) } else { Position::BOTTOM }
            }
            (Direction::Down, Slot::Insert(InsertSlot::Bottom)) => {
                if len > 0 { Position(0) } else { Position::TOP }
            }
            (Direction::Down, Slot::Insert(InsertSlot::Top)) => {
                if len > 0 { Position(0) } else { Position::BOTTOM }
            }
            (Direction::Down, Slot::Insert(InsertSlot::After(i))) => {
                let next = i as i64 + 1;
                if next < len { Position(next) } else { Position::BOTTOM }
            }
            (Direction::Up, Slot::Item(0)) => Position::TOP,
            (Direction::Up, Slot::Item(i)) => Position(i as i64 - 1),
            (Direction::Up, Slot::Insert(InsertSlot::Top)) => Position::BOTTOM,
            (Direction::Up, Slot::Insert(InsertSlot::Bottom)) => {
                if len > 0 { Position(len - 1) } else { Position::TOP }
            }
            (Direction::Up, Slot::Insert(InsertSlot::After(i))) => Position(i as i64).clamp(len as usize),
        }
    }

    /// Open a slot below the current item. Slots stay where they are.
    pub fn insert_after_current(self) -> Self {
        match self.slot() {
            Slot::Item(i) => Position::after(i),
            Slot::Insert(_) => self,
        }
    }

    /// Keep an item position inside `len`; empty views fall back to the
    /// bottom slot. After-slots past the end become the bottom slot too.
    pub fn clamp(self, len: usize) -> Self {
        match self.slot() {
            Slot::Item(_) | Slot::Insert(InsertSlot::After(_)) if len == 0 => Position::BOTTOM,
            Slot::Item(i) if i >= len => Position(len as i64 - 1),
            Slot::Insert(InsertSlot::After(i)) if i >= len => Position::BOTTOM,
            _ => self,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::BOTTOM
    }
}

/// Target index of an after-slot encoding (`p <= -3`)
pub fn insert_after_index(p: i64) -> usize {
    (p.unsigned_abs() as usize).saturating_sub(3)
}
