//! Layout parameters remembered for every tag

use super::client::ClientId;
use crate::{core::change::Change, layout::LayoutKind};
use serde::{Deserialize, Serialize};

/// Number of directions each area may take: the primary split may be
/// rotated, the master and stack sub-splits may not
pub(crate) const DIRECTION_COUNTS: [usize; 3] = [4, 2, 2];
/// Lowest weighting factor of an area
pub(crate) const MIN_FACT: f32 = 0.1;
/// Highest weighting factor of an area
pub(crate) const MAX_FACT: f32 = 10.0;

// ============================== SplitDir ============================
// ====================================================================

/// How an area is split between its occupants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum SplitDir {
    /// Side by side, first occupant on the left
    Horizontal,
    /// Stacked, first occupant on top
    Vertical,
    /// Side by side, first occupant on the right
    RotatedHorizontal,
    /// Stacked, first occupant at the bottom
    RotatedVertical,
}

impl SplitDir {
    const ALL: [Self; 4] = [
        Self::Horizontal,
        Self::Vertical,
        Self::RotatedHorizontal,
        Self::RotatedVertical,
    ];

    /// Position of the direction in the cycle
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
            Self::RotatedHorizontal => 2,
            Self::RotatedVertical => 3,
        }
    }

    /// Direction at `idx`, saturating at the last one
    pub(crate) fn from_index(idx: usize) -> Self {
        Self::ALL[idx.min(Self::ALL.len() - 1)]
    }

    /// Occupants are laid out along the x-axis
    pub(crate) const fn is_horizontal(self) -> bool {
        matches!(self, Self::Horizontal | Self::RotatedHorizontal)
    }

    /// Glyph shown in the layout symbol
    pub(crate) const fn glyph(self, primary: bool) -> char {
        if primary {
            match self {
                Self::Horizontal => '<',
                Self::Vertical => '^',
                Self::RotatedHorizontal => '>',
                Self::RotatedVertical => 'v',
            }
        } else if self.is_horizontal() {
            '-'
        } else {
            '|'
        }
    }

    /// Apply a [`Change`] within the first `count` directions. Steps wrap
    /// around, absolute values are clamped
    pub(crate) fn changed(self, change: Change<i32>, count: usize) -> Self {
        let count = count.max(1) as i32;
        let idx = match change {
            Change::Inc(step) => (self.index() as i32 + step).rem_euclid(count),
            Change::Set(value) => value.clamp(0, count - 1),
        };
        Self::from_index(idx as usize)
    }
}

// ================================ Area ==============================
// ====================================================================

/// Persisted parameters of one tiling region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct Area {
    pub(crate) dir:  SplitDir,
    /// Share of the first occupant relative to its siblings
    pub(crate) fact: f32,
}

// ============================== TagSlot =============================
// ====================================================================

/// Everything a tag remembers about its layout
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TagSlot {
    pub(crate) master_count:  u32,
    pub(crate) stack_columns: u32,
    /// Primary split, master area, stack area
    pub(crate) areas:         [Area; 3],
    pub(crate) layouts:       [LayoutKind; 2],
    /// Which of the two layouts is selected
    pub(crate) sellt:         usize,
    pub(crate) show_bar:      bool,
    /// Master displaced by the last swap-zoom
    pub(crate) prev_zoom:     Option<ClientId>,
}

impl TagSlot {
    /// The active layout
    pub(crate) const fn layout(&self) -> LayoutKind {
        self.layouts[self.sellt]
    }

    /// Change the split directions of all three areas
    pub(crate) fn set_directions(&mut self, changes: [Change<i32>; 3]) {
        for ((area, change), count) in self.areas.iter_mut().zip(changes).zip(DIRECTION_COUNTS) {
            area.dir = area.dir.changed(change, count);
        }
    }

    /// Change the weighting factors of all three areas
    pub(crate) fn set_factors(&mut self, changes: [Change<f32>; 3]) {
        for (area, change) in self.areas.iter_mut().zip(changes) {
            area.fact = change.apply(area.fact).clamp(MIN_FACT, MAX_FACT);
        }
    }
}

// =============================== Pertag =============================
// ====================================================================

/// One [`TagSlot`] for each tag plus slot `0` for the view of all tags
#[derive(Debug, Clone)]
pub(crate) struct Pertag {
    /// Slot of the active view
    pub(crate) current:  usize,
    /// Slot of the view before it
    pub(crate) previous: usize,
    slots:               Vec<TagSlot>,
}

impl Pertag {
    /// Create a new [`Pertag`] for `tag_count` tags, each starting from
    /// `defaults`
    pub(crate) fn new(tag_count: usize, mut defaults: TagSlot) -> Self {
        for (area, count) in defaults.areas.iter_mut().zip(DIRECTION_COUNTS) {
            area.dir = SplitDir::from_index(area.dir.index().min(count - 1));
            area.fact = area.fact.clamp(MIN_FACT, MAX_FACT);
        }

        Self {
            current:  1,
            previous: 1,
            slots:    vec![defaults; tag_count + 1],
        }
    }

    /// Slot of the active view
    pub(crate) fn slot(&self) -> &TagSlot {
        &self.slots[self.current]
    }

    /// Mutable slot of the active view
    pub(crate) fn slot_mut(&mut self) -> &mut TagSlot {
        &mut self.slots[self.current]
    }

    /// Make `idx` the active slot, remembering the old one
    pub(crate) fn select(&mut self, idx: usize) {
        self.previous = self.current;
        self.current = idx.min(self.slots.len() - 1);
    }

    /// Go back to the previously active slot
    pub(crate) fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
    }

    /// Forget `id` wherever it is remembered as a displaced master
    pub(crate) fn forget(&mut self, id: ClientId) {
        for slot in &mut self.slots {
            if slot.prev_zoom == Some(id) {
                slot.prev_zoom = None;
            }
        }
    }
}
