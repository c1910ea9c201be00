//! The cell model: a tagged kind plus integer mass.
//!
//! A cell's observable [`CellState`] is derived from its [`CellKind`] and its
//! mass, so the two can never disagree: a fluid cell holding mass is Water,
//! a fluid cell without mass is Empty, and walls and null cells never hold
//! mass at all.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer mass. One full, uncompressed cell holds `WaterConfig::max_mass`.
pub type Mass = i32;

// ---------------------------------------------------------------------------
// CellState
// ---------------------------------------------------------------------------

/// Observable state of a cell. Values are bit flags so set membership is a
/// single mask test (see [`CellState::matches`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellState {
    Null = 0,
    Wall = 1,
    Empty = 2,
    Water = 4,
}

impl CellState {
    /// One past the highest named state. Raw values above this clamp to
    /// `SENTINEL / 2`.
    pub const SENTINEL: i32 = 5;

    /// Mask matching cells that can hold water (Empty or Water).
    pub const FLUID_MASK: u8 = CellState::Empty as u8 | CellState::Water as u8;

    /// Resolve a raw integer into a state.
    ///
    /// Values below Null clamp to Null. Values above the sentinel, and
    /// in-range values that name no state, resolve to the sentinel's
    /// midpoint (Empty).
    pub fn from_raw(raw: i32) -> Self {
        let clamped = if raw < CellState::Null as i32 {
            CellState::Null as i32
        } else if raw > Self::SENTINEL {
            Self::SENTINEL / 2
        } else {
            raw
        };
        match clamped {
            0 => CellState::Null,
            1 => CellState::Wall,
            4 => CellState::Water,
            _ => CellState::Empty,
        }
    }

    /// The raw bit value.
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// True if this state's bit is set in `mask`.
    pub fn matches(self, mask: u8) -> bool {
        self.bits() & mask != 0
    }

    /// True for states that can hold and exchange mass.
    pub fn is_fillable(self) -> bool {
        !matches!(self, CellState::Wall | CellState::Null)
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellState::Null => "Null",
            CellState::Wall => "Wall",
            CellState::Empty => "Empty",
            CellState::Water => "Water",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// CellKind
// ---------------------------------------------------------------------------

/// What a cell is, independent of how much water it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Outside the playable area. Never holds mass.
    Null,
    /// Solid. Never holds mass.
    Wall,
    /// Open space that may hold water.
    Fluid,
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// One grid cell.
///
/// Fields are private: `mass` and `future_mass` only change through the
/// setters here, which keep the kind/mass invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    kind: CellKind,
    mass: Mass,
    future_mass: Mass,
    row: usize,
    col: usize,
}

impl Cell {
    /// An empty fluid cell at the given position.
    pub(crate) fn new(row: usize, col: usize) -> Self {
        Self {
            kind: CellKind::Fluid,
            mass: 0,
            future_mass: 0,
            row,
            col,
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    /// `(row, col)`.
    pub fn position(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn mass(&self) -> Mass {
        self.mass
    }

    /// Pending mass. Equal to [`Cell::mass`] outside a sweep.
    pub fn future_mass(&self) -> Mass {
        self.future_mass
    }

    /// Observable state, derived from kind and mass.
    pub fn state(&self) -> CellState {
        match self.kind {
            CellKind::Null => CellState::Null,
            CellKind::Wall => CellState::Wall,
            CellKind::Fluid if self.mass > 0 => CellState::Water,
            CellKind::Fluid => CellState::Empty,
        }
    }

    pub fn is_fillable(&self) -> bool {
        self.kind == CellKind::Fluid
    }

    /// Read-only copy of state and mass for renderers.
    pub fn snapshot(&self) -> CellSnapshot {
        CellSnapshot {
            state: self.state(),
            mass: self.mass,
        }
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    /// Change the cell's state.
    ///
    /// Wall, Null and Empty zero both masses. Water keeps the current mass;
    /// a cell switched to Water with no mass still reads as Empty until mass
    /// is added.
    pub(crate) fn set_state(&mut self, state: CellState) {
        self.kind = match state {
            CellState::Null => CellKind::Null,
            CellState::Wall => CellKind::Wall,
            CellState::Empty | CellState::Water => CellKind::Fluid,
        };
        if state != CellState::Water {
            self.mass = 0;
            self.future_mass = 0;
        }
    }

    /// Set the mass, culling anything below `min_mass` to zero, and reset
    /// the pending mass to match. Non-fillable cells stay at zero.
    pub(crate) fn set_mass(&mut self, mass: Mass, min_mass: Mass) {
        self.mass = if self.is_fillable() && mass >= min_mass {
            mass
        } else {
            0
        };
        self.future_mass = self.mass;
    }

    /// Commit the pending mass. Returns the mass culled by the threshold.
    pub(crate) fn update_mass(&mut self, min_mass: Mass) -> Mass {
        let pending = self.future_mass;
        self.set_mass(pending, min_mass);
        if self.mass == 0 { pending.max(0) } else { 0 }
    }

    /// Reset pending mass to the current mass at the start of a sweep.
    pub(crate) fn begin_tick(&mut self) {
        self.future_mass = self.mass;
    }

    pub(crate) fn debit(&mut self, delta: Mass) {
        self.future_mass = self.future_mass.saturating_sub(delta);
    }

    pub(crate) fn credit(&mut self, delta: Mass) {
        self.future_mass = self.future_mass.saturating_add(delta);
    }
}

// ---------------------------------------------------------------------------
// CellSnapshot
// ---------------------------------------------------------------------------

/// State and mass of one cell at the time it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub state: CellState,
    pub mass: Mass,
}

impl CellSnapshot {
    /// Fill level in tenths of a full cell. Compressed cells exceed 10.
    pub fn decile(&self, max_mass: Mass) -> i32 {
        if max_mass <= 0 {
            return 0;
        }
        (i64::from(self.mass) * 10 / i64::from(max_mass)) as i32
    }

    /// Opacity bonus for renderers, 0..=50 for an uncompressed cell.
    pub fn alpha(&self, max_mass: Mass) -> i32 {
        if max_mass <= 0 {
            return 0;
        }
        (i64::from(self.mass) * 50 / i64::from(max_mass)) as i32
    }

    /// Short label: the state name, or the fill decile for water.
    pub fn label(&self, max_mass: Mass) -> String {
        match self.state {
            CellState::Water => self.decile(max_mass).to_string(),
            CellState::Null => "NULL".to_string(),
            other => other.to_string(),
        }
    }
}
