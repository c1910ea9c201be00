//! Queued cell edits.
//!
//! Hosts that receive input while a tick may be in flight (a UI thread, a
//! network peer, a replay) queue [`Edit`]s instead of touching the grid. The
//! simulation drains the queue at the start of each step, so edits never
//! interleave with a sweep.

use serde::{Deserialize, Serialize};

use crate::cell::{CellState, Mass};
use crate::fixed::Ticks;
use crate::grid::Grid;

// ---------------------------------------------------------------------------
// Edit enum
// ---------------------------------------------------------------------------

/// A single cell edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edit {
    /// Turn a cell into a wall.
    SetWall { row: usize, col: usize },
    /// Clear a cell to Empty.
    SetEmpty { row: usize, col: usize },
    /// Remove a cell from play.
    SetNull { row: usize, col: usize },
    /// Set a cell's state from a raw integer (clamped).
    SetRawState { row: usize, col: usize, raw: i32 },
    /// Make a cell water with exactly `mass`.
    SetWater { row: usize, col: usize, mass: Mass },
    /// Add `amount` to a cell's water.
    AddWater { row: usize, col: usize, amount: Mass },
}

impl Edit {
    /// Target `(row, col)`.
    pub fn position(&self) -> (usize, usize) {
        match *self {
            Edit::SetWall { row, col }
            | Edit::SetEmpty { row, col }
            | Edit::SetNull { row, col }
            | Edit::SetRawState { row, col, .. }
            | Edit::SetWater { row, col, .. }
            | Edit::AddWater { row, col, .. } => (row, col),
        }
    }

    /// Apply to `grid`. Returns `false` if the target is off the grid.
    pub fn apply(&self, grid: &mut Grid) -> bool {
        match *self {
            Edit::SetWall { row, col } => grid.set_state(row, col, CellState::Wall),
            Edit::SetEmpty { row, col } => grid.set_state(row, col, CellState::Empty),
            Edit::SetNull { row, col } => grid.set_state(row, col, CellState::Null),
            Edit::SetRawState { row, col, raw } => grid.set_raw_state(row, col, raw),
            Edit::SetWater { row, col, mass } => grid.set_water(row, col, mass),
            Edit::AddWater { row, col, amount } => grid.add_water(row, col, amount),
        }
    }
}

// ---------------------------------------------------------------------------
// EditQueue
// ---------------------------------------------------------------------------

/// Edits waiting for the next step, with optional history for replay.
#[derive(Debug, Clone, Default)]
pub struct EditQueue {
    pending: Vec<Edit>,
    /// Applied edits as (tick, edit).
    history: Vec<(Ticks, Edit)>,
    /// 0 = no history.
    max_history: usize,
}

impl EditQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue that retains up to `max_history` applied edits.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            max_history,
            ..Self::default()
        }
    }

    pub fn push(&mut self, edit: Edit) {
        self.pending.push(edit);
    }

    pub fn push_batch(&mut self, edits: impl IntoIterator<Item = Edit>) {
        self.pending.extend(edits);
    }

    /// Take all pending edits in submission order, recording them in history
    /// under `tick`.
    pub fn drain(&mut self, tick: Ticks) -> Vec<Edit> {
        let edits: Vec<Edit> = self.pending.drain(..).collect();

        if self.max_history > 0 {
            self.history.extend(edits.iter().map(|edit| (tick, *edit)));
            let excess = self.history.len().saturating_sub(self.max_history);
            if excess > 0 {
                self.history.drain(..excess);
            }
        }

        edits
    }

    /// Edits waiting for the next step, in submission order.
    pub fn pending(&self) -> &[Edit] {
        &self.pending
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn history(&self) -> &[(Ticks, Edit)] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
