//! The rule engine: sweep, commit, and the per-direction transfer rules.
//!
//! A tick is two phases. The **sweep** visits every fillable cell in
//! row-major order and moves mass down, left, right and up by debiting and
//! crediting *pending* masses only. The **commit** then copies every pending
//! mass into the current mass, culling anything below `min_mass`. Because
//! the sweep reads only current masses, a cell visited early never sees a
//! neighbour's update from the same tick.
//!
//! The transfer rules are pure functions of masses and config so they can
//! be tested in isolation.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, Mass};
use crate::compress::compressible_mass;
use crate::config::WaterConfig;
use crate::fixed::Fixed64;
use crate::grid::Grid;

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

/// Mass accounting for one tick.
///
/// Transfers between cells conserve mass, so
/// `total_after == total_before - drained - culled_mass` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Mass moved into the cell below.
    pub moved_down: i64,
    /// Mass moved to left or right neighbours.
    pub moved_lateral: i64,
    /// Mass pushed back into the cell above.
    pub moved_up: i64,
    /// Mass lost through the open edges of the grid.
    pub drained: i64,
    /// Cells whose pending mass fell below `min_mass` and were emptied.
    pub culled_cells: u32,
    /// Mass discarded by culling.
    pub culled_mass: i64,
    /// Total mass before the sweep.
    pub total_before: i64,
    /// Total mass after the commit.
    pub total_after: i64,
}

impl TickReport {
    /// Mass that changed cells this tick.
    pub fn moved(&self) -> i64 {
        self.moved_down + self.moved_lateral + self.moved_up
    }

    /// Mass that left the grid this tick, by drainage or culling.
    pub fn lost(&self) -> i64 {
        self.drained + self.culled_mass
    }

    /// `total_after - total_before`.
    pub fn net_change(&self) -> i64 {
        self.total_after - self.total_before
    }

    /// True if the before/after totals agree with the recorded losses.
    pub fn is_balanced(&self) -> bool {
        self.total_before - self.lost() == self.total_after
    }

    /// True if nothing moved and nothing was lost.
    pub fn is_quiescent(&self) -> bool {
        self.moved() == 0 && self.lost() == 0
    }
}

// ---------------------------------------------------------------------------
// Transfer rules
// ---------------------------------------------------------------------------

/// Mass moved from a cell into the fillable cell below it.
///
/// Fills the lower cell up to `max_mass` (or its compressible capacity when
/// `compress_downward` is set), bounded by `min(min_delta, remaining)`.
pub fn downward_delta(remaining: Mass, below: Mass, config: &WaterConfig) -> Mass {
    let combined = i64::from(remaining) + i64::from(below);
    let capacity = if config.compress_downward {
        i64::from(compressible_mass(saturate(combined), config))
    } else {
        combined.min(i64::from(config.max_mass))
    };
    let mut delta = capacity - i64::from(below);
    if config.halve_fast_downward && delta > i64::from(config.min_delta) {
        delta /= 2;
    }
    bounded(delta, config.min_delta.min(remaining))
}

/// Mass a bottom-row cell loses to the void.
pub fn bottom_drain(remaining: Mass, config: &WaterConfig) -> Mass {
    bounded(i64::from(compressible_mass(remaining, config)), remaining)
}

/// Mass moved from a cell into a fillable side neighbour.
///
/// `mass` is the cell's mass at the start of the tick, not what remains
/// after earlier transfers.
pub fn lateral_delta(mass: Mass, neighbour: Mass, remaining: Mass, config: &WaterConfig) -> Mass {
    let diff = i64::from(mass) - i64::from(neighbour);
    let delta = divide(diff, config.lateral_divisor);
    bounded(halve_if_fast(delta, config), remaining)
}

/// Mass a cell on the left or right edge loses to the void.
pub fn edge_drain(mass: Mass, remaining: Mass, config: &WaterConfig) -> Mass {
    let delta = i64::from(mass) / 2;
    bounded(halve_if_fast(delta, config), remaining)
}

/// Over-compressed mass pushed into the fillable cell above.
pub fn upward_delta(remaining: Mass, above: Mass, config: &WaterConfig) -> Mass {
    let combined = saturate(i64::from(remaining) + i64::from(above));
    let delta = i64::from(remaining) - i64::from(compressible_mass(combined, config));
    bounded(delta, config.min_delta.min(remaining))
}

fn halve_if_fast(delta: i64, config: &WaterConfig) -> i64 {
    if config.halve_fast_lateral && delta > i64::from(config.min_delta) {
        delta / 2
    } else {
        delta
    }
}

/// Clamp into `[0, upper]`.
fn bounded(delta: i64, upper: Mass) -> Mass {
    delta.clamp(0, i64::from(upper.max(0))) as Mass
}

fn saturate(value: i64) -> Mass {
    value.clamp(i64::from(Mass::MIN), i64::from(Mass::MAX)) as Mass
}

/// `value / divisor`, truncated toward zero. Exact for any Q32.32 divisor.
fn divide(value: i64, divisor: Fixed64) -> i64 {
    let bits = i128::from(divisor.to_bits());
    if bits <= 0 {
        return 0;
    }
    let quotient = (i128::from(value) << Fixed64::FRAC_NBITS) / bits;
    quotient.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

// ---------------------------------------------------------------------------
// Sweep and commit
// ---------------------------------------------------------------------------

fn transfer(cells: &mut [Cell], from: usize, to: usize, delta: Mass) {
    cells[from].debit(delta);
    cells[to].credit(delta);
}

/// Compute every cell's pending mass for the next tick.
pub(crate) fn sweep(grid: &mut Grid, report: &mut TickReport) {
    let count = grid.rows() * grid.columns();
    sweep_in_order(grid, 0..count, report);
}

/// Sweep the cells at the given indices. Transfers read only current masses,
/// so any order covering every cell yields the same pending masses.
fn sweep_in_order(
    grid: &mut Grid,
    order: impl IntoIterator<Item = usize>,
    report: &mut TickReport,
) {
    let rows = grid.rows();
    let columns = grid.columns();
    let config = *grid.config();
    let min = config.min_mass;
    let cells = grid.cells_mut();

    for cell in cells.iter_mut() {
        cell.begin_tick();
    }

    for i in order {
        let (row, col) = (i / columns, i % columns);
        if !cells[i].is_fillable() {
            continue;
        }
        let mass = cells[i].mass();
        let mut remaining = mass;
        if remaining < min {
            continue;
        }

        // Down, or into the void below the bottom row.
        if row + 1 < rows {
            let below = i + columns;
            if cells[below].is_fillable() {
                let delta = downward_delta(remaining, cells[below].mass(), &config);
                transfer(cells, i, below, delta);
                remaining -= delta;
                report.moved_down += i64::from(delta);
            }
        } else {
            let delta = bottom_drain(remaining, &config);
            cells[i].debit(delta);
            remaining -= delta;
            report.drained += i64::from(delta);
        }
        if remaining < min {
            continue;
        }

        // Left.
        if col > 0 {
            let left = i - 1;
            if cells[left].is_fillable() {
                let delta = lateral_delta(mass, cells[left].mass(), remaining, &config);
                transfer(cells, i, left, delta);
                remaining -= delta;
                report.moved_lateral += i64::from(delta);
            }
        } else {
            let delta = edge_drain(mass, remaining, &config);
            cells[i].debit(delta);
            remaining -= delta;
            report.drained += i64::from(delta);
        }
        if remaining < min {
            continue;
        }

        // Right.
        if col + 1 < columns {
            let right = i + 1;
            if cells[right].is_fillable() {
                let delta = lateral_delta(mass, cells[right].mass(), remaining, &config);
                transfer(cells, i, right, delta);
                remaining -= delta;
                report.moved_lateral += i64::from(delta);
            }
        } else {
            let delta = edge_drain(mass, remaining, &config);
            cells[i].debit(delta);
            remaining -= delta;
            report.drained += i64::from(delta);
        }
        if remaining < min {
            continue;
        }

        // Up.
        if row > 0 {
            let above = i - columns;
            if cells[above].is_fillable() {
                let delta = upward_delta(remaining, cells[above].mass(), &config);
                transfer(cells, i, above, delta);
                report.moved_up += i64::from(delta);
            }
        }
    }
}

/// Copy every fillable cell's pending mass into its current mass.
pub(crate) fn commit(grid: &mut Grid, report: &mut TickReport) {
    let min = grid.config().min_mass;
    for cell in grid.cells_mut().iter_mut().filter(|c| c.is_fillable()) {
        let culled = cell.update_mass(min);
        if culled > 0 {
            report.culled_cells += 1;
            report.culled_mass += i64::from(culled);
        }
    }
}

/// Run one sweep and commit.
pub fn tick(grid: &mut Grid) -> TickReport {
    let mut report = TickReport {
        total_before: grid.total_mass(),
        ..TickReport::default()
    };
    sweep(grid, &mut report);
    commit(grid, &mut report);
    report.total_after = grid.total_mass();
    trace!(
        "tick: total {} -> {} (down={}, lateral={}, up={}, drained={}, culled={})",
        report.total_before,
        report.total_after,
        report.moved_down,
        report.moved_lateral,
        report.moved_up,
        report.drained,
        report.culled_mass,
    );
    report
}
