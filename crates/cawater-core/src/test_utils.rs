//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::cell::{CellKind, CellState, Mass};
use crate::config::WaterConfig;
use crate::fixed::Fixed64;
use crate::grid::Grid;
use crate::sim::SimulationStrategy;
use crate::simulation::Simulation;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Grid builders
// ===========================================================================

/// An all-Empty grid with default config.
///
/// # Panics
///
/// Panics if `rows` or `columns` is below the minimum.
pub fn empty_grid(rows: usize, columns: usize) -> Grid {
    Grid::new(rows, columns, WaterConfig::default()).expect("valid test grid")
}

/// A grid with a wall ring around the border.
pub fn walled_grid(rows: usize, columns: usize) -> Grid {
    let mut grid = empty_grid(rows, columns);
    grid.enclose();
    grid
}

/// A walled basin with full water in the interior top rows.
pub fn basin(rows: usize, columns: usize, water_rows: usize) -> Grid {
    let mut grid = walled_grid(rows, columns);
    let max = grid.config().max_mass;
    for row in 1..=water_rows.min(rows - 2) {
        for col in 1..columns - 1 {
            grid.set_water(row, col, max);
        }
    }
    grid
}

/// Parse a text map with default config.
pub fn ascii(map: &str) -> Grid {
    Grid::from_ascii(map, WaterConfig::default()).expect("valid test map")
}

/// Deterministic pseudo-random grid for benchmarks: roughly a tenth walls,
/// a third water.
pub fn noise_grid(rows: usize, columns: usize, seed: u64) -> Grid {
    let mut grid = empty_grid(rows, columns);
    let max = grid.config().max_mass;
    let mut state = seed | 1;
    for row in 0..rows {
        for col in 0..columns {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            match state % 30 {
                0..=2 => {
                    grid.set_wall(row, col);
                }
                3..=12 => {
                    grid.set_water(row, col, (state % max as u64) as Mass);
                }
                _ => {}
            }
        }
    }
    grid
}

pub fn tick_sim(grid: Grid) -> Simulation {
    Simulation::new(grid, SimulationStrategy::Tick)
}

// ===========================================================================
// Assertions
// ===========================================================================

/// Assert every cell's state agrees with its kind and mass.
///
/// # Panics
///
/// Panics with the offending cell if any invariant fails.
pub fn assert_coherent(grid: &Grid) {
    let min = grid.config().min_mass;
    for cell in grid.cells() {
        let (row, col) = cell.position();
        assert!(cell.mass() >= 0, "negative mass at ({row}, {col}): {cell:?}");
        assert_eq!(
            cell.mass(),
            cell.future_mass(),
            "pending mass left over at ({row}, {col})"
        );
        match cell.kind() {
            CellKind::Wall | CellKind::Null => {
                assert_eq!(cell.mass(), 0, "solid cell holds mass at ({row}, {col})");
                assert!(!cell.is_fillable());
            }
            CellKind::Fluid => {
                assert!(
                    cell.mass() == 0 || cell.mass() >= min,
                    "sub-threshold mass at ({row}, {col}): {}",
                    cell.mass()
                );
                assert_eq!(
                    cell.mass() > 0,
                    cell.state() == CellState::Water,
                    "state/mass mismatch at ({row}, {col})"
                );
            }
        }
    }
}
