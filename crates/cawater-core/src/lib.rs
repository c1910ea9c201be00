//! CA Water Core -- a cellular-automaton water engine on an integer grid.
//!
//! This crate provides the cell model, the compressible-mass approximation,
//! the double-buffered rule engine, and a small simulation driver. Water is
//! represented as integer mass per cell; every tick moves mass between
//! neighbouring cells according to a fixed rule order and then commits all
//! pending changes at once.
//!
//! # Two-Phase Tick
//!
//! Each call to [`grid::Grid::tick`] runs:
//!
//! 1. **Sweep** -- every fillable cell, in row-major order, computes the mass
//!    it hands down, left, right, up, or to the void. Only pending
//!    ("future") masses are written, so every cell reads the same snapshot.
//! 2. **Commit** -- every fillable cell copies its pending mass into its
//!    current mass. Sub-threshold mass is culled and the cell becomes Empty.
//!
//! # Edits
//!
//! Hosts edit cells between ticks, either directly on the grid or through
//! the [`simulation::Simulation`] edit queue, which applies queued edits at
//! the start of each step:
//!
//! ```rust,ignore
//! let mut sim = Simulation::new(grid, SimulationStrategy::Tick);
//! sim.queue(Edit::AddWater { row: 0, col: 4, amount: 1000 });
//! let result = sim.step();
//! ```
//!
//! # Key Types
//!
//! - [`cell::Cell`] -- one grid cell: kind, mass, pending mass.
//! - [`config::WaterConfig`] -- immutable tuning constants for one grid.
//! - [`compress::compressible_mass`] -- capacity of a cell under load.
//! - [`grid::Grid`] -- fixed-size cell array with edit and query operations.
//! - [`rules`] -- sweep/commit and the per-direction transfer functions.
//! - [`layout::GridLayout`] -- pixel-space to grid-space mapping.
//! - [`simulation::Simulation`] -- tick/delta driver with pause and hashing.
//! - [`serialize`] -- versioned snapshots via bitcode.

pub mod cell;
pub mod compress;
pub mod config;
pub mod edit;
pub mod fixed;
pub mod grid;
pub mod layout;
pub mod rules;
pub mod serialize;
pub mod sim;
pub mod simulation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
