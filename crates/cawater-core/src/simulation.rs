//! The simulation driver.
//!
//! [`Simulation`] owns a [`Grid`] and decides how many ticks run per host
//! call. Each step runs the same pipeline:
//!
//! 1. **Pre-tick** -- apply queued edits in submission order.
//! 2. **Sweep** -- compute pending masses.
//! 3. **Commit** -- copy pending masses into current masses.
//! 4. **Bookkeeping** -- advance the tick counter and recompute the state
//!    hash.

use log::debug;

use crate::edit::{Edit, EditQueue};
use crate::fixed::Ticks;
use crate::grid::Grid;
use crate::rules::TickReport;
use crate::sim::{AdvanceResult, SimState, SimulationStrategy, StateHash};

/// A grid plus the clock that drives it.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(crate) grid: Grid,
    pub(crate) strategy: SimulationStrategy,
    pub(crate) sim_state: SimState,
    pub(crate) paused: bool,
    pub(crate) edits: EditQueue,
    pub(crate) last_state_hash: u64,
    pub(crate) last_report: Option<TickReport>,
}

impl Simulation {
    pub fn new(grid: Grid, strategy: SimulationStrategy) -> Self {
        let mut sim = Self {
            grid,
            strategy,
            sim_state: SimState::new(),
            paused: false,
            edits: EditQueue::new(),
            last_state_hash: 0,
            last_report: None,
        };
        sim.last_state_hash = sim.compute_state_hash();
        sim
    }

    /// Keep up to `max_history` applied edits for replay.
    pub fn with_edit_history(mut self, max_history: usize) -> Self {
        self.edits = EditQueue::with_max_history(max_history);
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Direct grid access for edits between steps. Edits made here bypass
    /// the queue and the state hash until the next step.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn strategy(&self) -> SimulationStrategy {
        self.strategy
    }

    pub fn sim_state(&self) -> &SimState {
        &self.sim_state
    }

    /// Steps run so far.
    pub fn tick_count(&self) -> Ticks {
        self.sim_state.tick
    }

    pub fn edits(&self) -> &EditQueue {
        &self.edits
    }

    /// Report from the most recent step.
    pub fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }

    /// Hash of the grid as of the last step (or construction).
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    /// Queue an edit for the start of the next step.
    pub fn queue(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    pub fn queue_batch(&mut self, edits: impl IntoIterator<Item = Edit>) {
        self.edits.push_batch(edits);
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// While paused, `advance()`, `step()` and `run()` are no-ops. Queued
    /// edits stay queued and direct grid edits still work.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // -----------------------------------------------------------------------
    // Advancing time
    // -----------------------------------------------------------------------

    /// Advance by `dt` host time units.
    ///
    /// Tick mode runs exactly one step and ignores `dt`. Delta mode adds `dt`
    /// to the accumulator and runs one step per whole `fixed_timestep`.
    pub fn advance(&mut self, dt: Ticks) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        if self.paused {
            return result;
        }

        match self.strategy {
            SimulationStrategy::Tick => {
                self.step_internal(&mut result);
            }
            SimulationStrategy::Delta { fixed_timestep } => {
                self.sim_state.accumulator = self.sim_state.accumulator.saturating_add(dt);
                let step_size = fixed_timestep.max(1);
                while self.sim_state.accumulator >= step_size {
                    self.sim_state.accumulator -= step_size;
                    self.step_internal(&mut result);
                }
            }
        }

        result
    }

    /// Run a single step (convenience for tick mode).
    pub fn step(&mut self) -> AdvanceResult {
        self.advance(0)
    }

    /// Run `steps` steps regardless of strategy, leaving the accumulator
    /// untouched.
    pub fn run(&mut self, steps: u64) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        if self.paused {
            return result;
        }
        for _ in 0..steps {
            self.step_internal(&mut result);
        }
        result
    }

    fn step_internal(&mut self, result: &mut AdvanceResult) {
        // Pre-tick: apply queued edits.
        for edit in self.edits.drain(self.sim_state.tick) {
            if edit.apply(&mut self.grid) {
                result.edits_applied += 1;
            } else {
                debug!("dropped off-grid edit {edit:?}");
            }
        }

        let report = self.grid.tick();

        self.sim_state.tick += 1;
        self.last_state_hash = self.compute_state_hash();
        self.last_report = Some(report);
        result.reports.push(report);
        result.steps_run += 1;
    }

    // -----------------------------------------------------------------------
    // Hashing
    // -----------------------------------------------------------------------

    /// Hash of the tick counter and every cell's state and mass.
    pub fn compute_state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.sim_state.tick);
        hasher.write_u64(self.grid.rows() as u64);
        hasher.write_u64(self.grid.columns() as u64);
        for cell in self.grid.cells() {
            hasher.write_u8(cell.state().bits());
            hasher.write_i32(cell.mass());
        }
        hasher.finish()
    }
}
