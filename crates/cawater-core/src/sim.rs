//! Simulation strategy and state types.
//!
//! A [`Simulation`](crate::simulation::Simulation) is parameterized by a
//! [`SimulationStrategy`] that determines how time advances. Every step runs
//! the same pipeline (apply queued edits, sweep, commit, hash); strategies
//! differ only in how many steps run per `advance()` call.

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, Ticks};
use crate::rules::TickReport;

// ---------------------------------------------------------------------------
// Simulation strategy
// ---------------------------------------------------------------------------

/// How the simulation advances time. Chosen at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationStrategy {
    /// One step per call. The host calls `step()` at its own fixed rate.
    #[default]
    Tick,

    /// Real-time mode. The host calls `advance(dt)` with elapsed time in any
    /// unit (milliseconds, frames). Time accumulates and as many fixed steps
    /// run as fit, carrying the remainder forward.
    Delta {
        /// Duration of one water tick in the host's time unit. A 10 ms water
        /// clock driven by millisecond deltas uses `fixed_timestep: 10`.
        fixed_timestep: Ticks,
    },
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable counters tracked by the simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimState {
    /// Steps run so far.
    pub tick: Ticks,

    /// Time carried over in delta mode. Unused in tick mode.
    pub accumulator: Ticks,
}

impl SimState {
    /// State at tick 0.
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Advance result
// ---------------------------------------------------------------------------

/// Result of a `Simulation::advance()` call.
#[derive(Debug, Default)]
pub struct AdvanceResult {
    /// Number of steps actually executed.
    pub steps_run: u64,

    /// One report per step, in order.
    pub reports: Vec<TickReport>,

    /// Queued edits that landed on the grid.
    pub edits_applied: usize,
}

impl AdvanceResult {
    /// Total mass drained to the void across every step.
    pub fn drained(&self) -> i64 {
        self.reports.iter().map(|r| r.drained).sum()
    }

    /// Report of the final step, if any ran.
    pub fn last_report(&self) -> Option<&TickReport> {
        self.reports.last()
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A deterministic hash of simulation state for desync detection.
///
/// FNV-1a (64-bit). Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write(&[v]);
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
