//! Binary snapshots of a [`Simulation`].
//!
//! Snapshots are encoded with `bitcode` behind a versioned header. Decoding
//! re-checks every cell invariant, so a tampered or corrupt snapshot is
//! rejected instead of producing a grid whose state and mass disagree.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::edit::{Edit, EditQueue};
use crate::grid::Grid;
use crate::sim::{SimState, SimulationStrategy};
use crate::simulation::Simulation;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a water simulation snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xCA7A_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("data too short for snapshot header")]
    TooShort,
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    /// Malformed bytes, or a grid that fails construction checks.
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count when the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    /// A header for the current format version.
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Read just the header of a snapshot.
///
/// bitcode has no partial decoding, so this decodes the whole snapshot.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    decode(data).map(|snapshot| snapshot.header)
}

// ---------------------------------------------------------------------------
// Serializable simulation state
// ---------------------------------------------------------------------------

/// Everything needed to resume a simulation. Edit history is not kept.
#[derive(Debug, Serialize, Deserialize)]
struct SimulationSnapshot {
    header: SnapshotHeader,
    grid: Grid,
    strategy: SimulationStrategy,
    sim_state: SimState,
    paused: bool,
    pending_edits: Vec<Edit>,
    last_state_hash: u64,
}

fn decode(data: &[u8]) -> Result<SimulationSnapshot, DeserializeError> {
    if data.is_empty() {
        return Err(DeserializeError::TooShort);
    }
    bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))
}

impl Simulation {
    /// Encode the simulation into a versioned snapshot.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = SimulationSnapshot {
            header: SnapshotHeader::new(self.sim_state.tick),
            grid: self.grid.clone(),
            strategy: self.strategy,
            sim_state: self.sim_state.clone(),
            paused: self.paused,
            pending_edits: self.edits.pending().to_vec(),
            last_state_hash: self.last_state_hash,
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Restore a simulation from a snapshot made by [`Simulation::serialize`].
    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot = decode(data).inspect_err(|e| warn!("snapshot rejected: {e}"))?;
        snapshot
            .header
            .validate()
            .inspect_err(|e| warn!("snapshot rejected: {e}"))?;

        let mut edits = EditQueue::new();
        edits.push_batch(snapshot.pending_edits);

        Ok(Self {
            grid: snapshot.grid,
            strategy: snapshot.strategy,
            sim_state: snapshot.sim_state,
            paused: snapshot.paused,
            edits,
            last_state_hash: snapshot.last_state_hash,
            last_report: None,
        })
    }
}
