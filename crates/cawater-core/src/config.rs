//! Tuning constants for one water grid.
//!
//! Every grid carries its own [`WaterConfig`], so grids with different
//! tuning can coexist and tests can vary constants independently. The
//! defaults are the canonical values: 1000 mass units per full cell, a
//! culling threshold of 3, and a per-tick vertical cap of half a cell.

use serde::{Deserialize, Serialize};

use crate::cell::Mass;
use crate::fixed::Fixed64;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Mass of a completely full, uncompressed cell.
pub const DEFAULT_MAX_MASS: Mass = 1000;

/// Mass below which a cell is culled to Empty.
pub const DEFAULT_MIN_MASS: Mass = 3;

/// Default lateral equalisation divisor.
pub const DEFAULT_LATERAL_DIVISOR: i32 = 4;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A [`WaterConfig`] that cannot drive a stable simulation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("min_mass must be at least 1, got {0}")]
    MinMassTooSmall(Mass),
    #[error("max_mass ({max}) must be greater than min_mass ({min})")]
    MaxNotAboveMin { max: Mass, min: Mass },
    #[error("min_delta must be positive, got {0}")]
    NonPositiveDelta(Mass),
    #[error("compress_rate must not be negative, got {0}")]
    NegativeCompressRate(Fixed64),
    #[error("lateral_divisor must be at least 1, got {0}")]
    DivisorTooSmall(Fixed64),
}

// ---------------------------------------------------------------------------
// WaterConfig
// ---------------------------------------------------------------------------

/// Immutable tuning for the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterConfig {
    /// Mass of a full cell. Anything above is compressed.
    pub max_mass: Mass,
    /// Culling threshold. Pending mass below this is discarded at commit.
    pub min_mass: Mass,
    /// Largest vertical transfer per cell per tick.
    pub min_delta: Mass,
    /// Extra fraction of `max_mass` a loaded cell may hold.
    pub compress_rate: Fixed64,
    /// Divisor applied to the level difference of lateral neighbours.
    pub lateral_divisor: Fixed64,
    /// Halve a lateral transfer that exceeds `min_delta`.
    pub halve_fast_lateral: bool,
    /// Halve a downward transfer that exceeds `min_delta`.
    pub halve_fast_downward: bool,
    /// Fill the cell below up to its compressible capacity instead of
    /// `max_mass`.
    pub compress_downward: bool,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            max_mass: DEFAULT_MAX_MASS,
            min_mass: DEFAULT_MIN_MASS,
            min_delta: DEFAULT_MAX_MASS / 2,
            compress_rate: Fixed64::ZERO,
            lateral_divisor: Fixed64::from_num(DEFAULT_LATERAL_DIVISOR),
            halve_fast_lateral: true,
            halve_fast_downward: false,
            compress_downward: false,
        }
    }
}

impl WaterConfig {
    /// Canonical constants with `max_mass` replaced. `min_delta` follows as
    /// half of the new maximum.
    pub fn with_max_mass(mut self, max_mass: Mass) -> Self {
        self.max_mass = max_mass;
        self.min_delta = max_mass / 2;
        self
    }

    pub fn with_min_mass(mut self, min_mass: Mass) -> Self {
        self.min_mass = min_mass;
        self
    }

    pub fn with_min_delta(mut self, min_delta: Mass) -> Self {
        self.min_delta = min_delta;
        self
    }

    pub fn with_compress_rate(mut self, rate: Fixed64) -> Self {
        self.compress_rate = rate;
        self
    }

    pub fn with_lateral_divisor(mut self, divisor: Fixed64) -> Self {
        self.lateral_divisor = divisor;
        self
    }

    pub fn with_halve_fast_lateral(mut self, halve: bool) -> Self {
        self.halve_fast_lateral = halve;
        self
    }

    pub fn with_halve_fast_downward(mut self, halve: bool) -> Self {
        self.halve_fast_downward = halve;
        self
    }

    pub fn with_compress_downward(mut self, compress: bool) -> Self {
        self.compress_downward = compress;
        self
    }

    /// Check that the constants describe a usable simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_mass < 1 {
            return Err(ConfigError::MinMassTooSmall(self.min_mass));
        }
        if self.max_mass <= self.min_mass {
            return Err(ConfigError::MaxNotAboveMin {
                max: self.max_mass,
                min: self.min_mass,
            });
        }
        if self.min_delta <= 0 {
            return Err(ConfigError::NonPositiveDelta(self.min_delta));
        }
        if self.compress_rate < Fixed64::ZERO {
            return Err(ConfigError::NegativeCompressRate(self.compress_rate));
        }
        if self.lateral_divisor < Fixed64::from_num(1) {
            return Err(ConfigError::DivisorTooSmall(self.lateral_divisor));
        }
        Ok(())
    }

    /// `max_mass * compress_rate`, truncated. The extra mass a fully loaded
    /// cell may carry.
    pub fn max_compress(&self) -> Mass {
        Fixed64::saturating_from_num(self.max_mass)
            .saturating_mul(self.compress_rate)
            .saturating_to_num::<Mass>()
    }
}
