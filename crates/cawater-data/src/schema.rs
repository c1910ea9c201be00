//! Serde data file structs for water configs and scenarios.
//!
//! These define the on-disk format. Every field is optional where a
//! sensible default exists, and fractional values are plain `f64` in the
//! file, converted to fixed-point when resolved.

use serde::Deserialize;

use cawater_core::cell::Mass;
use cawater_core::config::WaterConfig;
use cawater_core::fixed::{Ticks, f64_to_fixed64};
use cawater_core::layout::GridLayout;
use cawater_core::sim::SimulationStrategy;

// ===========================================================================
// Config
// ===========================================================================

/// Overrides for [`WaterConfig`]. Missing fields keep the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigData {
    pub max_mass: Option<Mass>,
    pub min_mass: Option<Mass>,
    pub min_delta: Option<Mass>,
    pub compress_rate: Option<f64>,
    pub lateral_divisor: Option<f64>,
    pub halve_fast_lateral: Option<bool>,
    pub halve_fast_downward: Option<bool>,
    pub compress_downward: Option<bool>,
}

impl ConfigData {
    /// Apply the overrides on top of the defaults. Not validated; grid
    /// construction does that.
    pub fn resolve(&self) -> WaterConfig {
        let mut config = WaterConfig::default();
        if let Some(max) = self.max_mass {
            config = config.with_max_mass(max);
        }
        if let Some(min) = self.min_mass {
            config.min_mass = min;
        }
        if let Some(delta) = self.min_delta {
            config.min_delta = delta;
        }
        if let Some(rate) = self.compress_rate {
            config.compress_rate = f64_to_fixed64(rate);
        }
        if let Some(divisor) = self.lateral_divisor {
            config.lateral_divisor = f64_to_fixed64(divisor);
        }
        if let Some(halve) = self.halve_fast_lateral {
            config.halve_fast_lateral = halve;
        }
        if let Some(halve) = self.halve_fast_downward {
            config.halve_fast_downward = halve;
        }
        if let Some(compress) = self.compress_downward {
            config.compress_downward = compress;
        }
        config
    }
}

// ===========================================================================
// Layout and strategy
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutData {
    pub cell_size: u32,
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
}

impl LayoutData {
    pub fn resolve(&self) -> GridLayout {
        GridLayout::new(self.cell_size, self.offset_x, self.offset_y)
    }
}

/// How a loaded scenario is clocked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyData {
    #[default]
    Tick,
    Delta { fixed_timestep: Ticks },
}

impl StrategyData {
    pub fn resolve(self) -> SimulationStrategy {
        match self {
            StrategyData::Tick => SimulationStrategy::Tick,
            StrategyData::Delta { fixed_timestep } => {
                SimulationStrategy::Delta { fixed_timestep }
            }
        }
    }
}

// ===========================================================================
// Scenario
// ===========================================================================

/// A water placement: `mass` units at `(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaterData {
    pub row: usize,
    pub col: usize,
    pub mass: Mass,
}

/// A scenario file.
///
/// Either `map` (a text map, one line per row) or both `rows` and
/// `columns` must be given. Placements apply after the map, in order:
/// `enclose`, then `walls`, then `water`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioData {
    #[serde(default)]
    pub name: String,
    pub rows: Option<usize>,
    pub columns: Option<usize>,
    pub map: Option<String>,
    #[serde(default)]
    pub config: ConfigData,
    pub layout: Option<LayoutData>,
    #[serde(default)]
    pub strategy: StrategyData,
    /// Wall off the border.
    #[serde(default)]
    pub enclose: bool,
    #[serde(default)]
    pub walls: Vec<(usize, usize)>,
    #[serde(default)]
    pub water: Vec<WaterData>,
    /// Steps a headless run should take.
    pub ticks: Option<u64>,
}
