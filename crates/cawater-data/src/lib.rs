//! Data-driven configuration for the water engine.
//!
//! Loads [`WaterConfig`](cawater_core::config::WaterConfig) overrides and
//! whole scenarios (grid size or text map, layout, placements, clock) from
//! RON, TOML or JSON files.

pub mod loader;
pub mod scenario;
pub mod schema;

pub use loader::{DataLoadError, Format};
pub use scenario::{Scenario, ScenarioError, load_config, load_scenario};
pub use schema::{ConfigData, ScenarioData};
