//! Resolving scenario files into ready-to-run grids.

use std::path::Path;

use log::debug;

use cawater_core::config::WaterConfig;
use cawater_core::grid::{Grid, GridError};
use cawater_core::sim::SimulationStrategy;
use cawater_core::simulation::Simulation;

use crate::loader::{DataLoadError, deserialize_file};
use crate::schema::{ConfigData, ScenarioData};

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Load(#[from] DataLoadError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("scenario '{name}' needs a map or both rows and columns")]
    MissingDimensions { name: String },

    #[error("scenario '{name}' declares {declared:?} but its map is {actual:?}")]
    DimensionMismatch {
        name: String,
        declared: (usize, usize),
        actual: (usize, usize),
    },

    #[error("scenario '{name}' places {what} off the grid at ({row}, {col})")]
    OffGrid {
        name: String,
        what: &'static str,
        row: usize,
        col: usize,
    },
}

// ===========================================================================
// Scenario
// ===========================================================================

/// A resolved scenario: a populated grid plus how to run it.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub grid: Grid,
    pub strategy: SimulationStrategy,
    pub ticks: Option<u64>,
}

impl Scenario {
    /// Build the grid described by `data`.
    pub fn from_data(data: ScenarioData) -> Result<Self, ScenarioError> {
        let name = data.name.clone();
        let config = data.config.resolve();

        let mut grid = match &data.map {
            Some(map) => {
                let grid = Grid::from_ascii(map, config)?;
                let actual = (grid.rows(), grid.columns());
                if let (Some(rows), Some(columns)) = (data.rows, data.columns) {
                    if (rows, columns) != actual {
                        return Err(ScenarioError::DimensionMismatch {
                            name,
                            declared: (rows, columns),
                            actual,
                        });
                    }
                }
                grid
            }
            None => match (data.rows, data.columns) {
                (Some(rows), Some(columns)) => Grid::new(rows, columns, config)?,
                _ => return Err(ScenarioError::MissingDimensions { name }),
            },
        };

        if let Some(layout) = &data.layout {
            grid.set_layout(layout.resolve())?;
        }
        if data.enclose {
            grid.enclose();
        }
        for &(row, col) in &data.walls {
            if !grid.set_wall(row, col) {
                return Err(off_grid(&name, "a wall", row, col));
            }
        }
        for water in &data.water {
            if !grid.add_water(water.row, water.col, water.mass) {
                return Err(off_grid(&name, "water", water.row, water.col));
            }
        }

        debug!(
            "resolved scenario '{name}': {}x{} grid, total mass {}",
            grid.rows(),
            grid.columns(),
            grid.total_mass()
        );

        Ok(Self {
            name,
            grid,
            strategy: data.strategy.resolve(),
            ticks: data.ticks,
        })
    }

    /// Wrap the grid in a simulation driven by the scenario's strategy.
    pub fn into_simulation(self) -> Simulation {
        Simulation::new(self.grid, self.strategy)
    }
}

fn off_grid(name: &str, what: &'static str, row: usize, col: usize) -> ScenarioError {
    ScenarioError::OffGrid {
        name: name.to_string(),
        what,
        row,
        col,
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Load and resolve a scenario file (`.ron`, `.toml` or `.json`).
///
/// A scenario without a name takes the file stem.
pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let mut data: ScenarioData = deserialize_file(path)?;
    if data.name.is_empty() {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            data.name = stem.to_string();
        }
    }
    Scenario::from_data(data)
}

/// Load a standalone config file and validate it.
pub fn load_config(path: &Path) -> Result<WaterConfig, ScenarioError> {
    let data: ConfigData = deserialize_file(path)?;
    let config = data.resolve();
    config.validate().map_err(GridError::from)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::WaterData;
    use cawater_core::cell::CellState;

    fn data(rows: usize, columns: usize) -> ScenarioData {
        ScenarioData {
            name: "test".to_string(),
            rows: Some(rows),
            columns: Some(columns),
            ..ScenarioData::default()
        }
    }

    #[test]
    fn dimensions_without_map() {
        let scenario = Scenario::from_data(data(4, 6)).unwrap();
        assert_eq!(scenario.grid.rows(), 4);
        assert_eq!(scenario.grid.columns(), 6);
        assert_eq!(scenario.strategy, SimulationStrategy::Tick);
    }

    #[test]
    fn missing_dimensions_rejected() {
        let mut d = data(4, 4);
        d.columns = None;
        assert!(matches!(
            Scenario::from_data(d),
            Err(ScenarioError::MissingDimensions { .. })
        ));
    }

    #[test]
    fn too_small_grid_rejected() {
        assert!(matches!(
            Scenario::from_data(data(2, 8)),
            Err(ScenarioError::Grid(GridError::TooSmall { .. }))
        ));
    }

    #[test]
    fn map_dimensions_must_match() {
        let mut d = data(5, 5);
        d.map = Some("...\n...\n...\n".to_string());
        assert!(matches!(
            Scenario::from_data(d),
            Err(ScenarioError::DimensionMismatch {
                declared: (5, 5),
                actual: (3, 3),
                ..
            })
        ));
    }

    #[test]
    fn placements_apply_in_order() {
        let mut d = data(4, 4);
        d.enclose = true;
        d.walls = vec![(1, 1)];
        d.water = vec![
            WaterData { row: 2, col: 2, mass: 400 },
            WaterData { row: 2, col: 2, mass: 100 },
            WaterData { row: 0, col: 0, mass: 300 },
        ];
        let grid = Scenario::from_data(d).unwrap().grid;

        assert_eq!(grid.read_cell(1, 1).unwrap().state, CellState::Wall);
        assert_eq!(grid.read_cell(2, 2).unwrap().mass, 500);
        // Water painted over the border wall replaces it.
        assert_eq!(grid.read_cell(0, 0).unwrap().state, CellState::Water);
        assert_eq!(grid.read_cell(0, 1).unwrap().state, CellState::Wall);
    }

    #[test]
    fn off_grid_placement_rejected() {
        let mut d = data(4, 4);
        d.water = vec![WaterData { row: 4, col: 0, mass: 100 }];
        let err = Scenario::from_data(d).unwrap_err();
        assert!(matches!(err, ScenarioError::OffGrid { row: 4, col: 0, .. }));
        assert!(err.to_string().contains("water"));
    }

    #[test]
    fn invalid_config_rejected() {
        let mut d = data(4, 4);
        d.config.min_mass = Some(0);
        assert!(matches!(
            Scenario::from_data(d),
            Err(ScenarioError::Grid(GridError::Config(_)))
        ));
    }

    #[test]
    fn into_simulation_keeps_strategy() {
        let mut d = data(4, 4);
        d.strategy = crate::schema::StrategyData::Delta { fixed_timestep: 10 };
        let sim = Scenario::from_data(d).unwrap().into_simulation();
        assert_eq!(
            sim.strategy(),
            SimulationStrategy::Delta { fixed_timestep: 10 }
        );
        assert_eq!(sim.tick_count(), 0);
    }
}
