//! The fixed-size cell grid.
//!
//! A [`Grid`] owns `rows * columns` cells in row-major order, the
//! [`WaterConfig`] that tunes its rules, and the [`GridLayout`] that places
//! it in pixel space. Dimensions never change after construction.
//!
//! Edits (`set_wall`, `add_water`, ...) take effect immediately and return
//! `false` when the coordinates are off the grid. Ticks go through
//! [`Grid::tick`], which runs one sweep and one commit.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellSnapshot, CellState, Mass};
use crate::config::{ConfigError, WaterConfig};
use crate::layout::GridLayout;
use crate::rules::{self, TickReport};

/// Smallest legal row or column count.
pub const MIN_DIMENSION: usize = 3;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while constructing a grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("grid must be at least {MIN_DIMENSION}x{MIN_DIMENSION}, got {rows}x{columns}")]
    TooSmall { rows: usize, columns: usize },
    #[error("cell size must be non-zero")]
    ZeroCellSize,
    #[error("invalid water config: {0}")]
    Config(#[from] ConfigError),
    #[error("map row {row} has {found} cells, expected {expected}")]
    RaggedMap {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("unknown map glyph '{glyph}' at row {row}, column {col}")]
    UnknownGlyph { glyph: char, row: usize, col: usize },
    #[error("grid holds {found} cells, expected {expected}")]
    CellCount { found: usize, expected: usize },
    #[error("cell {index} claims position ({row}, {col})")]
    MisplacedCell { index: usize, row: usize, col: usize },
}

// ---------------------------------------------------------------------------
// Map glyphs
// ---------------------------------------------------------------------------

/// Glyph for a wall cell.
pub const GLYPH_WALL: char = '#';
/// Glyph for an empty cell.
pub const GLYPH_EMPTY: char = '.';
/// Glyph for a null cell.
pub const GLYPH_NULL: char = '?';
/// Glyph for a full (or compressed) water cell.
pub const GLYPH_FULL: char = '~';

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// A fixed-size 2D array of cells.
///
/// Deserializing a grid runs the same checks as construction, so a decoded
/// grid is always safe to tick and render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridData")]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
    config: WaterConfig,
    layout: GridLayout,
}

impl Grid {
    /// Create an all-Empty grid with the default layout.
    pub fn new(rows: usize, columns: usize, config: WaterConfig) -> Result<Self, GridError> {
        Self::with_layout(rows, columns, GridLayout::default(), config)
    }

    /// Create an all-Empty grid placed in pixel space by `layout`.
    ///
    /// Fails if either dimension is below [`MIN_DIMENSION`], the layout has a
    /// zero cell size, or the config does not validate.
    pub fn with_layout(
        rows: usize,
        columns: usize,
        layout: GridLayout,
        config: WaterConfig,
    ) -> Result<Self, GridError> {
        if rows < MIN_DIMENSION || columns < MIN_DIMENSION {
            return Err(GridError::TooSmall { rows, columns });
        }
        if layout.cell_size == 0 {
            return Err(GridError::ZeroCellSize);
        }
        config.validate()?;

        let cells = (0..rows)
            .flat_map(|row| (0..columns).map(move |col| Cell::new(row, col)))
            .collect();

        debug!(
            "created {rows}x{columns} water grid (max_mass={}, min_mass={}, min_delta={})",
            config.max_mass, config.min_mass, config.min_delta
        );

        Ok(Self {
            rows,
            columns,
            cells,
            config,
            layout,
        })
    }

    /// Build a grid from a text map, one line per row.
    ///
    /// `#` wall, `.` empty, `?` null, `~` full water, `0`-`9` water at that
    /// many tenths of `max_mass`. Blank lines and surrounding whitespace are
    /// ignored.
    pub fn from_ascii(map: &str, config: WaterConfig) -> Result<Self, GridError> {
        let lines: Vec<&str> = map
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let rows = lines.len();
        let columns = lines.first().map_or(0, |line| line.chars().count());

        let mut grid = Self::new(rows, columns, config)?;
        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != columns {
                return Err(GridError::RaggedMap {
                    row,
                    found,
                    expected: columns,
                });
            }
            for (col, glyph) in line.chars().enumerate() {
                grid.apply_glyph(row, col, glyph)?;
            }
        }
        Ok(grid)
    }

    fn apply_glyph(&mut self, row: usize, col: usize, glyph: char) -> Result<(), GridError> {
        let max = self.config.max_mass;
        match glyph {
            GLYPH_WALL => self.set_wall(row, col),
            GLYPH_EMPTY => self.set_empty(row, col),
            GLYPH_NULL => self.set_null(row, col),
            GLYPH_FULL => self.set_water(row, col, max),
            _ => match glyph.to_digit(10) {
                Some(tenths) => self.set_water(row, col, max / 10 * tenths as Mass),
                None => return Err(GridError::UnknownGlyph { glyph, row, col }),
            },
        };
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Dimensions and configuration
    // -----------------------------------------------------------------------

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn config(&self) -> &WaterConfig {
        &self.config
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Move the grid in pixel space. Cells are untouched.
    pub fn set_layout(&mut self, layout: GridLayout) -> Result<(), GridError> {
        if layout.cell_size == 0 {
            return Err(GridError::ZeroCellSize);
        }
        self.layout = layout;
        Ok(())
    }

    /// True if `(row, col)` addresses a cell.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.columns
    }

    pub(crate) fn index(&self, row: usize, col: usize) -> Option<usize> {
        self.contains(row, col).then(|| row * self.columns + col)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Read-only state and mass of one cell, `None` off the grid.
    pub fn read_cell(&self, row: usize, col: usize) -> Option<CellSnapshot> {
        self.cell(row, col).map(Cell::snapshot)
    }

    /// Sum of mass over every Water or Empty cell.
    pub fn total_mass(&self) -> i64 {
        self.cells
            .iter()
            .filter(|cell| cell.state().matches(CellState::FLUID_MASK))
            .map(|cell| i64::from(cell.mass()))
            .sum()
    }

    /// Number of cells currently holding water.
    pub fn water_cells(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.state() == CellState::Water)
            .count()
    }

    // -----------------------------------------------------------------------
    // Pixel mapping
    // -----------------------------------------------------------------------

    /// True if the pixel lies on this grid.
    pub fn on_grid(&self, x: i32, y: i32) -> bool {
        self.layout.on_grid(x, y, self.rows, self.columns)
    }

    /// `(row, col)` under a pixel, `None` off the grid.
    pub fn cell_index(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        self.layout.cell_index(x, y, self.rows, self.columns)
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Set a cell's state. Returns `false` off the grid.
    pub fn set_state(&mut self, row: usize, col: usize, state: CellState) -> bool {
        match self.index(row, col) {
            Some(i) => {
                self.cells[i].set_state(state);
                true
            }
            None => false,
        }
    }

    /// Set a cell's state from a raw integer, clamping unknown values.
    pub fn set_raw_state(&mut self, row: usize, col: usize, raw: i32) -> bool {
        self.set_state(row, col, CellState::from_raw(raw))
    }

    pub fn set_wall(&mut self, row: usize, col: usize) -> bool {
        self.set_state(row, col, CellState::Wall)
    }

    pub fn set_empty(&mut self, row: usize, col: usize) -> bool {
        self.set_state(row, col, CellState::Empty)
    }

    pub fn set_null(&mut self, row: usize, col: usize) -> bool {
        self.set_state(row, col, CellState::Null)
    }

    /// Make the cell fluid and set its mass outright. Sub-threshold values
    /// leave it Empty.
    pub fn set_water(&mut self, row: usize, col: usize, mass: Mass) -> bool {
        let min_mass = self.config.min_mass;
        match self.index(row, col) {
            Some(i) => {
                let cell = &mut self.cells[i];
                cell.set_state(CellState::Water);
                cell.set_mass(mass, min_mass);
                true
            }
            None => false,
        }
    }

    /// Make the cell fluid and add `amount` to its mass. Painting water over
    /// a wall replaces the wall.
    pub fn add_water(&mut self, row: usize, col: usize, amount: Mass) -> bool {
        let current = match self.cell(row, col) {
            Some(cell) => cell.mass(),
            None => return false,
        };
        self.set_water(row, col, current.saturating_add(amount))
    }

    /// Reset every cell to Empty.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.set_state(CellState::Empty);
        }
    }

    /// Turn the outer ring of cells into walls.
    pub fn enclose(&mut self) {
        for cell in &mut self.cells {
            let (row, col) = cell.position();
            if row == 0 || col == 0 || row == self.rows - 1 || col == self.columns - 1 {
                cell.set_state(CellState::Wall);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run one sweep and commit.
    pub fn tick(&mut self) -> TickReport {
        rules::tick(self)
    }

    /// Re-establish cell invariants after loading untrusted data.
    fn normalize(&mut self) -> Result<(), GridError> {
        if self.rows < MIN_DIMENSION || self.columns < MIN_DIMENSION {
            return Err(GridError::TooSmall {
                rows: self.rows,
                columns: self.columns,
            });
        }
        if self.layout.cell_size == 0 {
            return Err(GridError::ZeroCellSize);
        }
        self.config.validate()?;
        let expected = self.rows * self.columns;
        if self.cells.len() != expected {
            return Err(GridError::CellCount {
                found: self.cells.len(),
                expected,
            });
        }
        let min_mass = self.config.min_mass;
        for (index, cell) in self.cells.iter_mut().enumerate() {
            let (row, col) = cell.position();
            if (row, col) != (index / self.columns, index % self.columns) {
                return Err(GridError::MisplacedCell { index, row, col });
            }
            let mass = cell.mass();
            cell.set_mass(mass, min_mass);
        }
        Ok(())
    }
}

/// Wire shape of a [`Grid`], checked before it becomes one.
#[derive(Deserialize)]
struct GridData {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
    config: WaterConfig,
    layout: GridLayout,
}

impl TryFrom<GridData> for Grid {
    type Error = GridError;

    fn try_from(data: GridData) -> Result<Self, Self::Error> {
        let mut grid = Grid {
            rows: data.rows,
            columns: data.columns,
            cells: data.cells,
            config: data.config,
            layout: data.layout,
        };
        grid.normalize()?;
        Ok(grid)
    }
}

impl fmt::Display for Grid {
    /// One line per row: `#` wall, `.` empty, `?` null, `~` full or
    /// compressed water, `0`-`9` partial water in tenths.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let max = self.config.max_mass;
        for row in self.cells.chunks(self.columns) {
            for cell in row {
                let glyph = match cell.state() {
                    CellState::Wall => GLYPH_WALL,
                    CellState::Empty => GLYPH_EMPTY,
                    CellState::Null => GLYPH_NULL,
                    CellState::Water if cell.mass() >= max => GLYPH_FULL,
                    CellState::Water => {
                        let decile = cell.snapshot().decile(max).clamp(0, 9) as u32;
                        char::from_digit(decile, 10).unwrap_or(GLYPH_FULL)
                    }
                };
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: usize, columns: usize) -> Grid {
        Grid::new(rows, columns, WaterConfig::default()).unwrap()
    }

    #[test]
    fn new_grid_is_empty() {
        let g = grid(4, 5);
        assert_eq!(g.rows(), 4);
        assert_eq!(g.columns(), 5);
        assert_eq!(g.cells().len(), 20);
        assert!(g.cells().iter().all(|c| c.state() == CellState::Empty));
        assert_eq!(g.total_mass(), 0);
    }

    #[test]
    fn cells_know_their_position() {
        let g = grid(3, 4);
        assert_eq!(g.cell(2, 3).unwrap().position(), (2, 3));
        assert_eq!(g.cell(1, 0).unwrap().position(), (1, 0));
    }

    #[test]
    fn too_few_rows_rejected() {
        assert_eq!(
            Grid::new(2, 10, WaterConfig::default()),
            Err(GridError::TooSmall { rows: 2, columns: 10 })
        );
    }

    #[test]
    fn too_few_columns_rejected() {
        assert_eq!(
            Grid::new(10, 1, WaterConfig::default()),
            Err(GridError::TooSmall { rows: 10, columns: 1 })
        );
    }

    #[test]
    fn minimum_grid_accepted() {
        assert!(Grid::new(3, 3, WaterConfig::default()).is_ok());
    }

    #[test]
    fn invalid_config_rejected() {
        let config = WaterConfig::default().with_min_mass(0);
        assert!(matches!(
            Grid::new(3, 3, config),
            Err(GridError::Config(ConfigError::MinMassTooSmall(0)))
        ));
    }

    #[test]
    fn zero_cell_size_rejected() {
        let layout = GridLayout::new(0, 0, 0);
        assert_eq!(
            Grid::with_layout(3, 3, layout, WaterConfig::default()),
            Err(GridError::ZeroCellSize)
        );
    }

    #[test]
    fn edits_off_grid_report_false() {
        let mut g = grid(3, 3);
        assert!(!g.set_wall(3, 0));
        assert!(!g.add_water(0, 3, 100));
        assert!(g.read_cell(5, 5).is_none());
    }

    #[test]
    fn add_water_accumulates() {
        let mut g = grid(3, 3);
        assert!(g.add_water(1, 1, 25));
        assert!(g.add_water(1, 1, 25));
        assert_eq!(g.read_cell(1, 1).unwrap().mass, 50);
        assert_eq!(g.read_cell(1, 1).unwrap().state, CellState::Water);
    }

    #[test]
    fn add_water_below_threshold_stays_empty() {
        let mut g = grid(3, 3);
        g.add_water(0, 0, 2);
        assert_eq!(g.read_cell(0, 0).unwrap().state, CellState::Empty);
        assert_eq!(g.total_mass(), 0);
    }

    #[test]
    fn water_replaces_wall() {
        let mut g = grid(3, 3);
        g.set_wall(1, 1);
        g.add_water(1, 1, 1000);
        assert_eq!(g.read_cell(1, 1).unwrap().state, CellState::Water);
    }

    #[test]
    fn wall_replaces_water() {
        let mut g = grid(3, 3);
        g.set_water(1, 1, 1000);
        g.set_wall(1, 1);
        let snap = g.read_cell(1, 1).unwrap();
        assert_eq!(snap.state, CellState::Wall);
        assert_eq!(snap.mass, 0);
    }

    #[test]
    fn raw_state_is_clamped() {
        let mut g = grid(3, 3);
        g.set_raw_state(0, 0, 42);
        g.set_raw_state(0, 1, -3);
        assert_eq!(g.read_cell(0, 0).unwrap().state, CellState::Empty);
        assert_eq!(g.read_cell(0, 1).unwrap().state, CellState::Null);
    }

    #[test]
    fn total_mass_skips_walls() {
        let mut g = grid(3, 3);
        g.set_water(0, 0, 300);
        g.set_water(2, 2, 700);
        g.set_wall(1, 1);
        assert_eq!(g.total_mass(), 1000);
        assert_eq!(g.water_cells(), 2);
    }

    #[test]
    fn enclose_walls_the_border() {
        let mut g = grid(4, 4);
        g.enclose();
        assert_eq!(g.read_cell(0, 2).unwrap().state, CellState::Wall);
        assert_eq!(g.read_cell(3, 3).unwrap().state, CellState::Wall);
        assert_eq!(g.read_cell(1, 2).unwrap().state, CellState::Empty);
    }

    #[test]
    fn clear_resets_everything() {
        let mut g = grid(3, 3);
        g.set_wall(0, 0);
        g.set_water(1, 1, 900);
        g.clear();
        assert!(g.cells().iter().all(|c| c.state() == CellState::Empty));
    }

    #[test]
    fn pixel_lookup_uses_layout() {
        let layout = GridLayout::new(8, 0, 0);
        let g = Grid::with_layout(3, 3, layout, WaterConfig::default()).unwrap();
        assert!(g.on_grid(23, 23));
        assert!(!g.on_grid(24, 0));
        assert_eq!(g.cell_index(9, 17), Some((2, 1)));
    }

    #[test]
    fn set_layout_moves_the_grid() {
        let mut g = grid(3, 3);
        assert!(g.set_layout(GridLayout::new(10, 100, 0)).is_ok());
        assert_eq!(g.cell_index(105, 5), Some((0, 0)));
        assert_eq!(
            g.set_layout(GridLayout::new(0, 0, 0)),
            Err(GridError::ZeroCellSize)
        );
        assert_eq!(g.layout().cell_size, 10);
    }

    #[test]
    fn ascii_round_trip() {
        let map = "\
            #...#\n\
            #.~5#\n\
            #####\n";
        let g = Grid::from_ascii(map, WaterConfig::default()).unwrap();
        assert_eq!(g.rows(), 3);
        assert_eq!(g.columns(), 5);
        assert_eq!(g.read_cell(1, 2).unwrap().mass, 1000);
        assert_eq!(g.read_cell(1, 3).unwrap().mass, 500);
        assert_eq!(g.to_string(), "#...#\n#.~5#\n#####\n");
    }

    #[test]
    fn ascii_ragged_rows_rejected() {
        let err = Grid::from_ascii("...\n....\n...\n", WaterConfig::default()).unwrap_err();
        assert_eq!(
            err,
            GridError::RaggedMap {
                row: 1,
                found: 4,
                expected: 3
            }
        );
    }

    #[test]
    fn ascii_unknown_glyph_rejected() {
        let err = Grid::from_ascii("...\n.x.\n...\n", WaterConfig::default()).unwrap_err();
        assert_eq!(
            err,
            GridError::UnknownGlyph {
                glyph: 'x',
                row: 1,
                col: 1
            }
        );
    }

    #[test]
    fn ascii_small_map_rejected() {
        assert!(matches!(
            Grid::from_ascii("...\n...\n", WaterConfig::default()),
            Err(GridError::TooSmall { rows: 2, columns: 3 })
        ));
    }

    // -- decoding ------------------------------------------------------------

    fn reencode(grid: &Grid) -> Result<Grid, bitcode::Error> {
        bitcode::deserialize(&bitcode::serialize(grid).unwrap())
    }

    #[test]
    fn decoded_grid_round_trips() {
        let mut g = grid(4, 5);
        g.enclose();
        g.set_water(1, 2, 700);
        assert_eq!(reencode(&g).unwrap(), g);
    }

    #[test]
    fn decoding_rejects_missing_cells() {
        let mut g = grid(3, 3);
        g.cells.clear();
        assert!(reencode(&g).is_err());
    }

    #[test]
    fn decoding_rejects_undersized_grid() {
        let mut g = grid(3, 3);
        g.columns = 0;
        g.cells.clear();
        assert!(reencode(&g).is_err());
    }

    #[test]
    fn decoding_rejects_misplaced_cells() {
        let mut g = grid(3, 3);
        g.cells.swap(0, 4);
        assert!(reencode(&g).is_err());
    }

    #[test]
    fn decoding_rejects_bad_layout_and_config() {
        let mut g = grid(3, 3);
        g.layout.cell_size = 0;
        assert!(reencode(&g).is_err());

        let mut g = grid(3, 3);
        g.config.min_mass = 0;
        assert!(reencode(&g).is_err());
    }

    #[test]
    fn decoding_culls_sub_threshold_mass() {
        let mut g = grid(3, 3);
        g.set_water(1, 1, 50);
        g.config.min_mass = 100;
        let decoded = reencode(&g).unwrap();
        assert_eq!(decoded.read_cell(1, 1).unwrap().state, CellState::Empty);
        assert_eq!(decoded.total_mass(), 0);
    }

    #[test]
    fn try_from_reports_the_failed_check() {
        let g = grid(3, 3);
        let data = GridData {
            rows: 3,
            columns: 3,
            cells: g.cells[..8].to_vec(),
            config: g.config,
            layout: g.layout,
        };
        assert_eq!(
            Grid::try_from(data).unwrap_err(),
            GridError::CellCount {
                found: 8,
                expected: 9
            }
        );
    }
}
