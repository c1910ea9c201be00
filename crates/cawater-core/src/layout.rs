//! Pixel-space to grid-space mapping.
//!
//! Hosts that paint walls and water with a pointer work in pixels. A
//! [`GridLayout`] describes how the grid sits on screen (square cells of
//! `cell_size` pixels, shifted by an offset) and converts between the two
//! coordinate systems. All functions are pure.

use serde::{Deserialize, Serialize};

/// Default cell edge length in pixels.
pub const DEFAULT_CELL_SIZE: u32 = 16;

/// Placement of a grid in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridLayout {
    /// Edge length of one square cell, in pixels. Must be non-zero.
    pub cell_size: u32,
    /// Pixel x of the grid's left edge.
    pub offset_x: i32,
    /// Pixel y of the grid's top edge.
    pub offset_y: i32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            offset_x: 0,
            offset_y: 0,
        }
    }
}

impl GridLayout {
    pub fn new(cell_size: u32, offset_x: i32, offset_y: i32) -> Self {
        Self {
            cell_size,
            offset_x,
            offset_y,
        }
    }

    fn size(&self) -> i64 {
        i64::from(self.cell_size.max(1))
    }

    /// Pixel width and height covered by a grid of the given dimensions.
    pub fn field_size(&self, rows: usize, columns: usize) -> (i64, i64) {
        (columns as i64 * self.size(), rows as i64 * self.size())
    }

    /// True if the pixel lies on a grid of the given dimensions.
    pub fn on_grid(&self, x: i32, y: i32, rows: usize, columns: usize) -> bool {
        let (width, height) = self.field_size(rows, columns);
        let dx = i64::from(x) - i64::from(self.offset_x);
        let dy = i64::from(y) - i64::from(self.offset_y);
        (0..width).contains(&dx) && (0..height).contains(&dy)
    }

    /// Snap a pixel to the top-left corner of the cell containing it.
    pub fn snap(&self, x: i32, y: i32) -> (i64, i64) {
        let size = self.size();
        let sx = (i64::from(x) - i64::from(self.offset_x)).div_euclid(size) * size;
        let sy = (i64::from(y) - i64::from(self.offset_y)).div_euclid(size) * size;
        (sx + i64::from(self.offset_x), sy + i64::from(self.offset_y))
    }

    /// `(row, col)` of the cell under a pixel, or `None` off the grid.
    pub fn cell_index(&self, x: i32, y: i32, rows: usize, columns: usize) -> Option<(usize, usize)> {
        if !self.on_grid(x, y, rows, columns) {
            return None;
        }
        let size = self.size();
        let col = (i64::from(x) - i64::from(self.offset_x)) / size;
        let row = (i64::from(y) - i64::from(self.offset_y)) / size;
        Some((row as usize, col as usize))
    }

    /// Pixel position of a cell's top-left corner.
    pub fn cell_origin(&self, row: usize, col: usize) -> (i64, i64) {
        let size = self.size();
        (
            col as i64 * size + i64::from(self.offset_x),
            row as i64 * size + i64::from(self.offset_y),
        )
    }
}
