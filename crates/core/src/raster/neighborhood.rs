//! Neighborhood windows for raster analysis

use std::ops::RangeInclusive;

/// A square window around a cell, clamped to the raster extent.
///
/// The window shrinks at edges and corners instead of wrapping around, so a
/// corner cell of a 3x3 window has only 3 neighbors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClampedWindow {
    row_start: usize,
    row_end: usize,
    col_start: usize,
    col_end: usize,
}

impl ClampedWindow {
    /// Window of the given radius centered on (row, col) in a `rows x cols` raster
    pub fn new(row: usize, col: usize, radius: usize, rows: usize, cols: usize) -> Self {
        Self {
            row_start: row.saturating_sub(radius),
            row_end: (row + radius).min(rows.saturating_sub(1)),
            col_start: col.saturating_sub(radius),
            col_end: (col + radius).min(cols.saturating_sub(1)),
        }
    }

    /// The 3x3 (queen) window centered on (row, col)
    pub fn queen(row: usize, col: usize, rows: usize, cols: usize) -> Self {
        Self::new(row, col, 1, rows, cols)
    }

    /// Rows covered by the window
    pub fn rows(&self) -> RangeInclusive<usize> {
        self.row_start..=self.row_end
    }

    /// Columns covered by the window
    pub fn cols(&self) -> RangeInclusive<usize> {
        self.col_start..=self.col_end
    }

    /// Number of cells covered, including the center
    pub fn len(&self) -> usize {
        (self.row_end - self.row_start + 1) * (self.col_end - self.col_start + 1)
    }

    /// A window always covers at least its center
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over all (row, col) positions in row-major order, center included
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows().flat_map(move |r| self.cols().map(move |c| (r, c)))
    }
}
