//! Axis-aligned grid geometry

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Axis-aligned affine mapping between grid-cell indices and map coordinates.
///
/// A grid coordinate `(grid_x, grid_y)` maps to the map coordinate:
/// ```text
/// map_x = ref_map_x + cell_size_x * (grid_x - ref_grid_x)
/// map_y = ref_map_y + cell_size_y * (grid_y - ref_grid_y)
/// ```
///
/// Grid coordinates have their origin at the upper-left corner of the
/// upper-left cell, so the center of cell `(col, row)` is `(col + 0.5, row + 0.5)`.
/// Cell sizes are signed; north-up grids have a negative `cell_size_y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Map X coordinate of the reference point
    pub ref_map_x: f64,
    /// Map Y coordinate of the reference point
    pub ref_map_y: f64,
    /// Cell size in X direction (map units per column)
    pub cell_size_x: f64,
    /// Cell size in Y direction (map units per row, usually negative)
    pub cell_size_y: f64,
    /// Grid X coordinate the reference point refers to
    pub ref_grid_x: f64,
    /// Grid Y coordinate the reference point refers to
    pub ref_grid_y: f64,
}

/// Rotation terms smaller than this are treated as zero
const ROTATION_EPS: f64 = 1e-10;

impl GridGeometry {
    /// Create a geometry anchored at the upper-left corner of the grid
    pub fn new(origin_x: f64, origin_y: f64, cell_size_x: f64, cell_size_y: f64) -> Self {
        Self {
            ref_map_x: origin_x,
            ref_map_y: origin_y,
            cell_size_x,
            cell_size_y,
            ref_grid_x: 0.0,
            ref_grid_y: 0.0,
        }
    }

    /// Create a geometry from its six descriptor values
    /// `[ref_map_x, ref_map_y, cell_size_x, cell_size_y, ref_grid_x, ref_grid_y]`.
    pub fn from_array(values: [f64; 6]) -> Result<Self> {
        let geom = Self {
            ref_map_x: values[0],
            ref_map_y: values[1],
            cell_size_x: values[2],
            cell_size_y: values[3],
            ref_grid_x: values[4],
            ref_grid_y: values[5],
        };
        geom.validate()?;
        Ok(geom)
    }

    /// The six descriptor values in [`GridGeometry::from_array`] order
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.ref_map_x,
            self.ref_map_y,
            self.cell_size_x,
            self.cell_size_y,
            self.ref_grid_x,
            self.ref_grid_y,
        ]
    }

    /// Create from GDAL-style array `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
    ///
    /// Rotated grids are rejected.
    pub fn from_gdal(coeffs: [f64; 6]) -> Result<Self> {
        if coeffs[2].abs() > ROTATION_EPS || coeffs[4].abs() > ROTATION_EPS {
            return Err(Error::UnsupportedGeometry(format!(
                "rotation terms ({}, {}) are not supported",
                coeffs[2], coeffs[4]
            )));
        }
        let geom = Self::new(coeffs[0], coeffs[3], coeffs[1], coeffs[5]);
        geom.validate()?;
        Ok(geom)
    }

    /// Convert to GDAL-style array
    pub fn to_gdal(&self) -> [f64; 6] {
        let (origin_x, origin_y) = self.origin();
        [origin_x, self.cell_size_x, 0.0, origin_y, 0.0, self.cell_size_y]
    }

    /// Create from affine-ordered coefficients `[a, b, c, d, e, f]` where
    /// `x = a * col + b * row + c` and `y = d * col + e * row + f`.
    pub fn from_affine(coeffs: [f64; 6]) -> Result<Self> {
        Self::from_gdal([coeffs[2], coeffs[0], coeffs[1], coeffs[5], coeffs[3], coeffs[4]])
    }

    /// Reject zero or non-finite cell sizes and non-finite reference values
    pub fn validate(&self) -> Result<()> {
        for (name, size) in [("cell_size_x", self.cell_size_x), ("cell_size_y", self.cell_size_y)] {
            if !size.is_finite() || size == 0.0 {
                return Err(Error::UnsupportedGeometry(format!("{name} must be finite and nonzero, got {size}")));
            }
        }
        if self.to_array().iter().any(|v| !v.is_finite()) {
            return Err(Error::UnsupportedGeometry("geometry values must be finite".into()));
        }
        Ok(())
    }

    /// Map coordinates of the upper-left corner of cell (0, 0)
    pub fn origin(&self) -> (f64, f64) {
        self.grid_to_map(0.0, 0.0)
    }

    /// Convert (fractional) grid coordinates to map coordinates
    pub fn grid_to_map(&self, grid_x: f64, grid_y: f64) -> (f64, f64) {
        (
            self.ref_map_x + self.cell_size_x * (grid_x - self.ref_grid_x),
            self.ref_map_y + self.cell_size_y * (grid_y - self.ref_grid_y),
        )
    }

    /// Convert map coordinates to fractional grid coordinates
    ///
    /// Use `.floor()` to get integer indices.
    pub fn map_to_grid(&self, map_x: f64, map_y: f64) -> (f64, f64) {
        (
            self.ref_grid_x + (map_x - self.ref_map_x) / self.cell_size_x,
            self.ref_grid_y + (map_y - self.ref_map_y) / self.cell_size_y,
        )
    }

    /// Map coordinates of the center of cell (col, row)
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.grid_to_map(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Geometry of a grid covering the same extent with `width x height` cells
    /// when this geometry describes a grid of `src_width x src_height` cells.
    pub fn rescaled(&self, src_width: usize, src_height: usize, width: usize, height: usize) -> Self {
        let (origin_x, origin_y) = self.origin();
        Self::new(
            origin_x,
            origin_y,
            self.cell_size_x * src_width as f64 / width.max(1) as f64,
            self.cell_size_y * src_height as f64 / height.max(1) as f64,
        )
    }

    /// Check if this is a north-up grid (Y decreases with increasing row)
    pub fn is_north_up(&self) -> bool {
        self.cell_size_y < 0.0
    }

    /// Calculate the bounding box `(min_x, min_y, max_x, max_y)` for a grid of given dimensions
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.grid_to_map(0.0, 0.0);
        let (x1, y1) = self.grid_to_map(width as f64, height as f64);
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
