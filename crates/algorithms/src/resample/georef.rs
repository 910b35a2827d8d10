//! Geometry-aware resampling and cutting
//!
//! The output grid is placed inside the source grid by map coordinates
//! instead of by stretching one extent over the other. Both grids must be
//! axis-aligned with cell sizes of matching sign, and the output footprint
//! must lie inside the source footprint.

use std::borrow::Cow;
use std::cmp::Ordering;

use gapgrid_core::raster::{GridGeometry, Raster, RasterElement};
use gapgrid_core::{Error, Result};
use serde::{Deserialize, Serialize};

use super::axis::{AxisLayout, AxisPlacement, GEOMETRY_TOL};
use super::dispatch::resample_layouts;
use super::{check_non_empty, DownsampleParams, ResampleParams, UpsampleParams};

/// Axis-aligned rectangle in map coordinates, corners in any order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl MapRect {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    /// True when the rectangle has no area
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }
}

/// Upsample onto an output grid positioned by `out_geometry`.
///
/// Output cells must be no larger than source cells on either axis.
/// Returns the source borrowed when the output grid coincides with it.
pub fn upsample_with_geometry<'a, T: RasterElement>(
    src: &'a Raster<T>,
    width: usize,
    height: usize,
    out_geometry: &GridGeometry,
    params: UpsampleParams<T>,
) -> Result<Cow<'a, Raster<T>>> {
    let (x, y) = placed_layouts(src, width, height, out_geometry)?;
    if x.direction() == Ordering::Less || y.direction() == Ordering::Less {
        return Err(Error::GeometryMismatch(
            "upsampling requires output cells no larger than source cells".into(),
        ));
    }
    let params = ResampleParams {
        upsample: params.method,
        fill_value: params.fill_value,
        ..Default::default()
    };
    run_placed(src, x, y, out_geometry, &params)
}

/// Downsample onto an output grid positioned by `out_geometry`.
///
/// Output cells must be no smaller than source cells on either axis.
/// Returns the source borrowed when the output grid coincides with it.
pub fn downsample_with_geometry<'a, T: RasterElement>(
    src: &'a Raster<T>,
    width: usize,
    height: usize,
    out_geometry: &GridGeometry,
    params: DownsampleParams<T>,
) -> Result<Cow<'a, Raster<T>>> {
    params.method.validate()?;
    let (x, y) = placed_layouts(src, width, height, out_geometry)?;
    if x.direction() == Ordering::Greater || y.direction() == Ordering::Greater {
        return Err(Error::GeometryMismatch(
            "downsampling requires source cells no larger than output cells".into(),
        ));
    }
    let params = ResampleParams {
        downsample: params.method,
        fill_value: params.fill_value,
        ..Default::default()
    };
    run_placed(src, x, y, out_geometry, &params)
}

/// Resample onto an output grid positioned by `out_geometry`.
///
/// Each axis shrinks or grows according to the ratio of cell sizes.
pub fn resample_with_geometry<'a, T: RasterElement>(
    src: &'a Raster<T>,
    width: usize,
    height: usize,
    out_geometry: &GridGeometry,
    params: ResampleParams<T>,
) -> Result<Cow<'a, Raster<T>>> {
    params.downsample.validate()?;
    let (x, y) = placed_layouts(src, width, height, out_geometry)?;
    run_placed(src, x, y, out_geometry, &params)
}

/// Extract the map rectangle `rect` at the source resolution.
///
/// The output is `round(width / |cell_size_x|) x round(height / |cell_size_y|)`
/// cells anchored at the rectangle's upper-left corner. An empty rectangle
/// returns the source unchanged.
pub fn cut<'a, T: RasterElement>(
    src: &'a Raster<T>,
    rect: &MapRect,
    params: ResampleParams<T>,
) -> Result<Cow<'a, Raster<T>>> {
    if rect.is_empty() {
        return Ok(Cow::Borrowed(src));
    }
    let geom = src.geometry();
    let width = (rect.width() / geom.cell_size_x.abs()).round() as usize;
    let height = (rect.height() / geom.cell_size_y.abs()).round() as usize;

    let origin_x = if geom.cell_size_x > 0.0 {
        rect.x1.min(rect.x2)
    } else {
        rect.x1.max(rect.x2)
    };
    let origin_y = if geom.cell_size_y < 0.0 {
        rect.y1.max(rect.y2)
    } else {
        rect.y1.min(rect.y2)
    };
    let out_geometry = GridGeometry::new(origin_x, origin_y, geom.cell_size_x, geom.cell_size_y);
    resample_with_geometry(src, width, height, &out_geometry, params)
}

fn run_placed<'a, T: RasterElement>(
    src: &'a Raster<T>,
    x: AxisLayout,
    y: AxisLayout,
    out_geometry: &GridGeometry,
    params: &ResampleParams<T>,
) -> Result<Cow<'a, Raster<T>>> {
    if x.direction() == Ordering::Equal && y.direction() == Ordering::Equal {
        return Ok(Cow::Borrowed(src));
    }
    let mut out = src.with_same_meta(y.out_len, x.out_len);
    out.set_geometry(*out_geometry);
    resample_layouts(src, x, y, &mut out, params)?;
    Ok(Cow::Owned(out))
}

/// Locate the output grid inside the source grid, per axis
fn placed_layouts<T: RasterElement>(
    src: &Raster<T>,
    width: usize,
    height: usize,
    out_geometry: &GridGeometry,
) -> Result<(AxisLayout, AxisLayout)> {
    check_non_empty(src, width, height)?;
    let src_geometry = src.geometry();
    src_geometry.validate()?;
    out_geometry.validate()?;

    let (map_x, map_y) = out_geometry.grid_to_map(0.0, 0.0);
    let (offset_x, offset_y) = src_geometry.map_to_grid(map_x, map_y);

    let x = place_axis(
        "x",
        src_geometry.cell_size_x,
        out_geometry.cell_size_x,
        offset_x,
        src.cols(),
        width,
    )?;
    let y = place_axis(
        "y",
        src_geometry.cell_size_y,
        out_geometry.cell_size_y,
        offset_y,
        src.rows(),
        height,
    )?;
    Ok((x, y))
}

fn place_axis(
    axis: &str,
    src_cell: f64,
    out_cell: f64,
    offset: f64,
    src_len: usize,
    out_len: usize,
) -> Result<AxisLayout> {
    if src_cell.signum() != out_cell.signum() {
        return Err(Error::GeometryMismatch(format!(
            "{axis} cell sizes differ in sign: source {src_cell}, output {out_cell}"
        )));
    }
    let ratio = out_cell / src_cell;
    let end = offset + ratio * out_len as f64;
    if offset < -GEOMETRY_TOL || end > src_len as f64 + GEOMETRY_TOL {
        return Err(Error::GeometryMismatch(format!(
            "output {axis} range [{offset}, {end}] falls outside source range [0, {src_len}]"
        )));
    }
    // Snap roundoff at the leading edge
    let offset = if offset.abs() <= GEOMETRY_TOL { 0.0 } else { offset };
    Ok(AxisLayout::placed(src_len, out_len, AxisPlacement { offset, ratio }))
}
