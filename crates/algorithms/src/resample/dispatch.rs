//! Combined resampling
//!
//! Each axis is classified independently as shrinking, growing or
//! unchanged. When both axes move the same way (or one holds) a single
//! kernel runs; when one shrinks while the other grows, the shrinking axis
//! is aggregated first into an intermediate raster that the growing axis
//! then interpolates.

use std::borrow::Cow;
use std::cmp::Ordering;

use gapgrid_core::raster::{Raster, RasterElement};
use gapgrid_core::{Algorithm, Error, Result};
use tracing::debug;

use super::axis::AxisLayout;
use super::downsample::downsample_cells;
use super::upsample::upsample_cells;
use super::{check_non_empty, check_out_shape, resolve_fill_value, store_cells, ResampleParams};

/// Resample algorithm to a fixed target size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resample {
    pub width: usize,
    pub height: usize,
}

impl Algorithm for Resample {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = ResampleParams<f64>;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Resample"
    }

    fn description(&self) -> &'static str {
        "Change raster resolution by aggregating shrinking axes and interpolating growing axes"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let out = resample(&input, self.width, self.height, params)?.into_owned();
        Ok(out)
    }
}

/// Resample a raster to `width x height` cells.
///
/// Any combination of shrinking and growing axes is accepted. When the
/// target shape equals the source shape the source is returned borrowed.
///
/// # Arguments
/// * `src` - Input raster
/// * `width` - Output width
/// * `height` - Output height
/// * `params` - Aggregation and interpolation methods, fill value
pub fn resample<'a, T: RasterElement>(
    src: &'a Raster<T>,
    width: usize,
    height: usize,
    params: ResampleParams<T>,
) -> Result<Cow<'a, Raster<T>>> {
    params.downsample.validate()?;
    if (height, width) == src.shape() {
        return Ok(Cow::Borrowed(src));
    }
    let mut out = src.with_same_meta(height, width);
    out.set_geometry(src.geometry().rescaled(src.cols(), src.rows(), width, height));
    resample_into(src, width, height, &mut out, params)?;
    Ok(Cow::Owned(out))
}

/// Resample into a caller-owned buffer of shape `height x width`.
///
/// Returns the buffer, or `src` itself when the requested shape equals the
/// source shape.
pub fn resample_into<'a, T: RasterElement>(
    src: &'a Raster<T>,
    width: usize,
    height: usize,
    out: &'a mut Raster<T>,
    params: ResampleParams<T>,
) -> Result<&'a Raster<T>> {
    params.downsample.validate()?;
    check_out_shape(out, width, height)?;
    if out.shape() == src.shape() {
        return Ok(src);
    }
    check_non_empty(src, width, height)?;

    let x = AxisLayout::full_extent(src.cols(), width);
    let y = AxisLayout::full_extent(src.rows(), height);
    resample_layouts(src, x, y, out, &params)?;
    Ok(&*out)
}

/// Run the kernels for the given per-axis layouts and store into `out`.
///
/// `out` must already have shape `y.out_len x x.out_len`.
pub(crate) fn resample_layouts<T: RasterElement>(
    src: &Raster<T>,
    x: AxisLayout,
    y: AxisLayout,
    out: &mut Raster<T>,
    params: &ResampleParams<T>,
) -> Result<()> {
    let fill = resolve_fill_value(params.fill_value, src, out);
    let masked = src.has_mask();
    let (dx, dy) = (x.direction(), y.direction());

    debug!(
        src_rows = y.src_len,
        src_cols = x.src_len,
        rows = y.out_len,
        cols = x.out_len,
        x_direction = ?dx,
        y_direction = ?dy,
        downsample = %params.downsample,
        upsample = %params.upsample,
        "resampling"
    );

    match (dx, dy) {
        (Ordering::Less | Ordering::Equal, Ordering::Less | Ordering::Equal) => {
            let cells = downsample_cells(src, x, y, params.downsample);
            store_cells(out, cells, fill, masked)
        }
        (Ordering::Greater | Ordering::Equal, Ordering::Greater | Ordering::Equal) => {
            let cells = upsample_cells(src, x, y, params.upsample);
            store_cells(out, cells, fill, masked)
        }
        (Ordering::Less, _) => {
            // Columns shrink, rows grow
            let mut temp = src.with_same_meta(y.src_len, x.out_len);
            let cells = downsample_cells(src, x, AxisLayout::identity(y.src_len), params.downsample);
            store_cells(&mut temp, cells, fill, true)?;
            let cells = upsample_cells(&temp, AxisLayout::identity(x.out_len), y, params.upsample);
            store_cells(out, cells, fill, masked)
        }
        (_, Ordering::Less) => {
            // Rows shrink, columns grow
            let mut temp = src.with_same_meta(y.out_len, x.src_len);
            let cells = downsample_cells(src, AxisLayout::identity(x.src_len), y, params.downsample);
            store_cells(&mut temp, cells, fill, true)?;
            let cells = upsample_cells(&temp, x, AxisLayout::identity(y.out_len), params.upsample);
            store_cells(out, cells, fill, masked)
        }
    }
}
