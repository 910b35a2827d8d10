//! Upsampling by nearest neighbor or bilinear interpolation
//!
//! Each output cell maps to a fractional source coordinate. Nearest takes
//! the source cell under that coordinate as-is; linear blends the 4
//! surrounding cells, clamping at the last row/column so the far sample
//! repeats the near one (edge extension, not wraparound).

use std::borrow::Cow;

use crate::maybe_rayon::*;
use gapgrid_core::raster::{Raster, RasterElement};
use gapgrid_core::{Error, Result};

use super::axis::{linear_taps, nearest_indices, AxisLayout};
use super::{check_non_empty, check_out_shape, resolve_fill_value, store_cells, UpsampleMethod, UpsampleParams};

/// Upsample a raster to `width x height` cells.
///
/// Both dimensions must be greater than or equal to the source dimensions.
/// When they are equal the source is returned borrowed, without copying.
///
/// # Arguments
/// * `src` - Input raster
/// * `width` - Output width, `>= src.cols()`
/// * `height` - Output height, `>= src.rows()`
/// * `params` - Interpolation method and fill value
///
/// # Returns
/// The upsampled raster covering the same extent as `src`
pub fn upsample<'a, T: RasterElement>(
    src: &'a Raster<T>,
    width: usize,
    height: usize,
    params: UpsampleParams<T>,
) -> Result<Cow<'a, Raster<T>>> {
    if (height, width) == src.shape() {
        return Ok(Cow::Borrowed(src));
    }
    let mut out = src.with_same_meta(height, width);
    out.set_geometry(src.geometry().rescaled(src.cols(), src.rows(), width, height));
    upsample_into(src, width, height, &mut out, params)?;
    Ok(Cow::Owned(out))
}

/// Upsample into a caller-owned buffer of shape `height x width`.
///
/// Returns the buffer, or `src` itself when the requested shape equals the
/// source shape (the buffer is left untouched in that case).
pub fn upsample_into<'a, T: RasterElement>(
    src: &'a Raster<T>,
    width: usize,
    height: usize,
    out: &'a mut Raster<T>,
    params: UpsampleParams<T>,
) -> Result<&'a Raster<T>> {
    check_out_shape(out, width, height)?;
    if out.shape() == src.shape() {
        return Ok(src);
    }
    check_non_empty(src, width, height)?;
    if width < src.cols() || height < src.rows() {
        return Err(Error::InvalidTargetSize {
            operation: "upsampling",
            src_width: src.cols(),
            src_height: src.rows(),
            width,
            height,
        });
    }

    let fill = resolve_fill_value(params.fill_value, src, out);
    let x = AxisLayout::full_extent(src.cols(), width);
    let y = AxisLayout::full_extent(src.rows(), height);
    let cells = upsample_cells(src, x, y, params.method);
    store_cells(out, cells, fill, src.has_mask())?;
    Ok(&*out)
}

/// Compute every output cell; `None` marks cells that get the fill value
pub(crate) fn upsample_cells<T: RasterElement>(
    src: &Raster<T>,
    x: AxisLayout,
    y: AxisLayout,
    method: UpsampleMethod,
) -> Vec<Option<T>> {
    match method {
        UpsampleMethod::Nearest => {
            let xs = nearest_indices(x.up_map(method), x.src_len, x.out_len);
            let ys = nearest_indices(y.up_map(method), y.src_len, y.out_len);
            let mask = src.mask();

            (0..y.out_len)
                .into_par_iter()
                .flat_map(|oy| {
                    let sy = ys[oy];
                    xs.iter()
                        .map(|&sx| {
                            // Masked cells become fill; non-finite values pass through
                            if mask.is_some_and(|m| m[(sy, sx)]) {
                                None
                            } else {
                                Some(unsafe { src.get_unchecked(sy, sx) })
                            }
                        })
                        .collect::<Vec<_>>()
                })
                .collect()
        }
        UpsampleMethod::Linear => {
            let xt = linear_taps(x.up_map(method), x.src_len, x.out_len);
            let yt = linear_taps(y.up_map(method), y.src_len, y.out_len);

            (0..y.out_len)
                .into_par_iter()
                .flat_map(|oy| {
                    let ty = yt[oy];
                    xt.iter().map(|&tx| bilinear(src, ty, tx)).collect::<Vec<_>>()
                })
                .collect()
        }
    }
}

/// Bilinear sample at taps `(i0, i1, w)` for rows and columns.
///
/// If any corner is a gap, falls back to the corner nearest by weight and
/// returns `None` when that corner is a gap too.
#[inline]
fn bilinear<T: RasterElement>(src: &Raster<T>, ty: (usize, usize, f64), tx: (usize, usize, f64)) -> Option<T> {
    let (y0, y1, wy) = ty;
    let (x0, x1, wx) = tx;

    let corner = |r: usize, c: usize| unsafe { (src.get_unchecked(r, c), src.is_valid_unchecked(r, c)) };
    let (v00, ok00) = corner(y0, x0);
    let (v01, ok01) = corner(y0, x1);
    let (v10, ok10) = corner(y1, x0);
    let (v11, ok11) = corner(y1, x1);

    if ok00 && ok01 && ok10 && ok11 {
        let (a, b) = (v00.to_f64()?, v01.to_f64()?);
        let (c, d) = (v10.to_f64()?, v11.to_f64()?);
        let v0 = a + wx * (b - a);
        let v1 = c + wx * (d - c);
        return T::from_f64(v0 + wy * (v1 - v0));
    }

    let (value, ok) = match (wx < 0.5, wy < 0.5) {
        (true, true) => (v00, ok00),
        (true, false) => (v10, ok10),
        (false, true) => (v01, ok01),
        (false, false) => (v11, ok11),
    };
    ok.then_some(value)
}
