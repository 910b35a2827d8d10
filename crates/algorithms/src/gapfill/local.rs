//! Local gap filling by neighborhood averaging
//!
//! Each pass reads the previous grid and writes a new one, so a cell filled
//! in a pass only feeds its neighbors in the next pass. Gaps spread inward
//! from their valid border one ring per pass.

use crate::maybe_rayon::*;
use gapgrid_core::raster::{ClampedWindow, Raster};
use gapgrid_core::{Error, Result};
use ndarray::Array2;
use tracing::{debug, trace};

use super::detect::{gaps_as_nan, is_settled, restore_mask};
use super::GapFillParams;

/// Fill gaps by repeating neighborhood-averaging passes until no cell changes.
///
/// A gap is replaced by the mean of the valid cells in its edge-clamped 3x3
/// window when at least `min_valid_neighbors` of them are valid. Gaps that
/// never reach that count stay gaps.
///
/// # Arguments
/// * `raster` - Input raster; non-finite and masked cells are gaps
/// * `params` - Minimum valid neighbor count
///
/// # Returns
/// The filled raster, with `NaN` in the gaps that remain
pub fn fill_gaps_local(raster: &Raster<f64>, params: GapFillParams) -> Result<Raster<f64>> {
    params.validate()?;
    let mut current = gaps_as_nan(raster);
    if is_settled(&current) {
        return restore_mask(raster, current);
    }

    let initial = current.count_gaps();
    let mut gaps = initial;
    let mut passes = 0usize;
    loop {
        let (next, remaining) = local_pass(&current, params.min_valid_neighbors)?;
        passes += 1;
        trace!(pass = passes, remaining, "local averaging pass");
        current = next;
        if remaining == 0 || remaining == gaps {
            gaps = remaining;
            break;
        }
        gaps = remaining;
    }

    debug!(passes, filled = initial - gaps, remaining = gaps, "local gap filling converged");
    restore_mask(raster, current)
}

/// One averaging pass over a `NaN`-coded raster without a mask.
///
/// Returns the new raster and the number of gaps still present.
pub(crate) fn local_pass(raster: &Raster<f64>, min_valid: usize) -> Result<(Raster<f64>, usize)> {
    let (rows, cols) = raster.shape();
    let src = raster.data();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let v = unsafe { *src.uget((row, col)) };
                    if v.is_finite() {
                        return v;
                    }
                    // The center is a gap, so only neighbors contribute.
                    // Running mean, no intermediate sum to overflow.
                    let (mean, count) = ClampedWindow::queen(row, col, rows, cols)
                        .positions()
                        .map(|(r, c)| unsafe { *src.uget((r, c)) })
                        .filter(|nv| nv.is_finite())
                        .fold((0.0, 0usize), |(m, n), nv| {
                            let n = n + 1;
                            let k = n as f64;
                            (m * ((k - 1.0) / k) + nv / k, n)
                        });
                    if count >= min_valid {
                        mean
                    } else {
                        f64::NAN
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let remaining = data.iter().filter(|v| !v.is_finite()).count();
    let mut output = raster.with_same_meta(rows, cols);
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|_| Error::InvalidDimensions { width: cols, height: rows })?;
    Ok((output, remaining))
}
