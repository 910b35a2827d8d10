//! Multiscale gap filling over a halving pyramid
//!
//! Going down, every level gets one local averaging pass and, while gaps
//! remain, is mean-aggregated into a level of half the size. Going back up,
//! each level copies into its remaining gaps the value of the coarser cell
//! that covers them. The descent stops at a level that is 1x1, free of
//! gaps, or made only of gaps.

use gapgrid_core::raster::Raster;
use gapgrid_core::Result;
use tracing::debug;

use super::detect::{gaps_as_nan, is_settled, restore_mask};
use super::local::local_pass;
use super::GapFillParams;
use crate::resample::{downsample, DownsampleMethod, DownsampleParams};

/// Fill gaps using local averaging at every level of a resolution pyramid.
///
/// # Arguments
/// * `raster` - Input raster; non-finite and masked cells are gaps
/// * `params` - Minimum valid neighbor count for the averaging passes
///
/// # Returns
/// The filled raster and the number of gaps filled, which always equals
/// the input gap count minus the output gap count
pub fn fill_gaps_multiscale(raster: &Raster<f64>, params: GapFillParams) -> Result<(Raster<f64>, usize)> {
    params.validate()?;
    let base = gaps_as_nan(raster);
    let initial = base.count_gaps();

    // Finer levels, each after its averaging pass; `current` ends as the coarsest
    let mut levels: Vec<Raster<f64>> = Vec::new();
    let mut current = base;
    while !(current.is_singular() || is_settled(&current)) {
        let (filled, remaining) = local_pass(&current, params.min_valid_neighbors)?;
        debug!(
            level = levels.len(),
            rows = filled.rows(),
            cols = filled.cols(),
            remaining,
            "pyramid level averaged"
        );
        if remaining == 0 {
            current = filled;
            break;
        }
        current = halve(&filled)?;
        levels.push(filled);
    }

    let mut coarser = current;
    while let Some(mut finer) = levels.pop() {
        if !coarser.is_full_of_gaps() {
            patch_from_coarser(&mut finer, &coarser);
        }
        coarser = finer;
    }

    let remaining = coarser.count_gaps();
    let filled = initial - remaining;
    debug!(filled, remaining, "multiscale gap filling done");
    Ok((restore_mask(raster, coarser)?, filled))
}

/// Mean-aggregate to `ceil(cols / 2) x ceil(rows / 2)`, gaps stay `NaN`
fn halve(raster: &Raster<f64>) -> Result<Raster<f64>> {
    let params = DownsampleParams {
        method: DownsampleMethod::Mean,
        fill_value: Some(f64::NAN),
    };
    let width = raster.cols().div_ceil(2);
    let height = raster.rows().div_ceil(2);
    Ok(downsample(raster, width, height, params)?.into_owned())
}

/// Copy the covering coarser cell into every remaining gap of `finer`
fn patch_from_coarser(finer: &mut Raster<f64>, coarser: &Raster<f64>) {
    let coarse = coarser.data();
    for ((row, col), v) in finer.data_mut().indexed_iter_mut() {
        if !v.is_finite() {
            let c = coarse[(row / 2, col / 2)];
            if c.is_finite() {
                *v = c;
            }
        }
    }
}
