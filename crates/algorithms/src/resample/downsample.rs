//! Downsampling by area-weighted aggregation
//!
//! Every output cell covers a rectangle of the source grid. Source cells
//! fully inside contribute weight 1; cells cut by the rectangle's edges
//! contribute the covered fraction of their area. Gaps never contribute.

use std::borrow::Cow;

use crate::maybe_rayon::*;
use gapgrid_core::raster::{Raster, RasterElement};
use gapgrid_core::{Error, Result};

use super::axis::{axis_spans, AxisLayout, AxisSpan, EPS};
use super::{check_non_empty, check_out_shape, resolve_fill_value, store_cells, DownsampleMethod, DownsampleParams};

/// Downsample a raster to `width x height` cells.
///
/// Both dimensions must be less than or equal to the source dimensions.
/// When they are equal the source is returned borrowed, without copying.
///
/// # Arguments
/// * `src` - Input raster
/// * `width` - Output width, `<= src.cols()`
/// * `height` - Output height, `<= src.rows()`
/// * `params` - Aggregation method and fill value
///
/// # Returns
/// The aggregated raster covering the same extent as `src`
pub fn downsample<'a, T: RasterElement>(
    src: &'a Raster<T>,
    width: usize,
    height: usize,
    params: DownsampleParams<T>,
) -> Result<Cow<'a, Raster<T>>> {
    params.method.validate()?;
    if (height, width) == src.shape() {
        return Ok(Cow::Borrowed(src));
    }
    let mut out = src.with_same_meta(height, width);
    out.set_geometry(src.geometry().rescaled(src.cols(), src.rows(), width, height));
    downsample_into(src, width, height, &mut out, params)?;
    Ok(Cow::Owned(out))
}

/// Downsample into a caller-owned buffer of shape `height x width`.
///
/// Returns the buffer, or `src` itself when the requested shape equals the
/// source shape (the buffer is left untouched in that case).
pub fn downsample_into<'a, T: RasterElement>(
    src: &'a Raster<T>,
    width: usize,
    height: usize,
    out: &'a mut Raster<T>,
    params: DownsampleParams<T>,
) -> Result<&'a Raster<T>> {
    params.method.validate()?;
    check_out_shape(out, width, height)?;
    if out.shape() == src.shape() {
        return Ok(src);
    }
    check_non_empty(src, width, height)?;
    if width > src.cols() || height > src.rows() {
        return Err(Error::InvalidTargetSize {
            operation: "downsampling",
            src_width: src.cols(),
            src_height: src.rows(),
            width,
            height,
        });
    }

    let fill = resolve_fill_value(params.fill_value, src, out);
    let x = AxisLayout::full_extent(src.cols(), width);
    let y = AxisLayout::full_extent(src.rows(), height);
    let cells = downsample_cells(src, x, y, params.method);
    store_cells(out, cells, fill, src.has_mask())?;
    Ok(&*out)
}

/// Compute every output cell; `None` marks cells with no valid contribution
pub(crate) fn downsample_cells<T: RasterElement>(
    src: &Raster<T>,
    x: AxisLayout,
    y: AxisLayout,
    method: DownsampleMethod,
) -> Vec<Option<T>> {
    let xs = axis_spans(x.down_map(), x.src_len, x.out_len);
    let ys = axis_spans(y.down_map(), y.src_len, y.out_len);

    (0..y.out_len)
        .into_par_iter()
        .flat_map(|oy| {
            let sy = ys[oy];
            xs.iter()
                .map(|sx| aggregate(src, &sy, sx, method))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Aggregate the valid source cells of one output cell.
///
/// Candidates are visited row-major; each carries the product of its row
/// and column overlap weights.
fn aggregate<T: RasterElement>(src: &Raster<T>, ys: &AxisSpan, xs: &AxisSpan, method: DownsampleMethod) -> Option<T> {
    let mut cells = ys
        .indices()
        .flat_map(|r| xs.indices().map(move |c| (r, c)))
        .filter(|&(r, c)| unsafe { src.is_valid_unchecked(r, c) })
        .map(|(r, c)| (unsafe { src.get_unchecked(r, c) }, ys.weight(r) * xs.weight(c)));

    match method {
        DownsampleMethod::First => cells.next().map(|(v, _)| v),
        DownsampleMethod::Last => cells.last().map(|(v, _)| v),
        DownsampleMethod::Mean => {
            // Running convex combination, stays within the range of the inputs
            let mut sum_w = 0.0;
            let mut mean = 0.0;
            for (v, w) in cells.filter(|&(_, w)| w > 0.0) {
                sum_w += w;
                let f = w / sum_w;
                mean = mean * (1.0 - f) + v.to_f64()? * f;
            }
            if sum_w < EPS {
                return None;
            }
            T::from_f64(mean)
        }
        DownsampleMethod::Variance => {
            // Weighted Welford update
            let mut sum_w = 0.0;
            let mut mean = 0.0;
            let mut m2 = 0.0;
            for (v, w) in cells.filter(|&(_, w)| w > 0.0) {
                let v = v.to_f64()?;
                sum_w += w;
                let delta = v - mean;
                mean += delta * (w / sum_w);
                m2 += w * delta * (v - mean);
            }
            if sum_w < EPS {
                return None;
            }
            T::from_f64((m2 / sum_w).max(0.0))
        }
        DownsampleMethod::Mode { rank } => {
            let mut tally: Vec<(T, f64)> = Vec::new();
            for (v, w) in cells {
                match tally.iter_mut().find(|(t, _)| *t == v) {
                    Some(entry) => entry.1 += w,
                    None => tally.push((v, w)),
                }
            }
            // Stable: equal weights keep first-seen order
            tally.sort_by(|a, b| b.1.total_cmp(&a.1));
            tally.get(rank.checked_sub(1)?).map(|(v, _)| *v)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    const NAN: f64 = f64::NAN;

    fn params<T>(method: DownsampleMethod, fill_value: Option<T>) -> DownsampleParams<T> {
        DownsampleParams { method, fill_value }
    }

    fn assert_grid_eq(actual: &Array2<f64>, expected: &Array2<f64>) {
        assert_eq!(actual.dim(), expected.dim());
        for (a, e) in actual.iter().zip(expected.iter()) {
            if e.is_nan() {
                assert!(a.is_nan(), "expected NaN, got {}", a);
            } else {
                assert_relative_eq!(*a, *e, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_mean_three_to_two() {
        let src = Raster::from_array(array![[0.6, 0.2, 3.4], [1.4, 1.6, 1.0], [4.0, 2.8, 3.0]]);
        let out = downsample(&src, 2, 2, params(DownsampleMethod::Mean, None)).unwrap();
        let w = 1.0 + 0.5 + 0.5 + 0.25;
        let expected = array![
            [
                (0.6 + 0.5 * 0.2 + 0.5 * 1.4 + 0.25 * 1.6) / w,
                (3.4 + 0.5 * 0.2 + 0.5 * 1.0 + 0.25 * 1.6) / w
            ],
            [
                (4.0 + 0.5 * 1.4 + 0.5 * 2.8 + 0.25 * 1.6) / w,
                (3.0 + 0.5 * 1.0 + 0.5 * 2.8 + 0.25 * 1.6) / w
            ]
        ];
        assert_grid_eq(out.data(), &expected);
    }

    #[test]
    fn test_mean_even_blocks() {
        let src = Raster::from_array(array![
            [0.9, 0.5, 3.0, 4.0],
            [1.1, 1.5, 1.0, 2.0],
            [4.0, 2.1, 3.0, 5.0],
            [3.0, 4.9, 3.0, 1.0]
        ]);
        let out = downsample(&src, 2, 2, params(DownsampleMethod::Mean, None)).unwrap();
        assert_grid_eq(out.data(), &array![[1.0, 2.5], [3.5, 3.0]]);
    }

    #[test]
    fn test_mean_masked() {
        let src = Raster::from_array(array![
            [0.9, 0.5, 3.0, 4.0],
            [1.1, NAN, 1.0, 2.0],
            [4.0, 2.1, 3.0, 5.0],
            [3.0, 4.9, NAN, 1.0]
        ])
        .with_mask(array![
            [true, true, false, false],
            [true, true, false, false],
            [false, false, false, true],
            [false, false, false, false]
        ])
        .unwrap();
        let out = downsample(&src, 2, 2, params(DownsampleMethod::Mean, Some(NAN))).unwrap();
        assert_grid_eq(out.data(), &array![[NAN, 2.5], [3.5, 2.0]]);
        assert_eq!(out.mask().unwrap(), &array![[true, false], [false, false]]);
        assert!(out.nodata().unwrap().is_nan());
    }

    #[test]
    fn test_mode_weighted() {
        let src = Raster::from_array(array![[2, 4, 1], [1, 2, 2], [1, 1, 1]]);
        let out = downsample(&src, 2, 2, params(DownsampleMethod::mode(), Some(0))).unwrap();
        // Last cell: value 1 covers 1.5 of the area, value 2 only 0.75
        assert_eq!(out.data(), &array![[2, 1], [1, 1]]);
    }

    #[test]
    fn test_mode_ties_keep_first_seen() {
        let src = Raster::from_array(array![[3, 5, 2, 1], [3, 5, 4, 3], [1, 1, 3, 4], [4, 1, 4, 4]]);
        let out = downsample(&src, 2, 2, params(DownsampleMethod::mode(), Some(0))).unwrap();
        assert_eq!(out.data(), &array![[3, 2], [1, 4]]);
    }

    #[test]
    fn test_mode_masked_block_gets_fill() {
        let src = Raster::from_array(array![[3, 5, 2, 1], [3, 5, 4, 3], [1, 1, 3, 4], [4, 1, 4, 4]])
            .with_mask(array![
                [false, false, true, true],
                [false, false, true, true],
                [false, false, false, false],
                [false, false, false, false]
            ])
            .unwrap();
        let out = downsample(&src, 2, 2, params(DownsampleMethod::mode(), Some(9))).unwrap();
        assert_eq!(out.data(), &array![[3, 9], [1, 4]]);
        assert_eq!(out.nodata(), Some(9));
    }

    #[test]
    fn test_mode_rank_beyond_distinct_values() {
        let src = Raster::from_array(array![[1.0, 1.0], [1.0, 2.0]]);
        let out = downsample(&src, 1, 1, params(DownsampleMethod::Mode { rank: 2 }, Some(-1.0))).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 2.0);
        let out = downsample(&src, 1, 1, params(DownsampleMethod::Mode { rank: 3 }, Some(-1.0))).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), -1.0);
    }

    #[test]
    fn test_first_and_last_skip_gaps() {
        let src = Raster::from_array(array![[0.6, 0.2, 3.4], [1.4, NAN, 1.0], [4.0, 2.8, 3.0]]);
        let first = downsample(&src, 2, 2, params(DownsampleMethod::First, None)).unwrap();
        assert_grid_eq(first.data(), &array![[0.6, 0.2], [1.4, 1.0]]);
        let last = downsample(&src, 2, 2, params(DownsampleMethod::Last, None)).unwrap();
        assert_grid_eq(last.data(), &array![[1.4, 1.0], [2.8, 3.0]]);

        let src = Raster::from_array(array![
            [0.9, 0.5, 3.0, 4.0],
            [1.1, 1.5, 1.0, NAN],
            [NAN, NAN, 3.0, 5.0],
            [3.0, 4.9, NAN, 1.0]
        ]);
        let first = downsample(&src, 2, 2, params(DownsampleMethod::First, None)).unwrap();
        assert_grid_eq(first.data(), &array![[0.9, 3.0], [3.0, 3.0]]);
        let last = downsample(&src, 2, 2, params(DownsampleMethod::Last, None)).unwrap();
        assert_grid_eq(last.data(), &array![[1.5, 1.0], [4.9, 1.0]]);
    }

    #[test]
    fn test_variance() {
        let src = Raster::from_array(array![[1.0, 3.0], [1.0, 3.0]]);
        let out = downsample(&src, 1, 1, params(DownsampleMethod::Variance, None)).unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap(), 1.0, epsilon = 1e-12);

        let flat = Raster::filled(3, 3, 0.1);
        let out = downsample(&flat, 2, 2, params(DownsampleMethod::Variance, None)).unwrap();
        assert!(out.data().iter().all(|v| *v >= 0.0 && *v < 1e-12));
    }

    #[test]
    fn test_all_gaps_gets_fill() {
        let src = Raster::filled(2, 2, NAN);
        let out = downsample(&src, 1, 1, params(DownsampleMethod::Mean, Some(-1.0))).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), -1.0);
        assert!(!out.has_mask());
    }

    #[test]
    fn test_fill_falls_back_to_nodata() {
        let mut src = Raster::filled(2, 2, NAN);
        src.set_nodata(Some(-9999.0));
        let out = downsample(&src, 1, 1, params(DownsampleMethod::Mean, None)).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), -9999.0);
    }

    #[test]
    fn test_integer_mean_rounds() {
        let src = Raster::from_array(array![[1u8, 2], [2, 2]]);
        let out = downsample(&src, 1, 1, DownsampleParams::default()).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 2);
    }

    #[test]
    fn test_output_geometry_rescaled() {
        let src: Raster<f64> = Raster::new(4, 6);
        let out = downsample(&src, 3, 2, DownsampleParams::default()).unwrap();
        let geom = out.geometry();
        assert_relative_eq!(geom.cell_size_x, 2.0);
        assert_relative_eq!(geom.cell_size_y, -2.0);
    }

    #[test]
    fn test_mean_of_extreme_values_stays_finite() {
        let big: f64 = 1.7e308;
        let src = Raster::from_array(Array2::from_elem((4, 4), big));
        let out = downsample(&src, 2, 2, params(DownsampleMethod::Mean, None)).unwrap();
        for v in out.data().iter() {
            assert!(v.is_finite());
            assert_relative_eq!(*v, big, max_relative = 1e-12);
        }
        let out = downsample(&src, 1, 1, params(DownsampleMethod::Variance, None)).unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_same_size_borrows_source() {
        let src = Raster::from_array(array![[1.0, 2.0], [3.0, 4.0]]);
        let out = downsample(&src, 2, 2, params(DownsampleMethod::Mean, Some(-1.0))).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out.data(), &array![[1.0, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn test_growing_is_size_error() {
        let src: Raster<f64> = Raster::new(2, 2);
        let err = downsample(&src, 3, 1, DownsampleParams::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidTargetSize { operation: "downsampling", .. }));
    }

    #[test]
    fn test_mode_rank_zero_rejected() {
        let src: Raster<f64> = Raster::new(2, 2);
        let result = downsample(&src, 1, 1, params(DownsampleMethod::Mode { rank: 0 }, None));
        assert!(matches!(result, Err(Error::InvalidParameter { name: "mode_rank", .. })));
    }

    #[test]
    fn test_into_buffer() {
        let src = Raster::from_array(array![[1.0, 3.0], [5.0, 7.0]]);
        let mut out: Raster<f64> = Raster::new(1, 1);
        let result = downsample_into(&src, 1, 1, &mut out, DownsampleParams::default()).unwrap();
        assert_relative_eq!(result.get(0, 0).unwrap(), 4.0, epsilon = 1e-12);

        let mut wrong: Raster<f64> = Raster::new(2, 1);
        let result = downsample_into(&src, 1, 1, &mut wrong, DownsampleParams::default());
        assert!(matches!(result, Err(Error::SizeMismatch { .. })));
    }
}
