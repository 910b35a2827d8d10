//! Per-axis index mapping between output and source grids
//!
//! Every kernel works separably: an output index along one axis maps to a
//! fractional source coordinate `offset + scale * out_index`. Downsampling
//! turns that coordinate into a span of contributing source cells with
//! boundary weights; upsampling turns it into one or two source indices.

use std::cmp::Ordering;
use std::ops::RangeInclusive;

use super::UpsampleMethod;

/// End-edge weights below this are treated as a full cell of the previous index
pub(crate) const EPS: f64 = 1e-10;

/// Tolerance (in source cells) for geometry comparisons
pub(crate) const GEOMETRY_TOL: f64 = 1e-9;

/// Affine map from an output index to a fractional source coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisMap {
    pub offset: f64,
    pub scale: f64,
}

impl AxisMap {
    pub fn new(offset: f64, scale: f64) -> Self {
        Self { offset, scale }
    }

    /// Area mapping: output cell `i` covers `[i, i + 1) * src_len / out_len`
    pub fn area(src_len: usize, out_len: usize) -> Self {
        Self::new(0.0, src_len as f64 / out_len.max(1) as f64)
    }

    /// Corner-aligned mapping: first and last cells of both grids coincide
    pub fn corner_aligned(src_len: usize, out_len: usize) -> Self {
        let den = if out_len > 1 { (out_len - 1) as f64 } else { 1.0 };
        Self::new(0.0, (src_len as f64 - 1.0).max(0.0) / den)
    }

    #[inline]
    pub fn source(&self, out_index: usize) -> f64 {
        self.offset + self.scale * out_index as f64
    }
}

/// Source cells along one axis contributing to one output cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisSpan {
    pub start: usize,
    pub end: usize,
    pub w_start: f64,
    pub w_end: f64,
}

impl AxisSpan {
    #[inline]
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Overlap weight of source index `i` (must lie within the span)
    #[inline]
    pub fn weight(&self, i: usize) -> f64 {
        if i == self.start {
            self.w_start
        } else if i == self.end {
            self.w_end
        } else {
            1.0
        }
    }
}

/// Contribution spans for every output index along one axis
pub(crate) fn axis_spans(map: AxisMap, src_len: usize, out_len: usize) -> Vec<AxisSpan> {
    let last = src_len.saturating_sub(1);
    (0..out_len)
        .map(|i| {
            let f0 = map.source(i).max(0.0);
            let f1 = f0 + map.scale;
            let start = (f0.floor() as usize).min(last);
            let mut end = f1.floor() as usize;
            let w_start = 1.0 - (f0 - start as f64);
            let mut w_end = f1 - end as f64;
            if w_end < EPS {
                w_end = 1.0;
                if end > start {
                    end -= 1;
                }
            }
            if end > last {
                end = last;
                w_end = 1.0;
            }
            AxisSpan {
                start,
                end: end.max(start),
                w_start,
                w_end,
            }
        })
        .collect()
}

/// Nearest source index for every output index along one axis
pub(crate) fn nearest_indices(map: AxisMap, src_len: usize, out_len: usize) -> Vec<usize> {
    let last = src_len.saturating_sub(1);
    (0..out_len)
        .map(|i| (map.source(i).max(0.0).floor() as usize).min(last))
        .collect()
}

/// Interpolation taps `(i0, i1, w)` along one axis; `i1 == i0` at the far edge
pub(crate) fn linear_taps(map: AxisMap, src_len: usize, out_len: usize) -> Vec<(usize, usize, f64)> {
    let last = src_len.saturating_sub(1);
    (0..out_len)
        .map(|i| {
            let f = map.source(i).clamp(0.0, last as f64);
            let i0 = (f.floor() as usize).min(last);
            let w = f - i0 as f64;
            let i1 = if i0 < last { i0 + 1 } else { i0 };
            (i0, i1, w)
        })
        .collect()
}

/// Placement of an output axis inside a georeferenced source axis, in source cells
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisPlacement {
    /// Source coordinate of the output grid's leading edge
    pub offset: f64,
    /// Output cell size divided by source cell size
    pub ratio: f64,
}

/// How one axis of an output grid relates to the same axis of its source
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisLayout {
    pub src_len: usize,
    pub out_len: usize,
    pub placement: Option<AxisPlacement>,
}

impl AxisLayout {
    /// Layout where the output spans the full source extent
    pub fn full_extent(src_len: usize, out_len: usize) -> Self {
        Self {
            src_len,
            out_len,
            placement: None,
        }
    }

    /// Layout positioned by grid geometry
    pub fn placed(src_len: usize, out_len: usize, placement: AxisPlacement) -> Self {
        Self {
            src_len,
            out_len,
            placement: Some(placement),
        }
    }

    /// Identity layout over `len` cells
    pub fn identity(len: usize) -> Self {
        Self::full_extent(len, len)
    }

    /// `Less` when the axis shrinks (downsampling), `Greater` when it grows
    /// (upsampling), `Equal` when it passes through unchanged.
    pub fn direction(&self) -> Ordering {
        match self.placement {
            None => self.out_len.cmp(&self.src_len),
            Some(p) => {
                if p.ratio > 1.0 + GEOMETRY_TOL {
                    Ordering::Less
                } else if p.ratio < 1.0 - GEOMETRY_TOL {
                    Ordering::Greater
                } else if p.offset.abs() <= GEOMETRY_TOL && self.out_len == self.src_len {
                    Ordering::Equal
                } else {
                    // Same cell size but shifted or cropped: area weighting handles it
                    Ordering::Less
                }
            }
        }
    }

    pub fn down_map(&self) -> AxisMap {
        match self.placement {
            None => AxisMap::area(self.src_len, self.out_len),
            Some(p) => AxisMap::new(p.offset, p.ratio),
        }
    }

    pub fn up_map(&self, method: UpsampleMethod) -> AxisMap {
        match (self.placement, method) {
            (None, UpsampleMethod::Nearest) => AxisMap::area(self.src_len, self.out_len),
            (None, UpsampleMethod::Linear) => AxisMap::corner_aligned(self.src_len, self.out_len),
            (Some(p), UpsampleMethod::Nearest) => AxisMap::new(p.offset, p.ratio),
            // Output cell centers onto source cell centers
            (Some(p), UpsampleMethod::Linear) => AxisMap::new(p.offset + 0.5 * p.ratio - 0.5, p.ratio),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spans_three_to_two() {
        let spans = axis_spans(AxisMap::area(3, 2), 3, 2);
        assert_eq!(spans[0].indices(), 0..=1);
        assert_relative_eq!(spans[0].weight(0), 1.0);
        assert_relative_eq!(spans[0].weight(1), 0.5);
        // End edge lands exactly on 3.0: shrink to index 2 with full weight
        assert_eq!(spans[1].indices(), 1..=2);
        assert_relative_eq!(spans[1].weight(1), 0.5);
        assert_relative_eq!(spans[1].weight(2), 1.0);
    }

    #[test]
    fn test_spans_identity() {
        let spans = axis_spans(AxisMap::area(4, 4), 4, 4);
        for (i, span) in spans.iter().enumerate() {
            assert_eq!(span.indices(), i..=i);
            assert_relative_eq!(span.weight(i), 1.0);
        }
    }

    #[test]
    fn test_spans_even_halving() {
        let spans = axis_spans(AxisMap::area(4, 2), 4, 2);
        assert_eq!(spans[0].indices(), 0..=1);
        assert_eq!(spans[1].indices(), 2..=3);
        assert_relative_eq!(spans[1].weight(3), 1.0);
    }

    #[test]
    fn test_spans_shifted_half_cell() {
        let spans = axis_spans(AxisMap::new(0.5, 1.0), 4, 2);
        assert_eq!(spans[0].indices(), 0..=1);
        assert_relative_eq!(spans[0].weight(0), 0.5);
        assert_relative_eq!(spans[0].weight(1), 0.5);
    }

    #[test]
    fn test_linear_taps_clamp_at_edge() {
        let taps = linear_taps(AxisMap::corner_aligned(3, 5), 3, 5);
        assert_eq!(taps[0], (0, 1, 0.0));
        assert_eq!(taps[1], (0, 1, 0.5));
        assert_eq!(taps[4], (2, 2, 0.0));
    }

    #[test]
    fn test_corner_aligned_single_cell() {
        let map = AxisMap::corner_aligned(1, 4);
        assert_relative_eq!(map.scale, 0.0);
        assert_eq!(nearest_indices(AxisMap::area(1, 4), 1, 4), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_direction() {
        assert_eq!(AxisLayout::full_extent(4, 2).direction(), Ordering::Less);
        assert_eq!(AxisLayout::full_extent(2, 4).direction(), Ordering::Greater);
        assert_eq!(AxisLayout::identity(3).direction(), Ordering::Equal);

        let shifted = AxisLayout::placed(4, 2, AxisPlacement { offset: 0.5, ratio: 1.0 });
        assert_eq!(shifted.direction(), Ordering::Less);
    }
}
