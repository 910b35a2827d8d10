//! Gap detection and the NaN-coded working representation

use gapgrid_core::raster::{Raster, RasterElement};
use gapgrid_core::Result;
use ndarray::{Array2, Zip};

/// Number of gap cells: non-finite values, plus masked cells when a mask is attached
pub fn count_gaps<T: RasterElement>(raster: &Raster<T>) -> usize {
    raster.count_gaps()
}

/// Boolean grid with `true` at every gap cell
pub fn gap_mask<T: RasterElement>(raster: &Raster<T>) -> Array2<bool> {
    let mut gaps = raster.data().mapv(|v| !v.is_valid());
    if let Some(mask) = raster.mask() {
        Zip::from(&mut gaps).and(mask).for_each(|g, m| *g = *g || *m);
    }
    gaps
}

/// Copy of `raster` without a mask where every gap holds `NaN`.
///
/// Declared nodata values are not gaps unless masked; call
/// `Raster::mask_nodata` first to treat them as gaps.
pub(crate) fn gaps_as_nan(raster: &Raster<f64>) -> Raster<f64> {
    let gaps = gap_mask(raster);
    let mut out = raster.clone();
    out.take_mask();
    Zip::from(out.data_mut()).and(&gaps).for_each(|v, g| {
        if *g {
            *v = f64::NAN;
        }
    });
    out
}

/// Restore the input's mask convention on a NaN-coded result
pub(crate) fn restore_mask(input: &Raster<f64>, mut filled: Raster<f64>) -> Result<Raster<f64>> {
    if input.has_mask() {
        let mask = filled.data().mapv(|v| !v.is_finite());
        filled.set_mask(Some(mask))?;
    }
    Ok(filled)
}

/// Nothing to propagate: no gaps, or no valid cell to propagate from
pub(crate) fn is_settled(raster: &Raster<f64>) -> bool {
    let gaps = raster.count_gaps();
    gaps == 0 || gaps == raster.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_count_gaps() {
        let src = Raster::from_array(array![[1.0, f64::NAN], [f64::INFINITY, 4.0]]);
        assert_eq!(count_gaps(&src), 2);

        let masked = src.with_mask(array![[true, true], [false, false]]).unwrap();
        assert_eq!(count_gaps(&masked), 3);
    }

    #[test]
    fn test_integer_gaps_only_from_mask() {
        let src = Raster::from_array(array![[1i16, 2], [3, 4]]);
        assert_eq!(count_gaps(&src), 0);
        let masked = src.with_mask(array![[false, true], [false, false]]).unwrap();
        assert_eq!(gap_mask(&masked), array![[false, true], [false, false]]);
    }

    #[test]
    fn test_gaps_as_nan() {
        let src = Raster::from_array(array![[1.0, f64::NEG_INFINITY], [3.0, 4.0]])
            .with_mask(array![[false, false], [true, false]])
            .unwrap();
        let nan = gaps_as_nan(&src);
        assert!(!nan.has_mask());
        assert!(nan.get(0, 1).unwrap().is_nan());
        assert!(nan.get(1, 0).unwrap().is_nan());
        assert_eq!(nan.get(1, 1).unwrap(), 4.0);
    }

    #[test]
    fn test_restore_mask_only_when_input_masked() {
        let plain = Raster::from_array(array![[f64::NAN, 1.0]]);
        let out = restore_mask(&plain, plain.clone()).unwrap();
        assert!(!out.has_mask());

        let masked = plain.clone().with_mask(array![[true, true]]).unwrap();
        let out = restore_mask(&masked, plain).unwrap();
        assert_eq!(out.mask().unwrap(), &array![[true, false]]);
    }

    #[test]
    fn test_is_settled() {
        assert!(is_settled(&Raster::from_array(array![[1.0, 2.0]])));
        assert!(is_settled(&Raster::from_array(array![[f64::NAN, f64::NAN]])));
        assert!(!is_settled(&Raster::from_array(array![[f64::NAN, 2.0]])));
    }
}
