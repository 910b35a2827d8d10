//! Main Raster type

use crate::error::{Error, Result};
use crate::raster::{GridGeometry, RasterElement};
use ndarray::{Array2, ArrayView2, ArrayViewMut2};

/// A 2D raster grid with optional validity mask.
///
/// `Raster<T>` stores values of type `T` in a row-major grid together with
/// its [`GridGeometry`], an optional declared invalid sentinel (`nodata`)
/// and an optional validity mask of the same shape.
///
/// A cell is a *gap* when its value is not valid on its own (non-finite for
/// floats) or when the mask marks it invalid (`true`).
///
/// # Example
///
/// ```
/// use gapgrid_core::Raster;
///
/// let mut raster: Raster<f64> = Raster::new(3, 4);
/// raster.set(1, 2, f64::NAN).unwrap();
/// assert_eq!(raster.count_gaps(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// Grid-to-map geometry
    geometry: GridGeometry,
    /// Declared invalid sentinel
    nodata: Option<T>,
    /// Validity mask, `true` marks an invalid cell
    mask: Option<Array2<bool>>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from existing row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data).map_err(|_| Error::InvalidDimensions {
            width: cols,
            height: rows,
        })?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            geometry: GridGeometry::default(),
            nodata: None,
            mask: None,
        }
    }

    /// Create a raster with the same geometry and nodata but a different shape.
    ///
    /// The new raster is filled with zeros and has no mask.
    pub fn with_same_meta(&self, rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            geometry: self.geometry,
            nodata: self.nodata,
            mask: None,
        }
    }

    /// Create a raster with the same dimensions and metadata, filled with a value
    pub fn like(&self, fill_value: T) -> Self {
        Self {
            data: Array2::from_elem(self.data.dim(), fill_value),
            geometry: self.geometry,
            nodata: self.nodata,
            mask: None,
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Grid width (number of columns)
    pub fn width(&self) -> usize {
        self.cols()
    }

    /// Grid height (number of rows)
    pub fn height(&self) -> usize {
        self.rows()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the raster is a single cell
    pub fn is_singular(&self) -> bool {
        self.shape() == (1, 1)
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    /// Get a mutable view of the underlying data
    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, T> {
        self.data.view_mut()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Consume the raster and return the underlying array
    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    // Metadata

    /// Get the grid geometry
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Set the grid geometry
    pub fn set_geometry(&mut self, geometry: GridGeometry) {
        self.geometry = geometry;
    }

    /// Builder-style variant of [`Raster::set_geometry`]
    pub fn with_geometry(mut self, geometry: GridGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Get the declared no-data sentinel
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the declared no-data sentinel
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.geometry.bounds(self.cols(), self.rows())
    }

    // Validity mask

    /// Get the validity mask, if any (`true` marks an invalid cell)
    pub fn mask(&self) -> Option<&Array2<bool>> {
        self.mask.as_ref()
    }

    /// Whether a validity mask is attached
    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    /// Attach or remove the validity mask
    ///
    /// The mask must have exactly the raster's shape.
    pub fn set_mask(&mut self, mask: Option<Array2<bool>>) -> Result<()> {
        if let Some(m) = &mask {
            let (er, ec) = self.shape();
            let (ar, ac) = m.dim();
            if (er, ec) != (ar, ac) {
                return Err(Error::SizeMismatch { er, ec, ar, ac });
            }
        }
        self.mask = mask;
        Ok(())
    }

    /// Builder-style variant of [`Raster::set_mask`]
    pub fn with_mask(mut self, mask: Array2<bool>) -> Result<Self> {
        self.set_mask(Some(mask))?;
        Ok(self)
    }

    /// Detach and return the validity mask
    pub fn take_mask(&mut self) -> Option<Array2<bool>> {
        self.mask.take()
    }

    /// Build a validity mask from the declared no-data sentinel.
    ///
    /// Cells equal to `nodata` (or NaN for floats) become masked. Existing
    /// mask entries stay masked. Does nothing when no sentinel is declared.
    pub fn mask_nodata(&mut self) {
        let Some(nodata) = self.nodata else {
            return;
        };
        let mut mask = self
            .mask
            .take()
            .unwrap_or_else(|| Array2::from_elem(self.data.dim(), false));
        ndarray::Zip::from(&mut mask)
            .and(&self.data)
            .for_each(|m, v| *m = *m || v.is_nodata(Some(nodata)));
        self.mask = Some(mask);
    }

    // Gap queries

    /// Whether the cell at (row, col) holds a usable sample
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    #[inline]
    pub unsafe fn is_valid_unchecked(&self, row: usize, col: usize) -> bool {
        let value = unsafe { self.get_unchecked(row, col) };
        value.is_valid()
            && match &self.mask {
                Some(mask) => !unsafe { *mask.uget((row, col)) },
                None => true,
            }
    }

    /// Whether the cell at (row, col) is a gap
    pub fn is_gap_at(&self, row: usize, col: usize) -> Result<bool> {
        self.get(row, col)?;
        Ok(!unsafe { self.is_valid_unchecked(row, col) })
    }

    /// Number of gap cells (invalid values or masked cells)
    pub fn count_gaps(&self) -> usize {
        match &self.mask {
            Some(mask) => self
                .data
                .iter()
                .zip(mask.iter())
                .filter(|(v, m)| **m || !v.is_valid())
                .count(),
            None => self.data.iter().filter(|v| !v.is_valid()).count(),
        }
    }

    /// Whether the raster contains no gaps
    pub fn is_free_of_gaps(&self) -> bool {
        self.count_gaps() == 0
    }

    /// Whether every cell of the raster is a gap
    pub fn is_full_of_gaps(&self) -> bool {
        self.count_gaps() == self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f32> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
        assert_eq!((raster.width(), raster.height()), (200, 100));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f32> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert!(raster.get(10, 0).is_err());
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        let result = Raster::<f64>::from_vec(vec![1.0, 2.0, 3.0], 2, 2);
        assert!(matches!(result, Err(Error::InvalidDimensions { .. })));
    }

    #[test]
    fn test_count_gaps_nan_and_mask() {
        let raster = Raster::from_array(array![[1.0, f64::NAN], [f64::INFINITY, 4.0]]);
        assert_eq!(raster.count_gaps(), 2);
        assert!(raster.is_gap_at(0, 1).unwrap());
        assert!(!raster.is_gap_at(1, 1).unwrap());

        let masked = raster.with_mask(array![[true, false], [false, false]]).unwrap();
        assert_eq!(masked.count_gaps(), 3);
        assert!(masked.is_gap_at(0, 0).unwrap());
    }

    #[test]
    fn test_mask_shape_checked() {
        let mut raster: Raster<f64> = Raster::new(2, 3);
        let result = raster.set_mask(Some(Array2::from_elem((3, 2), false)));
        assert!(matches!(result, Err(Error::SizeMismatch { .. })));
        assert!(!raster.has_mask());
    }

    #[test]
    fn test_mask_nodata_for_integers() {
        let mut raster = Raster::from_array(array![[1i32, -9999], [3, 4]]);
        raster.set_nodata(Some(-9999));
        assert_eq!(raster.count_gaps(), 0);
        raster.mask_nodata();
        assert_eq!(raster.count_gaps(), 1);
        assert!(raster.is_gap_at(0, 1).unwrap());
    }

    #[test]
    fn test_full_and_free_of_gaps() {
        let full = Raster::filled(2, 2, f64::NAN);
        assert!(full.is_full_of_gaps());
        assert!(!full.is_free_of_gaps());

        let free: Raster<f64> = Raster::filled(1, 1, 3.0);
        assert!(free.is_free_of_gaps());
        assert!(free.is_singular());
    }
}
