//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Resampling accumulates weights and values in `f64`, so every element
/// must convert to `f64` and back. Integer elements round to the nearest
/// representable value on the way back.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Default invalid sentinel for this type (`NaN` for floats, `MIN` for integers)
    fn default_nodata() -> Self;

    /// Whether this value is a usable sample on its own, without a mask.
    ///
    /// Floats are valid when finite. Integers are always valid; use a
    /// validity mask to mark integer cells as gaps.
    fn is_valid(&self) -> bool;

    /// Check if this value equals the declared no-data sentinel
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Whether this type is a floating point type
    fn is_float() -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Convert an accumulated `f64` back to the element type.
    ///
    /// Returns `None` when the value cannot be represented.
    fn from_f64(value: f64) -> Option<Self>;
}

macro_rules! impl_raster_element_int {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::MIN
            }

            #[inline]
            fn is_valid(&self) -> bool {
                true
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                match nodata {
                    Some(nd) => *self == nd,
                    None => false,
                }
            }

            fn is_float() -> bool {
                false
            }

            #[inline]
            fn from_f64(value: f64) -> Option<Self> {
                NumCast::from(value.round())
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            #[inline]
            fn is_valid(&self) -> bool {
                self.is_finite()
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) => *self == nd,
                    None => false,
                }
            }

            fn is_float() -> bool {
                true
            }

            #[inline]
            fn from_f64(value: f64) -> Option<Self> {
                Some(value as $t)
            }
        }
    };
}

impl_raster_element_int!(i8);
impl_raster_element_int!(i16);
impl_raster_element_int!(i32);
impl_raster_element_int!(i64);
impl_raster_element_int!(u8);
impl_raster_element_int!(u16);
impl_raster_element_int!(u32);
impl_raster_element_int!(u64);
impl_raster_element_float!(f32);
impl_raster_element_float!(f64);
