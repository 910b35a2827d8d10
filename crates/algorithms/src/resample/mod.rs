//! Grid resampling
//!
//! Change the resolution of a raster:
//! - Upsampling: nearest neighbor or bilinear interpolation
//! - Downsampling: area-weighted aggregation (first, last, mean, mode, variance)
//! - Resample: per-axis composition of both
//! - Geometry-aware variants and map-rectangle cutting for georeferenced grids

mod axis;
mod dispatch;
mod downsample;
mod georef;
mod upsample;

pub use dispatch::{resample, resample_into, Resample};
pub use downsample::{downsample, downsample_into};
pub use georef::{cut, downsample_with_geometry, resample_with_geometry, upsample_with_geometry, MapRect};
pub use upsample::{upsample, upsample_into};

use std::fmt;
use std::str::FromStr;

use gapgrid_core::raster::{Raster, RasterElement};
use gapgrid_core::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Interpolation method for upsampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsampleMethod {
    /// Take the nearest source cell, even if it is a gap
    Nearest,
    /// Bilinear interpolation between the 4 surrounding source cells
    #[default]
    Linear,
}

/// Aggregation method for downsampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownsampleMethod {
    /// First valid contributing cell in row-major order
    First,
    /// Last valid contributing cell in row-major order
    Last,
    /// Average of valid contributing cells weighted by overlap area
    #[default]
    Mean,
    /// Value with the `rank`-th highest total overlap weight (1 = most frequent)
    Mode { rank: usize },
    /// Biased weighted variance of valid contributing cells
    Variance,
}

impl DownsampleMethod {
    /// The most frequent value
    pub fn mode() -> Self {
        DownsampleMethod::Mode { rank: 1 }
    }

    /// Reject a mode rank below 1
    pub fn validate(&self) -> Result<()> {
        if let DownsampleMethod::Mode { rank } = *self
            && rank < 1
        {
            return Err(Error::InvalidParameter {
                name: "mode_rank",
                value: rank.to_string(),
                reason: "must be >= 1".into(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for UpsampleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsampleMethod::Nearest => write!(f, "nearest"),
            UpsampleMethod::Linear => write!(f, "linear"),
        }
    }
}

impl FromStr for UpsampleMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(UpsampleMethod::Nearest),
            "linear" | "bilinear" => Ok(UpsampleMethod::Linear),
            _ => Err(Error::InvalidMethod {
                family: "upsampling",
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DownsampleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownsampleMethod::First => write!(f, "first"),
            DownsampleMethod::Last => write!(f, "last"),
            DownsampleMethod::Mean => write!(f, "mean"),
            DownsampleMethod::Mode { rank: 1 } => write!(f, "mode"),
            DownsampleMethod::Mode { rank } => write!(f, "mode:{rank}"),
            DownsampleMethod::Variance => write!(f, "variance"),
        }
    }
}

/// Parses `first`, `last`, `mean`, `mode`, `mode:<rank>`, `variance` (or `var`)
impl FromStr for DownsampleMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        let invalid = || Error::InvalidMethod {
            family: "downsampling",
            name: s.to_string(),
        };
        let method = match name.as_str() {
            "first" => DownsampleMethod::First,
            "last" => DownsampleMethod::Last,
            "mean" => DownsampleMethod::Mean,
            "mode" => DownsampleMethod::mode(),
            "variance" | "var" => DownsampleMethod::Variance,
            other => {
                let rank = other
                    .strip_prefix("mode:")
                    .ok_or_else(invalid)?
                    .parse::<usize>()
                    .map_err(|_| invalid())?;
                DownsampleMethod::Mode { rank }
            }
        };
        method.validate()?;
        Ok(method)
    }
}

/// Parameters for upsampling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpsampleParams<T> {
    /// Interpolation method
    pub method: UpsampleMethod,
    /// Value for cells without a valid source; `None` uses the nodata fallback chain
    pub fill_value: Option<T>,
}

impl<T> Default for UpsampleParams<T> {
    fn default() -> Self {
        Self {
            method: UpsampleMethod::default(),
            fill_value: None,
        }
    }
}

/// Parameters for downsampling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DownsampleParams<T> {
    /// Aggregation method
    pub method: DownsampleMethod,
    /// Value for cells without a valid source; `None` uses the nodata fallback chain
    pub fill_value: Option<T>,
}

impl<T> Default for DownsampleParams<T> {
    fn default() -> Self {
        Self {
            method: DownsampleMethod::default(),
            fill_value: None,
        }
    }
}

/// Parameters for combined resampling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResampleParams<T> {
    /// Aggregation method for shrinking axes
    pub downsample: DownsampleMethod,
    /// Interpolation method for growing axes
    pub upsample: UpsampleMethod,
    /// Value for cells without a valid source; `None` uses the nodata fallback chain
    pub fill_value: Option<T>,
}

impl<T> Default for ResampleParams<T> {
    fn default() -> Self {
        Self {
            downsample: DownsampleMethod::default(),
            upsample: UpsampleMethod::default(),
            fill_value: None,
        }
    }
}

/// Fill value resolution: explicit > source nodata > output nodata > type default
pub(crate) fn resolve_fill_value<T: RasterElement>(explicit: Option<T>, src: &Raster<T>, out: &Raster<T>) -> T {
    explicit
        .or_else(|| src.nodata())
        .or_else(|| out.nodata())
        .unwrap_or_else(T::default_nodata)
}

/// Reject an output buffer whose shape differs from the requested one
pub(crate) fn check_out_shape<T: RasterElement>(out: &Raster<T>, width: usize, height: usize) -> Result<()> {
    let (ar, ac) = out.shape();
    if (ar, ac) != (height, width) {
        return Err(Error::SizeMismatch {
            er: height,
            ec: width,
            ar,
            ac,
        });
    }
    Ok(())
}

/// Reject empty sources and empty targets
pub(crate) fn check_non_empty<T: RasterElement>(src: &Raster<T>, width: usize, height: usize) -> Result<()> {
    if src.is_empty() {
        return Err(Error::InvalidDimensions {
            width: src.cols(),
            height: src.rows(),
        });
    }
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Write kernel results into `out`.
///
/// `None` cells had no valid contribution and receive `fill`. When `masked`
/// is set, the output carries a validity mask marking those cells and any
/// non-finite values, and declares `fill` as its nodata.
pub(crate) fn store_cells<T: RasterElement>(
    out: &mut Raster<T>,
    cells: Vec<Option<T>>,
    fill: T,
    masked: bool,
) -> Result<()> {
    let shape = out.shape();
    let mask = masked.then(|| cells.iter().map(|c| c.is_none_or(|v| !v.is_valid())).collect::<Vec<bool>>());
    let values: Vec<T> = cells.into_iter().map(|c| c.unwrap_or(fill)).collect();

    *out.data_mut() = Array2::from_shape_vec(shape, values).map_err(|_| Error::InvalidDimensions {
        width: shape.1,
        height: shape.0,
    })?;

    match mask {
        Some(mask) => {
            let mask = Array2::from_shape_vec(shape, mask).map_err(|_| Error::InvalidDimensions {
                width: shape.1,
                height: shape.0,
            })?;
            out.set_mask(Some(mask))?;
            out.set_nodata(Some(fill));
        }
        None => out.set_mask(None)?,
    }
    Ok(())
}
