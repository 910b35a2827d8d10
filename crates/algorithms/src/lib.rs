//! # gapgrid Algorithms
//!
//! Resampling and gap filling for gapgrid rasters.
//!
//! ## Modules
//!
//! - **resample**: Upsampling, area-weighted downsampling, combined
//!   resampling, geometry-aware variants and map-rectangle cutting
//! - **gapfill**: Gap detection, local neighborhood averaging and
//!   multiscale pyramid filling

pub mod gapfill;
pub(crate) mod maybe_rayon;
pub mod resample;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::gapfill::{
        count_gaps, fill_gaps, fill_gaps_local, fill_gaps_multiscale, gap_mask, FillGaps, GapFillParams,
        GapFillResult, GapFillStrategy,
    };
    pub use crate::resample::{
        cut, downsample, downsample_into, downsample_with_geometry, resample, resample_into, resample_with_geometry,
        upsample, upsample_into, upsample_with_geometry, DownsampleMethod, DownsampleParams, MapRect, Resample,
        ResampleParams, UpsampleMethod, UpsampleParams,
    };
    pub use gapgrid_core::prelude::*;
}
