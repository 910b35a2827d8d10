//! Gap filling
//!
//! Reconstruct gap cells (non-finite or masked) from valid neighbors:
//! - Local: repeated 3x3 neighborhood averaging until nothing changes
//! - Multiscale: one averaging pass per level of a halving pyramid, with
//!   coarse levels patching what the finer ones could not reach
//!
//! Gap filling works on `f64` rasters. Masked cells are treated as gaps and
//! come back as `NaN`; when the input carries a mask, the output mask marks
//! exactly the gaps that remain.

mod detect;
mod local;
mod multiscale;

pub use detect::{count_gaps, gap_mask};
pub use local::fill_gaps_local;
pub use multiscale::fill_gaps_multiscale;

use std::fmt;
use std::str::FromStr;

use gapgrid_core::raster::Raster;
use gapgrid_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters for gap filling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapFillParams {
    /// Minimum number of valid cells in the 3x3 window required to fill a gap (at least 1)
    pub min_valid_neighbors: usize,
}

impl Default for GapFillParams {
    fn default() -> Self {
        Self { min_valid_neighbors: 1 }
    }
}

impl GapFillParams {
    pub fn new(min_valid_neighbors: usize) -> Self {
        Self { min_valid_neighbors }
    }

    /// Values above 8 are accepted; local averaging then never fills a gap
    pub fn validate(&self) -> Result<()> {
        if self.min_valid_neighbors == 0 {
            return Err(Error::InvalidParameter {
                name: "min_valid_neighbors",
                value: self.min_valid_neighbors.to_string(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Gap filling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapFillStrategy {
    /// Neighborhood averaging iterated to a fixpoint
    Local,
    /// Neighborhood averaging combined with a halving pyramid
    #[default]
    Multiscale,
}

impl fmt::Display for GapFillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapFillStrategy::Local => write!(f, "local"),
            GapFillStrategy::Multiscale => write!(f, "multiscale"),
        }
    }
}

impl FromStr for GapFillStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(GapFillStrategy::Local),
            "multiscale" => Ok(GapFillStrategy::Multiscale),
            _ => Err(Error::InvalidMethod {
                family: "gap filling",
                name: s.to_string(),
            }),
        }
    }
}

/// Gap-filled raster and the number of gaps that were filled
#[derive(Debug, Clone, PartialEq)]
pub struct GapFillResult {
    pub raster: Raster<f64>,
    pub gaps_filled: usize,
}

/// Fill gaps with the given strategy.
///
/// `gaps_filled` always equals the input gap count minus the output gap count.
pub fn fill_gaps(raster: &Raster<f64>, strategy: GapFillStrategy, params: GapFillParams) -> Result<GapFillResult> {
    match strategy {
        GapFillStrategy::Local => {
            let initial = count_gaps(raster);
            let raster = fill_gaps_local(raster, params)?;
            let gaps_filled = initial - count_gaps(&raster);
            Ok(GapFillResult { raster, gaps_filled })
        }
        GapFillStrategy::Multiscale => {
            let (raster, gaps_filled) = fill_gaps_multiscale(raster, params)?;
            Ok(GapFillResult { raster, gaps_filled })
        }
    }
}

/// Gap filling algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillGaps {
    pub strategy: GapFillStrategy,
}

impl Algorithm for FillGaps {
    type Input = Raster<f64>;
    type Output = GapFillResult;
    type Params = GapFillParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "FillGaps"
    }

    fn description(&self) -> &'static str {
        "Fill gap cells from the average of valid neighbors, optionally across a resolution pyramid"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        fill_gaps(&input, self.strategy, params)
    }
}
