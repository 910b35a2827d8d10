//! Raster data structures and operations

mod element;
mod geometry;
mod grid;
mod neighborhood;

pub use element::RasterElement;
pub use geometry::GridGeometry;
pub use grid::Raster;
pub use neighborhood::ClampedWindow;
