//! Raster grids, multi-band frames and frame series

pub mod frame;
mod geotransform;
mod grid;
mod series;

pub use frame::{Band, Property, RasterFrame, MONTH, N_DAYS, YEAR, YEAR_MONTH};
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use series::RasterSeries;
