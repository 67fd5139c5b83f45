//! # RWEQ Core
//!
//! Data types and I/O shared by the RWEQ wind-erosion pipeline.
//!
//! This crate provides:
//! - `Raster`: georeferenced `f64` grid, `NaN` marks undefined cells
//! - `RasterFrame` / `RasterSeries`: named bands plus scalar properties, and
//!   ordered collections of them
//! - `CalendarKey` / `MonthWindow`: `"YYYY-MM"` keys and half-open monthly windows
//! - GeoTIFF reading and writing, the JSON scene catalog and batch export
//! - `StudyArea`: polygon clip of the area of interest

pub mod calendar;
pub mod clip;
pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use calendar::{CalendarKey, DayWindow, MonthWindow};
pub use clip::StudyArea;
pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{Band, GeoTransform, Property, Raster, RasterFrame, RasterSeries};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::calendar::{month_windows, CalendarKey, MonthWindow};
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Property, Raster, RasterFrame, RasterSeries};
}
