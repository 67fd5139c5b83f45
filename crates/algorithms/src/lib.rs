//! # RWEQ Algorithms
//!
//! Monthly Revised Wind Erosion Equation model over raster time series.
//!
//! ## Modules
//!
//! - **imagery**: band math, vegetation index quality screening
//! - **temporal**: calendar aggregation, keyed and broadcast joins
//! - **factors**: slrc, wind, soil wetness, snow cover, weather factor
//! - **statics**: time-invariant soil and air-density layers
//! - **erosion**: erosion product, critical field length, transport capacity, SWEP
//! - **pipeline**: all stages wired over a configured month range

pub mod config;
pub mod erosion;
pub mod factors;
pub mod imagery;
mod maybe_rayon;
pub mod pipeline;
pub mod statics;
pub mod temporal;

pub use config::{ExportConfig, PhysicalConstants, RweqConfig};
pub use pipeline::{run, RweqInputs, RweqOutputs};
pub use statics::StaticLayers;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{ExportConfig, PhysicalConstants, RweqConfig};
    pub use crate::erosion::{erosion_product, soil_loss, ErosionValues};
    pub use crate::factors::{
        monthly_ndvi, monthly_snow, monthly_wetness_inputs, monthly_wind, slrc, soil_wetness,
        weather_factor,
    };
    pub use crate::imagery::{band_math, band_math_n, filter_quality, QualityParams};
    pub use crate::pipeline::{run, RweqInputs, RweqOutputs};
    pub use crate::statics::StaticLayers;
    pub use crate::temporal::{aggregate, broadcast_join, inner_join, MonthlyAggregator, Reducer};
    pub use rweq_core::prelude::*;
}
