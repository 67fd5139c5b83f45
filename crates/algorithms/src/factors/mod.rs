//! RWEQ factor calculators
//!
//! Per-pixel transforms from aggregated monthly rasters to the physical
//! factors of the model:
//!
//! - `slrc`: canopy-cover soil-loss ratio from the monthly vegetation index
//! - `excThr` / `sumWindFactor`: erosive wind hours and their weighted sum
//! - `sw`: soil wetness from evapotranspiration, rain and rainy days
//! - `sd`: snow-cover factor
//! - `wf`: weather factor combining the above with air density
//!
//! Undefined inputs give undefined outputs, and so do domain errors such as
//! a zero denominator. Nothing here panics on data.

mod snow;
mod vegetation;
mod weather;
mod wetness;
mod wind;

pub use snow::{monthly_snow, snow_indicator, SD, SNOW_DEPTH};
pub use vegetation::{monthly_ndvi, slrc, slrc_value, NDVI, SLRC};
pub use weather::{weather_factor, weather_factor_value, WF};
pub use wetness::{
    convert_et_r, monthly_wetness_inputs, rain_day, soil_wetness, soil_wetness_value, ET,
    EVAP_FLUX, R, RAIN_DAYS, RAIN_FLUX, SW,
};
pub use wind::{
    monthly_wind, wind_factor_value, wind_indicators, EXC_THR, HOURLY_EXCEED, HOURLY_FACTOR,
    SUM_WIND_FACTOR, WIND,
};
