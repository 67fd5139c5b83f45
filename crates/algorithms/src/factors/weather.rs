//! Weather factor
//!
//! ```text
//! wf = sw · sd · (sumWindFactor · excThr · ρ) / (nDays · g)
//! ```

use super::snow::SD;
use super::wetness::SW;
use super::wind::{EXC_THR, SUM_WIND_FACTOR};
use crate::imagery::band_math_n;
use crate::statics::AIR_DENSITY;
use rweq_core::raster::RasterFrame;
use rweq_core::Result;

pub const WF: &str = "wf";

pub fn weather_factor_value(
    sw: f64,
    sd: f64,
    sum_wind_factor: f64,
    exc_thr: f64,
    air_density: f64,
    n_days: f64,
    gravity: f64,
) -> f64 {
    let denominator = n_days * gravity;
    if denominator == 0.0 {
        return f64::NAN;
    }
    sw * sd * (sum_wind_factor * exc_thr * air_density) / denominator
}

/// Frame with the `wf` band.
///
/// `frame` must hold `sw`, `sd`, `sumWindFactor`, `excThr` and the
/// broadcast `airDensity` band, and carry `nDays`.
pub fn weather_factor(frame: &RasterFrame, gravity: f64) -> Result<RasterFrame> {
    let n_days = frame.n_days()?;
    let inputs = [
        frame.require_band(SW)?,
        frame.require_band(SD)?,
        frame.require_band(SUM_WIND_FACTOR)?,
        frame.require_band(EXC_THR)?,
        frame.require_band(AIR_DENSITY)?,
    ];
    let wf = band_math_n(&inputs, |v| {
        weather_factor_value(v[0], v[1], v[2], v[3], v[4], n_days, gravity)
    })?;
    Ok(RasterFrame::from_band(WF, wf).copy_properties_from(frame))
}
