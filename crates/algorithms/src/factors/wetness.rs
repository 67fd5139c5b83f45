//! Soil wetness factor
//!
//! Land-surface fluxes arrive as 3-hourly mean rates (kg m⁻² s⁻¹). Each
//! sample is converted to a depth over its interval, summed per day to
//! decide whether the day was rainy, and the daily frames are summed into
//! the month:
//!
//! ```text
//! sw = clamp((et - r * rd / nDays) / et, 0, 1)
//! ```

use crate::config::PhysicalConstants;
use crate::imagery::{band_math, band_math_n};
use crate::temporal::{MonthlyAggregator, Reducer};
use rweq_core::calendar::MonthWindow;
use rweq_core::raster::{RasterFrame, RasterSeries};
use rweq_core::Result;

/// Mean evapotranspiration rate of the raw collection
pub const EVAP_FLUX: &str = "Evap_tavg";
/// Mean rainfall rate of the raw collection
pub const RAIN_FLUX: &str = "Rainf_tavg";
pub const ET: &str = "et";
pub const R: &str = "r";
/// Rainy-day indicator, summed into a count of rainy days
pub const RAIN_DAYS: &str = "rd";
pub const SW: &str = "sw";

/// Convert flux rates of one sample into `et` and `r` depths
pub fn convert_et_r(frame: &RasterFrame, flux_seconds: f64) -> Result<RasterFrame> {
    let et = band_math(frame.require_band(EVAP_FLUX)?, |v| v * flux_seconds)?;
    let r = band_math(frame.require_band(RAIN_FLUX)?, |v| v * flux_seconds)?;
    Ok(RasterFrame::from_band(ET, et)
        .with_band(R, r)
        .copy_properties_from(frame))
}

/// Append the rainy-day indicator to a daily `et`/`r` frame
pub fn rain_day(day: &RasterFrame) -> Result<RasterFrame> {
    let rd = band_math(day.require_band(R)?, |r| if r == 0.0 { 0.0 } else { 1.0 })?;
    Ok(day.clone().with_band(RAIN_DAYS, rd))
}

/// Monthly `et`, `r` and rainy-day count from the 3-hourly collection
pub fn monthly_wetness_inputs(
    raw: &RasterSeries,
    windows: &[MonthWindow],
    constants: &PhysicalConstants,
) -> Result<RasterSeries> {
    let seconds = constants.flux_seconds;
    MonthlyAggregator::new(Reducer::Sum)
        .map_samples(move |frame| convert_et_r(frame, seconds))
        .daily_breakdown_with(rain_day)
        .aggregate(raw, windows)
}

/// Wetness of one pixel; zero evapotranspiration gives `NaN`
pub fn soil_wetness_value(et: f64, r: f64, rd: f64, n_days: f64) -> f64 {
    if et == 0.0 || n_days == 0.0 {
        return f64::NAN;
    }
    ((et - r * (rd / n_days)) / et).clamp(0.0, 1.0)
}

/// Frame with the `sw` band of a monthly `et`/`r`/`rd` frame
pub fn soil_wetness(frame: &RasterFrame) -> Result<RasterFrame> {
    let n_days = frame.n_days()?;
    let sw = band_math_n(
        &[
            frame.require_band(ET)?,
            frame.require_band(R)?,
            frame.require_band(RAIN_DAYS)?,
        ],
        |v| soil_wetness_value(v[0], v[1], v[2], n_days),
    )?;
    Ok(RasterFrame::from_band(SW, sw).copy_properties_from(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};
    use rweq_core::calendar::month_windows;
    use rweq_core::raster::N_DAYS;
    use rweq_core::Raster;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 4, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn sample(t: NaiveDateTime, evap: f64, rain: f64) -> RasterFrame {
        RasterFrame::from_band(EVAP_FLUX, Raster::filled(1, 1, evap))
            .with_band(RAIN_FLUX, Raster::filled(1, 1, rain))
            .with_timestamp(t)
    }

    #[test]
    fn test_wetness_is_clamped() {
        // (1 - 15 * 3/30) / 1 = -0.5
        assert_eq!(soil_wetness_value(1.0, 15.0, 3.0, 30.0), 0.0);
        assert_eq!(soil_wetness_value(1.0, 0.0, 0.0, 30.0), 1.0);
        assert_relative_eq!(soil_wetness_value(2.0, 10.0, 3.0, 30.0), 0.5);
        // negative et flips the sign of the ratio
        assert_eq!(soil_wetness_value(-1.0, 0.0, 0.0, 30.0), 1.0);
        assert_eq!(soil_wetness_value(-1.0, 30.0, 2.0, 30.0), 1.0);
    }

    #[test]
    fn test_zero_et_is_undefined() {
        assert!(soil_wetness_value(0.0, 1.0, 1.0, 30.0).is_nan());
    }

    #[test]
    fn test_soil_wetness_frame() {
        let frame = RasterFrame::from_band(ET, Raster::filled(1, 1, 2.0))
            .with_band(R, Raster::filled(1, 1, 10.0))
            .with_band(RAIN_DAYS, Raster::filled(1, 1, 3.0))
            .set_property(N_DAYS, 30.0);
        let out = soil_wetness(&frame).unwrap();
        assert_eq!(out.band_names(), vec![SW]);
        assert_relative_eq!(out.require_band(SW).unwrap().get(0, 0).unwrap(), 0.5);

        let untagged = RasterFrame::from_band(ET, Raster::filled(1, 1, 2.0));
        assert!(soil_wetness(&untagged).is_err());
    }

    #[test]
    fn test_rain_day_indicator() {
        let rain = Raster::from_vec(vec![0.0, 0.3, f64::NAN], 1, 3).unwrap();
        let day = RasterFrame::from_band(R, rain);
        let rd = rain_day(&day).unwrap();
        let rd = rd.require_band(RAIN_DAYS).unwrap();
        assert_eq!(rd.get(0, 0).unwrap(), 0.0);
        assert_eq!(rd.get(0, 1).unwrap(), 1.0);
        assert!(rd.get(0, 2).unwrap().is_nan());
    }

    #[test]
    fn test_monthly_inputs_count_rainy_days() {
        let raw = RasterSeries::new(vec![
            // two rainy samples on April 1st: one rainy day
            sample(at(1, 0), 1e-5, 1e-5),
            sample(at(1, 3), 1e-5, 2e-5),
            sample(at(2, 0), 1e-5, 0.0),
            sample(at(5, 21), 1e-5, 1e-5),
        ]);
        let windows = month_windows(
            NaiveDate::from_ymd_opt(2018, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2018, 5, 1).unwrap(),
        )
        .unwrap();

        let out = monthly_wetness_inputs(&raw, &windows, &PhysicalConstants::default()).unwrap();
        let april = &out.frames()[0];
        assert_eq!(april.band_names(), vec![ET, R, RAIN_DAYS]);
        assert_relative_eq!(
            april.require_band(ET).unwrap().get(0, 0).unwrap(),
            4.0 * 1e-5 * 10_800.0,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            april.require_band(R).unwrap().get(0, 0).unwrap(),
            4e-5 * 10_800.0,
            max_relative = 1e-9
        );
        assert_eq!(april.require_band(RAIN_DAYS).unwrap().get(0, 0).unwrap(), 2.0);
        assert_eq!(april.n_days().unwrap(), 30.0);
    }
}
