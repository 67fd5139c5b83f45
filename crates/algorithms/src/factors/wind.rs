//! Erosive wind hours
//!
//! An hour is erosive when the wind speed exceeds the threshold `u_t`
//! (5 m/s by default). Its contribution to the weather factor is
//! `(u - u_t)² · u`; calm hours contribute nothing.

use crate::config::PhysicalConstants;
use crate::imagery::band_math;
use crate::temporal::{MonthlyAggregator, Reducer};
use rweq_core::calendar::MonthWindow;
use rweq_core::raster::{RasterFrame, RasterSeries};
use rweq_core::Result;

/// Hourly wind speed band of the raw collection
pub const WIND: &str = "WIND";
pub const HOURLY_EXCEED: &str = "hourlyWindExceedThreshold";
pub const HOURLY_FACTOR: &str = "hourlyWindFactor";
/// Monthly count of erosive hours
pub const EXC_THR: &str = "excThr";
/// Monthly sum of `(u - u_t)² · u` over erosive hours
pub const SUM_WIND_FACTOR: &str = "sumWindFactor";

/// `(indicator, factor)` for one wind speed
pub fn wind_factor_value(wind: f64, threshold: f64) -> (f64, f64) {
    if wind.is_nan() {
        return (f64::NAN, f64::NAN);
    }
    let indicator = if wind > threshold { 1.0 } else { 0.0 };
    let excess = wind - threshold;
    (indicator, excess * excess * wind * indicator)
}

/// Hourly indicator and factor bands of one wind sample
pub fn wind_indicators(frame: &RasterFrame, threshold: f64) -> Result<RasterFrame> {
    let wind = frame.require_band(WIND)?;
    let indicator = band_math(wind, |u| wind_factor_value(u, threshold).0)?;
    let factor = band_math(wind, |u| wind_factor_value(u, threshold).1)?;

    let mut out = RasterFrame::from_band(HOURLY_EXCEED, indicator)
        .with_band(HOURLY_FACTOR, factor)
        .copy_properties_from(frame);
    if let Some(t) = frame.timestamp() {
        out = out.with_timestamp(t);
    }
    Ok(out)
}

/// Monthly `excThr` and `sumWindFactor` from hourly wind speed
pub fn monthly_wind(
    raw: &RasterSeries,
    windows: &[MonthWindow],
    constants: &PhysicalConstants,
) -> Result<RasterSeries> {
    let threshold = constants.wind_threshold;
    MonthlyAggregator::new(Reducer::Sum)
        .map_samples(move |frame| wind_indicators(frame, threshold))
        .aggregate(raw, windows)?
        .try_map(|frame| {
            frame
                .select(&[HOURLY_EXCEED, HOURLY_FACTOR])?
                .rename(&[EXC_THR, SUM_WIND_FACTOR])
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use rweq_core::calendar::month_windows;
    use rweq_core::Raster;

    #[test]
    fn test_calm_and_erosive_hours() {
        assert_eq!(wind_factor_value(3.0, 5.0), (0.0, 0.0));
        assert_eq!(wind_factor_value(5.0, 5.0), (0.0, 0.0));
        assert_eq!(wind_factor_value(7.0, 5.0), (1.0, 28.0));
        let (i, f) = wind_factor_value(f64::NAN, 5.0);
        assert!(i.is_nan() && f.is_nan());
    }

    #[test]
    fn test_wind_indicators_frame() {
        let frame = RasterFrame::from_band(WIND, Raster::from_vec(vec![4.0, 7.0], 1, 2).unwrap());
        let out = wind_indicators(&frame, 5.0).unwrap();
        assert_eq!(out.band_names(), vec![HOURLY_EXCEED, HOURLY_FACTOR]);
        let f = out.require_band(HOURLY_FACTOR).unwrap();
        assert_eq!(f.get(0, 0).unwrap(), 0.0);
        assert_eq!(f.get(0, 1).unwrap(), 28.0);
    }

    #[test]
    fn test_monthly_wind_sums_hours() {
        let start = NaiveDate::from_ymd_opt(2019, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        // 6, 7 and 4 m/s in the first three hours of January
        let raw: RasterSeries = [6.0, 7.0, 4.0]
            .iter()
            .enumerate()
            .map(|(h, &u)| {
                RasterFrame::from_band(WIND, Raster::filled(1, 1, u))
                    .with_timestamp(start + TimeDelta::hours(h as i64))
            })
            .collect();
        let windows = month_windows(start.date(), NaiveDate::from_ymd_opt(2019, 3, 1).unwrap())
            .unwrap();

        let out = monthly_wind(&raw, &windows, &PhysicalConstants::default()).unwrap();
        assert_eq!(out.len(), 2);

        let jan = out.find("2019-01").unwrap();
        assert_eq!(jan.band_names(), vec![EXC_THR, SUM_WIND_FACTOR]);
        assert_eq!(jan.require_band(EXC_THR).unwrap().get(0, 0).unwrap(), 2.0);
        assert_eq!(jan.require_band(SUM_WIND_FACTOR).unwrap().get(0, 0).unwrap(), 6.0 + 28.0);

        let feb = out.find("2019-02").unwrap();
        assert!(feb.require_band(EXC_THR).unwrap().get(0, 0).unwrap().is_nan());
    }
}
