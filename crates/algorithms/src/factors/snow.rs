//! Snow-cover factor

use crate::config::PhysicalConstants;
use crate::imagery::band_math;
use crate::temporal::{MonthlyAggregator, Reducer};
use rweq_core::calendar::MonthWindow;
use rweq_core::raster::{RasterFrame, RasterSeries};
use rweq_core::Result;

/// Instantaneous snow depth (m) of the raw collection
pub const SNOW_DEPTH: &str = "SnowDepth_inst";
pub const SD: &str = "sd";

/// `sd = 0` where the snow depth reaches `threshold`, `1` elsewhere
pub fn snow_indicator(frame: &RasterFrame, threshold: f64) -> Result<RasterFrame> {
    let depth = frame.require_band(SNOW_DEPTH)?;
    let sd = band_math(depth, |d| if d >= threshold { 0.0 } else { 1.0 })?;
    Ok(RasterFrame::from_band(SD, sd).copy_properties_from(frame))
}

/// Monthly mean of the snow indicator, i.e. the snow-free fraction
pub fn monthly_snow(
    raw: &RasterSeries,
    windows: &[MonthWindow],
    constants: &PhysicalConstants,
) -> Result<RasterSeries> {
    let threshold = constants.snow_threshold;
    MonthlyAggregator::new(Reducer::Mean)
        .map_samples(move |frame| snow_indicator(frame, threshold))
        .aggregate(raw, windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rweq_core::calendar::month_windows;
    use rweq_core::Raster;

    #[test]
    fn test_snow_indicator() {
        let frame = RasterFrame::from_band(
            SNOW_DEPTH,
            Raster::from_vec(vec![0.0, 0.0254, 0.3, f64::NAN], 2, 2).unwrap(),
        );
        let sd = snow_indicator(&frame, 0.0254).unwrap();
        let sd = sd.require_band(SD).unwrap();
        assert_eq!(sd.get(0, 0).unwrap(), 1.0);
        assert_eq!(sd.get(0, 1).unwrap(), 0.0);
        assert_eq!(sd.get(1, 0).unwrap(), 0.0);
        assert!(sd.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_monthly_snow_fraction() {
        let raw: RasterSeries = [0.1, 0.0, 0.0, 0.0]
            .iter()
            .enumerate()
            .map(|(i, &depth)| {
                RasterFrame::from_band(SNOW_DEPTH, Raster::filled(1, 1, depth)).with_timestamp(
                    NaiveDate::from_ymd_opt(2019, 12, 1 + i as u32)
                        .unwrap()
                        .and_hms_opt(0, 0, 0)
                        .unwrap(),
                )
            })
            .collect();
        let windows = month_windows(
            NaiveDate::from_ymd_opt(2019, 12, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        )
        .unwrap();

        let out = monthly_snow(&raw, &windows, &PhysicalConstants::default()).unwrap();
        assert_eq!(out.keys(), vec!["2019-12"]);
        assert_relative_eq!(out.frames()[0].require_band(SD).unwrap().get(0, 0).unwrap(), 0.75);
    }
}
