//! Canopy-cover soil-loss ratio (SLRc)

use crate::config::PhysicalConstants;
use crate::imagery::{band_math, filter_quality, QualityParams};
use crate::temporal::{MonthlyAggregator, Reducer};
use rweq_core::calendar::MonthWindow;
use rweq_core::raster::{RasterFrame, RasterSeries};
use rweq_core::Result;

/// Scaled monthly vegetation index band
pub const NDVI: &str = "ndvi";
pub const SLRC: &str = "slrc";

const SLRC_COEFF: f64 = -5.614;
const SLRC_EXP: f64 = 0.7366;

/// Monthly mean of the quality-screened, scaled vegetation index.
///
/// Every composite is screened first, so masked pixels never enter the
/// mean. Output frames carry a single `ndvi` band.
pub fn monthly_ndvi(
    raw: &RasterSeries,
    windows: &[MonthWindow],
    quality: &QualityParams,
    constants: &PhysicalConstants,
) -> Result<RasterSeries> {
    let quality = quality.clone();
    let scale = constants.ndvi_scale;

    MonthlyAggregator::new(Reducer::Mean)
        .map_samples(move |frame| {
            let screened = filter_quality(frame, &quality)?;
            let index = screened.require_band(&quality.index_band)?;
            Ok(RasterFrame::from_band(NDVI, band_math(index, |v| v * scale)?))
        })
        .aggregate(raw, windows)
}

/// `exp(-5.614 * ndvi^0.7366)`, undefined for negative `ndvi`
pub fn slrc_value(ndvi: f64) -> f64 {
    if ndvi < 0.0 {
        return f64::NAN;
    }
    (SLRC_COEFF * ndvi.powf(SLRC_EXP)).exp()
}

/// Frame with the `slrc` band of a monthly `ndvi` frame, properties kept
pub fn slrc(frame: &RasterFrame) -> Result<RasterFrame> {
    let ndvi = frame.require_band(NDVI)?;
    Ok(RasterFrame::from_band(SLRC, band_math(ndvi, slrc_value)?).copy_properties_from(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rweq_core::calendar::month_windows;
    use rweq_core::raster::YEAR_MONTH;
    use rweq_core::Raster;

    #[test]
    fn test_slrc_bounds_and_monotonic() {
        assert_eq!(slrc_value(0.0), 1.0);

        let mut previous = slrc_value(0.0);
        for i in 1..=80 {
            let v = slrc_value(i as f64 / 100.0);
            assert!(v > 0.0 && v <= 1.0);
            assert!(v < previous, "not decreasing at ndvi = {}", i as f64 / 100.0);
            previous = v;
        }
    }

    #[test]
    fn test_slrc_undefined_inputs() {
        assert!(slrc_value(-0.1).is_nan());
        assert!(slrc_value(f64::NAN).is_nan());
    }

    #[test]
    fn test_slrc_frame() {
        let frame = RasterFrame::from_band(NDVI, Raster::filled(2, 2, 0.5))
            .set_property(YEAR_MONTH, "2018-07");
        let out = slrc(&frame).unwrap();
        assert_eq!(out.band_names(), vec![SLRC]);
        assert_eq!(out.year_month(), Some("2018-07"));
        assert_relative_eq!(
            out.require_band(SLRC).unwrap().get(1, 1).unwrap(),
            (-5.614 * 0.5f64.powf(0.7366)).exp(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_monthly_ndvi_screens_and_scales() {
        let land = (1u32 << 11) as f64;
        let composite = |day: u32, ndvi: f64, summary: f64| {
            RasterFrame::from_band("NDVI", Raster::filled(1, 1, ndvi))
                .with_band("DetailedQA", Raster::filled(1, 1, land))
                .with_band("SummaryQA", Raster::filled(1, 1, summary))
                .with_timestamp(
                    NaiveDate::from_ymd_opt(2018, 6, day)
                        .unwrap()
                        .and_hms_opt(0, 0, 0)
                        .unwrap(),
                )
        };
        let raw = RasterSeries::new(vec![
            composite(2, 4000.0, 0.0),
            composite(18, 6000.0, 0.0),
            // cloudy composite, screened out
            composite(26, 9000.0, 2.0),
        ]);
        let windows = month_windows(
            NaiveDate::from_ymd_opt(2018, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2018, 7, 1).unwrap(),
        )
        .unwrap();

        let out = monthly_ndvi(
            &raw,
            &windows,
            &QualityParams::default(),
            &PhysicalConstants::default(),
        )
        .unwrap();
        let frame = &out.frames()[0];
        assert_eq!(frame.band_names(), vec![NDVI]);
        assert_relative_eq!(
            frame.require_band(NDVI).unwrap().get(0, 0).unwrap(),
            0.5,
            max_relative = 1e-12
        );
    }
}
