//! Vegetation index quality screening
//!
//! MOD13Q1-style composites carry a coarse `SummaryQA` band and a packed
//! `DetailedQA` bit field. A pixel survives only if the summary code is the
//! best one, the land/water sub-field (bits 11-13) says "land only", and the
//! index itself is non-negative. Failing pixels become `NaN` in every band;
//! the grid keeps its shape.

use ndarray::{Array2, Zip};
use rweq_core::raster::RasterFrame;
use rweq_core::Result;
use serde::{Deserialize, Serialize};

/// Band names and codes used by the quality screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityParams {
    pub index_band: String,
    pub summary_band: String,
    pub detailed_band: String,
    /// Summary code of the most reliable pixels; anything above fails
    pub best_summary_code: f64,
    /// Value of the land/water sub-field meaning "land only"
    pub land_code: u32,
    pub land_low_bit: u32,
    pub land_high_bit: u32,
}

impl Default for QualityParams {
    fn default() -> Self {
        Self {
            index_band: "NDVI".into(),
            summary_band: "SummaryQA".into(),
            detailed_band: "DetailedQA".into(),
            best_summary_code: 0.0,
            land_code: 1,
            land_low_bit: 11,
            land_high_bit: 13,
        }
    }
}

/// Extract bits `low_bit..=high_bit` of `value`, shifted down to bit 0.
///
/// An empty range (`low_bit > high_bit`) or one starting past bit 31 gives 0.
///
/// ```
/// use rweq_algorithms::imagery::extract_bits;
/// assert_eq!(extract_bits(0b0000_1000_0000_0000, 11, 13), 1);
/// assert_eq!(extract_bits(0b0011_1000_0000_0000, 11, 13), 7);
/// ```
pub fn extract_bits(value: u32, low_bit: u32, high_bit: u32) -> u32 {
    let Some(width) = high_bit.checked_sub(low_bit).map(|w| w.saturating_add(1)) else {
        return 0;
    };
    let mask = 1u32.checked_shl(width).map_or(u32::MAX, |bit| bit - 1);
    value.checked_shr(low_bit).map_or(0, |v| v & mask)
}

/// Whether one pixel passes all three quality conditions
pub fn passes_quality(summary: f64, detailed: f64, index: f64, params: &QualityParams) -> bool {
    if summary.is_nan() || detailed.is_nan() || index.is_nan() {
        return false;
    }
    // signed 16-bit QA sign-extends; bits below 16 are unchanged
    let bits = detailed as i64 as u32;
    summary <= params.best_summary_code
        && extract_bits(bits, params.land_low_bit, params.land_high_bit) == params.land_code
        && index >= 0.0
}

/// Mask every band of `frame` where the quality screen fails
pub fn filter_quality(frame: &RasterFrame, params: &QualityParams) -> Result<RasterFrame> {
    let summary = frame.require_band(&params.summary_band)?;
    let detailed = frame.require_band(&params.detailed_band)?;
    let index = frame.require_band(&params.index_band)?;
    summary.check_same_shape(detailed)?;
    summary.check_same_shape(index)?;

    let mut keep = Array2::from_elem(summary.shape(), false);
    Zip::from(&mut keep)
        .and(summary.data())
        .and(detailed.data())
        .and(index.data())
        .for_each(|k, &s, &d, &i| *k = passes_quality(s, d, i, params));

    let mut out = frame.clone();
    for band in frame.bands() {
        band.raster.check_same_shape(summary)?;
        out = out.with_band(band.name.clone(), band.raster.masked_where(&keep, |v| v));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rweq_core::Raster;

    const LAND: f64 = (1u32 << 11) as f64;

    fn qa_frame(summary: f64, detailed: f64, ndvi: f64) -> RasterFrame {
        RasterFrame::from_band("NDVI", Raster::filled(1, 1, ndvi))
            .with_band("DetailedQA", Raster::filled(1, 1, detailed))
            .with_band("SummaryQA", Raster::filled(1, 1, summary))
    }

    fn kept(frame: &RasterFrame) -> bool {
        let out = filter_quality(frame, &QualityParams::default()).unwrap();
        !out.require_band("NDVI").unwrap().get(0, 0).unwrap().is_nan()
    }

    #[test]
    fn test_extract_bits() {
        assert_eq!(extract_bits(0xFFFF, 0, 3), 0xF);
        assert_eq!(extract_bits(0b1010_0000, 5, 7), 0b101);
        assert_eq!(extract_bits(u32::MAX, 0, 31), u32::MAX);
    }

    #[test]
    fn test_extract_bits_out_of_range() {
        assert_eq!(extract_bits(0xFFFF, 13, 11), 0);
        assert_eq!(extract_bits(u32::MAX, 32, 40), 0);
        assert_eq!(extract_bits(0x8000_0000, 31, 40), 1);
    }

    #[test]
    fn test_good_pixel_is_retained() {
        // other QA bits set around the land field do not matter
        let detailed = LAND + 0b111 as f64 + (1u32 << 15) as f64;
        assert!(kept(&qa_frame(0.0, detailed, 0.35)));
        assert!(kept(&qa_frame(0.0, LAND, 0.0)));
    }

    #[test]
    fn test_each_condition_masks() {
        assert!(!kept(&qa_frame(1.0, LAND, 0.35)), "summary QA not best");
        assert!(!kept(&qa_frame(0.0, 0.0, 0.35)), "shoreline/water code");
        assert!(!kept(&qa_frame(0.0, 2.0 * LAND, 0.35)), "land field = 2");
        assert!(!kept(&qa_frame(0.0, LAND, -0.01)), "negative index");
        assert!(!kept(&qa_frame(f64::NAN, LAND, 0.35)), "undefined QA");
    }

    #[test]
    fn test_all_bands_masked_and_properties_kept() {
        let frame = qa_frame(3.0, LAND, 0.5).set_property("composite", 1i64);
        let out = filter_quality(&frame, &QualityParams::default()).unwrap();
        for band in out.bands() {
            assert!(band.raster.get(0, 0).unwrap().is_nan(), "{}", band.name);
        }
        assert!(out.property("composite").is_some());
    }

    #[test]
    fn test_missing_band_is_error() {
        let frame = RasterFrame::from_band("NDVI", Raster::filled(1, 1, 0.5));
        assert!(filter_quality(&frame, &QualityParams::default()).is_err());
    }
}
