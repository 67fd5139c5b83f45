//! Imagery algorithms
//!
//! - Band math: cell-wise raster algebra over co-registered bands
//! - Quality screening of vegetation index composites

mod band_math;
mod quality;

pub use band_math::{band_math, band_math_n};
pub use quality::{extract_bits, filter_quality, passes_quality, QualityParams};
