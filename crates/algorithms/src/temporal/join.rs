//! Temporal joins
//!
//! Two distinct ways of bringing layers together:
//!
//! - [`inner_join`] pairs monthly frames of two series on their `yearMonth`
//!   key. Months missing from either side are dropped.
//! - [`broadcast_join`] appends time-invariant bands to every frame of a
//!   series, with no key matching at all.

use rweq_core::raster::{RasterFrame, RasterSeries};
use rweq_core::Result;
use std::collections::HashMap;
use tracing::{debug, info};

/// Concatenate the bands of `primary` and `secondary` into one frame.
///
/// Bands keep their order (primary first). A secondary band whose name the
/// primary already has is skipped. Properties of the primary win on key
/// collisions.
pub fn merge_bands(primary: &RasterFrame, secondary: &RasterFrame) -> RasterFrame {
    let mut out = RasterFrame::new()
        .copy_properties_from(secondary)
        .copy_properties_from(primary);
    for band in primary.bands() {
        out = out.with_band(band.name.clone(), band.raster.clone());
    }
    for band in secondary.bands() {
        if !primary.has_band(&band.name) {
            out = out.with_band(band.name.clone(), band.raster.clone());
        }
    }
    match primary.timestamp() {
        Some(t) => out.with_timestamp(t),
        None => out,
    }
}

/// Inner join of two monthly series on `yearMonth`.
///
/// Each operand may hold at most one frame per key. The result follows the
/// primary's order and contains only keys present in both.
pub fn inner_join(primary: &RasterSeries, secondary: &RasterSeries) -> Result<RasterSeries> {
    primary.ensure_unique_keys()?;
    secondary.ensure_unique_keys()?;

    let lookup: HashMap<&str, &RasterFrame> = secondary
        .iter()
        .filter_map(|f| f.year_month().map(|k| (k, f)))
        .collect();

    let mut joined = RasterSeries::default();
    for frame in primary {
        let key = frame.year_month().unwrap_or_default();
        match lookup.get(key) {
            Some(other) => joined.push(merge_bands(frame, other)),
            None => debug!("Join drops {}: missing from secondary", key),
        }
    }

    for key in secondary.keys() {
        if primary.find(key).is_none() {
            debug!("Join drops {}: missing from primary", key);
        }
    }

    info!(
        "Joined {} x {} frames into {}",
        primary.len(),
        secondary.len(),
        joined.len()
    );
    Ok(joined)
}

/// Append every band of `statics` to every frame of `series`
pub fn broadcast_join(series: &RasterSeries, statics: &RasterFrame) -> Result<RasterSeries> {
    series.try_map(|frame| {
        if let (Some(a), Some(b)) = (frame.bands().first(), statics.bands().first()) {
            a.raster.check_same_shape(&b.raster)?;
        }
        let mut out = frame.clone();
        for band in statics.bands() {
            out = out.with_band(band.name.clone(), band.raster.clone());
        }
        Ok(out)
    })
}

/// Left-fold [`inner_join`] over several series
pub fn join_all(first: &RasterSeries, rest: &[&RasterSeries]) -> Result<RasterSeries> {
    rest.iter()
        .try_fold(first.clone(), |acc, next| inner_join(&acc, next))
}
