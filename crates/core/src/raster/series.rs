//! Ordered collections of frames

use crate::error::{Error, Result};
use crate::raster::frame::{Property, RasterFrame};
use chrono::NaiveDateTime;
use std::collections::HashSet;

/// An ordered sequence of frames sharing one band schema.
///
/// Raw input series are ordered by acquisition time; monthly series are
/// ordered by calendar key and carry at most one frame per `yearMonth`.
#[derive(Debug, Clone, Default)]
pub struct RasterSeries {
    frames: Vec<RasterFrame>,
}

impl RasterSeries {
    pub fn new(frames: Vec<RasterFrame>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[RasterFrame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<RasterFrame> {
        self.frames
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RasterFrame> {
        self.frames.iter()
    }

    pub fn first(&self) -> Option<&RasterFrame> {
        self.frames.first()
    }

    pub fn push(&mut self, frame: RasterFrame) {
        self.frames.push(frame);
    }

    /// Band names of the first frame
    pub fn band_names(&self) -> Vec<&str> {
        self.frames.first().map(|f| f.band_names()).unwrap_or_default()
    }

    /// Sort by acquisition timestamp; frames without one go first
    pub fn sort_by_time(&mut self) {
        self.frames.sort_by_key(|f| f.timestamp());
    }

    /// Frames stamped within `[start, end)`
    pub fn filter_date(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> impl Iterator<Item = &RasterFrame> {
        self.frames
            .iter()
            .filter(move |f| f.timestamp().is_some_and(|t| t >= start && t < end))
    }

    /// Frames whose property `key` equals `value`
    pub fn filter_property<'a>(
        &'a self,
        key: &'a str,
        value: &'a Property,
    ) -> impl Iterator<Item = &'a RasterFrame> {
        self.frames
            .iter()
            .filter(move |f| f.property(key) == Some(value))
    }

    pub fn map<F>(&self, f: F) -> RasterSeries
    where
        F: FnMut(&RasterFrame) -> RasterFrame,
    {
        RasterSeries::new(self.frames.iter().map(f).collect())
    }

    pub fn try_map<F>(&self, f: F) -> Result<RasterSeries>
    where
        F: FnMut(&RasterFrame) -> Result<RasterFrame>,
    {
        self.frames
            .iter()
            .map(f)
            .collect::<Result<Vec<_>>>()
            .map(RasterSeries::new)
    }

    pub fn select(&self, names: &[&str]) -> Result<RasterSeries> {
        self.try_map(|f| f.select(names))
    }

    /// `yearMonth` keys in series order (untagged frames are skipped)
    pub fn keys(&self) -> Vec<&str> {
        self.frames.iter().filter_map(|f| f.year_month()).collect()
    }

    /// Frame tagged with `year_month`
    pub fn find(&self, year_month: &str) -> Option<&RasterFrame> {
        self.frames
            .iter()
            .find(|f| f.year_month() == Some(year_month))
    }

    /// Fail unless every frame is tagged and no `yearMonth` repeats
    pub fn ensure_unique_keys(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.frames.len());
        for frame in &self.frames {
            let key = frame.calendar_key()?.to_string();
            if !seen.insert(key.clone()) {
                return Err(Error::DuplicateKey(key));
            }
        }
        Ok(())
    }
}

impl FromIterator<RasterFrame> for RasterSeries {
    fn from_iter<I: IntoIterator<Item = RasterFrame>>(iter: I) -> Self {
        RasterSeries::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RasterSeries {
    type Item = &'a RasterFrame;
    type IntoIter = std::slice::Iter<'a, RasterFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
