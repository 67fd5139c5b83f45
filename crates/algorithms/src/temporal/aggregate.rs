//! Calendar aggregation
//!
//! Collapses a raw time-stamped series into one frame per calendar month.
//! Each month is a half-open window `[monthStart, monthStart + 1 month)`;
//! the frames stamped inside it are reduced band by band, and the result is
//! tagged with `year`, `month`, `yearMonth` and `nDays`.
//!
//! With a daily breakdown, samples are first summed per day, an optional
//! per-day transform runs on each daily frame (e.g. the rain-day indicator,
//! which only makes sense at daily granularity), and the daily frames are
//! then reduced into the month.

use chrono::NaiveDate;
use ndarray::{Array2, Zip};
use rweq_core::calendar::{month_windows, MonthWindow};
use rweq_core::raster::{RasterFrame, RasterSeries};
use rweq_core::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-frame transform run before reduction
pub type FrameFn = dyn Fn(&RasterFrame) -> Result<RasterFrame> + Send + Sync;

/// Custom reduction over the frames of one window.
///
/// Receives the (already transformed) frames in the window, never an empty
/// slice; empty windows are handled by the aggregator.
pub type WindowFn = dyn Fn(&[RasterFrame]) -> Result<RasterFrame> + Send + Sync;

/// How the frames of one window collapse into one frame
#[derive(Clone)]
pub enum Reducer {
    /// Per-pixel mean over defined samples
    Mean,
    /// Per-pixel sum over defined samples
    Sum,
    Custom(Arc<WindowFn>),
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reducer::Mean => f.write_str("Mean"),
            Reducer::Sum => f.write_str("Sum"),
            Reducer::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl Reducer {
    /// Reduce a non-empty slice of frames
    pub fn reduce(&self, frames: &[RasterFrame]) -> Result<RasterFrame> {
        match self {
            Reducer::Mean => reduce_frames(frames, Statistic::Mean),
            Reducer::Sum => reduce_frames(frames, Statistic::Sum),
            Reducer::Custom(f) => f(frames),
        }
    }
}

#[derive(Clone, Copy)]
enum Statistic {
    Mean,
    Sum,
}

/// Band-wise reduction. A pixel with no defined sample stays undefined.
fn reduce_frames(frames: &[RasterFrame], statistic: Statistic) -> Result<RasterFrame> {
    let first = frames
        .first()
        .ok_or_else(|| Error::Other("cannot reduce an empty window".into()))?;

    let mut out = RasterFrame::new();
    for band in first.bands() {
        let template = &band.raster;
        let mut sum = Array2::<f64>::zeros(template.shape());
        let mut count = Array2::<u32>::zeros(template.shape());

        for frame in frames {
            let raster = frame.require_band(&band.name)?;
            template.check_same_shape(raster)?;
            Zip::from(&mut sum)
                .and(&mut count)
                .and(raster.data())
                .for_each(|s, c, &v| {
                    if !v.is_nan() {
                        *s += v;
                        *c += 1;
                    }
                });
        }

        let mut values = sum;
        Zip::from(&mut values).and(&count).for_each(|v, &c| {
            *v = match (c, statistic) {
                (0, _) => f64::NAN,
                (_, Statistic::Sum) => *v,
                (n, Statistic::Mean) => *v / f64::from(n),
            };
        });
        out = out.with_band(band.name.clone(), template.with_data(values));
    }
    Ok(out)
}

/// Builds one frame per calendar month from a raw series
pub struct MonthlyAggregator {
    reducer: Reducer,
    per_sample: Option<Box<FrameFn>>,
    daily: Option<Option<Box<FrameFn>>>,
}

impl fmt::Debug for MonthlyAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonthlyAggregator")
            .field("reducer", &self.reducer)
            .field("per_sample", &self.per_sample.is_some())
            .field("daily_breakdown", &self.daily.is_some())
            .finish()
    }
}

impl MonthlyAggregator {
    pub fn new(reducer: Reducer) -> Self {
        Self {
            reducer,
            per_sample: None,
            daily: None,
        }
    }

    /// Transform every raw sample before it is reduced
    pub fn map_samples<F>(mut self, f: F) -> Self
    where
        F: Fn(&RasterFrame) -> Result<RasterFrame> + Send + Sync + 'static,
    {
        self.per_sample = Some(Box::new(f));
        self
    }

    /// Sum samples per day first, then reduce the daily frames into the month
    pub fn daily_breakdown(mut self) -> Self {
        self.daily = Some(None);
        self
    }

    /// Daily breakdown with a transform applied to each daily sum
    pub fn daily_breakdown_with<F>(mut self, per_day: F) -> Self
    where
        F: Fn(&RasterFrame) -> Result<RasterFrame> + Send + Sync + 'static,
    {
        self.daily = Some(Some(Box::new(per_day)));
        self
    }

    fn prepare(&self, frame: &RasterFrame) -> Result<RasterFrame> {
        match &self.per_sample {
            Some(f) => f(frame),
            None => Ok(frame.clone()),
        }
    }

    fn prepare_day(&self, frame: RasterFrame) -> Result<RasterFrame> {
        match &self.daily {
            Some(Some(f)) => f(&frame),
            _ => Ok(frame),
        }
    }

    /// Schema of one output frame with every pixel undefined
    fn empty_template(&self, series: &RasterSeries) -> Result<RasterFrame> {
        let first = series
            .first()
            .ok_or_else(|| Error::Other("cannot aggregate an empty series".into()))?;
        let sample = self.prepare(first)?;
        let shaped = if self.daily.is_some() {
            self.prepare_day(sample.masked_like())?
        } else {
            sample
        };
        Ok(shaped.masked_like())
    }

    /// One frame per window, in window order
    pub fn aggregate(
        &self,
        series: &RasterSeries,
        windows: &[MonthWindow],
    ) -> Result<RasterSeries> {
        let template = self.empty_template(series)?;
        let mut frames = Vec::with_capacity(windows.len());

        for window in windows {
            let reduced = if self.daily.is_some() {
                self.reduce_daily(series, window, &template)?
            } else {
                self.reduce_window(series, window)?
            };

            let frame = match reduced {
                Some(frame) => frame,
                None => {
                    warn!("No samples in {}, emitting an undefined frame", window.key);
                    template.clone()
                }
            };
            frames.push(frame.with_calendar_tags(window));
        }

        info!(
            "Aggregated {} samples into {} monthly frames ({:?})",
            series.len(),
            frames.len(),
            self.reducer
        );
        Ok(RasterSeries::new(frames))
    }

    fn reduce_window(
        &self,
        series: &RasterSeries,
        window: &MonthWindow,
    ) -> Result<Option<RasterFrame>> {
        let samples = series
            .filter_date(window.start, window.end)
            .map(|f| self.prepare(f))
            .collect::<Result<Vec<_>>>()?;
        debug!("{}: {} samples", window.key, samples.len());

        if samples.is_empty() {
            return Ok(None);
        }
        self.reducer.reduce(&samples).map(Some)
    }

    fn reduce_daily(
        &self,
        series: &RasterSeries,
        window: &MonthWindow,
        template: &RasterFrame,
    ) -> Result<Option<RasterFrame>> {
        let mut daily = Vec::new();
        let mut sample_count = 0usize;

        for day in window.days() {
            let samples = series
                .filter_date(day.start, day.end)
                .map(|f| self.prepare(f))
                .collect::<Result<Vec<_>>>()?;
            sample_count += samples.len();

            let day_frame = if samples.is_empty() {
                template.clone()
            } else {
                self.prepare_day(reduce_frames(&samples, Statistic::Sum)?)?
            };
            daily.push(day_frame);
        }
        debug!("{}: {} samples over {} days", window.key, sample_count, daily.len());

        if sample_count == 0 {
            return Ok(None);
        }
        self.reducer.reduce(&daily).map(Some)
    }
}

/// Aggregate `series` into one frame per month of `[start, end)`.
///
/// `start` (inclusive) and `end` (exclusive) must be first-of-month dates.
pub fn aggregate(
    series: &RasterSeries,
    start: NaiveDate,
    end: NaiveDate,
    reducer: Reducer,
    daily_breakdown: bool,
) -> Result<RasterSeries> {
    let windows = month_windows(start, end)?;
    let mut aggregator = MonthlyAggregator::new(reducer);
    if daily_breakdown {
        aggregator = aggregator.daily_breakdown();
    }
    aggregator.aggregate(series, &windows)
}
