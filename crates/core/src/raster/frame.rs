//! Multi-band rasters tagged with scalar properties

use crate::calendar::{CalendarKey, MonthWindow};
use crate::error::{Error, Result};
use crate::raster::Raster;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Property key holding the calendar year
pub const YEAR: &str = "year";
/// Property key holding the zero-padded month label
pub const MONTH: &str = "month";
/// Property key holding the `"YYYY-MM"` join key
pub const YEAR_MONTH: &str = "yearMonth";
/// Property key holding the day count of the aggregation window
pub const N_DAYS: &str = "nDays";

/// Scalar value attached to a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Property {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Property {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Property::Int(v) => Some(*v as f64),
            Property::Float(v) => Some(*v),
            Property::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Property::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Int(v) => write!(f, "{}", v),
            Property::Float(v) => write!(f, "{}", v),
            Property::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Property {
    fn from(v: i64) -> Self {
        Property::Int(v)
    }
}

impl From<f64> for Property {
    fn from(v: f64) -> Self {
        Property::Float(v)
    }
}

impl From<&str> for Property {
    fn from(v: &str) -> Self {
        Property::Text(v.to_string())
    }
}

impl From<String> for Property {
    fn from(v: String) -> Self {
        Property::Text(v)
    }
}

/// A named raster layer
#[derive(Debug, Clone)]
pub struct Band {
    pub name: String,
    pub raster: Raster,
}

/// One or more co-registered bands plus scalar properties.
///
/// Frames are treated as values: every builder method consumes `self` and
/// returns the updated frame, and pipeline stages produce new frames rather
/// than editing their inputs.
#[derive(Debug, Clone, Default)]
pub struct RasterFrame {
    bands: Vec<Band>,
    properties: BTreeMap<String, Property>,
    timestamp: Option<NaiveDateTime>,
}

impl RasterFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame holding a single band
    pub fn from_band(name: impl Into<String>, raster: Raster) -> Self {
        Self::new().with_band(name, raster)
    }

    // Bands

    /// Add a band, replacing any band with the same name in place
    pub fn with_band(mut self, name: impl Into<String>, raster: Raster) -> Self {
        let name = name.into();
        match self.bands.iter_mut().find(|b| b.name == name) {
            Some(band) => band.raster = raster,
            None => self.bands.push(Band { name, raster }),
        }
        self
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|b| b.name == name)
    }

    pub fn band(&self, name: &str) -> Option<&Raster> {
        self.bands.iter().find(|b| b.name == name).map(|b| &b.raster)
    }

    /// Like [`band`](Self::band) but fails with [`Error::MissingBand`]
    pub fn require_band(&self, name: &str) -> Result<&Raster> {
        self.band(name).ok_or_else(|| Error::MissingBand {
            band: name.to_string(),
            available: self.band_names().join(", "),
        })
    }

    /// Keep only `names`, in the given order
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        let bands = names
            .iter()
            .map(|&name| {
                self.require_band(name).map(|r| Band {
                    name: name.to_string(),
                    raster: r.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            bands,
            properties: self.properties.clone(),
            timestamp: self.timestamp,
        })
    }

    /// Rename bands positionally
    pub fn rename(mut self, names: &[&str]) -> Result<Self> {
        if names.len() != self.bands.len() {
            return Err(Error::InvalidParameter {
                name: "names",
                value: names.join(", "),
                reason: format!("frame has {} bands", self.bands.len()),
            });
        }
        for (band, name) in self.bands.iter_mut().zip(names) {
            band.name = name.to_string();
        }
        Ok(self)
    }

    /// Shape shared by all bands, `None` for a frame without bands
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.bands.first().map(|b| b.raster.shape())
    }

    /// Same band names and grid, every cell undefined
    pub fn masked_like(&self) -> Self {
        Self {
            bands: self
                .bands
                .iter()
                .map(|b| Band {
                    name: b.name.clone(),
                    raster: b.raster.like(f64::NAN),
                })
                .collect(),
            properties: BTreeMap::new(),
            timestamp: None,
        }
    }

    // Properties

    pub fn properties(&self) -> &BTreeMap<String, Property> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn set_property(mut self, key: impl Into<String>, value: impl Into<Property>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Copy every property of `source`, overwriting existing keys
    pub fn copy_properties_from(mut self, source: &RasterFrame) -> Self {
        for (k, v) in &source.properties {
            self.properties.insert(k.clone(), v.clone());
        }
        self
    }

    /// Tag with `year`, `month`, `yearMonth` and `nDays` of a month window
    pub fn with_calendar_tags(self, window: &MonthWindow) -> Self {
        self.set_property(YEAR, window.key.year() as i64)
            .set_property(MONTH, window.key.month_label())
            .set_property(YEAR_MONTH, window.key.to_string())
            .set_property(N_DAYS, window.n_days())
    }

    /// The `yearMonth` join key, if tagged
    pub fn year_month(&self) -> Option<&str> {
        self.property(YEAR_MONTH).and_then(Property::as_str)
    }

    pub fn calendar_key(&self) -> Result<CalendarKey> {
        self.year_month()
            .ok_or_else(|| Error::MissingProperty(YEAR_MONTH.into()))?
            .parse()
    }

    pub fn n_days(&self) -> Result<f64> {
        self.property(N_DAYS)
            .and_then(Property::as_f64)
            .ok_or_else(|| Error::MissingProperty(N_DAYS.into()))
    }

    // Time

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }

    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
