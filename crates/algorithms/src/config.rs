//! Pipeline configuration
//!
//! Everything the stages need besides the rasters themselves: the date range,
//! physical constants, quality-screen codes and export naming. The struct is
//! passed explicitly to every stage.

use crate::imagery::QualityParams;
use chrono::{Datelike, NaiveDate};
use rweq_core::calendar::{month_windows, MonthWindow};
use rweq_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Physical constants of the wind erosion model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    /// Gravitational acceleration (m/s²)
    pub gravity: f64,
    /// Wind speed above which an hour counts as erosive (m/s)
    pub wind_threshold: f64,
    /// Snow depth at or above which the ground is snow covered (m)
    pub snow_threshold: f64,
    /// Downwind field length `x` of the erosion model (m)
    pub field_length: f64,
    /// Scale factor of the stored vegetation index
    pub ndvi_scale: f64,
    /// Seconds per land-surface sample, converts fluxes to depths
    pub flux_seconds: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            gravity: 9.80665,
            wind_threshold: 5.0,
            snow_threshold: 0.0254,
            field_length: 55.0,
            ndvi_scale: 0.0001,
            flux_seconds: 10_800.0,
        }
    }
}

/// Naming and resolution of the three export batches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Nominal output resolution (m), informational only
    pub scale: f64,
    pub slrc_pattern: String,
    pub wf_pattern: String,
    pub soil_loss_pattern: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 250.0,
            slrc_pattern: "slrcImgCol_{yearMonth}".into(),
            wf_pattern: "WF_{yearMonth}".into(),
            soil_loss_pattern: "windSoilLoss_{yearMonth}".into(),
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RweqConfig {
    /// First month of the run (inclusive, first of month)
    pub start_date: NaiveDate,
    /// End of the run (exclusive, first of month)
    pub end_date: NaiveDate,
    pub constants: PhysicalConstants,
    pub quality: QualityParams,
    pub export: ExportConfig,
}

impl Default for RweqConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            constants: PhysicalConstants::default(),
            quality: QualityParams::default(),
            export: ExportConfig::default(),
        }
    }
}

impl RweqConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the date range and the constants the formulas divide by
    pub fn validate(&self) -> Result<()> {
        for (name, date) in [("start_date", self.start_date), ("end_date", self.end_date)] {
            if date.day() != 1 {
                return Err(Error::InvalidParameter {
                    name,
                    value: date.to_string(),
                    reason: "must be the first day of a month".into(),
                });
            }
        }
        if self.end_date <= self.start_date {
            return Err(Error::InvalidParameter {
                name: "end_date",
                value: self.end_date.to_string(),
                reason: format!("must be after start_date {}", self.start_date),
            });
        }

        let c = &self.constants;
        let positive = [
            ("gravity", c.gravity),
            ("field_length", c.field_length),
            ("ndvi_scale", c.ndvi_scale),
            ("flux_seconds", c.flux_seconds),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(Error::InvalidParameter {
                    name,
                    value: value.to_string(),
                    reason: "must be positive".into(),
                });
            }
        }
        if c.wind_threshold < 0.0 || c.snow_threshold < 0.0 {
            return Err(Error::InvalidParameter {
                name: "threshold",
                value: format!("wind {}, snow {}", c.wind_threshold, c.snow_threshold),
                reason: "thresholds must not be negative".into(),
            });
        }
        let q = &self.quality;
        if q.land_low_bit > q.land_high_bit || q.land_high_bit > 31 {
            return Err(Error::InvalidParameter {
                name: "quality.land_bits",
                value: format!("{}..={}", q.land_low_bit, q.land_high_bit),
                reason: "need low <= high <= 31".into(),
            });
        }
        Ok(())
    }

    /// Month windows of the configured range
    pub fn windows(&self) -> Result<Vec<MonthWindow>> {
        month_windows(self.start_date, self.end_date)
    }
}
