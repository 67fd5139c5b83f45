//! JSON scene catalog
//!
//! Describes where the raw input collections live on disk:
//!
//! ```json
//! {
//!   "vegetation": [
//!     { "datetime": "2018-01-01T00:00:00",
//!       "bands": { "NDVI": "mod13q1/2018_001_ndvi.tif",
//!                  "DetailedQA": "mod13q1/2018_001_dqa.tif",
//!                  "SummaryQA": "mod13q1/2018_001_sqa.tif" } }
//!   ],
//!   "wind": [ { "datetime": "2018-01-01T00:00:00", "path": "rtma/2018010100.tif" } ],
//!   "land_surface": [ ... ],
//!   "statics": { "soils": "soils.tif", "k": "k.tif", "air_density": "air_density.tif" },
//!   "boundary": "columbia_plateau.geojson"
//! }
//! ```
//!
//! A scene gives either a multi-page `path` (band names from the pages) or a
//! `bands` map of single-band files. Relative paths resolve against the
//! catalog's directory.

use crate::clip::StudyArea;
use crate::error::{Error, Result};
use crate::io::geotiff::{read_frame, read_geotiff};
use crate::raster::{RasterFrame, RasterSeries};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One time-stamped scene of a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneEntry {
    pub datetime: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bands: BTreeMap<String, PathBuf>,
}

/// Time-invariant inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticEntries {
    /// Multi-page soil raster holding the erodible fraction and crust factor
    pub soils: PathBuf,
    #[serde(default = "default_ef_band")]
    pub ef_band: String,
    #[serde(default = "default_scf_band")]
    pub scf_band: String,
    /// Soil roughness factor
    pub k: PathBuf,
    pub air_density: PathBuf,
}

fn default_ef_band() -> String {
    "b8".to_string()
}

fn default_scf_band() -> String {
    "b9".to_string()
}

/// Locations of every pipeline input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub vegetation: Vec<SceneEntry>,
    pub wind: Vec<SceneEntry>,
    pub land_surface: Vec<SceneEntry>,
    pub statics: StaticEntries,
    #[serde(default)]
    pub boundary: Option<PathBuf>,
    #[serde(skip)]
    root: PathBuf,
}

impl Catalog {
    pub fn from_json_str(s: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let mut catalog: Catalog = serde_json::from_str(s)?;
        catalog.root = root.into();
        Ok(catalog)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_json_str(&text, root)
    }

    /// Resolve a catalog path against the catalog directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Study-area boundary, if the catalog names one
    pub fn study_area(&self) -> Result<Option<StudyArea>> {
        self.boundary
            .as_ref()
            .map(|p| StudyArea::from_geojson_file(self.resolve(p)))
            .transpose()
    }

    /// Read a collection into a time-ordered series
    pub fn load_series(&self, entries: &[SceneEntry]) -> Result<RasterSeries> {
        let mut series = entries
            .iter()
            .map(|entry| self.load_scene(entry))
            .collect::<Result<RasterSeries>>()?;
        series.sort_by_time();
        debug!("Loaded {} scenes", series.len());
        Ok(series)
    }

    fn load_scene(&self, entry: &SceneEntry) -> Result<RasterFrame> {
        let frame = match (&entry.path, entry.bands.is_empty()) {
            (Some(path), true) => read_frame(self.resolve(path))?,
            (None, false) => {
                let mut frame = RasterFrame::new();
                for (name, path) in &entry.bands {
                    frame = frame.with_band(name.as_str(), read_geotiff(self.resolve(path))?);
                }
                frame
            }
            _ => {
                return Err(Error::InvalidParameter {
                    name: "scene",
                    value: entry.datetime.to_string(),
                    reason: "give exactly one of `path` or `bands`".into(),
                })
            }
        };
        Ok(frame.with_timestamp(entry.datetime))
    }

    /// Read a multi-page static raster
    pub fn load_frame(&self, path: &Path) -> Result<RasterFrame> {
        read_frame(self.resolve(path))
    }
}
