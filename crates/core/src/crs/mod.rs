//! Coordinate reference system tags carried by rasters
//!
//! Only the EPSG code and whether it is geographic are kept; that is all the
//! GeoKey directory of the native writer records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    epsg: u32,
    /// Whether the EPSG code names a geographic (lat/lon) system
    geographic: bool,
}

impl CRS {
    /// Projected CRS from an EPSG code
    pub fn projected(code: u32) -> Self {
        Self {
            epsg: code,
            geographic: false,
        }
    }

    /// Geographic CRS from an EPSG code
    pub fn geographic(code: u32) -> Self {
        Self {
            epsg: code,
            geographic: true,
        }
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    pub fn is_geographic(&self) -> bool {
        self.geographic
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}
