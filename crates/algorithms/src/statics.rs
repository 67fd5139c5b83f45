//! Time-invariant soil and atmosphere layers
//!
//! Loaded once and broadcast into every month. They are joined by position
//! on the grid, never by calendar key.

use crate::imagery::band_math;
use rweq_core::raster::{Raster, RasterFrame};
use rweq_core::{Error, Result};
use tracing::debug;

/// Erodible fraction of the soil, in `[0, 1]`
pub const EF: &str = "ef";
/// Soil crust factor
pub const SCF: &str = "scf";
/// Soil roughness factor `K'`
pub const K: &str = "k";
/// Air density (kg/m³)
pub const AIR_DENSITY: &str = "airDensity";

#[derive(Debug, Clone)]
pub struct StaticLayers {
    pub ef: Raster,
    pub scf: Raster,
    pub k: Raster,
    pub air_density: Raster,
}

impl StaticLayers {
    /// Build from rasters of one shape. `ef` is clamped to `[0, 1]`.
    pub fn new(ef: Raster, scf: Raster, k: Raster, air_density: Raster) -> Result<Self> {
        ef.check_same_shape(&scf)?;
        ef.check_same_shape(&k)?;
        ef.check_same_shape(&air_density)?;
        let ef = band_math(&ef, |v| v.clamp(0.0, 1.0))?;
        Ok(Self {
            ef,
            scf,
            k,
            air_density,
        })
    }

    /// Build from the frames read off disk.
    ///
    /// `soils` packs the erodible fraction and crust factor as two named
    /// bands; `k` and `air_density` contribute their first band.
    pub fn from_frames(
        soils: &RasterFrame,
        ef_band: &str,
        scf_band: &str,
        k: &RasterFrame,
        air_density: &RasterFrame,
    ) -> Result<Self> {
        let ef = soils.require_band(ef_band)?.clone();
        let scf = soils.require_band(scf_band)?.clone();
        let k = first_band(k, K)?;
        let air_density = first_band(air_density, AIR_DENSITY)?;
        debug!("Static layers {:?}", ef.shape());
        Self::new(ef, scf, k, air_density)
    }

    /// Soil bands broadcast into the erosion stage
    pub fn soil_frame(&self) -> RasterFrame {
        RasterFrame::from_band(EF, self.ef.clone())
            .with_band(SCF, self.scf.clone())
            .with_band(K, self.k.clone())
    }

    /// Air density band broadcast into the weather factor stage
    pub fn air_density_frame(&self) -> RasterFrame {
        RasterFrame::from_band(AIR_DENSITY, self.air_density.clone())
    }

    pub fn shape(&self) -> (usize, usize) {
        self.ef.shape()
    }
}

fn first_band(frame: &RasterFrame, layer: &str) -> Result<Raster> {
    frame
        .bands()
        .first()
        .map(|b| b.raster.clone())
        .ok_or_else(|| Error::MissingBand {
            band: layer.to_string(),
            available: String::new(),
        })
}
