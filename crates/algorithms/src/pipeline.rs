//! End-to-end monthly RWEQ run
//!
//! Stage order:
//!
//! 1. clip every input to the study area (when one is given)
//! 2. aggregate the raw collections into monthly factor inputs
//! 3. derive `slrc`, `sw` and `sd`
//! 4. join wind with land surface, wetness with snow, then both together
//! 5. broadcast air density and compute `wf`
//! 6. join `wf` with `slrc`, broadcast the soil layers, compute the
//!    erosion product and the soil loss bands

use crate::config::RweqConfig;
use crate::erosion::{erosion_product, soil_loss};
use crate::factors::{
    monthly_ndvi, monthly_snow, monthly_wetness_inputs, monthly_wind, slrc, soil_wetness,
    weather_factor,
};
use crate::statics::StaticLayers;
use crate::temporal::{broadcast_join, inner_join};
use rweq_core::io::Catalog;
use rweq_core::raster::RasterSeries;
use rweq_core::{Result, StudyArea};
use std::borrow::Cow;
use tracing::{info, warn};

/// Raw inputs of one run
#[derive(Debug, Clone)]
pub struct RweqInputs {
    /// 16-day composites with `NDVI`, `DetailedQA`, `SummaryQA`
    pub vegetation: RasterSeries,
    /// Hourly `WIND`
    pub wind: RasterSeries,
    /// 3-hourly `Evap_tavg`, `Rainf_tavg`, `SnowDepth_inst`
    pub land_surface: RasterSeries,
    pub statics: StaticLayers,
    pub study_area: Option<StudyArea>,
}

impl RweqInputs {
    /// Read every collection and static layer named by `catalog`
    pub fn load(catalog: &Catalog) -> Result<Self> {
        let vegetation = catalog.load_series(&catalog.vegetation)?;
        let wind = catalog.load_series(&catalog.wind)?;
        let land_surface = catalog.load_series(&catalog.land_surface)?;
        info!(
            "Loaded {} vegetation, {} wind, {} land-surface scenes",
            vegetation.len(),
            wind.len(),
            land_surface.len()
        );

        let s = &catalog.statics;
        let statics = StaticLayers::from_frames(
            &catalog.load_frame(&s.soils)?,
            &s.ef_band,
            &s.scf_band,
            &catalog.load_frame(&s.k)?,
            &catalog.load_frame(&s.air_density)?,
        )?;

        Ok(Self {
            vegetation,
            wind,
            land_surface,
            statics,
            study_area: catalog.study_area()?,
        })
    }

    /// Inputs with every pixel outside the study area undefined; borrowed
    /// as-is when there is no study area
    pub fn clipped(&self) -> Cow<'_, Self> {
        let Some(area) = &self.study_area else {
            return Cow::Borrowed(self);
        };
        let statics = StaticLayers {
            ef: area.clip_raster(&self.statics.ef),
            scf: area.clip_raster(&self.statics.scf),
            k: area.clip_raster(&self.statics.k),
            air_density: area.clip_raster(&self.statics.air_density),
        };
        Cow::Owned(Self {
            vegetation: area.clip_series(&self.vegetation),
            wind: area.clip_series(&self.wind),
            land_surface: area.clip_series(&self.land_surface),
            statics,
            study_area: self.study_area.clone(),
        })
    }
}

/// The three export batches
#[derive(Debug, Clone)]
pub struct RweqOutputs {
    /// Monthly canopy-cover soil-loss ratio
    pub slrc: RasterSeries,
    /// Monthly weather factor
    pub wf: RasterSeries,
    /// Monthly `product`, `s`, `qmax` and `swep`
    pub soil_loss: RasterSeries,
}

/// Run all stages over the configured month range
pub fn run(inputs: &RweqInputs, config: &RweqConfig) -> Result<RweqOutputs> {
    config.validate()?;
    let windows = config.windows()?;
    let constants = &config.constants;
    info!(
        "RWEQ run over {} months ({} to {})",
        windows.len(),
        config.start_date,
        config.end_date
    );

    let inputs = inputs.clipped();

    // Canopy
    let ndvi = monthly_ndvi(&inputs.vegetation, &windows, &config.quality, constants)?;
    let canopy = ndvi.try_map(slrc)?;
    info!("slrc: {} monthly frames", canopy.len());

    // Weather
    let wind = monthly_wind(&inputs.wind, &windows, constants)?;
    let et_r_rd = monthly_wetness_inputs(&inputs.land_surface, &windows, constants)?;
    let sw = et_r_rd.try_map(soil_wetness)?;
    let sd = monthly_snow(&inputs.land_surface, &windows, constants)?;
    info!(
        "Weather inputs: {} wind, {} wetness, {} snow frames",
        wind.len(),
        sw.len(),
        sd.len()
    );

    let wind_land = inner_join(&wind, &et_r_rd)?;
    let wet_snow = inner_join(&sw, &sd)?;
    let weather_inputs = inner_join(&wind_land, &wet_snow)?;
    let weather_inputs = broadcast_join(&weather_inputs, &inputs.statics.air_density_frame())?;
    let wf = weather_inputs.try_map(|frame| weather_factor(frame, constants.gravity))?;
    info!("wf: {} monthly frames", wf.len());

    // Erosion
    let factors = inner_join(&wf, &canopy)?;
    let factors = broadcast_join(&factors, &inputs.statics.soil_frame())?;
    let loss = factors
        .try_map(erosion_product)?
        .try_map(|frame| soil_loss(frame, constants.field_length))?;
    if loss.len() < windows.len() {
        warn!(
            "{} of {} months dropped by joins",
            windows.len() - loss.len(),
            windows.len()
        );
    }
    info!("Soil loss: {} monthly frames", loss.len());

    Ok(RweqOutputs {
        slrc: canopy,
        wf,
        soil_loss: loss,
    })
}
