//! Soil wind erosion potential
//!
//! Combines the monthly weather factor with the soil layers and the canopy
//! factor into `product`, then derives per pixel:
//!
//! ```text
//! s    = 150.71 · product^-0.3711        critical field length (m)
//! qmax = 109.8 · product                 maximum transport capacity (kg/m)
//! swep = (2x / s²) · qmax · exp(-(x/s)²) soil wind erosion potential
//! ```

use crate::factors::{SLRC, WF};
use crate::imagery::band_math_n;
use crate::statics::{EF, K, SCF};
use rweq_core::raster::RasterFrame;
use rweq_core::Result;

pub const PRODUCT: &str = "product";
pub const S: &str = "s";
pub const QMAX: &str = "qmax";
pub const SWEP: &str = "swep";

const S_COEFF: f64 = 150.71;
const S_EXP: f64 = -0.3711;
const QMAX_COEFF: f64 = 109.8;

/// Derived quantities of one pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErosionValues {
    pub s: f64,
    pub qmax: f64,
    pub swep: f64,
}

impl ErosionValues {
    /// Non-positive or undefined `product` leaves `s` and `swep` undefined
    pub fn from_product(product: f64, field_length: f64) -> Self {
        let qmax = QMAX_COEFF * product;
        if product.is_nan() || product <= 0.0 {
            return Self {
                s: f64::NAN,
                qmax,
                swep: f64::NAN,
            };
        }
        let s = S_COEFF * product.powf(S_EXP);
        let x = field_length;
        let swep = (2.0 * x / (s * s)) * qmax * (-(x / s).powi(2)).exp();
        Self { s, qmax, swep }
    }
}

/// `wf · ef · scf · k · slrc` as a single `product` band
pub fn erosion_product(frame: &RasterFrame) -> Result<RasterFrame> {
    let inputs = [
        frame.require_band(WF)?,
        frame.require_band(EF)?,
        frame.require_band(SCF)?,
        frame.require_band(K)?,
        frame.require_band(SLRC)?,
    ];
    let product = band_math_n(&inputs, |v| v.iter().product())?;
    Ok(RasterFrame::from_band(PRODUCT, product).copy_properties_from(frame))
}

/// Append `s`, `qmax` and `swep` to a frame holding `product`
pub fn soil_loss(frame: &RasterFrame, field_length: f64) -> Result<RasterFrame> {
    let product = frame.require_band(PRODUCT)?;
    let at = |p: f64| ErosionValues::from_product(p, field_length);
    let s = band_math_n(&[product], |v| at(v[0]).s)?;
    let qmax = band_math_n(&[product], |v| at(v[0]).qmax)?;
    let swep = band_math_n(&[product], |v| at(v[0]).swep)?;

    Ok(frame
        .clone()
        .with_band(S, s)
        .with_band(QMAX, qmax)
        .with_band(SWEP, swep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rweq_core::raster::YEAR_MONTH;
    use rweq_core::Raster;

    fn joined(wf: f64) -> RasterFrame {
        let band = |v: f64| Raster::filled(1, 1, v);
        RasterFrame::from_band(WF, band(wf))
            .with_band(SLRC, band(0.2))
            .with_band(EF, band(0.5))
            .with_band(SCF, band(0.8))
            .with_band(K, band(0.9))
            .set_property(YEAR_MONTH, "2018-08")
    }

    fn get(frame: &RasterFrame, band: &str) -> f64 {
        frame.require_band(band).unwrap().get(0, 0).unwrap()
    }

    #[test]
    fn test_single_pixel_reference() {
        let product = erosion_product(&joined(1.0)).unwrap();
        let out = soil_loss(&product, 55.0).unwrap();
        assert_eq!(out.band_names(), vec![PRODUCT, S, QMAX, SWEP]);
        assert_eq!(out.year_month(), Some("2018-08"));

        let p: f64 = 0.5 * 0.8 * 0.9 * 0.2 * 1.0;
        assert_relative_eq!(get(&out, PRODUCT), 0.072, max_relative = 1e-6);
        assert_relative_eq!(get(&out, QMAX), 7.9056, max_relative = 1e-6);

        let s = 150.71 * p.powf(-0.3711);
        assert_relative_eq!(get(&out, S), s, max_relative = 1e-6);
        let swep = (2.0 * 55.0 / (s * s)) * 7.9056 * (-(55.0 / s) * (55.0 / s)).exp();
        assert_relative_eq!(get(&out, SWEP), swep, max_relative = 1e-6);
    }

    #[test]
    fn test_non_positive_product_is_undefined() {
        let zero = ErosionValues::from_product(0.0, 55.0);
        assert!(zero.s.is_nan() && zero.swep.is_nan());
        assert_eq!(zero.qmax, 0.0);

        let negative = ErosionValues::from_product(-0.1, 55.0);
        assert!(negative.s.is_nan() && negative.swep.is_nan());

        let out = soil_loss(&erosion_product(&joined(f64::NAN)).unwrap(), 55.0).unwrap();
        for band in [PRODUCT, S, QMAX, SWEP] {
            assert!(get(&out, band).is_nan(), "{}", band);
        }
    }

    #[test]
    fn test_missing_factor() {
        let frame = joined(1.0).select(&[WF, SLRC]).unwrap();
        assert!(erosion_product(&frame).is_err());
    }
}
