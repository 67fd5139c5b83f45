//! Band math operations
//!
//! Cell-wise raster algebra over one or more co-registered rasters. An
//! undefined (`NaN`) input cell always yields an undefined output cell; the
//! kernel is not called for it.

use crate::maybe_rayon::*;
use ndarray::Array2;
use rweq_core::raster::Raster;
use rweq_core::{Error, Result};

/// Apply a unary function to every defined cell.
///
/// # Example
/// ```ignore
/// let scaled = band_math(&ndvi, |v| v * 0.0001)?;
/// ```
pub fn band_math<F>(raster: &Raster, f: F) -> Result<Raster>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    band_math_n(&[raster], |v| f(v[0]))
}

/// Apply `f` to the stacked values of `inputs` at every cell.
///
/// `f` receives one value per input, in order, and is only called when all
/// of them are defined. The output keeps the georeferencing of `inputs[0]`.
pub fn band_math_n<F>(inputs: &[&Raster], f: F) -> Result<Raster>
where
    F: Fn(&[f64]) -> f64 + Sync + Send,
{
    let first = inputs
        .first()
        .ok_or_else(|| Error::Other("band math needs at least one input raster".into()))?;
    for other in &inputs[1..] {
        first.check_same_shape(other)?;
    }

    let (rows, cols) = first.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut values = vec![0.0; inputs.len()];
            for (col, out) in row_data.iter_mut().enumerate() {
                let defined = inputs.iter().zip(values.iter_mut()).all(|(r, slot)| {
                    *slot = r.data()[(row, col)];
                    !slot.is_nan()
                });
                if defined {
                    *out = f(&values);
                }
            }
            row_data
        })
        .collect();

    let array =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(first.with_data(array))
}
