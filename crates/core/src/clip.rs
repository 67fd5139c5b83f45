//! Study-area clipping
//!
//! Cells whose centre falls outside the boundary polygon become undefined.
//! The grid shape is never changed.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterFrame, RasterSeries};
use geo::{Contains, MultiPolygon, Point, Polygon};
use geojson::GeoJson;
use ndarray::Array2;
use std::path::Path;

/// Boundary of the study area
#[derive(Debug, Clone)]
pub struct StudyArea {
    boundary: MultiPolygon<f64>,
}

impl StudyArea {
    pub fn new(boundary: MultiPolygon<f64>) -> Self {
        Self { boundary }
    }

    /// Read every polygon of a GeoJSON document (geometry, feature or collection)
    pub fn from_geojson_str(s: &str) -> Result<Self> {
        let geojson: GeoJson = s
            .parse()
            .map_err(|e: geojson::Error| Error::Geometry(e.to_string()))?;

        let geometries: Vec<geojson::Geometry> = match geojson {
            GeoJson::Geometry(g) => vec![g],
            GeoJson::Feature(f) => f.geometry.into_iter().collect(),
            GeoJson::FeatureCollection(fc) => {
                fc.features.into_iter().filter_map(|f| f.geometry).collect()
            }
        };

        let mut polygons: Vec<Polygon<f64>> = Vec::new();
        for geometry in geometries {
            let geometry = geo_types::Geometry::<f64>::try_from(geometry)
                .map_err(|e| Error::Geometry(e.to_string()))?;
            match geometry {
                geo_types::Geometry::Polygon(p) => polygons.push(p),
                geo_types::Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
                other => {
                    return Err(Error::Geometry(format!(
                        "boundary must be polygonal, got {:?}",
                        other
                    )))
                }
            }
        }

        if polygons.is_empty() {
            return Err(Error::Geometry("boundary contains no polygon".into()));
        }
        Ok(Self::new(MultiPolygon::new(polygons)))
    }

    pub fn from_geojson_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_geojson_str(&text)
    }

    /// `true` for every cell whose centre lies inside the boundary
    pub fn mask(&self, raster: &Raster) -> Array2<bool> {
        let transform = raster.transform();
        Array2::from_shape_fn(raster.shape(), |(row, col)| {
            let (x, y) = transform.pixel_to_geo(col, row);
            self.boundary.contains(&Point::new(x, y))
        })
    }

    pub fn clip_raster(&self, raster: &Raster) -> Raster {
        raster.masked_where(&self.mask(raster), |v| v)
    }

    /// Clip every band of every frame, computing the mask once per distinct grid
    pub fn clip_series(&self, series: &RasterSeries) -> RasterSeries {
        let mut cached: Option<((usize, usize), GeoTransform, Array2<bool>)> = None;

        series.map(|frame| {
            let mut out = RasterFrame::new().copy_properties_from(frame);
            if let Some(t) = frame.timestamp() {
                out = out.with_timestamp(t);
            }
            for band in frame.bands() {
                let raster = &band.raster;
                let key = (raster.shape(), *raster.transform());
                if !matches!(&cached, Some((s, t, _)) if (*s, *t) == key) {
                    cached = None;
                }
                let (_, _, mask) =
                    cached.get_or_insert_with(|| (key.0, key.1, self.mask(raster)));
                out = out.with_band(band.name.clone(), raster.masked_where(mask, |v| v));
            }
            out
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"{
        "type": "Feature",
        "properties": {},
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, -2.0], [0.0, -2.0], [0.0, 0.0]]]
        }
    }"#;

    #[test]
    fn test_clip_masks_outside_cells() {
        let area = StudyArea::from_geojson_str(SQUARE).unwrap();
        let mut raster = Raster::filled(3, 3, 1.0);
        raster.set_transform(GeoTransform::new(0.0, 0.0, 1.0, -1.0));

        let clipped = area.clip_raster(&raster);
        assert_eq!(clipped.get(0, 0).unwrap(), 1.0);
        assert_eq!(clipped.get(1, 1).unwrap(), 1.0);
        assert!(clipped.get(2, 2).unwrap().is_nan());
        assert!(clipped.get(0, 2).unwrap().is_nan());
        assert_eq!(clipped.shape(), (3, 3));
    }

    #[test]
    fn test_rejects_non_polygon() {
        let point = r#"{"type": "Point", "coordinates": [1.0, 1.0]}"#;
        assert!(StudyArea::from_geojson_str(point).is_err());
    }
}
