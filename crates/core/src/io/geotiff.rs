//! Native GeoTIFF reading/writing with the `tiff` crate
//!
//! Frames are stored as multi-page TIFFs: one page per band, the band name
//! in the page's `ImageDescription` tag. Georeferencing uses the
//! ModelPixelScale/ModelTiepoint tags plus a minimal GeoKey directory that
//! records the EPSG code when the raster carries one. Cells equal to the
//! `GDAL_NODATA` value of a page are read as `NaN`.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterFrame};
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray64Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tracing::warn;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// Read the first page of a GeoTIFF as a single raster
pub fn read_geotiff<P: AsRef<Path>>(path: P) -> Result<Raster> {
    let file = File::open(path.as_ref())?;
    let mut decoder = Decoder::new(file)?;
    decode_page(&mut decoder)
}

/// Read every page of a GeoTIFF as the bands of one frame
pub fn read_frame<P: AsRef<Path>>(path: P) -> Result<RasterFrame> {
    let file = File::open(path.as_ref())?;
    decode_frame(file)
}

/// Same as [`read_frame`] but from an in-memory buffer
pub fn read_frame_from_buffer(data: &[u8]) -> Result<RasterFrame> {
    decode_frame(Cursor::new(data))
}

fn decode_frame<R: Read + Seek>(reader: R) -> Result<RasterFrame> {
    let mut decoder = Decoder::new(reader)?;
    let mut frame = RasterFrame::new();
    let mut index = 0usize;

    loop {
        let name = decoder
            .get_tag_ascii_string(Tag::ImageDescription)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("b{}", index + 1));
        let raster = decode_page(&mut decoder)?;
        frame = frame.with_band(name.trim(), raster);
        index += 1;

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    Ok(frame)
}

/// Decode the current page into an `f64` raster
fn decode_page<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Raster> {
    let (width, height) = decoder.dimensions()?;
    let rows = height as usize;
    let cols = width as usize;

    let image = decoder.read_image()?;
    // f32 pages store the fill value at single precision
    let single = matches!(image, DecodingResult::F32(_));
    let nodata = read_nodata(decoder).map(|v| if single { f64::from(v as f32) } else { v });

    let mut data: Vec<f64> = match image {
        DecodingResult::F64(buf) => buf,
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U8(buf) => to_f64(buf),
        DecodingResult::U16(buf) => to_f64(buf),
        DecodingResult::U32(buf) => to_f64(buf),
        DecodingResult::I8(buf) => to_f64(buf),
        DecodingResult::I16(buf) => to_f64(buf),
        DecodingResult::I32(buf) => to_f64(buf),
        _ => return Err(Error::Tiff("unsupported TIFF pixel format".into())),
    };
    if let Some(nodata) = nodata {
        data.iter_mut()
            .filter(|v| **v == nodata)
            .for_each(|v| *v = f64::NAN);
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;
    if let Some(transform) = read_geotransform(decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_crs(decoder));
    Ok(raster)
}

fn to_f64<T: num_traits::ToPrimitive>(buf: Vec<T>) -> Vec<f64> {
    buf.into_iter()
        .map(|v| v.to_f64().unwrap_or(f64::NAN))
        .collect()
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    decoder
        .get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA))
        .ok()?
        .trim_end_matches('\0')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))
        .ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT)).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }
    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder
        .get_tag_u16_vec(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))
        .ok()?;
    // header: version, revision, minor, key count; then 4 shorts per key
    let count = *keys.get(3)? as usize;
    keys.get(4..4 + count * 4)?
        .chunks_exact(4)
        .find_map(|entry| match (entry[0], entry[1], entry[3]) {
            (PROJECTED_CS_TYPE_KEY, 0, code) => Some(CRS::projected(u32::from(code))),
            (GEOGRAPHIC_TYPE_KEY, 0, code) => Some(CRS::geographic(u32::from(code))),
            _ => None,
        })
}

/// Write every band of `frame` as one page of a GeoTIFF
pub fn write_frame<P: AsRef<Path>>(frame: &RasterFrame, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode_frame(frame, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Same as [`write_frame`] but returns the encoded bytes
pub fn write_frame_to_buffer(frame: &RasterFrame) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_frame(frame, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_frame<W: Write + Seek>(frame: &RasterFrame, writer: W) -> Result<()> {
    if frame.bands().is_empty() {
        return Err(Error::Tiff("cannot write a frame without bands".into()));
    }

    let mut encoder = TiffEncoder::new(writer)?;

    for band in frame.bands() {
        let raster = &band.raster;
        let (rows, cols) = raster.shape();
        let data: Vec<f64> = raster.data().iter().copied().collect();

        let mut image = encoder.new_image::<Gray64Float>(cols as u32, rows as u32)?;
        let gt = raster.transform();

        image
            .encoder()
            .write_tag(Tag::ImageDescription, band.name.as_str())?;
        image.encoder().write_tag(
            Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE),
            &[gt.pixel_width, gt.pixel_height.abs(), 0.0][..],
        )?;
        image.encoder().write_tag(
            Tag::from_u16_exhaustive(MODEL_TIEPOINT),
            &[0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0][..],
        )?;
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY), geo_keys(raster.crs()).as_slice())?;

        image.write_data(&data)?;
    }

    Ok(())
}

fn geo_keys(crs: Option<&CRS>) -> Vec<u16> {
    let code = crs.and_then(|c| match u16::try_from(c.epsg()) {
        Ok(code) => Some(code),
        Err(_) => {
            warn!("{} does not fit a GeoKey short, writing without a CRS", c);
            None
        }
    });
    let geographic = crs.is_some_and(|c| c.is_geographic());

    let model_type = if geographic {
        MODEL_TYPE_GEOGRAPHIC
    } else {
        MODEL_TYPE_PROJECTED
    };
    let mut keys = vec![
        1, 1, 0, 2,
        GT_MODEL_TYPE_KEY, 0, 1, model_type,
        GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA,
    ];
    if let Some(code) = code {
        let key = if geographic {
            GEOGRAPHIC_TYPE_KEY
        } else {
            PROJECTED_CS_TYPE_KEY
        };
        keys.extend_from_slice(&[key, 0, 1, code]);
        keys[3] = 3;
    }
    keys
}
