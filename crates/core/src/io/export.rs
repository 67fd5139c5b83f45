//! Batch export of a series, one GeoTIFF per frame

use crate::error::{Error, Result};
use crate::io::geotiff::write_frame;
use crate::raster::{RasterFrame, RasterSeries};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Substitute `{property}` placeholders in `pattern` with frame properties.
///
/// `"WF_{yearMonth}"` on a frame tagged `yearMonth = "2018-03"` gives
/// `"WF_2018-03"`. An unknown property or an unclosed brace is an error.
pub fn render_name(pattern: &str, frame: &RasterFrame) -> Result<String> {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let close = rest[open..].find('}').ok_or_else(|| Error::InvalidParameter {
            name: "pattern",
            value: pattern.to_string(),
            reason: "unclosed '{'".into(),
        })?;
        let key = &rest[open + 1..open + close];
        let value = frame
            .property(key)
            .ok_or_else(|| Error::MissingProperty(key.to_string()))?;
        out.push_str(&value.to_string());
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Write every frame of `series` to `dir/<rendered pattern>.tif`.
///
/// The first failing write aborts the batch; files already written stay.
pub fn export_series(series: &RasterSeries, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(series.len());
    for frame in series {
        let name = render_name(pattern, frame)?;
        let path = dir.join(format!("{}.tif", name));
        write_frame(frame, &path).map_err(|e| Error::Export {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        debug!("Wrote {}", path.display());
        written.push(path);
    }

    info!("Exported {} frames matching '{}'", written.len(), pattern);
    Ok(written)
}
