//! Reading scenes, writing GeoTIFFs and exporting monthly batches

mod catalog;
mod export;
mod geotiff;

pub use catalog::{Catalog, SceneEntry, StaticEntries};
pub use export::{export_series, render_name};
pub use geotiff::{
    read_frame, read_frame_from_buffer, read_geotiff, write_frame, write_frame_to_buffer,
};
