//! I/O for rasters and auxiliary files

mod native;
mod stretch;

pub use native::{
    read_band_stack, read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer,
    write_label_geotiff, write_label_geotiff_to_buffer,
};
pub use stretch::{parse_stretch_stats, read_stretch_stats, BandStretchStats};
