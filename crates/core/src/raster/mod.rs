//! Raster data structures, accessors and iteration

mod access;
mod element;
mod geotransform;
mod grid;
mod neighborhood;
mod stack;
mod window;

pub use access::{LabelAccess, SpectralAccess};
pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use neighborhood::{Neighborhood, NeighborIter};
pub use stack::BandStack;
pub use window::{for_each_pixel, Window, WindowIterator, DEFAULT_BLOCK_ROWS};
