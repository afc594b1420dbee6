//! # TerraClump Core
//!
//! Core types, traits and I/O for the TerraClump segmentation toolkit.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid
//! - `BandStack`: Co-registered multi-band spectral raster
//! - `LabelAccess` / `SpectralAccess`: Point and row accessors consumed by algorithms
//! - Windowed per-pixel iteration over label and spectral rasters
//! - Native GeoTIFF I/O and band-stretch statistics files

pub mod error;
pub mod io;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{
    BandStack, GeoTransform, LabelAccess, Raster, RasterElement, SpectralAccess,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{
        BandStack, GeoTransform, LabelAccess, Raster, RasterElement, SpectralAccess,
    };
    pub use crate::Algorithm;
}

/// Core trait for algorithms in TerraClump.
///
/// Algorithms transform input data according to parameters. Algorithms that
/// rewrite a raster in place take a mutable reference as their input.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
