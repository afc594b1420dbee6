//! Point and row accessors consumed by region algorithms
//!
//! Segmentation code never touches `Raster` or `BandStack` storage directly;
//! it reads and writes through these traits so callers can hand in any grid
//! that can answer the same questions.

use crate::raster::{BandStack, Raster};

/// Read/write access to a label raster. Label 0 is background.
///
/// Coordinates are `(row, col)` and must be in bounds; implementations may
/// panic otherwise.
pub trait LabelAccess {
    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    fn label(&self, row: usize, col: usize) -> u32;

    fn set_label(&mut self, row: usize, col: usize, label: u32);

    /// Largest label value present, used to size per-label tables
    fn max_label(&self) -> u32;
}

/// Read access to a co-registered multi-band spectral raster
pub trait SpectralAccess {
    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    fn band_count(&self) -> usize;

    /// Write all band values of one pixel into `out` (`out.len() == band_count()`)
    fn read_bands(&self, row: usize, col: usize, out: &mut [f64]);

    /// Bulk read of one band row into `out` (`out.len() == cols()`)
    fn read_band_row(&self, band: usize, row: usize, out: &mut [f64]);
}

impl LabelAccess for Raster<u32> {
    fn rows(&self) -> usize {
        Raster::rows(self)
    }

    fn cols(&self) -> usize {
        Raster::cols(self)
    }

    fn label(&self, row: usize, col: usize) -> u32 {
        self.data()[(row, col)]
    }

    fn set_label(&mut self, row: usize, col: usize, label: u32) {
        self.data_mut()[(row, col)] = label;
    }

    fn max_label(&self) -> u32 {
        self.data().iter().copied().max().unwrap_or(0)
    }
}

impl SpectralAccess for BandStack {
    fn rows(&self) -> usize {
        BandStack::rows(self)
    }

    fn cols(&self) -> usize {
        BandStack::cols(self)
    }

    fn band_count(&self) -> usize {
        BandStack::band_count(self)
    }

    fn read_bands(&self, row: usize, col: usize, out: &mut [f64]) {
        for (b, v) in out.iter_mut().enumerate() {
            *v = self.data()[(b, row, col)];
        }
    }

    fn read_band_row(&self, band: usize, row: usize, out: &mut [f64]) {
        let src = self.data().slice(ndarray::s![band, row, ..]);
        for (dst, &v) in out.iter_mut().zip(src.iter()) {
            *dst = v;
        }
    }
}

/// A single-band float raster is a one-band spectral stack
impl SpectralAccess for Raster<f64> {
    fn rows(&self) -> usize {
        Raster::rows(self)
    }

    fn cols(&self) -> usize {
        Raster::cols(self)
    }

    fn band_count(&self) -> usize {
        1
    }

    fn read_bands(&self, row: usize, col: usize, out: &mut [f64]) {
        out[0] = self.data()[(row, col)];
    }

    fn read_band_row(&self, _band: usize, row: usize, out: &mut [f64]) {
        for (dst, &v) in out.iter_mut().zip(self.data().row(row).iter()) {
            *dst = v;
        }
    }
}
