//! Multi-band spectral raster

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use ndarray::{s, Array3, ArrayView2, Axis};

/// A co-registered stack of spectral bands.
///
/// Values are stored band-sequential as `(band, row, col)` so a band row is
/// a contiguous slice, which is what the windowed reader pulls in bulk.
#[derive(Debug, Clone)]
pub struct BandStack {
    data: Array3<f64>,
    transform: GeoTransform,
}

impl BandStack {
    /// Create a zero-filled stack
    pub fn new(bands: usize, rows: usize, cols: usize) -> Self {
        Self::from_array(Array3::zeros((bands, rows, cols)))
    }

    pub fn from_array(data: Array3<f64>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
        }
    }

    /// Stack single-band rasters. All bands must share the first band's shape;
    /// the first band's transform is kept.
    pub fn from_rasters(bands: &[Raster<f64>]) -> Result<Self> {
        let first = bands
            .first()
            .ok_or_else(|| Error::Algorithm("Band stack needs at least one band".into()))?;
        let (rows, cols) = first.shape();

        let mut data = Array3::zeros((bands.len(), rows, cols));
        for (b, band) in bands.iter().enumerate() {
            band.ensure_shape(rows, cols)?;
            data.index_axis_mut(Axis(0), b).assign(band.data());
        }

        Ok(Self {
            data,
            transform: *first.transform(),
        })
    }

    /// Build from band-interleaved-by-pixel samples (`samples` values per cell)
    pub fn from_interleaved(values: &[f64], samples: usize, rows: usize, cols: usize) -> Result<Self> {
        if samples == 0 || values.len() != samples * rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        let mut data = Array3::zeros((samples, rows, cols));
        for (cell, pixel) in values.chunks_exact(samples).enumerate() {
            let (r, c) = (cell / cols, cell % cols);
            for (b, &v) in pixel.iter().enumerate() {
                data[(b, r, c)] = v;
            }
        }
        Ok(Self::from_array(data))
    }

    pub fn band_count(&self) -> usize {
        self.data.dim().0
    }

    pub fn rows(&self) -> usize {
        self.data.dim().1
    }

    pub fn cols(&self) -> usize {
        self.data.dim().2
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// View of a single band
    pub fn band(&self, band: usize) -> Result<ArrayView2<'_, f64>> {
        if band >= self.band_count() {
            return Err(Error::BandCountMismatch {
                expected: band + 1,
                actual: self.band_count(),
            });
        }
        Ok(self.data.index_axis(Axis(0), band))
    }

    pub fn set(&mut self, band: usize, row: usize, col: usize, value: f64) -> Result<()> {
        let (bands, rows, cols) = self.data.dim();
        if band >= bands || row >= rows || col >= cols {
            return Err(Error::IndexOutOfBounds { row, col, rows, cols });
        }
        self.data[(band, row, col)] = value;
        Ok(())
    }

    /// All band values of one pixel
    pub fn pixel(&self, row: usize, col: usize) -> Vec<f64> {
        self.data.slice(s![.., row, col]).to_vec()
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rasters() {
        let a = Raster::filled(2, 3, 1.0);
        let b = Raster::filled(2, 3, 2.0);
        let stack = BandStack::from_rasters(&[a, b]).unwrap();

        assert_eq!(stack.band_count(), 2);
        assert_eq!(stack.shape(), (2, 3));
        assert_eq!(stack.pixel(1, 2), vec![1.0, 2.0]);
    }

    #[test]
    fn test_from_rasters_shape_mismatch() {
        let a = Raster::filled(2, 3, 1.0);
        let b = Raster::filled(3, 3, 2.0);
        let result = BandStack::from_rasters(&[a, b]);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_from_rasters_empty() {
        assert!(BandStack::from_rasters(&[]).is_err());
    }

    #[test]
    fn test_from_interleaved() {
        // 1 row, 2 cols, 3 samples
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let stack = BandStack::from_interleaved(&values, 3, 1, 2).unwrap();
        assert_eq!(stack.band_count(), 3);
        assert_eq!(stack.pixel(0, 0), vec![1.0, 2.0, 3.0]);
        assert_eq!(stack.pixel(0, 1), vec![4.0, 5.0, 6.0]);
        assert_eq!(stack.band(2).unwrap()[(0, 1)], 6.0);
    }

    #[test]
    fn test_band_out_of_range() {
        let stack = BandStack::new(2, 2, 2);
        assert!(matches!(
            stack.band(2),
            Err(Error::BandCountMismatch { expected: 3, actual: 2 })
        ));
    }
}
