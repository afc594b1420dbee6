//! Main Raster type

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::{Array2, ArrayView1};

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a row-major grid with an
/// associated transform and optional no-data value. Segmentations are
/// `Raster<u32>` (0 is background), spectral bands are `Raster<f64>`.
///
/// # Example
///
/// ```
/// use terraclump_core::Raster;
///
/// let mut labels: Raster<u32> = Raster::new(4, 4);
/// labels.set(1, 2, 7).unwrap();
/// assert_eq!(labels.get(1, 2).unwrap(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    transform: GeoTransform,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a zeroed raster of another type sharing this raster's transform
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            nodata: None,
        }
    }

    // Dimensions

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fail with `DimensionMismatch` unless this raster is `rows` x `cols`
    pub fn ensure_shape(&self, rows: usize, cols: usize) -> Result<()> {
        if self.shape() != (rows, cols) {
            return Err(Error::DimensionMismatch {
                expected_rows: rows,
                expected_cols: cols,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(())
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Get a row view
    pub fn row(&self, row: usize) -> Result<ArrayView1<'_, T>> {
        if row >= self.rows() {
            return Err(Error::IndexOutOfBounds {
                row,
                col: 0,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(self.data.row(row))
    }

    // Metadata

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    // Statistics

    /// Range, mean and valid-cell count, skipping no-data
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut stats = RasterStatistics {
            min: None,
            max: None,
            mean: None,
            valid_count: 0,
            nodata_count: 0,
        };
        let mut sum = 0.0;

        for &value in self.data.iter().filter(|v| !self.is_nodata(**v)) {
            let Some(v) = value.to_f64().filter(|v| !v.is_nan()) else {
                continue;
            };
            stats.min = Some(match stats.min {
                Some(m) if m <= value => m,
                _ => value,
            });
            stats.max = Some(match stats.max {
                Some(m) if m >= value => m,
                _ => value,
            });
            sum += v;
            stats.valid_count += 1;
        }

        stats.nodata_count = self.len() - stats.valid_count;
        if stats.valid_count > 0 {
            stats.mean = Some(sum / stats.valid_count as f64);
        }
        stats
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f32> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<u32> = Raster::new(10, 10);
        raster.set(5, 5, 42).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42);
        assert!(raster.get(10, 0).is_err());
        assert!(raster.set(0, 10, 1).is_err());
    }

    #[test]
    fn test_from_vec_wrong_length() {
        let result: Result<Raster<u32>> = Raster::from_vec(vec![1, 2, 3], 2, 2);
        assert!(matches!(result, Err(Error::InvalidDimensions { .. })));
    }

    #[test]
    fn test_ensure_shape() {
        let raster: Raster<u32> = Raster::new(3, 4);
        assert!(raster.ensure_shape(3, 4).is_ok());
        match raster.ensure_shape(4, 4) {
            Err(Error::DimensionMismatch { expected_rows, rows, .. }) => {
                assert_eq!(expected_rows, 4);
                assert_eq!(rows, 3);
            }
            other => panic!("expected DimensionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_raster_statistics() {
        let mut raster: Raster<f32> = Raster::new(10, 10);
        for i in 0..10 {
            for j in 0..10 {
                raster.set(i, j, (i * 10 + j) as f32).unwrap();
            }
        }

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(stats.max, Some(99.0));
        assert_eq!(stats.valid_count, 100);
    }

    #[test]
    fn test_label_statistics_skip_background() {
        let mut labels: Raster<u32> = Raster::new(2, 2);
        labels.set_nodata(Some(0));
        labels.set(0, 0, 3).unwrap();
        labels.set(1, 1, 9).unwrap();

        let stats = labels.statistics();
        assert_eq!(stats.min, Some(3));
        assert_eq!(stats.max, Some(9));
        assert_eq!(stats.valid_count, 2);
        assert_eq!(stats.nodata_count, 2);
    }
}
