//! Windowed per-pixel iteration over a label raster and its spectral stack
//!
//! Rasters are walked in full-width row blocks. For each block, every band
//! row is pulled in bulk through [`SpectralAccess::read_band_row`] and the
//! callback then sees one pixel at a time with all of its band values.

use crate::error::Result;
use crate::raster::{LabelAccess, SpectralAccess};

/// Rows per window when the caller has no preference
pub const DEFAULT_BLOCK_ROWS: usize = 256;

/// A full-width block of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// First row of the block in the source raster
    pub row_offset: usize,
    /// Number of rows in the block
    pub rows: usize,
    /// Number of columns (always the raster width)
    pub cols: usize,
}

/// Iterator over row-block windows covering a raster exactly once
#[derive(Debug, Clone)]
pub struct WindowIterator {
    total_rows: usize,
    total_cols: usize,
    block_rows: usize,
    current_row: usize,
}

impl WindowIterator {
    pub fn new(total_rows: usize, total_cols: usize, block_rows: usize) -> Self {
        Self {
            total_rows,
            total_cols,
            block_rows: block_rows.max(1),
            current_row: 0,
        }
    }
}

impl Iterator for WindowIterator {
    type Item = Window;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.total_rows || self.total_cols == 0 {
            return None;
        }

        let rows = self.block_rows.min(self.total_rows - self.current_row);
        let window = Window {
            row_offset: self.current_row,
            rows,
            cols: self.total_cols,
        };
        self.current_row += rows;
        Some(window)
    }
}

/// Visit every pixel of a co-registered label/spectral pair.
///
/// The callback receives `(label, band_values, row, col)`. Fails with
/// `DimensionMismatch` before reading anything if the two rasters differ
/// in shape; an error returned by the callback stops the walk.
pub fn for_each_pixel<L, S, F>(labels: &L, bands: &S, block_rows: usize, mut f: F) -> Result<()>
where
    L: LabelAccess + ?Sized,
    S: SpectralAccess + ?Sized,
    F: FnMut(u32, &[f64], usize, usize) -> Result<()>,
{
    let (rows, cols) = (labels.rows(), labels.cols());
    if bands.rows() != rows || bands.cols() != cols {
        return Err(crate::Error::DimensionMismatch {
            expected_rows: rows,
            expected_cols: cols,
            rows: bands.rows(),
            cols: bands.cols(),
        });
    }

    let n_bands = bands.band_count();
    let block_rows = block_rows.clamp(1, rows.max(1));
    // block buffer laid out as [band][local_row][col]
    let mut block = vec![0.0; n_bands * block_rows * cols];
    let mut pixel = vec![0.0; n_bands];

    for window in WindowIterator::new(rows, cols, block_rows) {
        for b in 0..n_bands {
            for local in 0..window.rows {
                let start = (b * block_rows + local) * cols;
                bands.read_band_row(b, window.row_offset + local, &mut block[start..start + cols]);
            }
        }

        for local in 0..window.rows {
            let row = window.row_offset + local;
            for col in 0..cols {
                for (b, v) in pixel.iter_mut().enumerate() {
                    *v = block[(b * block_rows + local) * cols + col];
                }
                f(labels.label(row, col), &pixel, row, col)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{BandStack, Raster};
    use crate::Error;

    #[test]
    fn test_window_coverage() {
        let windows: Vec<_> = WindowIterator::new(10, 4, 3).collect();
        assert_eq!(windows.len(), 4);
        assert_eq!(windows[0].row_offset, 0);
        assert_eq!(windows[3].row_offset, 9);
        assert_eq!(windows[3].rows, 1);
        assert_eq!(windows.iter().map(|w| w.rows).sum::<usize>(), 10);
    }

    #[test]
    fn test_empty_raster_has_no_windows() {
        assert_eq!(WindowIterator::new(0, 5, 4).count(), 0);
        assert_eq!(WindowIterator::new(5, 0, 4).count(), 0);
    }

    #[test]
    fn test_for_each_pixel_visits_all_cells() {
        let mut labels: Raster<u32> = Raster::new(5, 3);
        let mut stack = BandStack::new(2, 5, 3);
        for r in 0..5 {
            for c in 0..3 {
                labels.set(r, c, (r * 3 + c) as u32).unwrap();
                stack.set(0, r, c, r as f64).unwrap();
                stack.set(1, r, c, c as f64).unwrap();
            }
        }

        let mut seen = 0;
        for_each_pixel(&labels, &stack, 2, |label, px, row, col| {
            assert_eq!(label, (row * 3 + col) as u32);
            assert_eq!(px, &[row as f64, col as f64]);
            seen += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, 15);
    }

    #[test]
    fn test_for_each_pixel_dimension_mismatch() {
        let labels: Raster<u32> = Raster::new(4, 4);
        let stack = BandStack::new(1, 4, 5);
        let result = for_each_pixel(&labels, &stack, DEFAULT_BLOCK_ROWS, |_, _, _, _| Ok(()));
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_callback_error_stops_walk() {
        let labels: Raster<u32> = Raster::new(3, 3);
        let stack = BandStack::new(1, 3, 3);
        let mut calls = 0;
        let result = for_each_pixel(&labels, &stack, 1, |_, _, _, _| {
            calls += 1;
            if calls == 2 {
                return Err(Error::Other("stop".into()));
            }
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(calls, 2);
    }
}
