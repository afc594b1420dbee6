//! Clump table: per-label pixel lists and spectral sums
//!
//! Built once per elimination run in a single windowed pass over the label
//! raster and its spectral stack. Slot `i` holds clump id `i`; slot 0 is the
//! background and is never populated.

use serde::{Deserialize, Serialize};
use terraclump_core::raster::{for_each_pixel, LabelAccess, SpectralAccess, DEFAULT_BLOCK_ROWS};
use terraclump_core::{Error, Result};

/// A member pixel as (row, col)
pub type Pixel = (usize, usize);

/// How a clump's mean vector is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeanMode {
    /// Store the mean and refresh it on every merge
    #[default]
    Tracked,
    /// Derive the mean from sum and pixel count whenever it is read
    OnDemand,
}

/// One region of the segmentation
#[derive(Debug, Clone, Default)]
pub struct Clump {
    id: u32,
    pixels: Vec<Pixel>,
    band_sum: Vec<f64>,
    band_mean: Option<Vec<f64>>,
    active: bool,
}

impl Clump {
    fn new(id: u32, bands: usize, mean_mode: MeanMode) -> Self {
        Self {
            id,
            pixels: Vec::new(),
            band_sum: vec![0.0; bands],
            band_mean: match mean_mode {
                MeanMode::Tracked => Some(vec![0.0; bands]),
                MeanMode::OnDemand => None,
            },
            active: true,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Number of member pixels
    pub fn size(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn band_sum(&self) -> &[f64] {
        &self.band_sum
    }

    pub fn band_count(&self) -> usize {
        self.band_sum.len()
    }

    /// Mean of one band over the member pixels
    pub fn mean(&self, band: usize) -> f64 {
        match &self.band_mean {
            Some(mean) => mean[band],
            None if self.pixels.is_empty() => 0.0,
            None => self.band_sum[band] / self.pixels.len() as f64,
        }
    }

    /// Mean vector over all bands
    pub fn means(&self) -> Vec<f64> {
        (0..self.band_count()).map(|b| self.mean(b)).collect()
    }

    fn add_pixel(&mut self, pixel: Pixel, values: &[f64]) {
        self.pixels.push(pixel);
        for (sum, v) in self.band_sum.iter_mut().zip(values) {
            *sum += v;
        }
    }

    fn refresh_mean(&mut self) {
        if let Some(mean) = self.band_mean.as_mut() {
            let n = self.pixels.len();
            for (m, s) in mean.iter_mut().zip(&self.band_sum) {
                *m = if n == 0 { 0.0 } else { s / n as f64 };
            }
        }
    }

    /// Take over another clump's pixels and sums
    pub(crate) fn absorb(&mut self, pixels: Vec<Pixel>, band_sum: &[f64]) {
        if self.pixels.is_empty() {
            self.pixels = pixels;
        } else {
            self.pixels.extend(pixels);
        }
        for (sum, v) in self.band_sum.iter_mut().zip(band_sum) {
            *sum += v;
        }
        self.refresh_mean();
    }

    /// Deactivate and hand back the pixel list and sums, releasing this
    /// clump's storage
    pub(crate) fn release(&mut self) -> (Vec<Pixel>, Vec<f64>) {
        self.active = false;
        self.band_mean = None;
        (
            std::mem::take(&mut self.pixels),
            std::mem::take(&mut self.band_sum),
        )
    }
}

/// Dense id -> clump mapping, sized once and never resized
#[derive(Debug, Clone)]
pub struct ClumpTable {
    clumps: Vec<Clump>,
    band_count: usize,
    mean_mode: MeanMode,
}

impl ClumpTable {
    /// Build the table with capacity taken from the label raster's largest id
    pub fn build<L, S>(labels: &L, bands: &S, mean_mode: MeanMode) -> Result<Self>
    where
        L: LabelAccess + ?Sized,
        S: SpectralAccess + ?Sized,
    {
        Self::build_with_capacity(labels, bands, labels.max_label(), mean_mode, DEFAULT_BLOCK_ROWS)
    }

    /// Build the table for ids `1..=capacity`.
    ///
    /// Fails with `DimensionMismatch` if the rasters are not co-registered and
    /// with `LabelOutOfRange` if a label exceeds `capacity`. Ids that own no
    /// pixels keep an empty, inactive slot.
    pub fn build_with_capacity<L, S>(
        labels: &L,
        bands: &S,
        capacity: u32,
        mean_mode: MeanMode,
        block_rows: usize,
    ) -> Result<Self>
    where
        L: LabelAccess + ?Sized,
        S: SpectralAccess + ?Sized,
    {
        let (rows, cols) = (labels.rows(), labels.cols());
        if bands.rows() != rows || bands.cols() != cols {
            return Err(Error::DimensionMismatch {
                expected_rows: rows,
                expected_cols: cols,
                rows: bands.rows(),
                cols: bands.cols(),
            });
        }

        let band_count = bands.band_count();
        let mut clumps: Vec<Clump> = (0..=capacity)
            .map(|id| Clump::new(id, band_count, mean_mode))
            .collect();

        for_each_pixel(labels, bands, block_rows, |label, values, row, col| {
            if label == 0 {
                return Ok(());
            }
            if label > capacity {
                return Err(Error::LabelOutOfRange { label, capacity });
            }
            clumps[label as usize].add_pixel((row, col), values);
            Ok(())
        })?;

        for clump in clumps.iter_mut() {
            if clump.id == 0 || clump.pixels.is_empty() {
                clump.release();
            } else {
                clump.refresh_mean();
            }
        }

        Ok(Self {
            clumps,
            band_count,
            mean_mode,
        })
    }

    /// Largest id the table can hold
    pub fn capacity(&self) -> u32 {
        (self.clumps.len() - 1) as u32
    }

    pub fn band_count(&self) -> usize {
        self.band_count
    }

    pub fn mean_mode(&self) -> MeanMode {
        self.mean_mode
    }

    /// Clump by id; `None` for 0 or ids beyond capacity
    pub fn get(&self, id: u32) -> Option<&Clump> {
        if id == 0 {
            return None;
        }
        self.clumps.get(id as usize)
    }

    pub(crate) fn get_mut(&mut self, id: u32) -> Result<&mut Clump> {
        let capacity = self.capacity();
        if id == 0 || id > capacity {
            return Err(Error::LabelOutOfRange { label: id, capacity });
        }
        Ok(&mut self.clumps[id as usize])
    }

    /// Pixel count of a clump, 0 for unknown or released ids
    pub fn size_of(&self, id: u32) -> usize {
        self.get(id).map_or(0, Clump::size)
    }

    /// Active clumps in ascending id order
    pub fn active(&self) -> impl Iterator<Item = &Clump> + '_ {
        self.clumps.iter().filter(|c| c.active)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Ids of active clumps with `size <= level`, ascending
    pub fn undersized(&self, level: usize) -> Vec<u32> {
        self.active()
            .filter(|c| c.size() <= level)
            .map(Clump::id)
            .collect()
    }

    pub fn undersized_count(&self, level: usize) -> usize {
        self.active().filter(|c| c.size() <= level).count()
    }

    /// Total member pixels over active clumps
    pub fn total_pixels(&self) -> usize {
        self.active().map(Clump::size).sum()
    }

    /// Check the table against the label raster: every active clump's pixels
    /// carry its id, and its mean equals sum / size.
    pub fn validate<L: LabelAccess + ?Sized>(&self, labels: &L) -> Result<()> {
        for clump in self.active() {
            if let Some(&(row, col)) = clump
                .pixels
                .iter()
                .find(|&&(r, c)| labels.label(r, c) != clump.id)
            {
                return Err(Error::Algorithm(format!(
                    "clump {} lists pixel ({}, {}) labelled {}",
                    clump.id,
                    row,
                    col,
                    labels.label(row, col)
                )));
            }
            let n = clump.size() as f64;
            for b in 0..self.band_count {
                let expected = clump.band_sum[b] / n;
                let mean = clump.mean(b);
                if (mean - expected).abs() > 1e-9 * expected.abs().max(1.0) {
                    return Err(Error::Algorithm(format!(
                        "clump {} band {} mean {} != sum/size {}",
                        clump.id, b, mean, expected
                    )));
                }
            }
        }
        Ok(())
    }
}
