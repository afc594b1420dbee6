//! Spectral distance between clumps

use super::clump_table::Clump;
use serde::{Deserialize, Serialize};
use terraclump_core::io::BandStretchStats;
use terraclump_core::{Error, Result};

/// Per-band affine map from stretched pixel values to physical units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandRescale {
    pub offset: f64,
    pub gain: f64,
}

impl BandRescale {
    pub fn new(offset: f64, gain: f64) -> Self {
        Self { offset, gain }
    }

    pub fn apply(&self, value: f64) -> f64 {
        self.offset + value * self.gain
    }

    /// Derive one rescale per band from stretch statistics.
    ///
    /// Entries are matched to bands by their band index, which must cover
    /// `1..=band_count` exactly once. A wrong entry count is a
    /// `BandCountMismatch`; a repeated index is a `Parse` error; an index
    /// outside the stack is a `BandCountMismatch` naming that index.
    pub fn from_stretch_stats(stats: &[BandStretchStats], band_count: usize) -> Result<Vec<Self>> {
        if stats.len() != band_count {
            return Err(Error::BandCountMismatch {
                expected: band_count,
                actual: stats.len(),
            });
        }

        let mut slots: Vec<Option<Self>> = vec![None; band_count];
        for (i, s) in stats.iter().enumerate() {
            let slot = s
                .band
                .checked_sub(1)
                .and_then(|b| slots.get_mut(b))
                .ok_or_else(|| Error::BandCountMismatch {
                    expected: band_count,
                    actual: s.band,
                })?;
            if slot.is_some() {
                return Err(Error::Parse {
                    line: i + 1,
                    reason: format!("band {} listed twice", s.band),
                });
            }
            let (offset, gain) = s.offset_gain();
            *slot = Some(Self::new(offset, gain));
        }

        // every slot is filled: band_count distinct indices in 1..=band_count
        Ok(slots.into_iter().flatten().collect())
    }
}

/// How per-band differences are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMetric {
    /// `sqrt(sum_b d_b^2)`
    #[default]
    Euclidean,
    /// `sqrt(sum_b d_b^2 / bands)`, comparable across band counts
    BandNormalized,
}

/// Euclidean distance between clump mean vectors, optionally in physical units
#[derive(Debug, Clone, Default)]
pub struct DistanceEvaluator {
    metric: DistanceMetric,
    rescale: Option<Vec<BandRescale>>,
}

impl DistanceEvaluator {
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            rescale: None,
        }
    }

    /// Map each band mean through `rescale` before differencing
    pub fn with_rescale(mut self, rescale: Vec<BandRescale>) -> Self {
        self.rescale = Some(rescale);
        self
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn rescale(&self) -> Option<&[BandRescale]> {
        self.rescale.as_deref()
    }

    /// Distance between the current means of two clumps
    pub fn between(&self, a: &Clump, b: &Clump) -> f64 {
        let bands = a.band_count().min(b.band_count());
        self.combine((0..bands).map(|band| (band, a.mean(band), b.mean(band))), bands)
    }

    /// Distance between two mean vectors
    pub fn between_means(&self, a: &[f64], b: &[f64]) -> f64 {
        let bands = a.len().min(b.len());
        self.combine(
            a.iter().zip(b).enumerate().map(|(band, (&x, &y))| (band, x, y)),
            bands,
        )
    }

    fn combine(&self, values: impl Iterator<Item = (usize, f64, f64)>, bands: usize) -> f64 {
        let sum_sq: f64 = values
            .map(|(band, x, y)| {
                // bands without a rescale entry stay in stored units
                let (x, y) = match self.rescale.as_ref().and_then(|r| r.get(band)) {
                    Some(r) => (r.apply(x), r.apply(y)),
                    None => (x, y),
                };
                (x - y) * (x - y)
            })
            .sum();

        match self.metric {
            DistanceMetric::Euclidean => sum_sq.sqrt(),
            DistanceMetric::BandNormalized if bands > 0 => (sum_sq / bands as f64).sqrt(),
            DistanceMetric::BandNormalized => 0.0,
        }
    }
}
