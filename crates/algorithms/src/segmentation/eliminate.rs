//! Small clump elimination
//!
//! Drives the clump table through size levels `k = 1..=min_clump_size`. At
//! each level every active clump of at most `k` pixels is offered to its
//! nearest strictly-larger neighbor; the batch is applied and, under the
//! iterative schedule, the level is repeated while the pass changed the
//! number of undersized clumps and some remain.
//!
//! Every repeat either lowers the undersized count or plans nothing (which
//! leaves the count unchanged and ends the level), so a run always
//! terminates.

use super::applier::apply_merges;
use super::clump_table::{ClumpTable, MeanMode};
use super::distance::{BandRescale, DistanceEvaluator, DistanceMetric};
use super::planner::{plan_merges, MergeDirective};
use serde::{Deserialize, Serialize};
use terraclump_core::raster::{LabelAccess, SpectralAccess, DEFAULT_BLOCK_ROWS};
use terraclump_core::{Algorithm, BandStack, Error, Raster, Result};
use tracing::{debug, info};

/// How size levels are stepped through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Schedule {
    /// Levels 1..=min size, each repeated until it stops making progress
    #[default]
    Iterative,
    /// Levels 1..=min size, one pass each
    Stepwise,
    /// A single pass at the minimum size
    SinglePass,
}

/// Parameters for small clump elimination
#[derive(Debug, Clone)]
pub struct EliminateParams {
    /// Clumps of at most this many pixels are eliminated (>= 1)
    pub min_clump_size: usize,
    /// Merges need a spectral distance strictly below this (>= 0)
    pub spec_threshold: f64,
    pub schedule: Schedule,
    pub mean_mode: MeanMode,
    pub metric: DistanceMetric,
    /// Per-band (offset, gain) applied to means before distances are taken
    pub rescale: Option<Vec<BandRescale>>,
    /// Stop repeating a level after this many passes
    pub max_passes_per_level: Option<usize>,
    /// Rows per window when building the clump table
    pub block_rows: usize,
}

impl Default for EliminateParams {
    fn default() -> Self {
        Self {
            min_clump_size: 10,
            spec_threshold: f64::INFINITY,
            schedule: Schedule::default(),
            mean_mode: MeanMode::default(),
            metric: DistanceMetric::default(),
            rescale: None,
            max_passes_per_level: None,
            block_rows: DEFAULT_BLOCK_ROWS,
        }
    }
}

impl EliminateParams {
    fn validate(&self, band_count: usize) -> Result<()> {
        if self.min_clump_size == 0 {
            return Err(Error::InvalidParameter {
                name: "min_clump_size",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.spec_threshold.is_nan() || self.spec_threshold < 0.0 {
            return Err(Error::InvalidParameter {
                name: "spec_threshold",
                value: self.spec_threshold.to_string(),
                reason: "must be a non-negative number".into(),
            });
        }
        if self.max_passes_per_level == Some(0) {
            return Err(Error::InvalidParameter {
                name: "max_passes_per_level",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        if let Some(rescale) = &self.rescale {
            if rescale.len() != band_count {
                return Err(Error::BandCountMismatch {
                    expected: band_count,
                    actual: rescale.len(),
                });
            }
        }
        Ok(())
    }
}

/// What one plan/apply pass did at a level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOutcome {
    /// Undersized clumps before the pass
    pub init_count: usize,
    /// Undersized clumps after the pass
    pub post_count: usize,
    pub merges: usize,
}

impl PassOutcome {
    /// The level should be scanned again
    pub fn should_repeat(&self) -> bool {
        self.post_count > 0 && self.post_count != self.init_count
    }
}

/// Summary of one size level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub level: usize,
    pub passes: usize,
    pub merges: usize,
    /// Undersized clumps left when the level was finished
    pub remaining: usize,
}

/// Summary of an elimination run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EliminationReport {
    pub initial_clumps: usize,
    pub final_clumps: usize,
    pub merges: usize,
    pub passes: usize,
    /// Clumps at or below `min_clump_size` that could not be merged
    pub remaining_undersized: usize,
    pub levels: Vec<LevelRecord>,
}

/// Elimination engine: a clump table plus the rules for merging it.
///
/// The label raster is not owned; pass the same raster the engine was built
/// from to every call.
#[derive(Debug, Clone)]
pub struct Eliminator {
    table: ClumpTable,
    evaluator: DistanceEvaluator,
    spec_threshold: f64,
}

impl Eliminator {
    /// Validate parameters and build the clump table
    pub fn new<L, S>(labels: &L, bands: &S, params: &EliminateParams) -> Result<Self>
    where
        L: LabelAccess + ?Sized,
        S: SpectralAccess + ?Sized,
    {
        params.validate(bands.band_count())?;

        let table = ClumpTable::build_with_capacity(
            labels,
            bands,
            labels.max_label(),
            params.mean_mode,
            params.block_rows,
        )?;

        let mut evaluator = DistanceEvaluator::new(params.metric);
        if let Some(rescale) = &params.rescale {
            evaluator = evaluator.with_rescale(rescale.clone());
        }

        debug!(
            clumps = table.active_count(),
            capacity = table.capacity(),
            bands = table.band_count(),
            "Built clump table"
        );

        Ok(Self {
            table,
            evaluator,
            spec_threshold: params.spec_threshold,
        })
    }

    pub fn table(&self) -> &ClumpTable {
        &self.table
    }

    pub fn evaluator(&self) -> &DistanceEvaluator {
        &self.evaluator
    }

    /// Plan merges for all active clumps of at most `level` pixels
    pub fn plan<L: LabelAccess + ?Sized>(&self, labels: &L, level: usize) -> Vec<MergeDirective> {
        let candidates = self.table.undersized(level);
        plan_merges(
            &self.table,
            labels,
            &candidates,
            &self.evaluator,
            self.spec_threshold,
        )
    }

    /// Apply a planned batch
    pub fn apply<L: LabelAccess + ?Sized>(
        &mut self,
        labels: &mut L,
        directives: &[MergeDirective],
    ) -> Result<usize> {
        apply_merges(&mut self.table, labels, directives)
    }

    /// One scan/plan/apply/recheck cycle at `level`
    pub fn pass<L: LabelAccess + ?Sized>(&mut self, labels: &mut L, level: usize) -> Result<PassOutcome> {
        let init_count = self.table.undersized_count(level);
        let directives = self.plan(labels, level);
        let merges = self.apply(labels, &directives)?;
        let post_count = self.table.undersized_count(level);

        debug!(level, init_count, post_count, merges, "Elimination pass");

        Ok(PassOutcome {
            init_count,
            post_count,
            merges,
        })
    }

    /// Run the whole schedule
    pub fn run<L: LabelAccess + ?Sized>(
        &mut self,
        labels: &mut L,
        params: &EliminateParams,
    ) -> Result<EliminationReport> {
        let mut report = EliminationReport {
            initial_clumps: self.table.active_count(),
            ..Default::default()
        };

        let levels = match params.schedule {
            Schedule::SinglePass => params.min_clump_size..=params.min_clump_size,
            Schedule::Iterative | Schedule::Stepwise => 1..=params.min_clump_size,
        };
        let max_passes = match params.schedule {
            Schedule::Iterative => params.max_passes_per_level.unwrap_or(usize::MAX),
            Schedule::Stepwise | Schedule::SinglePass => 1,
        };

        for level in levels {
            let mut record = LevelRecord {
                level,
                passes: 0,
                merges: 0,
                remaining: self.table.undersized_count(level),
            };

            while record.remaining > 0 && record.passes < max_passes {
                let outcome = self.pass(labels, level)?;
                record.passes += 1;
                record.merges += outcome.merges;
                record.remaining = outcome.post_count;
                if !outcome.should_repeat() {
                    break;
                }
            }

            report.passes += record.passes;
            report.merges += record.merges;
            report.levels.push(record);
        }

        report.final_clumps = self.table.active_count();
        report.remaining_undersized = self.table.undersized_count(params.min_clump_size);

        info!(
            initial = report.initial_clumps,
            remaining = report.final_clumps,
            merges = report.merges,
            passes = report.passes,
            undersized = report.remaining_undersized,
            "Small clump elimination finished"
        );

        Ok(report)
    }
}

/// Merge every clump of at most `min_clump_size` pixels into its spectrally
/// nearest strictly-larger neighbor, rewriting `labels` in place.
///
/// # Arguments
/// * `labels` - Segmentation (0 = background); rewritten in place
/// * `bands` - Co-registered spectral stack supplying clump means
/// * `params` - Size/distance thresholds and schedule
///
/// # Errors
/// `DimensionMismatch` if the rasters differ in shape, `BandCountMismatch`
/// if the rescale list does not match the band count, `InvalidParameter`
/// for a zero minimum size or negative threshold.
pub fn eliminate_small_clumps<L, S>(
    labels: &mut L,
    bands: &S,
    params: &EliminateParams,
) -> Result<EliminationReport>
where
    L: LabelAccess + ?Sized,
    S: SpectralAccess + ?Sized,
{
    let mut engine = Eliminator::new(labels, bands, params)?;
    engine.run(labels, params)
}

/// Small clump elimination algorithm
#[derive(Debug, Clone, Default)]
pub struct EliminateSmallClumps;

impl Algorithm for EliminateSmallClumps {
    type Input = (Raster<u32>, BandStack);
    type Output = (Raster<u32>, EliminationReport);
    type Params = EliminateParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Eliminate Small Clumps"
    }

    fn description(&self) -> &'static str {
        "Merge undersized segments into their spectrally nearest larger neighbor"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (mut labels, bands) = input;
        let report = eliminate_small_clumps(&mut labels, &bands, &params)?;
        Ok((labels, report))
    }
}
