//! Image segmentation
//!
//! A segmentation is a `Raster<u32>` of region labels (0 = background)
//! co-registered with a multi-band spectral stack. The pipeline is:
//!
//! - **clump**: split a classified raster into connected regions
//! - **eliminate**: merge undersized regions into their spectrally nearest
//!   larger neighbour, level by level, until nothing more can move
//! - **relabel**: compact the surviving ids to 1..=n
//!
//! Elimination never materialises a region adjacency graph. Adjacency is
//! re-derived from the label raster whenever it is needed, and the raster
//! is rewritten as regions merge, so it stays the single source of truth
//! for membership. The per-clump pixel lists in [`ClumpTable`] are a cache
//! kept consistent with it.

mod applier;
mod clump;
mod clump_table;
mod distance;
mod eliminate;
mod neighbors;
mod planner;
mod relabel;

pub use applier::{apply_merges, resolve_chains};
pub use clump::{clump, ClumpParams, Clumping};
pub use clump_table::{Clump, ClumpTable, MeanMode, Pixel};
pub use distance::{BandRescale, DistanceEvaluator, DistanceMetric};
pub use eliminate::{
    eliminate_small_clumps, EliminateParams, EliminateSmallClumps, EliminationReport, Eliminator,
    LevelRecord, PassOutcome, Schedule,
};
pub use neighbors::{collect_neighbors, neighbor_ids};
pub use planner::{best_target, plan_merges, MergeDirective};
pub use relabel::relabel_sequential;
