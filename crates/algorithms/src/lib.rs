//! # TerraClump Algorithms
//!
//! Segmentation algorithms operating on label rasters and their
//! co-registered spectral stacks.
//!
//! ## Available Algorithms
//!
//! - **segmentation::clump**: connected-component labelling of a categorical raster
//! - **segmentation::eliminate**: iterative small clump elimination by spectral merging
//! - **segmentation::relabel**: compact label ids to 1..=n

pub mod segmentation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::segmentation::{
        clump, eliminate_small_clumps, relabel_sequential, BandRescale, ClumpParams, ClumpTable,
        DistanceMetric, EliminateParams, EliminateSmallClumps, EliminationReport, Eliminator,
        MeanMode, MergeDirective, Schedule,
    };
    pub use terraclump_core::prelude::*;
}
