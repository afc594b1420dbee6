//! Merge planning
//!
//! For each undersized clump, pick the spectrally nearest neighbor that is
//! strictly larger. Planning only reads the table and the label raster, so a
//! whole batch is computed against the state before any of it is applied.

use super::clump_table::{Clump, ClumpTable};
use super::distance::DistanceEvaluator;
use super::neighbors::collect_neighbors;
use serde::{Deserialize, Serialize};
use terraclump_core::raster::LabelAccess;

/// Merge `source` into `target`. Only meaningful within the pass that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeDirective {
    pub source: u32,
    pub target: u32,
}

impl MergeDirective {
    pub fn new(source: u32, target: u32) -> Self {
        Self { source, target }
    }
}

/// Nearest strictly-larger neighbor of `clump` and its distance.
///
/// `neighbors` must be the clump's sorted neighbor ids. Equal distances keep
/// the first candidate in that order, i.e. the lowest id. Candidates at a
/// non-finite distance (NaN band means) are never chosen.
pub fn best_target(
    table: &ClumpTable,
    clump: &Clump,
    neighbors: &[u32],
    evaluator: &DistanceEvaluator,
) -> Option<(u32, f64)> {
    let mut best: Option<(u32, f64)> = None;

    for &id in neighbors {
        let Some(candidate) = table.get(id) else {
            continue;
        };
        if !candidate.is_active() || candidate.size() <= clump.size() {
            continue;
        }

        let dist = evaluator.between(clump, candidate);
        if !dist.is_finite() {
            continue;
        }
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((id, dist));
        }
    }

    best
}

/// Plan one pass: a directive for every candidate whose best target is
/// closer than `spec_threshold`.
///
/// Candidates that are inactive or empty are skipped. Directives come out in
/// candidate order.
pub fn plan_merges<L: LabelAccess + ?Sized>(
    table: &ClumpTable,
    labels: &L,
    candidates: &[u32],
    evaluator: &DistanceEvaluator,
    spec_threshold: f64,
) -> Vec<MergeDirective> {
    let mut directives = Vec::new();
    let mut neighbors = Vec::new();

    for &id in candidates {
        let Some(clump) = table.get(id) else {
            continue;
        };
        if !clump.is_active() || clump.size() == 0 {
            continue;
        }

        collect_neighbors(labels, clump, &mut neighbors);
        if let Some((target, dist)) = best_target(table, clump, &neighbors, evaluator) {
            if dist < spec_threshold {
                directives.push(MergeDirective::new(id, target));
            }
        }
    }

    directives
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::clump_table::MeanMode;
    use terraclump_core::{BandStack, Raster};

    /// Single-band stack where every pixel of label `l` has value `value(l)`
    fn stack_from(labels: &Raster<u32>, value: impl Fn(u32) -> f64) -> BandStack {
        let (rows, cols) = labels.shape();
        let mut stack = BandStack::new(1, rows, cols);
        for r in 0..rows {
            for c in 0..cols {
                stack.set(0, r, c, value(labels.get(r, c).unwrap())).unwrap();
            }
        }
        stack
    }

    #[test]
    fn test_picks_nearest_larger_neighbor() {
        // 2 2 2 3
        // 2 5 3 3
        // 2 2 3 3
        let labels = Raster::from_vec(vec![2, 2, 2, 3, 2, 5, 3, 3, 2, 2, 3, 3], 3, 4).unwrap();
        let stack = stack_from(&labels, |l| match l {
            2 => 10.0,
            3 => 4.0,
            _ => 5.0,
        });
        let table = ClumpTable::build(&labels, &stack, MeanMode::Tracked).unwrap();

        let directives = plan_merges(&table, &labels, &[5], &DistanceEvaluator::default(), 100.0);
        assert_eq!(directives, vec![MergeDirective::new(5, 3)]);
    }

    #[test]
    fn test_only_strictly_larger_neighbors_qualify() {
        // 1 2 2
        let labels = Raster::from_vec(vec![1, 2, 2], 1, 3).unwrap();
        let stack = stack_from(&labels, |_| 0.0);
        let table = ClumpTable::build(&labels, &stack, MeanMode::Tracked).unwrap();

        // 2 has no larger neighbor, 1 does
        let directives =
            plan_merges(&table, &labels, &[1, 2], &DistanceEvaluator::default(), 1.0);
        assert_eq!(directives, vec![MergeDirective::new(1, 2)]);

        // equal sizes never merge
        let labels = Raster::from_vec(vec![1, 2], 1, 2).unwrap();
        let stack = stack_from(&labels, |_| 0.0);
        let table = ClumpTable::build(&labels, &stack, MeanMode::Tracked).unwrap();
        assert!(plan_merges(&table, &labels, &[1, 2], &DistanceEvaluator::default(), 1.0).is_empty());
    }

    #[test]
    fn test_threshold_is_strict() {
        // 1 2 2
        let labels = Raster::from_vec(vec![1, 2, 2], 1, 3).unwrap();
        let stack = stack_from(&labels, |l| if l == 1 { 0.0 } else { 0.5 });
        let table = ClumpTable::build(&labels, &stack, MeanMode::Tracked).unwrap();
        let eval = DistanceEvaluator::default();

        assert!(plan_merges(&table, &labels, &[1], &eval, 0.5).is_empty());
        assert_eq!(plan_merges(&table, &labels, &[1], &eval, 0.5001).len(), 1);
    }

    #[test]
    fn test_ties_resolve_to_lowest_id() {
        // 4 4 4
        // 3 1 2
        // 3 3 2
        // 2 2 2
        let labels =
            Raster::from_vec(vec![4, 4, 4, 3, 1, 2, 3, 3, 2, 2, 2, 2], 4, 3).unwrap();
        let stack = stack_from(&labels, |l| if l == 1 { 5.0 } else { 6.0 });
        let table = ClumpTable::build(&labels, &stack, MeanMode::Tracked).unwrap();

        let directives = plan_merges(&table, &labels, &[1], &DistanceEvaluator::default(), 10.0);
        assert_eq!(directives, vec![MergeDirective::new(1, 2)]);
    }

    #[test]
    fn test_nan_neighbor_does_not_block_valid_target() {
        // 2 2 1 3 3 3, clump 2 carries NaN (float no-data) in its band
        let labels = Raster::from_vec(vec![2, 2, 1, 3, 3, 3], 1, 6).unwrap();
        let stack = stack_from(&labels, |l| match l {
            2 => f64::NAN,
            1 => 5.0,
            _ => 5.1,
        });
        let table = ClumpTable::build(&labels, &stack, MeanMode::Tracked).unwrap();
        let eval = DistanceEvaluator::default();

        let (target, dist) = best_target(&table, table.get(1).unwrap(), &[2, 3], &eval).unwrap();
        assert_eq!(target, 3);
        assert!((dist - 0.1).abs() < 1e-9);

        let directives = plan_merges(&table, &labels, &[1], &eval, 1.0);
        assert_eq!(directives, vec![MergeDirective::new(1, 3)]);
    }

    #[test]
    fn test_only_nan_neighbors_gives_no_target() {
        let labels = Raster::from_vec(vec![1, 2, 2], 1, 3).unwrap();
        let stack = stack_from(&labels, |l| if l == 1 { 0.0 } else { f64::NAN });
        let table = ClumpTable::build(&labels, &stack, MeanMode::Tracked).unwrap();
        let eval = DistanceEvaluator::default();
        assert!(best_target(&table, table.get(1).unwrap(), &[2], &eval).is_none());
        assert!(plan_merges(&table, &labels, &[1], &eval, f64::INFINITY).is_empty());
    }

    #[test]
    fn test_best_target_none_without_larger_neighbor() {
        let labels = Raster::from_vec(vec![1, 1, 2], 1, 3).unwrap();
        let stack = stack_from(&labels, |_| 0.0);
        let table = ClumpTable::build(&labels, &stack, MeanMode::Tracked).unwrap();
        let clump = table.get(1).unwrap();
        assert!(best_target(&table, clump, &[2], &DistanceEvaluator::default()).is_none());
    }
}
