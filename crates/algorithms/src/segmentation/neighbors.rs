//! Neighbor discovery from the label raster
//!
//! Adjacency is never cached: every query checks the four rook neighbors of
//! each member pixel in the current label raster, so it always reflects the
//! merges applied so far.

use super::clump_table::Clump;
use terraclump_core::raster::{LabelAccess, Neighborhood};

/// Sorted, de-duplicated ids of clumps 4-adjacent to `clump`.
///
/// Background (0) and the clump's own id are excluded.
pub fn neighbor_ids<L: LabelAccess + ?Sized>(labels: &L, clump: &Clump) -> Vec<u32> {
    let mut out = Vec::new();
    collect_neighbors(labels, clump, &mut out);
    out
}

/// Same as [`neighbor_ids`], reusing `out` as the result buffer
pub fn collect_neighbors<L: LabelAccess + ?Sized>(labels: &L, clump: &Clump, out: &mut Vec<u32>) {
    out.clear();
    let (rows, cols) = (labels.rows(), labels.cols());
    let own = clump.id();

    for &(row, col) in clump.pixels() {
        for (nr, nc) in Neighborhood::Rook.neighbors(row, col, rows, cols) {
            let label = labels.label(nr, nc);
            if label != 0 && label != own {
                out.push(label);
            }
        }
    }

    out.sort_unstable();
    out.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::clump_table::{ClumpTable, MeanMode};
    use terraclump_core::{BandStack, Raster};

    fn table_for(labels: &Raster<u32>) -> ClumpTable {
        let stack = BandStack::new(1, labels.rows(), labels.cols());
        ClumpTable::build(labels, &stack, MeanMode::Tracked).unwrap()
    }

    #[test]
    fn test_interior_clump() {
        // 2 2 2
        // 3 5 4
        // 2 2 2
        let labels = Raster::from_vec(vec![2, 2, 2, 3, 5, 4, 2, 2, 2], 3, 3).unwrap();
        let table = table_for(&labels);
        assert_eq!(neighbor_ids(&labels, table.get(5).unwrap()), vec![2, 3, 4]);
    }

    #[test]
    fn test_diagonals_are_not_neighbors() {
        // 1 0
        // 0 2
        let labels = Raster::from_vec(vec![1, 0, 0, 2], 2, 2).unwrap();
        let table = table_for(&labels);
        assert!(neighbor_ids(&labels, table.get(1).unwrap()).is_empty());
    }

    #[test]
    fn test_edges_and_background_skipped() {
        // 7 7 0
        // 7 8 8
        let labels = Raster::from_vec(vec![7, 7, 0, 7, 8, 8], 2, 3).unwrap();
        let table = table_for(&labels);
        assert_eq!(neighbor_ids(&labels, table.get(7).unwrap()), vec![8]);
        assert_eq!(neighbor_ids(&labels, table.get(8).unwrap()), vec![7]);
    }

    #[test]
    fn test_multi_pixel_contacts_deduplicated() {
        // 1 1 1
        // 9 9 9
        let labels = Raster::from_vec(vec![1, 1, 1, 9, 9, 9], 2, 3).unwrap();
        let table = table_for(&labels);
        assert_eq!(neighbor_ids(&labels, table.get(1).unwrap()), vec![9]);
    }

    #[test]
    fn test_buffer_is_cleared() {
        let labels = Raster::from_vec(vec![1, 2], 1, 2).unwrap();
        let table = table_for(&labels);
        let mut buf = vec![42, 43];
        collect_neighbors(&labels, table.get(1).unwrap(), &mut buf);
        assert_eq!(buf, vec![2]);
    }
}
