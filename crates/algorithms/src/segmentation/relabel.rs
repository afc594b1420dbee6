//! Sequential relabelling
//!
//! Elimination leaves gaps in the id space. Relabelling compacts the ids to
//! `1..=n` while keeping their relative order.

use terraclump_core::raster::LabelAccess;

/// Rewrite nonzero ids to `1..=n` in ascending order of the old id.
///
/// Background (0) is untouched. Returns `n`, the number of distinct ids.
pub fn relabel_sequential<L: LabelAccess + ?Sized>(labels: &mut L) -> u32 {
    let (rows, cols) = (labels.rows(), labels.cols());
    let max = labels.max_label() as usize;

    let mut present = vec![false; max + 1];
    for row in 0..rows {
        for col in 0..cols {
            present[labels.label(row, col) as usize] = true;
        }
    }

    let mut lookup = vec![0u32; max + 1];
    let mut next = 0u32;
    for (old, seen) in present.iter().enumerate().skip(1) {
        if *seen {
            next += 1;
            lookup[old] = next;
        }
    }

    for row in 0..rows {
        for col in 0..cols {
            let old = labels.label(row, col);
            if old != 0 {
                labels.set_label(row, col, lookup[old as usize]);
            }
        }
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use terraclump_core::Raster;

    #[test]
    fn test_compacts_gaps_in_order() {
        let mut labels = Raster::from_vec(vec![0, 40, 40, 7, 12, 0], 2, 3).unwrap();
        let n = relabel_sequential(&mut labels);
        assert_eq!(n, 3);
        let out: Vec<u32> = labels.data().iter().copied().collect();
        assert_eq!(out, vec![0, 3, 3, 1, 2, 0]);
    }

    #[test]
    fn test_already_sequential_unchanged() {
        let mut labels = Raster::from_vec(vec![1, 2, 2, 3], 2, 2).unwrap();
        assert_eq!(relabel_sequential(&mut labels), 3);
        let out: Vec<u32> = labels.data().iter().copied().collect();
        assert_eq!(out, vec![1, 2, 2, 3]);
    }

    #[test]
    fn test_all_background() {
        let mut labels = Raster::<u32>::new(2, 2);
        assert_eq!(relabel_sequential(&mut labels), 0);
    }
}
