//! Connected-component clumping
//!
//! Turns a categorical raster (classes, quantized values) into a segment
//! raster: each connected run of equal values gets its own id.

use ndarray::Array2;
use std::collections::VecDeque;
use terraclump_core::raster::{Neighborhood, Raster};
use terraclump_core::{Algorithm, Error, Result};

/// Parameters for clumping
#[derive(Debug, Clone, Copy, Default)]
pub struct ClumpParams {
    /// Connectivity used to grow clumps (default: 4-connected)
    pub neighborhood: Neighborhood,
}

/// Connected-component clumping algorithm
#[derive(Debug, Clone, Default)]
pub struct Clumping;

impl Algorithm for Clumping {
    type Input = Raster<u32>;
    type Output = Raster<u32>;
    type Params = ClumpParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Clump"
    }

    fn description(&self) -> &'static str {
        "Label connected regions of equal value"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        clump(&input, params)
    }
}

/// Label connected regions of equal value.
///
/// Ids are assigned from 1 in raster scan order of each region's first
/// cell. Cells holding 0 or the raster's no-data value are background and
/// stay 0 in the output.
///
/// # Returns
/// Raster<u32> of clump ids, no-data set to 0
pub fn clump(classes: &Raster<u32>, params: ClumpParams) -> Result<Raster<u32>> {
    let (rows, cols) = classes.shape();
    let input = classes.data();
    let nodata = classes.nodata();
    let mut ids = Array2::<u32>::zeros((rows, cols));
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    let mut next_id: u32 = 0;

    for row in 0..rows {
        for col in 0..cols {
            let value = input[(row, col)];
            if value == 0 || Some(value) == nodata || ids[(row, col)] != 0 {
                continue;
            }

            next_id = next_id
                .checked_add(1)
                .ok_or_else(|| Error::Algorithm("more clumps than u32 ids".into()))?;
            ids[(row, col)] = next_id;
            queue.push_back((row, col));

            while let Some((r, c)) = queue.pop_front() {
                for (nr, nc) in params.neighborhood.neighbors(r, c, rows, cols) {
                    if ids[(nr, nc)] == 0 && input[(nr, nc)] == value {
                        ids[(nr, nc)] = next_id;
                        queue.push_back((nr, nc));
                    }
                }
            }
        }
    }

    let mut output = classes.with_same_meta::<u32>(rows, cols);
    *output.data_mut() = ids;
    output.set_nodata(Some(0));
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(r: &Raster<u32>) -> Vec<u32> {
        r.data().iter().copied().collect()
    }

    #[test]
    fn test_rook_splits_diagonal_contact() {
        // 1 0
        // 0 1
        let input = Raster::from_vec(vec![1, 0, 0, 1], 2, 2).unwrap();
        let out = clump(&input, ClumpParams::default()).unwrap();
        assert_eq!(ids(&out), vec![1, 0, 0, 2]);
    }

    #[test]
    fn test_queen_joins_diagonal_contact() {
        let input = Raster::from_vec(vec![1, 0, 0, 1], 2, 2).unwrap();
        let params = ClumpParams {
            neighborhood: Neighborhood::Queen,
        };
        let out = clump(&input, params).unwrap();
        assert_eq!(ids(&out), vec![1, 0, 0, 1]);
    }

    #[test]
    fn test_same_class_disconnected_gets_two_ids() {
        // 7 7 3 7
        // 3 3 3 7
        let input = Raster::from_vec(vec![7, 7, 3, 7, 3, 3, 3, 7], 2, 4).unwrap();
        let out = clump(&input, ClumpParams::default()).unwrap();
        assert_eq!(ids(&out), vec![1, 1, 2, 3, 2, 2, 2, 3]);
        assert_eq!(out.nodata(), Some(0));
    }

    #[test]
    fn test_nodata_is_background() {
        let mut input = Raster::from_vec(vec![9, 9, 4, 4], 1, 4).unwrap();
        input.set_nodata(Some(9));
        let out = clump(&input, ClumpParams::default()).unwrap();
        assert_eq!(ids(&out), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_u_shape_single_clump() {
        // 5 0 5
        // 5 0 5
        // 5 5 5
        let input = Raster::from_vec(vec![5, 0, 5, 5, 0, 5, 5, 5, 5], 3, 3).unwrap();
        let out = Clumping.execute(input, ClumpParams::default()).unwrap();
        assert_eq!(out.data().iter().filter(|&&v| v == 1).count(), 7);
        assert_eq!(out.data().iter().copied().max(), Some(1));
    }
}
