//! Cell connectivity for region operations

/// Which cells count as adjacent to a center cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Neighborhood {
    /// Up, down, left, right
    #[default]
    Rook,
    /// Rook plus the four diagonals
    Queen,
}

const ROOK_OFFSETS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

const QUEEN_OFFSETS: [(isize, isize); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

impl Neighborhood {
    /// Relative (row, col) offsets, excluding the center
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Neighborhood::Rook => &ROOK_OFFSETS,
            Neighborhood::Queen => &QUEEN_OFFSETS,
        }
    }

    /// In-bounds neighbors of (row, col) in a `rows` x `cols` grid
    pub fn neighbors(&self, row: usize, col: usize, rows: usize, cols: usize) -> NeighborIter {
        NeighborIter {
            offsets: self.offsets(),
            row,
            col,
            rows,
            cols,
            index: 0,
        }
    }
}

/// Iterator over the in-bounds neighbors of a cell. Offsets that fall
/// outside the grid are skipped.
#[derive(Debug, Clone)]
pub struct NeighborIter {
    offsets: &'static [(isize, isize)],
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
    index: usize,
}

impl Iterator for NeighborIter {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.offsets.len() {
            let (dr, dc) = self.offsets[self.index];
            self.index += 1;

            let nr = self.row as isize + dr;
            let nc = self.col as isize + dc;
            if nr < 0 || nc < 0 || nr >= self.rows as isize || nc >= self.cols as isize {
                continue;
            }
            return Some((nr as usize, nc as usize));
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.offsets.len() - self.index))
    }
}
