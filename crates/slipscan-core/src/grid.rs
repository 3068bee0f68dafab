//! Mapping between lottery numbers and betting-slip grid cells.
//!
//! Numbers are laid out column-major: the first column holds `1..=rows`, the
//! second `rows+1..=2*rows`, and so on. For the 10x6 Mega-Sena slip:
//!
//! ```text
//! col:    0   1   2   3   4   5
//! row 0:  1  11  21  31  41  51
//! row 1:  2  12  22  32  42  52
//!  ...
//! row 9: 10  20  30  40  50  60
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::LotteryConfig;
use crate::error::{InvalidDrawError, RangeError};

/// A cell on the slip, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
}

impl GridPosition {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Manhattan (L1) distance.
    pub fn manhattan(self, other: Self) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Euclidean distance between cell centers.
    pub fn euclidean(self, other: Self) -> f64 {
        let dr = self.row as f64 - other.row as f64;
        let dc = self.col as f64 - other.col as f64;
        (dr * dr + dc * dc).sqrt()
    }
}

/// One of the four slip quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Quadrant {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl Quadrant {
    /// Index 0..4 in q1..q4 order.
    pub fn index(self) -> usize {
        match self {
            Self::UpperLeft => 0,
            Self::UpperRight => 1,
            Self::LowerLeft => 2,
            Self::LowerRight => 3,
        }
    }
}

/// Offsets of the 4-connected (von Neumann) neighborhood.
pub(crate) const NEIGHBORS_4: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Offsets of the 8-connected (Moore) neighborhood.
pub(crate) const NEIGHBORS_8: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Grid geometry for one lottery variant.
#[derive(Debug, Clone)]
pub struct GridMapper {
    config: LotteryConfig,
}

impl GridMapper {
    pub fn new(config: &LotteryConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &LotteryConfig {
        &self.config
    }

    pub fn rows(&self) -> usize {
        self.config.rows()
    }

    pub fn cols(&self) -> usize {
        self.config.cols()
    }

    /// Cell holding `number`.
    pub fn to_position(&self, number: u32) -> Result<GridPosition, RangeError> {
        let (min, max) = (self.config.min_number(), self.config.max_number());
        if number < min || number > max {
            return Err(RangeError::Number { number, min, max });
        }
        let idx = (number - min) as usize;
        let rows = self.rows();
        Ok(GridPosition::new(idx % rows, idx / rows))
    }

    /// Number printed in `position`.
    pub fn to_number(&self, position: GridPosition) -> Result<u32, RangeError> {
        if !self.contains(position) {
            return Err(RangeError::Position {
                position,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok((position.col * self.rows() + position.row) as u32 + self.config.min_number())
    }

    pub fn contains(&self, position: GridPosition) -> bool {
        position.row < self.rows() && position.col < self.cols()
    }

    /// Why `numbers` is not a valid draw for this variant, if it is not.
    pub fn check(&self, numbers: &[u32]) -> Result<(), InvalidDrawError> {
        let expected = self.config.draw_size();
        if numbers.len() != expected {
            return Err(InvalidDrawError::WrongSize {
                expected,
                got: numbers.len(),
            });
        }
        let (min, max) = (self.config.min_number(), self.config.max_number());
        let mut seen = HashSet::with_capacity(numbers.len());
        for &number in numbers {
            if number < min || number > max {
                return Err(InvalidDrawError::OutOfRange { number, min, max });
            }
            if !seen.insert(number) {
                return Err(InvalidDrawError::Duplicate(number));
            }
        }
        Ok(())
    }

    /// True iff `numbers` has the right size, no duplicates and no out-of-range entries.
    pub fn validate(&self, numbers: &[u32]) -> bool {
        self.check(numbers).is_ok()
    }

    /// Validate a draw and map every number to its cell, preserving order.
    pub fn positions(&self, numbers: &[u32]) -> Result<Vec<GridPosition>, InvalidDrawError> {
        self.check(numbers)?;
        let rows = self.rows();
        let min = self.config.min_number();
        Ok(numbers
            .iter()
            .map(|&n| {
                let idx = (n - min) as usize;
                GridPosition::new(idx % rows, idx / rows)
            })
            .collect())
    }

    /// Binary occupancy vector indexed by `number - min_number`.
    pub fn occupancy(&self, numbers: &[u32]) -> Result<Vec<u8>, InvalidDrawError> {
        self.check(numbers)?;
        let mut vector = vec![0u8; self.config.total_numbers() as usize];
        for &n in numbers {
            vector[(n - self.config.min_number()) as usize] = 1;
        }
        Ok(vector)
    }

    fn offset(&self, position: GridPosition, (dr, dc): (isize, isize)) -> Option<GridPosition> {
        let row = position.row.checked_add_signed(dr)?;
        let col = position.col.checked_add_signed(dc)?;
        let next = GridPosition::new(row, col);
        self.contains(next).then_some(next)
    }

    /// In-bounds 4-connected neighbors.
    pub fn neighbors_4(&self, position: GridPosition) -> impl Iterator<Item = GridPosition> + '_ {
        self.neighbors_by(position, &NEIGHBORS_4)
    }

    /// In-bounds 8-connected neighbors.
    pub fn neighbors_8(&self, position: GridPosition) -> impl Iterator<Item = GridPosition> + '_ {
        self.neighbors_by(position, &NEIGHBORS_8)
    }

    /// In-bounds cells at the given row/column offsets.
    pub(crate) fn neighbors_by<'a>(
        &'a self,
        position: GridPosition,
        offsets: &'static [(isize, isize)],
    ) -> impl Iterator<Item = GridPosition> + 'a {
        offsets
            .iter()
            .filter_map(move |&d| self.offset(position, d))
    }

    /// Quadrant split at the integer midpoints `rows / 2` and `cols / 2`.
    /// Cells on a midpoint belong to the lower or right half.
    pub fn quadrant(&self, position: GridPosition) -> Quadrant {
        let upper = position.row < self.rows() / 2;
        let left = position.col < self.cols() / 2;
        match (upper, left) {
            (true, true) => Quadrant::UpperLeft,
            (true, false) => Quadrant::UpperRight,
            (false, true) => Quadrant::LowerLeft,
            (false, false) => Quadrant::LowerRight,
        }
    }

    pub fn is_border(&self, position: GridPosition) -> bool {
        position.row == 0
            || position.row == self.rows() - 1
            || position.col == 0
            || position.col == self.cols() - 1
    }

    /// One of the four grid corners.
    pub fn is_corner(&self, position: GridPosition) -> bool {
        (position.row == 0 || position.row == self.rows() - 1)
            && (position.col == 0 || position.col == self.cols() - 1)
    }

    /// Geometric center `((rows-1)/2, (cols-1)/2)` in cell coordinates.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.rows() as f64 - 1.0) / 2.0,
            (self.cols() as f64 - 1.0) / 2.0,
        )
    }
}
