//! Canonical grid feature set: Manhattan/quadrant/BFS descriptors.

use std::collections::VecDeque;

use crate::grid::{GridMapper, GridPosition, NEIGHBORS_4, NEIGHBORS_8};

/// Keys of [`FeatureSchema::Grid`](super::FeatureSchema::Grid), in vector order.
pub const NAMES: &[&str] = &[
    // Basic
    "mean_row",
    "mean_col",
    "dispersion",
    "border_count",
    "corner_count",
    "q1",
    "q2",
    "q3",
    "q4",
    "row_std",
    "col_std",
    "row_min",
    "row_max",
    "col_min",
    "col_max",
    // Advanced
    "adjacencies_4",
    "adjacencies_8",
    "connectivity_4",
    "connectivity_8",
    "inertia",
    "eccentricity",
    "compactness",
    "symmetry_horizontal",
    "symmetry_vertical",
    "ring1",
    "ring2",
    "ring3",
];

/// Neighborhood used for adjacency and connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Four,
    Eight,
}

impl Connectivity {
    fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::Four => &NEIGHBORS_4,
            Self::Eight => &NEIGHBORS_8,
        }
    }
}

/// Row/column spread of a set of positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisStats {
    pub mean_row: f64,
    pub mean_col: f64,
    pub row_std: f64,
    pub col_std: f64,
    pub row_min: usize,
    pub row_max: usize,
    pub col_min: usize,
    pub col_max: usize,
}

pub(crate) fn extract(grid: &GridMapper, positions: &[GridPosition]) -> Vec<f64> {
    let axis = axis_stats(positions);
    let quadrants = quadrant_counts(grid, positions);
    let (sym_h, sym_v) = symmetry(grid, positions);
    let rings = ring_distribution(grid, positions);

    let mut v = Vec::with_capacity(NAMES.len());
    v.extend([
        axis.mean_row,
        axis.mean_col,
        dispersion(positions),
        positions.iter().filter(|&&p| grid.is_border(p)).count() as f64,
        positions.iter().filter(|&&p| grid.is_corner(p)).count() as f64,
    ]);
    v.extend(quadrants.iter().map(|&c| c as f64));
    v.extend([
        axis.row_std,
        axis.col_std,
        axis.row_min as f64,
        axis.row_max as f64,
        axis.col_min as f64,
        axis.col_max as f64,
        adjacent_pairs(grid, positions, Connectivity::Four) as f64,
        adjacent_pairs(grid, positions, Connectivity::Eight) as f64,
        connected_components(grid, positions, Connectivity::Four) as f64,
        connected_components(grid, positions, Connectivity::Eight) as f64,
        inertia(positions),
        eccentricity(&axis, positions.len()),
        compactness(&axis, positions.len()),
        sym_h as f64,
        sym_v as f64,
    ]);
    v.extend(rings.iter().map(|&c| c as f64));
    v
}

// ---------------------------------------------------------------------------
// Basic descriptors
// ---------------------------------------------------------------------------

/// Centroid, population standard deviations and extents along each axis.
/// All zero for an empty slice.
pub fn axis_stats(positions: &[GridPosition]) -> AxisStats {
    let n = positions.len();
    if n == 0 {
        return AxisStats {
            mean_row: 0.0,
            mean_col: 0.0,
            row_std: 0.0,
            col_std: 0.0,
            row_min: 0,
            row_max: 0,
            col_min: 0,
            col_max: 0,
        };
    }
    let nf = n as f64;
    let mean_row = positions.iter().map(|p| p.row as f64).sum::<f64>() / nf;
    let mean_col = positions.iter().map(|p| p.col as f64).sum::<f64>() / nf;
    let var_row = positions
        .iter()
        .map(|p| (p.row as f64 - mean_row).powi(2))
        .sum::<f64>()
        / nf;
    let var_col = positions
        .iter()
        .map(|p| (p.col as f64 - mean_col).powi(2))
        .sum::<f64>()
        / nf;

    AxisStats {
        mean_row,
        mean_col,
        row_std: var_row.sqrt(),
        col_std: var_col.sqrt(),
        row_min: positions.iter().map(|p| p.row).min().unwrap_or(0),
        row_max: positions.iter().map(|p| p.row).max().unwrap_or(0),
        col_min: positions.iter().map(|p| p.col).min().unwrap_or(0),
        col_max: positions.iter().map(|p| p.col).max().unwrap_or(0),
    }
}

/// Mean Manhattan distance over all unordered pairs; 0 for fewer than two positions.
pub fn dispersion(positions: &[GridPosition]) -> f64 {
    let n = positions.len();
    if n <= 1 {
        return 0.0;
    }
    let mut total = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            total += positions[i].manhattan(positions[j]);
        }
    }
    total as f64 / (n * (n - 1) / 2) as f64
}

/// Counts per quadrant in q1..q4 order (upper-left, upper-right, lower-left, lower-right).
pub fn quadrant_counts(grid: &GridMapper, positions: &[GridPosition]) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for &p in positions {
        counts[grid.quadrant(p).index()] += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Adjacency and connectivity
// ---------------------------------------------------------------------------

/// Row-major occupancy mask of the drawn cells.
fn occupied_mask(grid: &GridMapper, positions: &[GridPosition]) -> Vec<bool> {
    let mut mask = vec![false; grid.rows() * grid.cols()];
    for p in positions {
        mask[p.row * grid.cols() + p.col] = true;
    }
    mask
}

fn neighbors(
    grid: &GridMapper,
    p: GridPosition,
    connectivity: Connectivity,
) -> impl Iterator<Item = GridPosition> + '_ {
    grid.neighbors_by(p, connectivity.offsets())
}

/// Number of unordered drawn pairs that are neighbors.
pub fn adjacent_pairs(
    grid: &GridMapper,
    positions: &[GridPosition],
    connectivity: Connectivity,
) -> usize {
    let mask = occupied_mask(grid, positions);
    let cols = grid.cols();
    let directed: usize = positions
        .iter()
        .map(|&p| {
            neighbors(grid, p, connectivity)
                .filter(|q| mask[q.row * cols + q.col])
                .count()
        })
        .sum();
    // Each pair was seen from both ends.
    directed / 2
}

/// Number of connected components among drawn cells (breadth-first search).
/// In `[1, n]` for a non-empty draw, 0 for an empty one.
pub fn connected_components(
    grid: &GridMapper,
    positions: &[GridPosition],
    connectivity: Connectivity,
) -> usize {
    let cols = grid.cols();
    let mask = occupied_mask(grid, positions);
    let mut visited = vec![false; mask.len()];
    let mut queue = VecDeque::new();
    let mut components = 0;

    for &start in positions {
        let idx = start.row * cols + start.col;
        if visited[idx] {
            continue;
        }
        components += 1;
        visited[idx] = true;
        queue.push_back(start);

        while let Some(p) = queue.pop_front() {
            for q in neighbors(grid, p, connectivity) {
                let qi = q.row * cols + q.col;
                if mask[qi] && !visited[qi] {
                    visited[qi] = true;
                    queue.push_back(q);
                }
            }
        }
    }
    components
}

// ---------------------------------------------------------------------------
// Shape descriptors
// ---------------------------------------------------------------------------

/// Sum of squared Euclidean distances to the centroid.
pub fn inertia(positions: &[GridPosition]) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    let axis = axis_stats(positions);
    positions
        .iter()
        .map(|p| (p.row as f64 - axis.mean_row).powi(2) + (p.col as f64 - axis.mean_col).powi(2))
        .sum()
}

/// `row_std / col_std`.
///
/// `+inf` when the columns do not vary but the rows do; 1.0 when neither
/// varies or the draw has at most one position.
pub fn eccentricity(axis: &AxisStats, n: usize) -> f64 {
    if n <= 1 {
        return 1.0;
    }
    if axis.col_std == 0.0 {
        return if axis.row_std > 0.0 { f64::INFINITY } else { 1.0 };
    }
    axis.row_std / axis.col_std
}

/// Drawn cells over the bounding-box perimeter `2 * (height + width)`.
pub fn compactness(axis: &AxisStats, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let height = axis.row_max - axis.row_min + 1;
    let width = axis.col_max - axis.col_min + 1;
    n as f64 / (2 * (height + width)) as f64
}

/// `(horizontal, vertical)` imbalance: absolute difference of the counts on
/// either side of the row midline and of the column midline. A cell lying on
/// a midline counts toward the lower/right side.
pub fn symmetry(grid: &GridMapper, positions: &[GridPosition]) -> (usize, usize) {
    let (mid_row, mid_col) = grid.center();
    let upper = positions.iter().filter(|p| (p.row as f64) < mid_row).count();
    let left = positions.iter().filter(|p| (p.col as f64) < mid_col).count();
    let n = positions.len();
    (upper.abs_diff(n - upper), left.abs_diff(n - left))
}

/// Counts within Euclidean distance `<= 2`, `(2, 4]` and `> 4` of the grid center.
pub fn ring_distribution(grid: &GridMapper, positions: &[GridPosition]) -> [usize; 3] {
    let (cr, cc) = grid.center();
    let mut rings = [0usize; 3];
    for p in positions {
        let d = ((p.row as f64 - cr).powi(2) + (p.col as f64 - cc).powi(2)).sqrt();
        let ring = if d <= 2.0 {
            0
        } else if d <= 4.0 {
            1
        } else {
            2
        };
        rings[ring] += 1;
    }
    rings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LotteryConfig;
    use crate::features::{FeatureExtractor, FeatureSchema};

    fn mega() -> GridMapper {
        GridMapper::new(&LotteryConfig::megasena())
    }

    fn pos(row: usize, col: usize) -> GridPosition {
        GridPosition::new(row, col)
    }

    /// Deterministic stream of valid megasena draws (simple LCG + rejection).
    fn pseudo_draws(count: usize) -> Vec<Vec<u32>> {
        let mut state: u64 = 0xDEAD_BEEF_CAFE_BABE;
        let mut next = move || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u32
        };
        (0..count)
            .map(|_| {
                let mut draw = Vec::new();
                while draw.len() < 6 {
                    let n = next() % 60 + 1;
                    if !draw.contains(&n) {
                        draw.push(n);
                    }
                }
                draw.sort_unstable();
                draw
            })
            .collect()
    }

    #[test]
    fn test_dispersion_examples() {
        assert_eq!(dispersion(&[pos(3, 3)]), 0.0);
        assert_eq!(dispersion(&[]), 0.0);
        assert_eq!(dispersion(&[pos(0, 0), pos(9, 5)]), 14.0);
        // Pairs: 1, 1, 2 -> mean 4/3.
        let d = dispersion(&[pos(0, 0), pos(0, 1), pos(1, 1)]);
        assert!((d - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_worked_draw_megasena() {
        let ex = FeatureExtractor::new(&LotteryConfig::megasena(), FeatureSchema::Grid);
        let v = ex.extract(&[1, 10, 11, 20, 30, 60]).unwrap();
        // 1 -> (0,0), 10 -> (9,0) and 60 -> (9,5) are corners.
        assert_eq!(v.get("corner_count"), Some(3.0));
        assert_eq!(v.get("border_count"), Some(6.0));
        assert_eq!(v.get("row_min"), Some(0.0));
        assert_eq!(v.get("row_max"), Some(9.0));
        assert_eq!(v.get("col_max"), Some(5.0));
        // (0,0),(0,1) adjacent; (9,0),(9,1),(9,2) a horizontal run; (9,5) alone.
        assert_eq!(v.get("adjacencies_4"), Some(3.0));
        assert_eq!(v.get("connectivity_4"), Some(3.0));
        assert_eq!(v.get("connectivity_8"), Some(3.0));
        // Upper half holds rows 0..5: two cells, lower half four.
        assert_eq!(v.get("q1"), Some(2.0));
        assert_eq!(v.get("q3"), Some(3.0));
        assert_eq!(v.get("q4"), Some(1.0));
        assert_eq!(v.get("symmetry_horizontal"), Some(2.0));
    }

    #[test]
    fn test_quadrants_sum_to_draw_size() {
        let g = mega();
        for draw in pseudo_draws(200) {
            let positions = g.positions(&draw).unwrap();
            assert_eq!(quadrant_counts(&g, &positions).iter().sum::<usize>(), 6);
            assert_eq!(ring_distribution(&g, &positions).iter().sum::<usize>(), 6);
        }
    }

    #[test]
    fn test_component_bounds() {
        let g = mega();
        for draw in pseudo_draws(500) {
            let positions = g.positions(&draw).unwrap();
            let c4 = connected_components(&g, &positions, Connectivity::Four);
            let c8 = connected_components(&g, &positions, Connectivity::Eight);
            assert!((1..=6).contains(&c4));
            assert!((1..=6).contains(&c8));
            assert!(c4 >= c8);
            assert!(
                adjacent_pairs(&g, &positions, Connectivity::Eight)
                    >= adjacent_pairs(&g, &positions, Connectivity::Four)
            );
        }
    }

    #[test]
    fn test_neighbors_follow_connectivity() {
        let g = mega();
        for p in [pos(0, 0), pos(4, 2), pos(9, 5)] {
            let four: Vec<_> = neighbors(&g, p, Connectivity::Four).collect();
            let eight: Vec<_> = neighbors(&g, p, Connectivity::Eight).collect();
            assert_eq!(four, g.neighbors_4(p).collect::<Vec<_>>());
            assert_eq!(eight, g.neighbors_8(p).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_diagonal_chain_connectivity() {
        let g = mega();
        let diag = [pos(0, 0), pos(1, 1), pos(2, 2), pos(3, 3)];
        assert_eq!(connected_components(&g, &diag, Connectivity::Four), 4);
        assert_eq!(connected_components(&g, &diag, Connectivity::Eight), 1);
        assert_eq!(adjacent_pairs(&g, &diag, Connectivity::Four), 0);
        assert_eq!(adjacent_pairs(&g, &diag, Connectivity::Eight), 3);
    }

    #[test]
    fn test_block_adjacency() {
        let g = mega();
        let block = [pos(0, 0), pos(0, 1), pos(1, 0), pos(1, 1)];
        assert_eq!(adjacent_pairs(&g, &block, Connectivity::Four), 4);
        assert_eq!(adjacent_pairs(&g, &block, Connectivity::Eight), 6);
        assert_eq!(connected_components(&g, &block, Connectivity::Four), 1);
    }

    #[test]
    fn test_eccentricity_sentinels() {
        let column = [pos(0, 2), pos(5, 2), pos(9, 2)];
        let axis = axis_stats(&column);
        assert_eq!(eccentricity(&axis, 3), f64::INFINITY);

        let single = [pos(4, 4)];
        assert_eq!(eccentricity(&axis_stats(&single), 1), 1.0);

        let square = [pos(0, 0), pos(2, 2)];
        assert!((eccentricity(&axis_stats(&square), 2) - 1.0).abs() < 1e-12);

        let row = [pos(3, 0), pos(3, 5)];
        assert_eq!(eccentricity(&axis_stats(&row), 2), 0.0);
    }

    #[test]
    fn test_inertia_and_compactness() {
        let pts = [pos(0, 0), pos(0, 2)];
        assert!((inertia(&pts) - 2.0).abs() < 1e-12);
        let axis = axis_stats(&pts);
        // Bounding box 1x3 -> perimeter 8.
        assert!((compactness(&axis, 2) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_symmetry_and_rings_megasena() {
        let g = mega();
        let pts = [pos(0, 0), pos(1, 0), pos(2, 5), pos(9, 5)];
        assert_eq!(symmetry(&g, &pts), (2, 0));
        // Center (4.5, 2.5): (4,2) and (5,3) are inside ring 1.
        let rings = ring_distribution(&g, &[pos(4, 2), pos(5, 3), pos(1, 2), pos(0, 0)]);
        assert_eq!(rings, [2, 1, 1]);
    }

    #[test]
    fn test_lotofacil_full_vector_is_finite_and_sized() {
        let ex = FeatureExtractor::new(&LotteryConfig::lotofacil(), FeatureSchema::Grid);
        let v = ex.extract(&(1..=15).collect::<Vec<u32>>()).unwrap();
        assert_eq!(v.values().len(), NAMES.len());
        // Columns 0-2 fully drawn: one component.
        assert_eq!(v.get("connectivity_4"), Some(1.0));
        assert_eq!(v.get("compactness"), Some(15.0 / 16.0));
        assert!(v.values().iter().all(|x| x.is_finite()));
    }
}
