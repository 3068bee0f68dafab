//! Alternate feature set for slip layouts, built on Euclidean geometry.
//!
//! Distances are between cell centers in `(row, col)` units. Halves and
//! quadrants split at the geometric center returned by
//! [`GridMapper::center`]; a cell lying on a midline counts toward the
//! bottom/right side.

use crate::grid::{GridMapper, GridPosition};

/// Keys of [`FeatureSchema::Slip`](super::FeatureSchema::Slip), in vector order.
pub const NAMES: &[&str] = &[
    "mean_distance",
    "std_distance",
    "min_distance",
    "max_distance",
    "top_count",
    "bottom_count",
    "left_count",
    "right_count",
    "quadrant_1",
    "quadrant_2",
    "quadrant_3",
    "quadrant_4",
    "centroid_distance",
    "nearest_neighbor_mean",
    "spatial_autocorrelation",
    "clustering_coefficient",
    "convex_hull_area",
    "spatial_entropy",
    "pattern_regularity",
];

pub(crate) fn extract(grid: &GridMapper, positions: &[GridPosition]) -> Vec<f64> {
    let distances = pairwise_distances(positions);
    let (mean_d, std_d, min_d, max_d) = distance_summary(&distances);
    let halves = half_counts(grid, positions);
    let quadrants = quadrant_counts(grid, positions);
    let nn = nearest_neighbor_distances(positions);

    let mut v = Vec::with_capacity(NAMES.len());
    v.extend([mean_d, std_d, min_d, max_d]);
    v.extend(halves.iter().map(|&c| c as f64));
    v.extend(quadrants.iter().map(|&c| c as f64));
    v.extend([
        centroid_distance(grid, positions),
        mean_of(&nn),
        morans_i(grid, positions),
        clustering_coefficient(grid, positions),
        convex_hull_area(positions),
        quadrant_entropy(&quadrants),
        pattern_regularity(&nn),
    ]);
    v
}

fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn population_std(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Euclidean distance of every unordered pair.
pub fn pairwise_distances(positions: &[GridPosition]) -> Vec<f64> {
    let n = positions.len();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            out.push(positions[i].euclidean(positions[j]));
        }
    }
    out
}

/// `(mean, population std, min, max)`; all zero when there are no pairs.
fn distance_summary(distances: &[f64]) -> (f64, f64, f64, f64) {
    if distances.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let mean = mean_of(distances);
    let min = distances.iter().copied().fold(f64::INFINITY, f64::min);
    let max = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (mean, population_std(distances, mean), min, max)
}

/// `[top, bottom, left, right]`.
pub fn half_counts(grid: &GridMapper, positions: &[GridPosition]) -> [usize; 4] {
    let (cr, cc) = grid.center();
    let top = positions.iter().filter(|p| (p.row as f64) < cr).count();
    let left = positions.iter().filter(|p| (p.col as f64) < cc).count();
    let n = positions.len();
    [top, n - top, left, n - left]
}

/// Membership in the four rectangles meeting at the geometric center,
/// ordered upper-left, upper-right, lower-left, lower-right.
pub fn quadrant_counts(grid: &GridMapper, positions: &[GridPosition]) -> [usize; 4] {
    let (cr, cc) = grid.center();
    let mut counts = [0usize; 4];
    for p in positions {
        let lower = (p.row as f64) >= cr;
        let right = (p.col as f64) >= cc;
        counts[usize::from(lower) * 2 + usize::from(right)] += 1;
    }
    counts
}

/// Distance from the draw's centroid to the grid center.
pub fn centroid_distance(grid: &GridMapper, positions: &[GridPosition]) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    let n = positions.len() as f64;
    let mr = positions.iter().map(|p| p.row as f64).sum::<f64>() / n;
    let mc = positions.iter().map(|p| p.col as f64).sum::<f64>() / n;
    let (cr, cc) = grid.center();
    ((mr - cr).powi(2) + (mc - cc).powi(2)).sqrt()
}

/// For each position, the distance to the closest other position.
/// Empty when fewer than two positions.
pub fn nearest_neighbor_distances(positions: &[GridPosition]) -> Vec<f64> {
    if positions.len() < 2 {
        return Vec::new();
    }
    positions
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            positions
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &q)| p.euclidean(q))
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

/// Moran's I of the binary occupancy grid under rook (4-neighbor) weights.
///
/// Positive when drawn cells sit next to each other more than chance would
/// place them, negative when they avoid each other. 0 when every cell or no
/// cell is drawn.
pub fn morans_i(grid: &GridMapper, positions: &[GridPosition]) -> f64 {
    let (rows, cols) = (grid.rows(), grid.cols());
    let cells = rows * cols;
    let mut x = vec![0.0f64; cells];
    for p in positions {
        x[p.row * cols + p.col] = 1.0;
    }
    let mean = positions.len() as f64 / cells as f64;
    let denom: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    if denom == 0.0 {
        return 0.0;
    }

    let mut numer = 0.0;
    let mut weight_sum = 0usize;
    for row in 0..rows {
        for col in 0..cols {
            let here = GridPosition::new(row, col);
            let di = x[row * cols + col] - mean;
            for q in grid.neighbors_4(here) {
                numer += di * (x[q.row * cols + q.col] - mean);
                weight_sum += 1;
            }
        }
    }
    if weight_sum == 0 {
        return 0.0;
    }
    (cells as f64 / weight_sum as f64) * numer / denom
}

/// Average local clustering coefficient of the 8-connected graph on drawn cells.
pub fn clustering_coefficient(grid: &GridMapper, positions: &[GridPosition]) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    let cols = grid.cols();
    let mut drawn = vec![false; grid.rows() * cols];
    for p in positions {
        drawn[p.row * cols + p.col] = true;
    }

    let total: f64 = positions
        .iter()
        .map(|&p| {
            let nbrs: Vec<GridPosition> = grid
                .neighbors_8(p)
                .filter(|q| drawn[q.row * cols + q.col])
                .collect();
            let k = nbrs.len();
            if k < 2 {
                return 0.0;
            }
            let mut links = 0usize;
            for i in 0..k {
                for j in (i + 1)..k {
                    if nbrs[i].row.abs_diff(nbrs[j].row) <= 1
                        && nbrs[i].col.abs_diff(nbrs[j].col) <= 1
                    {
                        links += 1;
                    }
                }
            }
            2.0 * links as f64 / (k * (k - 1)) as f64
        })
        .sum();
    total / positions.len() as f64
}

fn cross(o: (i64, i64), a: (i64, i64), b: (i64, i64)) -> i64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Area of the convex hull of the cell centers (monotone chain + shoelace).
/// 0 for fewer than three points or a collinear set.
pub fn convex_hull_area(positions: &[GridPosition]) -> f64 {
    let mut pts: Vec<(i64, i64)> = positions
        .iter()
        .map(|p| (p.col as i64, p.row as i64))
        .collect();
    pts.sort_unstable();
    pts.dedup();
    if pts.len() < 3 {
        return 0.0;
    }

    let mut hull: Vec<(i64, i64)> = Vec::with_capacity(pts.len() * 2);
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    // Last point repeats the first.
    hull.pop();
    if hull.len() < 3 {
        return 0.0;
    }

    let twice: i64 = (0..hull.len())
        .map(|i| {
            let (a, b) = (hull[i], hull[(i + 1) % hull.len()]);
            a.0 * b.1 - b.0 * a.1
        })
        .sum();
    twice.abs() as f64 / 2.0
}

/// Shannon entropy in bits of the quadrant distribution, in `[0, 2]`.
pub fn quadrant_entropy(counts: &[usize; 4]) -> f64 {
    let n: usize = counts.iter().sum();
    if n == 0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n as f64;
            -p * p.log2()
        })
        .sum()
}

/// `1 / (1 + cv)` of nearest-neighbor distances; 1.0 when cv is undefined.
pub fn pattern_regularity(nn: &[f64]) -> f64 {
    let mean = mean_of(nn);
    if nn.is_empty() || mean == 0.0 {
        return 1.0;
    }
    let cv = population_std(nn, mean) / mean;
    1.0 / (1.0 + cv)
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

    #[test]
    fn test_block_hull_area() {
        let block = [pos(0, 0), pos(0, 1), pos(1, 0), pos(1, 1)];
        assert!((convex_hull_area(&block) - 1.0).abs() < 1e-12);
        // Interior point does not change the hull.
        let tri = [pos(0, 0), pos(4, 0), pos(0, 4), pos(1, 1)];
        assert!((convex_hull_area(&tri) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_hull_degenerate() {
        assert_eq!(convex_hull_area(&[pos(0, 0), pos(1, 1)]), 0.0);
        assert_eq!(convex_hull_area(&[pos(0, 0), pos(1, 1), pos(2, 2), pos(3, 3)]), 0.0);
    }

    #[test]
    fn test_entropy_bounds() {
        assert_eq!(quadrant_entropy(&[6, 0, 0, 0]), 0.0);
        assert!((quadrant_entropy(&[1, 1, 1, 1]) - 2.0).abs() < 1e-12);
        assert!((quadrant_entropy(&[2, 2, 0, 0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_quadrant_draw() {
        let ex = FeatureExtractor::new(&LotteryConfig::megasena(), FeatureSchema::Slip);
        // Numbers 1-3 and 11-13 occupy rows 0-2 of columns 0 and 1.
        let v = ex.extract(&[1, 2, 3, 11, 12, 13]).unwrap();
        assert_eq!(v.get("quadrant_1"), Some(6.0));
        assert_eq!(v.get("spatial_entropy"), Some(0.0));
        assert_eq!(v.get("top_count"), Some(6.0));
        assert_eq!(v.get("left_count"), Some(6.0));
        assert!((v.get("convex_hull_area").unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(v.get("min_distance"), Some(1.0));
        assert!(v.get("spatial_autocorrelation").unwrap() > 0.0);
    }

    #[test]
    fn test_counts_sum_to_draw_size() {
        let g = GridMapper::new(&LotteryConfig::lotofacil());
        let positions = g
            .positions(&[1, 3, 5, 7, 9, 11, 13, 15, 17, 19, 21, 23, 25, 2, 4])
            .unwrap();
        let halves = half_counts(&g, &positions);
        assert_eq!(halves[0] + halves[1], 15);
        assert_eq!(halves[2] + halves[3], 15);
        assert_eq!(quadrant_counts(&g, &positions).iter().sum::<usize>(), 15);
    }

    #[test]
    fn test_nearest_neighbor_and_regularity() {
        let line = [pos(0, 0), pos(0, 1), pos(0, 2)];
        let nn = nearest_neighbor_distances(&line);
        assert_eq!(nn, vec![1.0, 1.0, 1.0]);
        assert_eq!(pattern_regularity(&nn), 1.0);
        assert!(nearest_neighbor_distances(&[pos(3, 3)]).is_empty());
        assert_eq!(pattern_regularity(&[]), 1.0);

        let uneven = nearest_neighbor_distances(&[pos(0, 0), pos(0, 1), pos(9, 5)]);
        assert!(pattern_regularity(&uneven) < 1.0);
    }

    #[test]
    fn test_clustering_triangle() {
        let g = mega();
        // An L-shaped triple is a triangle under 8-adjacency.
        let tri = [pos(0, 0), pos(0, 1), pos(1, 0)];
        assert!((clustering_coefficient(&g, &tri) - 1.0).abs() < 1e-12);
        // A straight run of three: only the middle node has degree 2, unlinked.
        let run = [pos(0, 0), pos(0, 1), pos(0, 2)];
        assert_eq!(clustering_coefficient(&g, &run), 0.0);
    }

    #[test]
    fn test_morans_i_sign() {
        let g = mega();
        let clustered = [pos(0, 0), pos(0, 1), pos(1, 0), pos(1, 1), pos(2, 0), pos(2, 1)];
        assert!(morans_i(&g, &clustered) > 0.0);
        let checker = [pos(0, 0), pos(1, 1), pos(2, 0), pos(3, 1), pos(4, 0), pos(5, 1)];
        assert!(morans_i(&g, &checker) < morans_i(&g, &clustered));
    }

    #[test]
    fn test_distance_summary() {
        let d = pairwise_distances(&[pos(0, 0), pos(3, 4)]);
        assert_eq!(d, vec![5.0]);
        assert_eq!(distance_summary(&d), (5.0, 0.0, 5.0, 5.0));
        assert_eq!(distance_summary(&[]), (0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_centroid_distance_symmetric_draw() {
        let g = mega();
        // Corners are symmetric about the center.
        let corners = [pos(0, 0), pos(0, 5), pos(9, 0), pos(9, 5)];
        assert!(centroid_distance(&g, &corners).abs() < 1e-12);
    }
}
