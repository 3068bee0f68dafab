//! Statistical test battery for null-distribution comparisons.
//!
//! Provides the building blocks used to compare an observed sample against a
//! simulated one: descriptive helpers, a Monte Carlo two-sided p-value, the
//! two-sample Kolmogorov-Smirnov and Mann-Whitney U tests, and multiple-comparison
//! corrections (Benjamini-Hochberg, Bonferroni). Nothing here knows about
//! lotteries or grids.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use std::cmp::Ordering;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a two-sample test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TwoSampleResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// A p-value that cannot enter a correction step.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("p-value at index {index} is {value}, expected a number in [0, 1]")]
pub struct InvalidPValue {
    pub index: usize,
    pub value: f64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Descriptive helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Keep only finite values (drops NaN and ±infinity).
pub fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divide by n); 0.0 for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Sample standard deviation (divide by n-1); 0.0 with fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Percentile `q` in [0, 100] with linear interpolation between order statistics.
///
/// Returns 0.0 for an empty slice. The input does not need to be sorted.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, q)
}

/// Same as [`percentile`] for input that is already sorted ascending.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let h = (n - 1) as f64 * (q / 100.0).clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

// ═══════════════════════════════════════════════════════════════════════════════
// Monte Carlo p-value
// ═══════════════════════════════════════════════════════════════════════════════

/// Empirical two-sided p-value of `observed` against simulated statistics.
///
/// `p = min(1, 2 * min(#{sim >= obs}, #{sim <= obs}) / n)`. An empty
/// simulation set carries no evidence and yields 1.0.
pub fn monte_carlo_p_value(observed: f64, simulated: &[f64]) -> f64 {
    let n = simulated.len();
    if n == 0 {
        return 1.0;
    }
    let upper = simulated.iter().filter(|&&s| s >= observed).count();
    let lower = simulated.iter().filter(|&&s| s <= observed).count();
    (2.0 * upper.min(lower) as f64 / n as f64).min(1.0)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Two-sample tests
// ═══════════════════════════════════════════════════════════════════════════════

/// Survival function of the Kolmogorov distribution, `P(K > lambda)`.
fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    if lambda < 1.18 {
        // Small-lambda form converges where the alternating series does not.
        let y = (-PI * PI / (8.0 * lambda * lambda)).exp();
        let mut cdf = 0.0;
        let mut k = 1i32;
        loop {
            let term = y.powi(k * k);
            cdf += term;
            if term < 1e-16 || k > 50 {
                break;
            }
            k += 2;
        }
        cdf *= (2.0 * PI).sqrt() / lambda;
        return (1.0 - cdf).clamp(0.0, 1.0);
    }
    let mut p = 0.0;
    for k in 1..=100i32 {
        let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
        p += sign * (-2.0 * (k as f64 * lambda).powi(2)).exp();
    }
    (2.0 * p).clamp(0.0, 1.0)
}

/// Two-sample Kolmogorov-Smirnov test.
///
/// Statistic D is the largest vertical gap between the two empirical CDFs.
/// The p-value uses the asymptotic Kolmogorov distribution with the Stephens
/// small-sample correction. Returns `None` if either sample is empty.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> Option<TwoSampleResult> {
    let n = a.len();
    let m = b.len();
    if n == 0 || m == 0 {
        return None;
    }
    let mut xs = a.to_vec();
    let mut ys = b.to_vec();
    xs.sort_by(f64::total_cmp);
    ys.sort_by(f64::total_cmp);

    let (nf, mf) = (n as f64, m as f64);
    let mut i = 0;
    let mut j = 0;
    let mut d_max = 0.0f64;
    while i < n && j < m {
        let v = if xs[i] <= ys[j] { xs[i] } else { ys[j] };
        while i < n && xs[i] <= v {
            i += 1;
        }
        while j < m && ys[j] <= v {
            j += 1;
        }
        d_max = d_max.max((i as f64 / nf - j as f64 / mf).abs());
    }

    let en = (nf * mf / (nf + mf)).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * d_max;
    Some(TwoSampleResult {
        statistic: d_max,
        p_value: kolmogorov_sf(lambda),
    })
}

/// Average ranks (1-based) with ties sharing the mean rank, plus the tie
/// correction term `sum(t^3 - t)` over tie groups.
fn average_ranks(sorted: &[(f64, bool)]) -> (Vec<f64>, f64) {
    let n = sorted.len();
    let mut ranks = vec![0.0; n];
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && sorted[j].0 == sorted[i].0 {
            j += 1;
        }
        let avg_rank = ((i + 1) + j) as f64 / 2.0;
        for rank in &mut ranks[i..j] {
            *rank = avg_rank;
        }
        let t = (j - i) as f64;
        tie_term += t * t * t - t;
        i = j;
    }
    (ranks, tie_term)
}

/// Two-sided Mann-Whitney U test.
///
/// The statistic is U of the first sample. The p-value uses the normal
/// approximation with tie and continuity correction. Returns `None` if either
/// sample is empty.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Option<TwoSampleResult> {
    let n1 = a.len();
    let n2 = b.len();
    if n1 == 0 || n2 == 0 {
        return None;
    }

    let mut combined: Vec<(f64, bool)> = Vec::with_capacity(n1 + n2);
    combined.extend(a.iter().map(|&v| (v, true)));
    combined.extend(b.iter().map(|&v| (v, false)));
    combined.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(Ordering::Equal));

    let (ranks, tie_term) = average_ranks(&combined);
    let r1: f64 = combined
        .iter()
        .zip(&ranks)
        .filter(|((_, first), _)| *first)
        .map(|(_, r)| r)
        .sum();

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let n = n1f + n2f;
    let u1 = r1 - n1f * (n1f + 1.0) / 2.0;
    let mu = n1f * n2f / 2.0;
    let variance = n1f * n2f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));

    let p_value = if variance <= 0.0 {
        1.0
    } else {
        let z = ((u1 - mu).abs() - 0.5).max(0.0) / variance.sqrt();
        match Normal::new(0.0, 1.0) {
            Ok(normal) => (2.0 * normal.sf(z)).min(1.0),
            Err(_) => 1.0,
        }
    };

    Some(TwoSampleResult {
        statistic: u1,
        p_value,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Multiple-comparison correction
// ═══════════════════════════════════════════════════════════════════════════════

/// Multiple-comparison correction applied across a family of p-values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CorrectionMethod {
    /// Benjamini-Hochberg false discovery rate (default).
    #[default]
    BenjaminiHochberg,
    /// Bonferroni family-wise error rate.
    Bonferroni,
    /// No correction.
    None,
}

impl CorrectionMethod {
    /// Short name used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BenjaminiHochberg => "fdr",
            Self::Bonferroni => "bonferroni",
            Self::None => "none",
        }
    }

    /// Adjust `p_values`, preserving input order.
    pub fn adjust(self, p_values: &[f64]) -> Result<Vec<f64>, InvalidPValue> {
        check_p_values(p_values)?;
        Ok(match self {
            Self::BenjaminiHochberg => benjamini_hochberg(p_values),
            Self::Bonferroni => bonferroni(p_values),
            Self::None => p_values.to_vec(),
        })
    }

    /// Adjusted p-values and rejection decisions (`adjusted < alpha`).
    pub fn apply(self, p_values: &[f64], alpha: f64) -> Result<(Vec<f64>, Vec<bool>), InvalidPValue> {
        let adjusted = self.adjust(p_values)?;
        let reject = adjusted.iter().map(|&p| p < alpha).collect();
        Ok((adjusted, reject))
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BenjaminiHochberg => write!(f, "FDR (Benjamini-Hochberg)"),
            Self::Bonferroni => write!(f, "Bonferroni"),
            Self::None => write!(f, "None"),
        }
    }
}

impl FromStr for CorrectionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fdr" | "bh" | "benjamini-hochberg" => Ok(Self::BenjaminiHochberg),
            "bonferroni" => Ok(Self::Bonferroni),
            "none" => Ok(Self::None),
            other => Err(format!(
                "unknown correction method '{other}' (expected fdr, bonferroni or none)"
            )),
        }
    }
}

fn check_p_values(p_values: &[f64]) -> Result<(), InvalidPValue> {
    match p_values
        .iter()
        .position(|p| !(0.0..=1.0).contains(p))
    {
        Some(index) => Err(InvalidPValue {
            index,
            value: p_values[index],
        }),
        None => Ok(()),
    }
}

/// Benjamini-Hochberg adjusted p-values, in input order.
///
/// Ascending ranks get `p * n / rank` capped at 1, then a backward pass makes
/// the adjusted values non-decreasing in rank.
pub fn benjamini_hochberg(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len();
    if n == 0 {
        return Vec::new();
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let mut sorted_adj: Vec<f64> = order
        .iter()
        .enumerate()
        .map(|(rank, &idx)| (p_values[idx] * n as f64 / (rank + 1) as f64).min(1.0))
        .collect();
    for i in (0..n.saturating_sub(1)).rev() {
        sorted_adj[i] = sorted_adj[i].min(sorted_adj[i + 1]);
    }

    let mut adjusted = vec![0.0; n];
    for (rank, &idx) in order.iter().enumerate() {
        adjusted[idx] = sorted_adj[rank];
    }
    adjusted
}

/// Bonferroni adjusted p-values: `min(p * n, 1)`.
pub fn bonferroni(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len() as f64;
    p_values.iter().map(|&p| (p * n).min(1.0)).collect()
}
