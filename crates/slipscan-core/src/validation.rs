//! Hypothesis testing of observed features against the simulated null model.
//!
//! The primary test compares the observed dataset mean with the distribution
//! of simulation-level means (Monte Carlo p-value, z-score, 95% interval).
//! KS and Mann-Whitney tests on raw per-draw values are reported as
//! supplementary evidence when raw simulated rows were retained. One
//! multiple-comparison correction is applied across all features.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use slipscan_tests::{
    CorrectionMethod, finite, ks_two_sample, mann_whitney_u, mean, monte_carlo_p_value,
    percentile_sorted, population_std, sample_std,
};

use crate::baseline::run_means;
use crate::error::ValidationInputError;
use crate::features::FeatureTable;
use crate::simulation::SimulationRun;

// ═══════════════════════════════════════════════════════════════════════════════
// Result types
// ═══════════════════════════════════════════════════════════════════════════════

/// Magnitude class of `|z|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectSize {
    Small,
    Medium,
    Large,
}

impl EffectSize {
    /// Large at 0.5 and above, medium at 0.2 and above.
    pub fn classify(effect_size: f64) -> Self {
        if effect_size >= 0.5 {
            Self::Large
        } else if effect_size >= 0.2 {
            Self::Medium
        } else {
            Self::Small
        }
    }
}

impl fmt::Display for EffectSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
        }
    }
}

/// Outcome of testing one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub feature: String,
    pub observed_mean: f64,
    pub observed_std: f64,
    pub simulated_mean: f64,
    pub simulated_std: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub outside_ci_95: bool,
    pub z_score: f64,
    pub effect_size: f64,
    pub effect_interpretation: EffectSize,
    pub raw_p_value: f64,
    pub ks_statistic: Option<f64>,
    pub ks_p_value: Option<f64>,
    pub mann_whitney_u: Option<f64>,
    pub mann_whitney_p: Option<f64>,
    pub adjusted_p_value: f64,
    pub significant: bool,
    pub difference: f64,
    pub difference_pct: f64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Simulation-level means
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-run means of each feature: `column(name)[i]` belongs to run `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimMeans {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl SimMeans {
    /// Means supplied column by column; every column must have one value per run.
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self, ValidationInputError> {
        if names.len() != columns.len() {
            return Err(ValidationInputError::RaggedRow {
                row: 0,
                expected: names.len(),
                got: columns.len(),
            });
        }
        let n_runs = columns.first().map_or(0, Vec::len);
        if let Some((i, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != n_runs) {
            return Err(ValidationInputError::RaggedRow {
                row: i,
                expected: n_runs,
                got: col.len(),
            });
        }
        Ok(Self { names, columns })
    }

    pub fn from_runs(runs: &[SimulationRun]) -> Result<Self, ValidationInputError> {
        let (schema, columns) = run_means(runs)?;
        Ok(Self {
            names: schema.names().iter().map(|s| s.to_string()).collect(),
            columns,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_runs(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(&self.columns[idx])
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Validator
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HypothesisValidator {
    alpha: f64,
    correction: CorrectionMethod,
}

impl HypothesisValidator {
    /// `alpha` must lie strictly between 0 and 1.
    pub fn new(alpha: f64, correction: CorrectionMethod) -> Result<Self, ValidationInputError> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ValidationInputError::InvalidAlpha(alpha));
        }
        Ok(Self { alpha, correction })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn correction(&self) -> CorrectionMethod {
        self.correction
    }

    /// Test every observed feature against the simulation runs.
    ///
    /// Raw simulated values for KS and Mann-Whitney come from whichever runs
    /// retained their feature vectors, read one column at a time.
    pub fn validate(
        &self,
        observed: &FeatureTable,
        runs: &[SimulationRun],
    ) -> Result<Vec<ValidationResult>, ValidationInputError> {
        let sim_means = SimMeans::from_runs(runs)?;
        let schema = runs[0].schema;
        let retained = || runs.iter().flat_map(|r| r.features.iter());
        if retained().any(|v| v.schema() != schema) {
            return Err(ValidationInputError::MixedRunSchemas);
        }
        let raw_names: Vec<String> = if retained().next().is_some() {
            schema.names().iter().map(|s| s.to_string()).collect()
        } else {
            Vec::new()
        };
        self.score_all(observed, &sim_means, &raw_names, |name| {
            let idx = schema.index_of(name)?;
            Some(retained().filter_map(|v| v.values().get(idx).copied()).collect())
        })
    }

    /// Lower-level entry point for tables produced outside the simulator.
    ///
    /// An empty `simulated_raw` table means raw values are unavailable and the
    /// distributional test fields are left as `None`.
    pub fn validate_tables(
        &self,
        observed: &FeatureTable,
        simulated_raw: &FeatureTable,
        sim_means: &SimMeans,
    ) -> Result<Vec<ValidationResult>, ValidationInputError> {
        let raw_names = if simulated_raw.is_empty() {
            &[][..]
        } else {
            simulated_raw.names()
        };
        self.score_all(observed, sim_means, raw_names, |name| {
            simulated_raw.column(name)
        })
    }

    /// Score and correct every feature. `raw_names` is empty when no raw
    /// simulated values exist; otherwise `raw_column` yields them by name.
    fn score_all<F>(
        &self,
        observed: &FeatureTable,
        sim_means: &SimMeans,
        raw_names: &[String],
        raw_column: F,
    ) -> Result<Vec<ValidationResult>, ValidationInputError>
    where
        F: Fn(&str) -> Option<Vec<f64>>,
    {
        if observed.names().is_empty() {
            return Err(ValidationInputError::EmptyFeatureSet);
        }
        check_same_keys(observed.names(), sim_means.names())?;
        if !raw_names.is_empty() {
            check_same_keys(observed.names(), raw_names)?;
        }
        if observed.is_empty() {
            return Err(ValidationInputError::NoObservations);
        }
        if sim_means.n_runs() == 0 {
            return Err(ValidationInputError::NoSimulations);
        }

        log::info!(
            "validating {} features: {} observed draws vs {} simulations ({}, alpha {})",
            observed.names().len(),
            observed.len(),
            sim_means.n_runs(),
            self.correction,
            self.alpha
        );

        let mut results: Vec<ValidationResult> = observed
            .names()
            .iter()
            .map(|name| {
                let obs = observed.column(name).unwrap_or_default();
                let sims = sim_means.column(name).unwrap_or_default();
                let raw = if raw_names.is_empty() {
                    None
                } else {
                    raw_column(name)
                };
                score_feature(name, &obs, sims, raw.as_deref())
            })
            .collect();

        let raw_p: Vec<f64> = results.iter().map(|r| r.raw_p_value).collect();
        let (adjusted, reject) = self.correction.apply(&raw_p, self.alpha).map_err(|e| {
            ValidationInputError::InvalidPValue {
                feature: results[e.index].feature.clone(),
                value: e.value,
            }
        })?;
        for ((result, adj), rej) in results.iter_mut().zip(adjusted).zip(reject) {
            result.adjusted_p_value = adj;
            result.significant = rej;
        }

        results.sort_by(|a, b| b.effect_size.total_cmp(&a.effect_size));
        log::info!(
            "{} of {} features significant",
            results.iter().filter(|r| r.significant).count(),
            results.len()
        );
        Ok(results)
    }
}

fn check_same_keys(observed: &[String], simulated: &[String]) -> Result<(), ValidationInputError> {
    let obs: BTreeSet<&str> = observed.iter().map(String::as_str).collect();
    let sim: BTreeSet<&str> = simulated.iter().map(String::as_str).collect();
    if obs == sim {
        return Ok(());
    }
    Err(ValidationInputError::SchemaMismatch {
        only_observed: obs.difference(&sim).map(|s| s.to_string()).collect(),
        only_simulated: sim.difference(&obs).map(|s| s.to_string()).collect(),
    })
}

/// Everything but the corrected p-value and the significance flag.
fn score_feature(
    name: &str,
    observed: &[f64],
    sim_means: &[f64],
    simulated_raw: Option<&[f64]>,
) -> ValidationResult {
    let obs = finite(observed);
    if obs.len() < observed.len() {
        log::warn!(
            "{name}: dropped {} non-finite observed values",
            observed.len() - obs.len()
        );
    }
    let mut sims = finite(sim_means);
    sims.sort_by(f64::total_cmp);

    let observed_mean = mean(&obs);
    let simulated_mean = mean(&sims);
    let simulated_std = sample_std(&sims);
    let z_score = if simulated_std > 0.0 {
        (observed_mean - simulated_mean) / simulated_std
    } else {
        0.0
    };
    let effect_size = z_score.abs();
    let ci_lower = percentile_sorted(&sims, 2.5);
    let ci_upper = percentile_sorted(&sims, 97.5);

    let raw = simulated_raw.map(finite);
    let ks = raw.as_deref().and_then(|r| ks_two_sample(&obs, r));
    let mw = raw.as_deref().and_then(|r| mann_whitney_u(&obs, r));

    let difference = observed_mean - simulated_mean;
    let difference_pct = if simulated_mean != 0.0 {
        difference / simulated_mean * 100.0
    } else {
        0.0
    };

    let raw_p_value = monte_carlo_p_value(observed_mean, &sims);
    ValidationResult {
        feature: name.to_string(),
        observed_mean,
        observed_std: population_std(&obs),
        simulated_mean,
        simulated_std,
        ci_lower,
        ci_upper,
        outside_ci_95: observed_mean < ci_lower || observed_mean > ci_upper,
        z_score,
        effect_size,
        effect_interpretation: EffectSize::classify(effect_size),
        raw_p_value,
        ks_statistic: ks.map(|t| t.statistic),
        ks_p_value: ks.map(|t| t.p_value),
        mann_whitney_u: mw.map(|t| t.statistic),
        mann_whitney_p: mw.map(|t| t.p_value),
        adjusted_p_value: raw_p_value,
        significant: false,
        difference,
        difference_pct,
    }
}
