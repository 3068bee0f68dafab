//! Null-model baseline over simulation-level means.
//!
//! The unit of comparison is one simulated dataset: for each feature the
//! statistics below are taken over the per-run means, never over individual
//! simulated draws.

use serde::Serialize;
use slipscan_tests::{finite, mean, percentile_sorted, sample_std};

use crate::error::ValidationInputError;
use crate::features::FeatureSchema;
use crate::simulation::SimulationRun;

/// Distribution of one feature's per-run mean under the null model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineStatistic {
    pub feature: String,
    /// Runs that contributed a finite mean.
    pub runs: usize,
    pub mean: f64,
    /// Sample standard deviation (n-1).
    pub std: f64,
    pub p2_5: f64,
    pub p50: f64,
    pub p97_5: f64,
    pub min: f64,
    pub max: f64,
}

impl BaselineStatistic {
    /// Summary of a set of per-run means. Non-finite entries are dropped; if
    /// none remain every statistic is 0.0.
    pub fn from_means(feature: &str, means: &[f64]) -> Self {
        let mut values = finite(means);
        if values.len() < means.len() {
            log::warn!(
                "{feature}: {} of {} run means are not finite and were dropped",
                means.len() - values.len(),
                means.len()
            );
        }
        if values.is_empty() {
            return Self {
                feature: feature.to_string(),
                runs: 0,
                mean: 0.0,
                std: 0.0,
                p2_5: 0.0,
                p50: 0.0,
                p97_5: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }
        values.sort_by(f64::total_cmp);
        Self {
            feature: feature.to_string(),
            runs: values.len(),
            mean: mean(&values),
            std: sample_std(&values),
            p2_5: percentile_sorted(&values, 2.5),
            p50: percentile_sorted(&values, 50.0),
            p97_5: percentile_sorted(&values, 97.5),
            min: values[0],
            max: values[values.len() - 1],
        }
    }
}

/// Baseline for every feature of one schema, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineTable {
    pub schema: FeatureSchema,
    pub n_simulations: usize,
    pub features: Vec<BaselineStatistic>,
}

impl BaselineTable {
    pub fn get(&self, feature: &str) -> Option<&BaselineStatistic> {
        self.features.iter().find(|s| s.feature == feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BaselineStatistic> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Per-run means of every feature, column by column. Runs must share a schema
/// and carry one mean per feature.
pub(crate) fn run_means(
    runs: &[SimulationRun],
) -> Result<(FeatureSchema, Vec<Vec<f64>>), ValidationInputError> {
    let schema = runs
        .first()
        .map(|r| r.schema)
        .ok_or(ValidationInputError::NoSimulations)?;
    if runs.iter().any(|r| r.schema != schema) {
        return Err(ValidationInputError::MixedRunSchemas);
    }
    if let Some(r) = runs.iter().find(|r| r.means.len() != schema.len()) {
        return Err(ValidationInputError::RaggedRow {
            row: r.simulation_id as usize,
            expected: schema.len(),
            got: r.means.len(),
        });
    }
    let columns = (0..schema.len())
        .map(|i| runs.iter().map(|r| r.means[i]).collect())
        .collect();
    Ok((schema, columns))
}

/// Baseline statistics of every feature over the simulation runs.
pub fn summarize(runs: &[SimulationRun]) -> Result<BaselineTable, ValidationInputError> {
    let (schema, columns) = run_means(runs)?;
    let features = schema
        .names()
        .iter()
        .zip(&columns)
        .map(|(name, means)| BaselineStatistic::from_means(name, means))
        .collect();
    log::info!(
        "baseline summarized over {} runs, {} features",
        runs.len(),
        schema.len()
    );
    Ok(BaselineTable {
        schema,
        n_simulations: runs.len(),
        features,
    })
}
