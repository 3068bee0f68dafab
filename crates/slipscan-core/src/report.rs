//! End-to-end analysis and the report it produces.

use serde::Serialize;
use slipscan_tests::CorrectionMethod;

use crate::baseline::{self, BaselineTable};
use crate::config::LotteryConfig;
use crate::draw::Draw;
use crate::error::{Error, Result};
use crate::features::{FeatureExtractor, FeatureSchema, FeatureTable};
use crate::simulation::{
    CancelToken, MonteCarloSimulator, Progress, RawRetention, SimulationSettings,
};
use crate::validation::{EffectSize, HypothesisValidator, ValidationResult};

/// Knobs for [`analyze`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSettings {
    pub schema: FeatureSchema,
    pub n_simulations: usize,
    /// Draws per simulated dataset; defaults to the number of observed draws.
    pub n_draws_per_sim: Option<usize>,
    pub seed: u64,
    pub alpha: f64,
    pub correction: CorrectionMethod,
    pub parallel: bool,
    pub retention: RawRetention,
    /// Entries in [`ValidationSummary::top_by_effect`].
    pub top_n: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            schema: FeatureSchema::Grid,
            n_simulations: 10_000,
            n_draws_per_sim: None,
            seed: 42,
            alpha: 0.05,
            correction: CorrectionMethod::BenjaminiHochberg,
            parallel: true,
            retention: RawRetention::FirstRuns(100),
            top_n: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopFeature {
    pub feature: String,
    pub effect_size: f64,
    pub adjusted_p_value: f64,
    pub significant: bool,
}

/// Headline counts over a set of validation results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub features_tested: usize,
    pub significant_count: usize,
    pub large_effect_count: usize,
    pub medium_effect_count: usize,
    pub correction_method: String,
    pub significant_features: Vec<String>,
    pub large_effect_features: Vec<String>,
    pub top_by_effect: Vec<TopFeature>,
}

impl ValidationSummary {
    /// `results` are expected in validator order (descending effect size);
    /// the first `top_n` become `top_by_effect`.
    pub fn from_results(
        results: &[ValidationResult],
        method: CorrectionMethod,
        top_n: usize,
    ) -> Self {
        let with_effect = |e: EffectSize| results.iter().filter(move |r| r.effect_interpretation == e);
        Self {
            features_tested: results.len(),
            significant_count: results.iter().filter(|r| r.significant).count(),
            large_effect_count: with_effect(EffectSize::Large).count(),
            medium_effect_count: with_effect(EffectSize::Medium).count(),
            correction_method: method.to_string(),
            significant_features: results
                .iter()
                .filter(|r| r.significant)
                .map(|r| r.feature.clone())
                .collect(),
            large_effect_features: with_effect(EffectSize::Large)
                .map(|r| r.feature.clone())
                .collect(),
            top_by_effect: results
                .iter()
                .take(top_n)
                .map(|r| TopFeature {
                    feature: r.feature.clone(),
                    effect_size: r.effect_size,
                    adjusted_p_value: r.adjusted_p_value,
                    significant: r.significant,
                })
                .collect(),
        }
    }

    /// Share of tested features that came out significant, in percent.
    pub fn significant_pct(&self) -> f64 {
        if self.features_tested == 0 {
            0.0
        } else {
            self.significant_count as f64 / self.features_tested as f64 * 100.0
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SpatialReport {
    pub config: LotteryConfig,
    pub schema: FeatureSchema,
    pub settings: AnalysisSettings,
    pub observed: FeatureTable,
    pub baseline: BaselineTable,
    pub results: Vec<ValidationResult>,
    pub summary: ValidationSummary,
}

/// Feature table of the observed draws. Fails on the first invalid draw.
pub fn extract_observed(
    config: &LotteryConfig,
    schema: FeatureSchema,
    draws: &[Draw],
) -> Result<FeatureTable> {
    let extractor = FeatureExtractor::new(config, schema);
    let mut table = FeatureTable::for_schema(schema);
    for (index, draw) in draws.iter().enumerate() {
        let vector = extractor
            .extract(&draw.numbers)
            .map_err(|source| Error::ObservedDraw {
                index,
                contest: draw.contest,
                source,
            })?;
        table.push_row(vector.values().to_vec())?;
    }
    Ok(table)
}

/// Extraction, simulation, baseline and validation, in that order.
pub fn analyze(
    config: &LotteryConfig,
    draws: &[Draw],
    settings: &AnalysisSettings,
    cancel: &CancelToken,
) -> Result<SpatialReport> {
    analyze_with_progress(config, draws, settings, cancel, None)
}

pub fn analyze_with_progress(
    config: &LotteryConfig,
    draws: &[Draw],
    settings: &AnalysisSettings,
    cancel: &CancelToken,
    progress: Option<Progress<'_>>,
) -> Result<SpatialReport> {
    let validator = HypothesisValidator::new(settings.alpha, settings.correction)?;
    log::info!(
        "analyzing {} draws of {} with the {} feature set",
        draws.len(),
        config.slug(),
        settings.schema.as_str()
    );

    let observed = extract_observed(config, settings.schema, draws)?;

    let simulation = SimulationSettings {
        n_simulations: settings.n_simulations,
        n_draws_per_sim: settings.n_draws_per_sim.unwrap_or(draws.len()),
        seed: settings.seed,
        parallel: settings.parallel,
        retention: settings.retention,
    };
    let runs = MonteCarloSimulator::new(config, settings.schema).run_with(
        &simulation,
        cancel,
        progress,
    )?;

    let baseline = baseline::summarize(&runs)?;
    let results = validator.validate(&observed, &runs)?;
    let summary = ValidationSummary::from_results(&results, settings.correction, settings.top_n);

    Ok(SpatialReport {
        config: config.clone(),
        schema: settings.schema,
        settings: settings.clone(),
        observed,
        baseline,
        results,
        summary,
    })
}
