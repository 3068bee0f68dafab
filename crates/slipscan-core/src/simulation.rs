//! Monte Carlo null model: uniform draws without replacement.
//!
//! Simulation `i` owns an RNG seeded with `seed + i`, so each run's output
//! depends only on `(seed, i)`. Runs are independent and can execute on the
//! rayon pool; the result is always sorted by `simulation_id` and is identical
//! to a sequential execution.
//!
//! Every run keeps a streaming per-feature mean over its draws. The raw draws
//! and feature vectors are only kept when the [`RawRetention`] policy selects
//! the run, which bounds memory for large simulation counts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::LotteryConfig;
use crate::error::SimulationError;
use crate::features::{FeatureExtractor, FeatureSchema, FeatureVector};

/// Progress callback: `(completed, total)` simulations.
pub type Progress<'a> = &'a (dyn Fn(usize, usize) + Sync);

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Shared cancellation flag, checked before each simulation starts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Which runs keep their raw draws and feature vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RawRetention {
    #[default]
    All,
    None,
    /// Runs with `simulation_id < k`.
    FirstRuns(usize),
}

impl RawRetention {
    pub fn keeps(self, simulation_id: u64) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::FirstRuns(k) => simulation_id < k as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSettings {
    pub n_simulations: usize,
    pub n_draws_per_sim: usize,
    pub seed: u64,
    pub parallel: bool,
    pub retention: RawRetention,
}

impl SimulationSettings {
    /// Parallel execution, all raw rows retained.
    pub fn new(n_simulations: usize, n_draws_per_sim: usize, seed: u64) -> Self {
        Self {
            n_simulations,
            n_draws_per_sim,
            seed,
            parallel: true,
            retention: RawRetention::All,
        }
    }

    fn check(&self) -> Result<(), SimulationError> {
        if self.n_simulations == 0 {
            return Err(SimulationError::InvalidSettings(
                "n_simulations must be at least 1".into(),
            ));
        }
        if self.n_draws_per_sim == 0 {
            return Err(SimulationError::InvalidSettings(
                "n_draws_per_sim must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SimulationRun
// ---------------------------------------------------------------------------

/// One simulated dataset of `n_draws` draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRun {
    pub simulation_id: u64,
    pub n_draws: usize,
    pub schema: FeatureSchema,
    /// Finite-only mean of each feature over the run, in schema order.
    /// NaN when a feature had no finite value in this run.
    pub means: Vec<f64>,
    /// Raw draws, empty unless retained.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub draws: Vec<Vec<u32>>,
    /// Raw feature vectors, empty unless retained.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<FeatureVector>,
}

impl SimulationRun {
    /// True when raw draws and feature vectors were kept.
    pub fn has_raw(&self) -> bool {
        !self.features.is_empty()
    }

    /// Run-level mean of one feature.
    pub fn mean(&self, feature: &str) -> Option<f64> {
        self.means.get(self.schema.index_of(feature)?).copied()
    }

    /// Retained raw values of one feature.
    pub fn column(&self, feature: &str) -> Option<Vec<f64>> {
        let idx = self.schema.index_of(feature)?;
        self.features.iter().map(|v| v.values().get(idx).copied()).collect()
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Generates null-model datasets for one lottery variant.
#[derive(Debug, Clone)]
pub struct MonteCarloSimulator {
    extractor: FeatureExtractor,
}

impl MonteCarloSimulator {
    pub fn new(config: &LotteryConfig, schema: FeatureSchema) -> Self {
        Self {
            extractor: FeatureExtractor::new(config, schema),
        }
    }

    pub fn config(&self) -> &LotteryConfig {
        self.extractor.grid().config()
    }

    pub fn schema(&self) -> FeatureSchema {
        self.extractor.schema()
    }

    /// `n_simulations` runs of `n_draws_per_sim` draws, keeping every raw row.
    pub fn run(
        &self,
        n_simulations: usize,
        n_draws_per_sim: usize,
        seed: u64,
    ) -> Result<Vec<SimulationRun>, SimulationError> {
        let settings = SimulationSettings::new(n_simulations, n_draws_per_sim, seed);
        self.run_with(&settings, &CancelToken::new(), None)
    }

    /// Full-control entry point. Returns either every run, ordered by id, or
    /// an error; never a partial result.
    pub fn run_with(
        &self,
        settings: &SimulationSettings,
        cancel: &CancelToken,
        progress: Option<Progress<'_>>,
    ) -> Result<Vec<SimulationRun>, SimulationError> {
        settings.check()?;
        let total = settings.n_simulations;
        log::info!(
            "simulating {} x {} draws for {} (seed {}, {})",
            total,
            settings.n_draws_per_sim,
            self.config().slug(),
            settings.seed,
            if settings.parallel { "parallel" } else { "sequential" }
        );
        let start = Instant::now();
        let completed = AtomicUsize::new(0);

        let one = |i: usize| -> Result<SimulationRun, SimulationError> {
            if cancel.is_cancelled() {
                return Err(SimulationError::Cancelled {
                    completed: completed.load(Ordering::SeqCst),
                    total,
                });
            }
            let run = self.simulate_one(i as u64, settings)?;
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            log::debug!("simulation {i} done ({done}/{total})");
            if let Some(report) = progress {
                report(done, total);
            }
            Ok(run)
        };

        let mut runs = if settings.parallel {
            (0..total)
                .into_par_iter()
                .map(one)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            (0..total).map(one).collect::<Result<Vec<_>, _>>()?
        };
        runs.sort_by_key(|r| r.simulation_id);

        log::info!(
            "{} simulations finished in {:.2}s",
            runs.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(runs)
    }

    fn simulate_one(
        &self,
        simulation_id: u64,
        settings: &SimulationSettings,
    ) -> Result<SimulationRun, SimulationError> {
        let config = self.config();
        let width = self.schema().len();
        let keep_raw = settings.retention.keeps(simulation_id);
        let mut rng = StdRng::seed_from_u64(settings.seed.wrapping_add(simulation_id));

        let mut sums = vec![0.0f64; width];
        let mut counts = vec![0usize; width];
        let mut draws = Vec::new();
        let mut features = Vec::new();

        for _ in 0..settings.n_draws_per_sim {
            let numbers = random_draw(&mut rng, config);
            let vector = self
                .extractor
                .extract(&numbers)
                .map_err(|source| SimulationError::Feature {
                    simulation_id,
                    source,
                })?;
            for (i, &x) in vector.values().iter().enumerate() {
                if x.is_finite() {
                    sums[i] += x;
                    counts[i] += 1;
                }
            }
            if keep_raw {
                draws.push(numbers);
                features.push(vector);
            }
        }

        let means = sums
            .iter()
            .zip(&counts)
            .map(|(&s, &c)| if c == 0 { f64::NAN } else { s / c as f64 })
            .collect();

        Ok(SimulationRun {
            simulation_id,
            n_draws: settings.n_draws_per_sim,
            schema: self.schema(),
            means,
            draws,
            features,
        })
    }
}

/// `draw_size` distinct numbers, uniform without replacement, sorted ascending.
fn random_draw(rng: &mut StdRng, config: &LotteryConfig) -> Vec<u32> {
    let mut numbers: Vec<u32> = rand::seq::index::sample(
        rng,
        config.total_numbers() as usize,
        config.draw_size(),
    )
    .iter()
    .map(|idx| config.min_number() + idx as u32)
    .collect();
    numbers.sort_unstable();
    numbers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridMapper;

    fn mega_sim() -> MonteCarloSimulator {
        MonteCarloSimulator::new(&LotteryConfig::megasena(), FeatureSchema::Grid)
    }

    #[test]
    fn test_shape_and_ordering() {
        let runs = mega_sim().run(20, 15, 7).unwrap();
        assert_eq!(runs.len(), 20);
        for (i, run) in runs.iter().enumerate() {
            assert_eq!(run.simulation_id, i as u64);
            assert_eq!(run.n_draws, 15);
            assert_eq!(run.draws.len(), 15);
            assert_eq!(run.features.len(), 15);
            assert_eq!(run.means.len(), FeatureSchema::Grid.len());
        }
    }

    #[test]
    fn test_draws_are_valid() {
        let sim = MonteCarloSimulator::new(&LotteryConfig::lotofacil(), FeatureSchema::Slip);
        let grid = GridMapper::new(&LotteryConfig::lotofacil());
        for run in sim.run(5, 40, 123).unwrap() {
            for draw in &run.draws {
                assert!(grid.validate(draw));
                assert!(draw.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let sim = mega_sim();
        let mut settings = SimulationSettings::new(30, 25, 42);
        let parallel = sim.run_with(&settings, &CancelToken::new(), None).unwrap();
        settings.parallel = false;
        let sequential = sim.run_with(&settings, &CancelToken::new(), None).unwrap();
        assert_eq!(parallel.len(), sequential.len());
        for (a, b) in parallel.iter().zip(&sequential) {
            assert_eq!(a.draws, b.draws);
            assert_eq!(
                a.means.iter().map(|m| m.to_bits()).collect::<Vec<_>>(),
                b.means.iter().map(|m| m.to_bits()).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_seed_changes_output() {
        let sim = mega_sim();
        let a = sim.run(3, 10, 1).unwrap();
        let b = sim.run(3, 10, 2).unwrap();
        assert_ne!(a[0].draws, b[0].draws);
        // Run i of seed s equals run i-1 of seed s+1.
        assert_eq!(a[1].draws, b[0].draws);
    }

    #[test]
    fn test_means_match_raw_features() {
        let runs = mega_sim().run(2, 50, 9).unwrap();
        let run = &runs[0];
        let raw = run.column("dispersion").unwrap();
        let expected = raw.iter().sum::<f64>() / raw.len() as f64;
        assert!((run.mean("dispersion").unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_means_skip_non_finite() {
        let runs = mega_sim().run(4, 200, 5).unwrap();
        for run in &runs {
            let ecc = run.mean("eccentricity").unwrap();
            assert!(ecc.is_finite());
        }
    }

    #[test]
    fn test_retention_policy() {
        let sim = mega_sim();
        let mut settings = SimulationSettings::new(6, 10, 3);
        settings.retention = RawRetention::FirstRuns(2);
        let runs = sim.run_with(&settings, &CancelToken::new(), None).unwrap();
        assert!(runs[0].has_raw() && runs[1].has_raw());
        assert!(runs[2..].iter().all(|r| !r.has_raw() && r.draws.is_empty()));

        let full = sim.run(6, 10, 3).unwrap();
        for (kept, all) in runs.iter().zip(&full) {
            assert_eq!(
                kept.means.iter().map(|m| m.to_bits()).collect::<Vec<_>>(),
                all.means.iter().map(|m| m.to_bits()).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_invalid_settings() {
        let sim = mega_sim();
        assert!(matches!(
            sim.run(0, 10, 1),
            Err(SimulationError::InvalidSettings(_))
        ));
        assert!(matches!(
            sim.run(10, 0, 1),
            Err(SimulationError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let settings = SimulationSettings::new(10, 10, 1);
        let result = mega_sim().run_with(&settings, &cancel, None);
        assert!(matches!(
            result,
            Err(SimulationError::Cancelled { completed: 0, total: 10 })
        ));
    }

    #[test]
    fn test_progress_reaches_total() {
        let seen = AtomicUsize::new(0);
        let report = |done: usize, total: usize| {
            assert!(done <= total);
            seen.fetch_max(done, Ordering::SeqCst);
        };
        let settings = SimulationSettings::new(12, 5, 1);
        mega_sim()
            .run_with(&settings, &CancelToken::new(), Some(&report))
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn test_mean_lookup_on_short_run() {
        let mut run = mega_sim().run(1, 5, 3).unwrap().remove(0);
        assert!(run.mean("q1").is_some());
        run.means.truncate(1);
        assert_eq!(run.mean("q1"), None);
        assert_eq!(run.mean("no_such_feature"), None);
    }
}
