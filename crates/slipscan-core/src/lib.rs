//! # slipscan-core
//!
//! **Do lottery draws fall on the betting slip the way chance says they should?**
//!
//! `slipscan-core` maps each drawn number onto its cell of the printed slip,
//! reduces every draw to a vector of spatial features, and compares the
//! observed dataset against a Monte Carlo null model of uniform draws.
//!
//! ## Quick Start
//!
//! ```no_run
//! use slipscan_core::{AnalysisSettings, CancelToken, Draw, Registry, analyze};
//!
//! let registry = Registry::builtin();
//! let config = registry.get("megasena").unwrap();
//! let draws = vec![
//!     Draw::new(Some(1), vec![4, 5, 30, 33, 41, 52]),
//!     Draw::new(Some(2), vec![9, 37, 39, 41, 43, 49]),
//! ];
//!
//! let settings = AnalysisSettings { n_simulations: 1_000, ..Default::default() };
//! let report = analyze(config, &draws, &settings, &CancelToken::new()).unwrap();
//! println!("{} of {} features significant", report.summary.significant_count,
//!     report.summary.features_tested);
//! ```
//!
//! ## Architecture
//!
//! GridMapper → FeatureExtractor → MonteCarloSimulator → Baseline → HypothesisValidator
//!
//! The comparison unit is the dataset-level mean: the observed mean of each
//! feature is ranked against the per-simulation means, never against single
//! simulated draws. KS and Mann-Whitney tests on raw values are supplementary.

pub mod baseline;
pub mod config;
pub mod draw;
pub mod error;
pub mod features;
pub mod grid;
pub mod report;
pub mod simulation;
pub mod validation;

pub use baseline::{BaselineStatistic, BaselineTable, summarize};
pub use config::{LotteryConfig, Registry};
pub use draw::Draw;
pub use error::{
    ConfigError, Error, InvalidDrawError, RangeError, Result, SimulationError,
    ValidationInputError,
};
pub use features::{FeatureExtractor, FeatureSchema, FeatureTable, FeatureVector};
pub use grid::{GridMapper, GridPosition, Quadrant};
pub use report::{
    AnalysisSettings, SpatialReport, TopFeature, ValidationSummary, analyze,
    analyze_with_progress, extract_observed,
};
pub use simulation::{
    CancelToken, MonteCarloSimulator, Progress, RawRetention, SimulationRun, SimulationSettings,
};
pub use slipscan_tests::CorrectionMethod;
pub use validation::{EffectSize, HypothesisValidator, SimMeans, ValidationResult};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
