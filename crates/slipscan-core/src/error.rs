//! Error types for the analysis pipeline.
//!
//! Numeric edge cases (zero variance, empty intervals) are never errors; they
//! resolve to documented sentinel values inside the feature and validation code.

use crate::grid::GridPosition;

/// A number or grid coordinate outside the configured bounds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("number {number} outside [{min}, {max}]")]
    Number { number: u32, min: u32, max: u32 },
    #[error("position ({}, {}) outside {rows}x{cols} grid", .position.row, .position.col)]
    Position {
        position: GridPosition,
        rows: usize,
        cols: usize,
    },
}

/// A draw that fails validation against its lottery configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDrawError {
    #[error("draw has {got} numbers, expected {expected}")]
    WrongSize { expected: usize, got: usize },
    #[error("number {0} appears more than once")]
    Duplicate(u32),
    #[error("number {number} outside [{min}, {max}]")]
    OutOfRange { number: u32, min: u32, max: u32 },
}

/// An invalid or unknown lottery configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid lottery configuration '{slug}': {reason}")]
    Invalid { slug: String, reason: String },
    #[error("unknown lottery variant '{slug}' (available: {available})")]
    UnknownVariant { slug: String, available: String },
    #[error("failed to parse lottery variants: {0}")]
    Parse(String),
}

/// Malformed input reaching the baseline or validation stage. Always fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationInputError {
    #[error("no features to validate")]
    EmptyFeatureSet,
    #[error("observed table has no draws")]
    NoObservations,
    #[error("no simulation runs supplied")]
    NoSimulations,
    #[error(
        "feature schemas differ: only observed [{}], only simulated [{}]",
        .only_observed.join(", "),
        .only_simulated.join(", ")
    )]
    SchemaMismatch {
        only_observed: Vec<String>,
        only_simulated: Vec<String>,
    },
    #[error("row {row} has {got} values, table has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("simulation runs use different feature schemas")]
    MixedRunSchemas,
    #[error("alpha must lie in (0, 1), got {0}")]
    InvalidAlpha(f64),
    #[error("malformed p-value for feature '{feature}': {value}")]
    InvalidPValue { feature: String, value: f64 },
}

/// Failure of a Monte Carlo run. No partial output is ever returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("invalid simulation settings: {0}")]
    InvalidSettings(String),
    #[error("simulation cancelled after {completed} of {total} runs")]
    Cancelled { completed: usize, total: usize },
    #[error("simulation {simulation_id} produced an invalid draw: {source}")]
    Feature {
        simulation_id: u64,
        #[source]
        source: InvalidDrawError,
    },
}

/// Any failure of the end-to-end analysis.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    InvalidDraw(#[from] InvalidDrawError),
    #[error("observed draw #{index} (contest {}) is invalid: {source}", .contest.map_or_else(|| "-".to_string(), |c| c.to_string()))]
    ObservedDraw {
        index: usize,
        contest: Option<u32>,
        #[source]
        source: InvalidDrawError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    ValidationInput(#[from] ValidationInputError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
