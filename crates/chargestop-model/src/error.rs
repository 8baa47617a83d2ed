//! Error types for instance construction, model assembly and solving.
//!
//! Configuration and assembly errors abort a request before anything reaches a
//! solver. Infeasible and timed-out solves are not errors; they come back as a
//! [`chargestop_solver_common::SolveStatus`] inside the outcome.

use chargestop_solver_common::SolverError;
use thiserror::Error;

/// Malformed or inconsistent problem parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("at least one candidate station is required, got {0}")]
    TooFewStations(usize),

    #[error("station count mismatch: declared {declared}, found {found} station records")]
    StationCountMismatch { declared: usize, found: usize },

    #[error("battery capacity must be positive, got {0}")]
    NonPositiveCapacity(f64),

    #[error("{name} must lie in the open interval (0, 1), got {value}")]
    FractionOutOfRange { name: &'static str, value: f64 },

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{field} of station {order} must be non-negative, got {value}")]
    NegativeValue {
        order: usize,
        field: &'static str,
        value: f64,
    },

    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("initial energy {initial} must lie within [0, {capacity}]")]
    InitialEnergyOutOfRange { initial: f64, capacity: f64 },

    #[error("station {order} has no charging power")]
    ZeroChargingPower { order: usize },

    #[error("station orders must run 1..=n in route order: expected {expected}, found {found}")]
    NonConsecutiveOrder { expected: usize, found: usize },

    #[error("{field} decreases at station {order} ({value} < {previous})")]
    NonMonotonic {
        order: usize,
        field: &'static str,
        value: f64,
        previous: f64,
    },

    #[error(
        "charging curve is not convex: breakpoint fraction {breakpoint} times slope fraction {slope} exceeds 1"
    )]
    NonConvexChargingCurve { breakpoint: f64, slope: f64 },

    #[error("unknown {kind} '{value}'; supported values: {supported}")]
    UnknownOption {
        kind: &'static str,
        value: String,
        supported: &'static str,
    },

    #[error("weighted objective needs {expected} weights, got {found}")]
    ObjectiveWeights { expected: usize, found: usize },

    #[error("objective weights only apply to the multi objective, not '{mode}'")]
    WeightsRequireMulti { mode: &'static str },
}

/// Top-level error for a planning request.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Invalid problem parameters.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Internal invariant broken while declaring variables or constraints.
    #[error("Model assembly error: {0}")]
    ModelAssembly(String),

    /// The solving machinery failed.
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

/// Convenience type alias for planning results.
pub type PlanResult<T> = Result<T, PlanError>;
