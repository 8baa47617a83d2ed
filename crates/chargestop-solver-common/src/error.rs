//! Error types for solver communication.

use thiserror::Error;

/// Errors raised by the solving machinery.
///
/// A model that turns out to be infeasible is not an error; see
/// [`crate::SolveStatus::Infeasible`].
#[derive(Debug, Error)]
pub enum SolverError {
    /// Unknown backend name.
    #[error("Unknown MILP backend '{name}'; supported values: {available}")]
    UnknownBackend { name: String, available: String },

    /// Backend exists but was not compiled in.
    #[error("MILP backend {0} is not enabled in this build")]
    BackendUnavailable(crate::MilpBackend),

    /// The backend rejected or failed on the model.
    #[error("Solver failed: {0}")]
    Failed(String),

    /// The objective can decrease without bound.
    #[error("Model is unbounded")]
    Unbounded,
}
