//! Common types for the chargestop solve pipeline.
//!
//! The model crate assembles a mixed-integer program and hands it to one of the
//! MILP backends listed in [`MilpBackend`]. Whatever the backend reports is
//! normalized into a [`SolveStatus`] so callers branch on one taxonomy:
//!
//! ```text
//! chargestop-model ──ConstraintSystem──> backend (microlp | HiGHS)
//!                  <──SolveStatus + values──
//! ```
//!
//! Infeasibility and timeouts are statuses, not errors. [`SolverError`] is
//! reserved for failures of the solving machinery itself.

pub mod backend;
pub mod error;
pub mod status;

pub use backend::MilpBackend;
pub use error::SolverError;
pub use status::SolveStatus;
