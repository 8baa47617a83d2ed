//! Status of a finished solve call.

use serde::{Deserialize, Serialize};

/// Outcome category reported by a solve call.
///
/// `Timeout` means the time budget ran out before optimality was proven; a
/// best-known assignment may still accompany it and must never be reported
/// as optimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Optimal solution found and proven.
    Optimal,
    /// Feasible solution found, optimality not proven (e.g. gap limit).
    Feasible,
    /// No assignment satisfies the constraints.
    Infeasible,
    /// Time budget elapsed before optimality was proven.
    Timeout,
}

impl SolveStatus {
    /// Check if optimality was proven.
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "OPTIMAL"),
            SolveStatus::Feasible => write!(f, "FEASIBLE"),
            SolveStatus::Infeasible => write!(f, "INFEASIBLE"),
            SolveStatus::Timeout => write!(f, "TIMEOUT"),
        }
    }
}
