//! MILP backend selection.

use crate::SolverError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Mixed-integer backends the model can be handed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilpBackend {
    /// microlp - pure-Rust simplex with branch-and-bound.
    ///
    /// Always available. Does not honour a time limit.
    #[default]
    Microlp,

    /// HiGHS - branch-and-cut MIP solver (native, `solver-highs` feature).
    ///
    /// **Reference:** Huangfu, Q., & Hall, J. A. J. (2018). Parallelizing the dual
    /// revised simplex method. *Mathematical Programming Computation*, 10(1), 119-142.
    Highs,
}

const AVAILABLE_BACKENDS: &[&str] = &[
    "microlp",
    #[cfg(feature = "solver-highs")]
    "highs",
];

impl MilpBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilpBackend::Microlp => "microlp",
            MilpBackend::Highs => "highs",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MilpBackend::Microlp => "microlp",
            MilpBackend::Highs => "HiGHS",
        }
    }

    /// Whether the backend stops at a wall-clock limit.
    pub fn supports_time_limit(&self) -> bool {
        matches!(self, MilpBackend::Highs)
    }

    /// Whether this build can actually run the backend.
    pub fn is_enabled(&self) -> bool {
        AVAILABLE_BACKENDS.contains(&self.as_str())
    }
}

impl std::fmt::Display for MilpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for MilpBackend {
    type Err = SolverError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "microlp" => Ok(MilpBackend::Microlp),
            "highs" => Ok(MilpBackend::Highs),
            other => Err(SolverError::UnknownBackend {
                name: other.to_string(),
                available: AVAILABLE_BACKENDS.join(", "),
            }),
        }
    }
}
