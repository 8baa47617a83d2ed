//! # chargestop-model: Charging Stop Planning as a MILP
//!
//! Decides where an electric vehicle stops to charge on a fixed route and how
//! much it charges at each stop. Candidate stations lie along the route in
//! order; the vehicle starts with a known state of charge and must keep a
//! reserve on arrival at every stop and at the destination.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CHARGING STOP PLANNING                                                  │
//! │  ──────────────────────                                                  │
//! │                                                                          │
//! │  Given:                                                                  │
//! │    • Route with n candidate stations (energy/time to reach each)        │
//! │    • Battery capacity, initial energy, minimum reserve fraction         │
//! │    • Two-piece charging curve per station (fast, then taper)            │
//! │                                                                          │
//! │  Decide:                                                                 │
//! │    • Which stations to stop at (binary)                                 │
//! │    • Arrival/departure energy and time at every location                │
//! │                                                                          │
//! │  Minimize one of:                                                        │
//! │    • travel time, charging cost, number of stops, (cost, time)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pipeline
//!
//! | Step | Type | Module |
//! |------|------|--------|
//! | Validate parameters | [`ProblemInstance`] | [`instance`] |
//! | Declare variables and constraints | [`ModelBuilder`] → [`ConstraintSystem`] | [`builder`] |
//! | Visiting order | [`OrderingEncoder`] | [`ordering`] |
//! | Charging curve | [`PiecewiseChargingFunction`] | [`charging`] |
//! | Objective | [`ObjectiveSelector`] | [`objective`] |
//! | Solve | [`solve`] → [`PlanOutcome`] | [`mod@solve`] |
//!
//! ## Example
//!
//! ```
//! use chargestop_model::{
//!     solve, ModelBuilder, ObjectiveConfig, ObjectiveMode, ProblemInstanceBuilder, SolverConfig,
//! };
//!
//! let instance = ProblemInstanceBuilder::new(100.0)
//!     .min_soc_fraction(0.1)
//!     .initial_energy(50.0)
//!     .route(130.0, 100.0)
//!     .station(40.0, 30.0, 50.0, 0.4)
//!     .build()?;
//!
//! let system = ModelBuilder::new(&instance)
//!     .objective(ObjectiveConfig::new(ObjectiveMode::TravelTime))
//!     .build()?;
//! let outcome = solve(&system, &SolverConfig::default())?;
//!
//! println!("{}", outcome.summary());
//! # Ok::<(), chargestop_model::PlanError>(())
//! ```

pub mod builder;
pub mod charging;
pub mod error;
pub mod instance;
pub mod kpi;
pub mod objective;
pub mod ordering;
pub mod solution;
pub mod solve;
pub mod system;

pub use builder::{ModelBuilder, PlanVariables};
pub use charging::{ChargeSegment, PiecewiseChargingFunction};
pub use error::{ConfigurationError, PlanError, PlanResult};
pub use instance::{InstanceData, ProblemInstance, ProblemInstanceBuilder, StationInput, StationRecord};
pub use kpi::{KpiExpressions, KpiExtractor, KpiValues};
pub use objective::{
    CostBasis, MultiObjectivePolicy, Objective, ObjectiveConfig, ObjectiveGoal, ObjectiveMode,
    ObjectiveSelector,
};
pub use ordering::{OrderingEncoder, OrderingVariables, PairTable};
pub use solution::{Assignment, LocationAssignment, PairAssignment, PlanOutcome, Violation};
pub use solve::{solve, SolverConfig};
pub use system::{
    ConstraintFamily, ConstraintSystem, LinearConstraint, ModelStatistics, Sense, VariableInfo,
    VariableKind,
};

pub use chargestop_solver_common::{MilpBackend, SolveStatus, SolverError};
