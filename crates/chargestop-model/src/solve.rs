//! Solver adapter
//!
//! Hands a [`ConstraintSystem`] to a `good_lp` MILP backend and maps the
//! result onto a [`PlanOutcome`].
//!
//! ## Status mapping
//!
//! | Backend result | [`SolveStatus`] | Assignment |
//! |----------------|-----------------|------------|
//! | optimal | `Optimal` | yes |
//! | time limit with incumbent | `Timeout` | yes |
//! | gap limit | `Feasible` | yes |
//! | infeasible | `Infeasible` | no |
//! | failure after the time budget ran out | `Timeout` | no |
//! | unbounded | error | - |
//! | any other failure | error | - |
//!
//! ## Lexicographic objectives
//!
//! Multi-goal objectives solve one stage per goal. After each stage the goal
//! is bounded by its optimum (plus `lexicographic_tolerance`) so later stages
//! cannot degrade it. The time limit is shared by all stages.

use crate::error::PlanResult;
use crate::kpi::{KpiExpressions, KpiValues};
use crate::objective::{ObjectiveGoal, ObjectiveMode};
use crate::solution::{Assignment, PlanOutcome};
use crate::system::ConstraintSystem;
use chargestop_solver_common::{MilpBackend, SolveStatus, SolverError};
use good_lp::solvers::SolutionStatus;
use good_lp::{constraint, Expression, ResolutionError, Solution, SolverModel};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Solver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// MILP backend
    pub backend: MilpBackend,
    /// Wall-clock budget across all stages (None = unlimited)
    pub time_limit_seconds: Option<f64>,
    /// Slack granted to earlier goals in lexicographic mode, relative to
    /// `max(1, |optimum|)`
    pub lexicographic_tolerance: f64,
    /// Forward solver output to stdout when the backend supports it
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: MilpBackend::default(),
            time_limit_seconds: None,
            lexicographic_tolerance: 1e-6,
            verbose: false,
        }
    }
}

impl SolverConfig {
    pub fn with_backend(mut self, backend: MilpBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_seconds = Some(seconds);
        self
    }

    fn time_limit(&self) -> Option<Duration> {
        self.time_limit_seconds
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64)
    }
}

/// What one stage produced.
enum StageResult {
    Solved(StageValues),
    Infeasible,
    /// Budget exhausted without an assignment
    OutOfTime,
}

struct StageValues {
    status: SolveStatus,
    objective: f64,
    kpis: KpiValues,
    assignment: Assignment,
}

/// Solve a constraint system.
///
/// Infeasible and timed-out runs are reported through
/// [`PlanOutcome::status`]; only solver failures are errors.
///
/// # Example
///
/// ```
/// use chargestop_model::{solve, ModelBuilder, ProblemInstanceBuilder, SolverConfig};
/// use chargestop_solver_common::SolveStatus;
///
/// let instance = ProblemInstanceBuilder::new(100.0)
///     .initial_energy(50.0)
///     .route(130.0, 100.0)
///     .station(40.0, 30.0, 50.0, 0.4)
///     .build()?;
/// let system = ModelBuilder::new(&instance).build()?;
///
/// let outcome = solve(&system, &SolverConfig::default())?;
/// assert_eq!(outcome.status, SolveStatus::Optimal);
/// # Ok::<(), chargestop_model::PlanError>(())
/// ```
pub fn solve(system: &ConstraintSystem, config: &SolverConfig) -> PlanResult<PlanOutcome> {
    let start = Instant::now();
    let backend = config.backend;
    if !backend.is_enabled() {
        return Err(SolverError::BackendUnavailable(backend).into());
    }
    if config.time_limit().is_some() && !backend.supports_time_limit() {
        warn!(backend = %backend, "backend ignores the time limit");
    }

    let mode = system.objective().mode;
    let stages = system.objective().stages();
    let stats = system.statistics();
    info!(
        backend = %backend,
        mode = %mode,
        stages = stages.len(),
        variables = stats.variables,
        constraints = stats.constraints,
        "solving charging stop model"
    );

    if let Some(row) = system
        .constraints()
        .iter()
        .find(|c| c.is_unsatisfiable_constant())
    {
        info!(constraint = %row.label, family = %row.family, "model infeasible before solving");
        return Ok(PlanOutcome::without_solution(
            mode,
            SolveStatus::Infeasible,
            start.elapsed(),
        ));
    }

    let mut bounds: Vec<(Expression, f64)> = Vec::new();
    let mut objective_values = Vec::new();
    let mut last: Option<StageValues> = None;

    for (index, goal) in stages.iter().enumerate() {
        let remaining = match config.time_limit() {
            Some(limit) => match limit.checked_sub(start.elapsed()) {
                Some(left) if !left.is_zero() => Some(left),
                _ => {
                    warn!(stage = goal.label, "time budget exhausted before stage");
                    return Ok(timed_out(mode, last, objective_values, start));
                }
            },
            None => None,
        };

        let result = solve_stage(system, goal, &bounds, backend, remaining, config.verbose)?;
        let values = match result {
            StageResult::Solved(values) => values,
            StageResult::Infeasible => {
                if index > 0 {
                    warn!(stage = goal.label, "later lexicographic stage infeasible");
                }
                return Ok(PlanOutcome::without_solution(
                    mode,
                    SolveStatus::Infeasible,
                    start.elapsed(),
                ));
            }
            StageResult::OutOfTime => {
                return Ok(timed_out(mode, last, objective_values, start));
            }
        };

        debug!(
            stage = goal.label,
            status = %values.status,
            objective = values.objective,
            "stage finished"
        );
        objective_values.push(values.objective);

        let proven = values.status.is_optimal();
        let bound = values.objective
            + config.lexicographic_tolerance * values.objective.abs().max(1.0);
        bounds.push((goal.expression.clone(), bound));
        last = Some(values);

        if !proven {
            // Later stages would be bounded by an unproven optimum
            break;
        }
    }

    let outcome = match last {
        Some(values) => PlanOutcome {
            mode,
            status: if objective_values.len() == stages.len() {
                values.status
            } else {
                downgrade_incomplete(values.status)
            },
            objective_value: Some(values.objective),
            objective_values,
            kpis: Some(values.kpis),
            assignment: Some(values.assignment),
            elapsed: start.elapsed(),
        },
        None => PlanOutcome::without_solution(mode, SolveStatus::Infeasible, start.elapsed()),
    };

    info!(
        status = %outcome.status,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "solve finished"
    );
    Ok(outcome)
}

/// Status of a run that stopped before its last stage.
fn downgrade_incomplete(status: SolveStatus) -> SolveStatus {
    match status {
        SolveStatus::Optimal => SolveStatus::Feasible,
        other => other,
    }
}

fn timed_out(
    mode: ObjectiveMode,
    last: Option<StageValues>,
    objective_values: Vec<f64>,
    start: Instant,
) -> PlanOutcome {
    match last {
        Some(values) => PlanOutcome {
            mode,
            status: SolveStatus::Timeout,
            objective_value: Some(values.objective),
            objective_values,
            kpis: Some(values.kpis),
            assignment: Some(values.assignment),
            elapsed: start.elapsed(),
        },
        None => PlanOutcome::without_solution(mode, SolveStatus::Timeout, start.elapsed()),
    }
}

fn solve_stage(
    system: &ConstraintSystem,
    goal: &ObjectiveGoal,
    bounds: &[(Expression, f64)],
    backend: MilpBackend,
    time_limit: Option<Duration>,
    verbose: bool,
) -> PlanResult<StageResult> {
    let problem = system.problem_variables().minimise(goal.expression.clone());

    match backend {
        MilpBackend::Microlp => {
            let model = attach_rows(problem.using(good_lp::microlp), system, bounds);
            finish(model, system, goal, time_limit)
        }
        #[cfg(feature = "solver-highs")]
        MilpBackend::Highs => {
            let mut model = problem.using(good_lp::highs).set_verbose(verbose);
            if let Some(limit) = time_limit {
                model = model.set_time_limit(limit.as_secs_f64());
            }
            let model = attach_rows(model, system, bounds);
            finish(model, system, goal, time_limit)
        }
        #[cfg(not(feature = "solver-highs"))]
        MilpBackend::Highs => {
            let _ = verbose;
            Err(SolverError::BackendUnavailable(backend).into())
        }
    }
}

fn attach_rows<M: SolverModel>(
    mut model: M,
    system: &ConstraintSystem,
    bounds: &[(Expression, f64)],
) -> M {
    for row in system.constraints() {
        model = model.with(row.to_constraint());
    }
    for (expression, bound) in bounds {
        model = model.with(constraint::leq(expression.clone(), *bound));
    }
    model
}

fn finish<M>(
    model: M,
    system: &ConstraintSystem,
    goal: &ObjectiveGoal,
    time_limit: Option<Duration>,
) -> PlanResult<StageResult>
where
    M: SolverModel<Error = ResolutionError>,
{
    let start = Instant::now();
    match model.solve() {
        Ok(solution) => {
            let status = match solution.status() {
                SolutionStatus::Optimal => SolveStatus::Optimal,
                SolutionStatus::TimeLimit => SolveStatus::Timeout,
                #[allow(unreachable_patterns)]
                _ => SolveStatus::Feasible,
            };
            let values = StageValues {
                status,
                objective: goal.expression.eval_with(&solution),
                kpis: evaluate_kpis(system.kpis(), &solution),
                assignment: Assignment::capture(system, |var| solution.value(var)),
            };
            Ok(StageResult::Solved(values))
        }
        Err(ResolutionError::Infeasible) => Ok(StageResult::Infeasible),
        Err(ResolutionError::Unbounded) => Err(SolverError::Unbounded.into()),
        Err(err) => match time_limit {
            Some(limit) if start.elapsed() >= limit => {
                warn!(error = %err, "solver stopped at the time limit without an assignment");
                Ok(StageResult::OutOfTime)
            }
            _ => Err(SolverError::Failed(err.to_string()).into()),
        },
    }
}

fn evaluate_kpis(kpis: &KpiExpressions, solution: &impl Solution) -> KpiValues {
    KpiValues {
        travel_time: kpis.travel_time.eval_with(solution),
        cost: kpis.cost.eval_with(solution),
        stop_count: kpis.stop_count.eval_with(solution),
    }
}
