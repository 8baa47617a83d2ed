//! Solver-independent constraint system
//!
//! [`ConstraintSystem`] is the immutable value produced by the model builder.
//! It records every variable definition in declaration order, so each solve
//! call can regenerate a fresh `good_lp` variable set whose handles coincide
//! with the ones the constraints were written against. One assembled system
//! can therefore be solved several times (lexicographic stages, different
//! backends) without shared mutable state.

use crate::builder::PlanVariables;
use crate::kpi::KpiExpressions;
use crate::objective::Objective;
use good_lp::solvers::SolutionStatus;
use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Solution, Variable};
use std::collections::BTreeMap;

/// Integrality of a declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Binary,
    Continuous,
}

/// Definition of one decision variable.
#[derive(Debug, Clone)]
pub struct VariableInfo {
    pub name: String,
    pub kind: VariableKind,
    pub lower: f64,
    pub upper: Option<f64>,
    pub variable: Variable,
}

impl VariableInfo {
    fn definition(&self) -> good_lp::VariableDefinition {
        definition(&self.name, self.kind, self.lower, self.upper)
    }
}

fn definition(
    name: &str,
    kind: VariableKind,
    lower: f64,
    upper: Option<f64>,
) -> good_lp::VariableDefinition {
    let def = match (kind, upper) {
        (VariableKind::Binary, _) => variable().binary(),
        (VariableKind::Continuous, Some(upper)) => variable().min(lower).max(upper),
        (VariableKind::Continuous, None) => variable().min(lower),
    };
    def.name(name)
}

/// Declares variables while a model is being assembled.
pub(crate) struct VariableArena {
    problem: ProblemVariables,
    infos: Vec<VariableInfo>,
}

impl VariableArena {
    pub(crate) fn new() -> Self {
        Self {
            problem: ProblemVariables::new(),
            infos: Vec::new(),
        }
    }

    pub(crate) fn binary(&mut self, name: String) -> Variable {
        self.declare(name, VariableKind::Binary, 0.0, Some(1.0))
    }

    pub(crate) fn continuous(&mut self, name: String, lower: f64, upper: Option<f64>) -> Variable {
        self.declare(name, VariableKind::Continuous, lower, upper)
    }

    fn declare(
        &mut self,
        name: String,
        kind: VariableKind,
        lower: f64,
        upper: Option<f64>,
    ) -> Variable {
        let handle = self.problem.add(definition(&name, kind, lower, upper));
        self.infos.push(VariableInfo {
            name,
            kind,
            lower,
            upper,
            variable: handle,
        });
        handle
    }

    pub(crate) fn into_infos(self) -> Vec<VariableInfo> {
        self.infos
    }
}

/// Constraint families, used for labelling and model statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintFamily {
    BoundaryFixing,
    ReachFromOrigin,
    ReachDestination,
    BothVisited,
    Intermediate,
    EnergyContinuity,
    PassThrough,
    TimeContinuity,
    MinimumReserve,
    ChargingDuration,
    ChargingCurve,
}

impl std::fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConstraintFamily::BoundaryFixing => "boundary fixing",
            ConstraintFamily::ReachFromOrigin => "reach from origin",
            ConstraintFamily::ReachDestination => "reach destination",
            ConstraintFamily::BothVisited => "both visited",
            ConstraintFamily::Intermediate => "intermediate visited",
            ConstraintFamily::EnergyContinuity => "energy continuity",
            ConstraintFamily::PassThrough => "pass-through",
            ConstraintFamily::TimeContinuity => "time continuity",
            ConstraintFamily::MinimumReserve => "minimum reserve",
            ConstraintFamily::ChargingDuration => "charging duration",
            ConstraintFamily::ChargingCurve => "charging curve",
        };
        write!(f, "{name}")
    }
}

const CONSTANT_TOLERANCE: f64 = 1e-9;

/// Relation between the two sides of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    LessEqual,
    GreaterEqual,
    Equal,
}

/// A labelled linear constraint `lhs (<=|>=|==) rhs`.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub family: ConstraintFamily,
    pub label: String,
    pub lhs: Expression,
    pub sense: Sense,
    pub rhs: Expression,
    /// Neither side references a variable
    pub constant: bool,
}

/// Evaluates expressions that reference no variable.
struct Unassigned;

impl Solution for Unassigned {
    fn status(&self) -> SolutionStatus {
        SolutionStatus::Optimal
    }

    fn value(&self, _variable: Variable) -> f64 {
        0.0
    }
}

impl LinearConstraint {
    /// A variable-free row that cannot hold, such as an empty sum `>= 1`.
    pub fn is_unsatisfiable_constant(&self) -> bool {
        if !self.constant {
            return false;
        }
        let gap = self.lhs.eval_with(&Unassigned) - self.rhs.eval_with(&Unassigned);
        match self.sense {
            Sense::LessEqual => gap > CONSTANT_TOLERANCE,
            Sense::GreaterEqual => gap < -CONSTANT_TOLERANCE,
            Sense::Equal => gap.abs() > CONSTANT_TOLERANCE,
        }
    }

    /// Materialize as a `good_lp` constraint.
    pub fn to_constraint(&self) -> Constraint {
        let (lhs, rhs) = (self.lhs.clone(), self.rhs.clone());
        match self.sense {
            Sense::LessEqual => constraint::leq(lhs, rhs),
            Sense::GreaterEqual => constraint::geq(lhs, rhs),
            Sense::Equal => constraint::eq(lhs, rhs),
        }
    }
}

/// Collects constraints while a model is being assembled.
#[derive(Default)]
pub(crate) struct ConstraintSink {
    rows: Vec<LinearConstraint>,
}

impl ConstraintSink {
    pub(crate) fn add(
        &mut self,
        family: ConstraintFamily,
        label: impl Into<String>,
        lhs: impl Into<Expression>,
        sense: Sense,
        rhs: impl Into<Expression>,
    ) {
        self.rows.push(LinearConstraint {
            family,
            label: label.into(),
            lhs: lhs.into(),
            sense,
            rhs: rhs.into(),
            constant: false,
        });
    }

    /// `Σ terms (sense) rhs`; an empty `terms` is kept as a constant row.
    pub(crate) fn add_sum(
        &mut self,
        family: ConstraintFamily,
        label: impl Into<String>,
        terms: Vec<Variable>,
        sense: Sense,
        rhs: f64,
    ) {
        let constant = terms.is_empty();
        let lhs: Expression = terms.into_iter().sum();
        self.rows.push(LinearConstraint {
            family,
            label: label.into(),
            lhs,
            sense,
            rhs: Expression::from(rhs),
            constant,
        });
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn into_rows(self) -> Vec<LinearConstraint> {
        self.rows
    }
}

/// Size of an assembled model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStatistics {
    pub variables: usize,
    pub binaries: usize,
    pub continuous: usize,
    pub constraints: usize,
    pub by_family: BTreeMap<ConstraintFamily, usize>,
}

/// Fully assembled charging stop model.
///
/// Holds variables, constraints, the objective and the KPI expressions.
/// Immutable; produced by [`crate::ModelBuilder::build`].
#[derive(Debug, Clone)]
pub struct ConstraintSystem {
    variables: Vec<VariableInfo>,
    constraints: Vec<LinearConstraint>,
    plan: PlanVariables,
    objective: Objective,
    kpis: KpiExpressions,
}

impl ConstraintSystem {
    pub(crate) fn new(
        variables: Vec<VariableInfo>,
        constraints: Vec<LinearConstraint>,
        plan: PlanVariables,
        objective: Objective,
        kpis: KpiExpressions,
    ) -> Self {
        Self {
            variables,
            constraints,
            plan,
            objective,
            kpis,
        }
    }

    /// Variable definitions in declaration order.
    pub fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Constraints of one family.
    pub fn constraints_of(
        &self,
        family: ConstraintFamily,
    ) -> impl Iterator<Item = &LinearConstraint> + '_ {
        self.constraints.iter().filter(move |c| c.family == family)
    }

    /// Named decision variables of the plan.
    pub fn plan(&self) -> &PlanVariables {
        &self.plan
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn kpis(&self) -> &KpiExpressions {
        &self.kpis
    }

    /// Declare the recorded variables on a fresh `good_lp` problem.
    ///
    /// Declaration order is replayed, so the returned problem issues the
    /// same handles the constraints refer to.
    pub fn problem_variables(&self) -> ProblemVariables {
        let mut problem = ProblemVariables::new();
        for info in &self.variables {
            let handle = problem.add(info.definition());
            debug_assert_eq!(handle, info.variable, "variable {} moved", info.name);
        }
        problem
    }

    pub fn statistics(&self) -> ModelStatistics {
        let binaries = self
            .variables
            .iter()
            .filter(|v| v.kind == VariableKind::Binary)
            .count();
        let mut by_family = BTreeMap::new();
        for row in &self.constraints {
            *by_family.entry(row.family).or_insert(0) += 1;
        }
        ModelStatistics {
            variables: self.variables.len(),
            binaries,
            continuous: self.variables.len() - binaries,
            constraints: self.constraints.len(),
            by_family,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_records_declarations() {
        let mut vars = VariableArena::new();
        let x = vars.binary("x".to_string());
        let y = vars.continuous("y".to_string(), 0.0, Some(5.0));

        let infos = vars.into_infos();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].variable, x);
        assert_eq!(infos[0].kind, VariableKind::Binary);
        assert_eq!(infos[1].variable, y);
        assert_eq!(infos[1].upper, Some(5.0));
    }

    #[test]
    fn test_constant_rows() {
        let mut vars = VariableArena::new();
        let x = vars.binary("x".to_string());
        let mut sink = ConstraintSink::default();

        sink.add_sum(ConstraintFamily::ReachFromOrigin, "empty", vec![], Sense::GreaterEqual, 1.0);
        sink.add_sum(ConstraintFamily::ReachFromOrigin, "trivial", vec![], Sense::LessEqual, 1.0);
        sink.add_sum(ConstraintFamily::ReachDestination, "x", vec![x], Sense::GreaterEqual, 1.0);
        sink.add(ConstraintFamily::BoundaryFixing, "fix", x, Sense::Equal, 1.0);

        let rows = sink.into_rows();
        let flags: Vec<bool> = rows.iter().map(|r| r.is_unsatisfiable_constant()).collect();
        assert_eq!(flags, vec![true, false, false, false]);
        assert!(rows[1].constant);
        assert!(!rows[2].constant);
    }

    #[test]
    fn test_family_display() {
        assert_eq!(ConstraintFamily::EnergyContinuity.to_string(), "energy continuity");
        assert_eq!(ConstraintFamily::PassThrough.to_string(), "pass-through");
    }
}
