//! Solve outcome data structures
//!
//! A [`PlanOutcome`] always carries a [`SolveStatus`]. The variable
//! assignment is present whenever the solver produced one, including runs
//! stopped by the time limit with an incumbent.

use crate::instance::ProblemInstance;
use crate::kpi::KpiValues;
use crate::objective::ObjectiveMode;
use crate::system::ConstraintSystem;
use chargestop_solver_common::SolveStatus;
use good_lp::Variable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Binary values above this threshold read as `1`.
const BINARY_THRESHOLD: f64 = 0.5;

/// Solved state of one route location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationAssignment {
    /// Route order, `0` for the origin and `n + 1` for the destination
    pub order: usize,
    pub visited: bool,
    pub arrival_energy: f64,
    pub departure_energy: f64,
    pub arrival_time: f64,
    pub departure_time: f64,
}

impl LocationAssignment {
    /// Energy added at this location (kWh)
    pub fn charged_energy(&self) -> f64 {
        self.departure_energy - self.arrival_energy
    }

    /// Time spent at this location (min)
    pub fn dwell_time(&self) -> f64 {
        self.departure_time - self.arrival_time
    }
}

/// Solved ordering indicators of one pair `(i, j)`, `j < i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairAssignment {
    pub i: usize,
    pub j: usize,
    pub both_visited: bool,
    pub has_intermediate: bool,
}

impl PairAssignment {
    /// `j` and `i` are consecutive stops.
    pub fn is_adjacent(&self) -> bool {
        self.both_visited && !self.has_intermediate
    }
}

/// Values of every decision variable of a solved model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// One entry per location, in route order
    pub locations: Vec<LocationAssignment>,
    pub pairs: Vec<PairAssignment>,
    /// `(name, value)` of every variable in declaration order
    pub values: Vec<(String, f64)>,
}

impl Assignment {
    /// Read an assignment out of per-variable values.
    ///
    /// `value_of` is queried once per declared variable.
    pub fn capture(system: &ConstraintSystem, mut value_of: impl FnMut(Variable) -> f64) -> Self {
        let values: Vec<(String, f64)> = system
            .variables()
            .iter()
            .map(|info| (info.name.clone(), value_of(info.variable)))
            .collect();
        let by_handle: HashMap<Variable, f64> = system
            .variables()
            .iter()
            .zip(&values)
            .map(|(info, (_, value))| (info.variable, *value))
            .collect();
        let get = |var: &Variable| by_handle.get(var).copied().unwrap_or(0.0);

        let plan = system.plan();
        let locations = (0..plan.locations())
            .map(|order| LocationAssignment {
                order,
                visited: get(&plan.visit[order]) > BINARY_THRESHOLD,
                arrival_energy: get(&plan.arrival_energy[order]),
                departure_energy: get(&plan.departure_energy[order]),
                arrival_time: get(&plan.arrival_time[order]),
                departure_time: get(&plan.departure_time[order]),
            })
            .collect();

        let pairs = plan
            .ordering
            .both_visited
            .iter()
            .map(|(i, j, both)| PairAssignment {
                i,
                j,
                both_visited: get(both) > BINARY_THRESHOLD,
                has_intermediate: plan
                    .ordering
                    .has_intermediate
                    .get(i, j)
                    .map(|inter| get(inter) > BINARY_THRESHOLD)
                    .unwrap_or(false),
            })
            .collect();

        Self {
            locations,
            pairs,
            values,
        }
    }

    /// Value of a variable by name.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Candidate stations used as stops, in route order.
    pub fn stops(&self) -> Vec<&LocationAssignment> {
        let last = self.locations.len().saturating_sub(1);
        self.locations
            .iter()
            .filter(|loc| loc.visited && loc.order != 0 && loc.order != last)
            .collect()
    }

    fn pair(&self, i: usize, j: usize) -> Option<&PairAssignment> {
        self.pairs.iter().find(|p| p.i == i && p.j == j)
    }

    /// Check the assignment against the physical meaning of the model.
    ///
    /// Returns every violated property; an empty list means the plan is
    /// consistent within `tolerance`.
    pub fn audit(&self, instance: &ProblemInstance, tolerance: f64) -> Vec<Violation> {
        let mut audit = Audit {
            tolerance,
            violations: Vec::new(),
        };
        let capacity = instance.battery_capacity();
        let dest = instance.destination();

        if self.locations.len() != dest + 1 {
            audit.fail(
                "dimensions",
                format!("{} locations for {} stations", self.locations.len(), instance.station_count()),
            );
            return audit.violations;
        }

        let origin = &self.locations[0];
        let end = &self.locations[dest];
        audit.check(origin.visited && end.visited, "boundary", || {
            "origin and destination must be visited".into()
        });
        audit.close(
            origin.departure_energy,
            instance.initial_energy(),
            "boundary",
            "departure energy at origin",
        );
        audit.close(origin.departure_time, 0.0, "boundary", "departure time at origin");
        audit.at_least(
            end.arrival_energy,
            instance.reserve_energy(),
            "reserve",
            "arrival energy at destination",
        );

        for loc in &self.locations {
            for (what, value) in [
                ("arrival energy", loc.arrival_energy),
                ("departure energy", loc.departure_energy),
            ] {
                audit.check(
                    value >= -tolerance && value <= capacity + tolerance,
                    "battery bounds",
                    || format!("{what} {value:.4} at {} outside [0, {capacity}]", loc.order),
                );
            }
        }

        for order in instance.candidate_orders() {
            let loc = &self.locations[order];
            let curve = instance.charging_function(order);
            audit.at_least(loc.departure_energy, loc.arrival_energy, "charging", "departure energy");
            audit.close(
                loc.dwell_time(),
                curve.duration(loc.arrival_energy, loc.departure_energy),
                "charging",
                "dwell time against charging curve",
            );
            if loc.visited {
                audit.at_least(
                    loc.arrival_energy,
                    instance.reserve_energy(),
                    "reserve",
                    "arrival energy at stop",
                );
            } else {
                audit.close(loc.charged_energy(), 0.0, "pass-through", "energy charged while passing");
                audit.close(loc.dwell_time(), 0.0, "pass-through", "dwell time while passing");
            }
        }

        for order in 1..=dest {
            let drive = instance.station(order).time_to_reach - instance.station(order - 1).time_to_reach;
            audit.close(
                self.locations[order].arrival_time - self.locations[order - 1].departure_time,
                drive,
                "time continuity",
                "driving time",
            );
        }

        let visited: Vec<usize> = self
            .locations
            .iter()
            .filter(|loc| loc.visited)
            .map(|loc| loc.order)
            .collect();
        for leg in visited.windows(2) {
            let (j, i) = (leg[0], leg[1]);
            let used = instance.station(i).energy_to_reach - instance.station(j).energy_to_reach;
            audit.close(
                self.locations[j].departure_energy - self.locations[i].arrival_energy,
                used,
                "energy continuity",
                "energy used between consecutive stops",
            );
        }

        for pair in &self.pairs {
            let expected_both = self.locations[pair.i].visited && self.locations[pair.j].visited;
            let expected_inter =
                (pair.j + 1..pair.i).any(|m| self.pair(pair.i, m).is_some_and(|p| p.both_visited));
            audit.check(
                pair.both_visited == expected_both && pair.has_intermediate == expected_inter,
                "ordering",
                || format!("indicators of pair ({}, {}) disagree with visits", pair.i, pair.j),
            );
        }

        audit.violations
    }

    /// Human-readable stop table.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Stops: {}\n", self.stops().len()));
        for stop in self.stops() {
            s.push_str(&format!(
                "  [STOP] station {}: {:.2} -> {:.2} kWh, {:.2} min\n",
                stop.order,
                stop.arrival_energy,
                stop.departure_energy,
                stop.dwell_time()
            ));
        }
        s
    }
}

/// A property of the plan that the assignment breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub check: &'static str,
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.check, self.detail)
    }
}

struct Audit {
    tolerance: f64,
    violations: Vec<Violation>,
}

impl Audit {
    fn fail(&mut self, check: &'static str, detail: String) {
        self.violations.push(Violation { check, detail });
    }

    fn check(&mut self, ok: bool, check: &'static str, detail: impl FnOnce() -> String) {
        if !ok {
            self.fail(check, detail());
        }
    }

    fn close(&mut self, actual: f64, expected: f64, check: &'static str, what: &str) {
        let ok = (actual - expected).abs() <= self.tolerance;
        self.check(ok, check, || format!("{what}: {actual:.6} != {expected:.6}"));
    }

    fn at_least(&mut self, actual: f64, bound: f64, check: &'static str, what: &str) {
        let ok = actual >= bound - self.tolerance;
        self.check(ok, check, || format!("{what}: {actual:.6} < {bound:.6}"));
    }
}

/// Result of solving a [`ConstraintSystem`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub mode: ObjectiveMode,
    pub status: SolveStatus,
    /// Value of the last optimized stage
    pub objective_value: Option<f64>,
    /// Value reached by every completed stage, in priority order
    pub objective_values: Vec<f64>,
    pub kpis: Option<KpiValues>,
    pub assignment: Option<Assignment>,
    /// Wall time across all stages
    pub elapsed: Duration,
}

impl PlanOutcome {
    /// Outcome without any assignment.
    pub fn without_solution(mode: ObjectiveMode, status: SolveStatus, elapsed: Duration) -> Self {
        Self {
            mode,
            status,
            objective_value: None,
            objective_values: Vec::new(),
            kpis: None,
            assignment: None,
            elapsed,
        }
    }

    pub fn has_assignment(&self) -> bool {
        self.assignment.is_some()
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Charging Stop Plan\n{}\n", "=".repeat(40)));
        s.push_str(&format!("Objective: {}\n", self.mode));
        s.push_str(&format!("Status: {}\n", self.status));
        s.push_str(&format!("Solve Time: {:.2?}\n", self.elapsed));
        if let Some(value) = self.objective_value {
            s.push_str(&format!("Objective Value: {value:.4}\n"));
        }
        if let Some(kpis) = &self.kpis {
            for (name, value) in kpis.entries() {
                s.push_str(&format!("{name}: {value:.4}\n"));
            }
        }
        if let Some(assignment) = &self.assignment {
            s.push('\n');
            s.push_str(&assignment.summary());
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::ProblemInstanceBuilder;

    fn instance() -> ProblemInstance {
        ProblemInstanceBuilder::new(100.0)
            .min_soc_fraction(0.1)
            .initial_energy(50.0)
            .route(130.0, 100.0)
            .charging_curve(0.8, 0.25)
            .station(40.0, 30.0, 50.0, 0.4)
            .build()
            .unwrap()
    }

    fn location(order: usize, visited: bool, energy: (f64, f64), time: (f64, f64)) -> LocationAssignment {
        LocationAssignment {
            order,
            visited,
            arrival_energy: energy.0,
            departure_energy: energy.1,
            arrival_time: time.0,
            departure_time: time.1,
        }
    }

    /// Hand-built optimal plan: charge 10 -> 100 kWh at the only station.
    fn charged_plan() -> Assignment {
        // 70 kWh at 0.96 min/kWh, 20 kWh at 4.8 min/kWh
        let dwell = 70.0 * 0.96 + 20.0 * 4.8;
        Assignment {
            locations: vec![
                location(0, true, (50.0, 50.0), (0.0, 0.0)),
                location(1, true, (10.0, 100.0), (30.0, 30.0 + dwell)),
                location(2, true, (10.0, 10.0), (100.0 + dwell, 100.0 + dwell)),
            ],
            pairs: vec![
                PairAssignment { i: 1, j: 0, both_visited: true, has_intermediate: false },
                PairAssignment { i: 2, j: 0, both_visited: true, has_intermediate: true },
                PairAssignment { i: 2, j: 1, both_visited: true, has_intermediate: false },
            ],
            values: vec![("visit_1".into(), 1.0)],
        }
    }

    #[test]
    fn test_consistent_plan_passes_audit() {
        let plan = charged_plan();
        let violations = plan.audit(&instance(), 1e-6);
        assert!(violations.is_empty(), "{violations:?}");

        assert_eq!(plan.stops().len(), 1);
        assert_eq!(plan.value("visit_1"), Some(1.0));
        assert!(plan.summary().contains("[STOP] station 1"));
    }

    #[test]
    fn test_audit_flags_energy_gap() {
        let mut plan = charged_plan();
        plan.locations[2].arrival_energy = 30.0;
        plan.locations[2].departure_energy = 30.0;

        let violations = plan.audit(&instance(), 1e-6);
        assert!(violations.iter().any(|v| v.check == "energy continuity"));
    }

    #[test]
    fn test_audit_flags_inconsistent_indicators() {
        let mut plan = charged_plan();
        plan.pairs[1].has_intermediate = false;

        let violations = plan.audit(&instance(), 1e-6);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].check, "ordering");
    }

    #[test]
    fn test_audit_flags_charging_while_passing() {
        let mut plan = charged_plan();
        plan.locations[1].visited = false;

        let violations = plan.audit(&instance(), 1e-6);
        assert!(violations.iter().any(|v| v.check == "pass-through"));
    }

    #[test]
    fn test_outcome_summary() {
        let outcome = PlanOutcome {
            mode: ObjectiveMode::TravelTime,
            status: SolveStatus::Optimal,
            objective_value: Some(263.2),
            objective_values: vec![263.2],
            kpis: Some(KpiValues {
                travel_time: 263.2,
                cost: 36.0,
                stop_count: 1.0,
            }),
            assignment: Some(charged_plan()),
            elapsed: Duration::from_millis(12),
        };

        let summary = outcome.summary();
        assert!(summary.contains("Status: OPTIMAL"));
        assert!(summary.contains("Objective: traveltime"));
        assert!(summary.contains("Travel time: 263.2000"));
        assert!(summary.contains("Stops: 1"));

        let empty = PlanOutcome::without_solution(
            ObjectiveMode::Cost,
            SolveStatus::Infeasible,
            Duration::ZERO,
        );
        assert!(!empty.has_assignment());
        assert!(empty.summary().contains("INFEASIBLE"));
    }
}
