//! End-to-end planning tests on the bundled `microlp` backend

use chargestop_model::{
    solve, CostBasis, ModelBuilder, MultiObjectivePolicy, ObjectiveConfig, ObjectiveMode,
    PlanOutcome, ProblemInstance, ProblemInstanceBuilder, SolveStatus, SolverConfig,
};
use proptest::prelude::*;

const TOL: f64 = 1e-4;

fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "{what}: expected {expected}, got {actual}"
    );
}

fn plan(instance: &ProblemInstance, config: ObjectiveConfig) -> PlanOutcome {
    let system = ModelBuilder::new(instance).objective(config).build().unwrap();
    solve(&system, &SolverConfig::default()).unwrap()
}

fn stop_orders(outcome: &PlanOutcome) -> Vec<usize> {
    outcome
        .assignment
        .as_ref()
        .unwrap()
        .stops()
        .iter()
        .map(|s| s.order)
        .collect()
}

/// One station, every decision forced: charge 10 -> 100 kWh at station 1.
fn single_forced_stop() -> ProblemInstance {
    ProblemInstanceBuilder::new(100.0)
        .min_soc_fraction(0.1)
        .initial_energy(50.0)
        .route(130.0, 100.0)
        .charging_curve(0.8, 0.25)
        .station(40.0, 30.0, 50.0, 0.4)
        .build()
        .unwrap()
}

/// Three stations where the objectives disagree.
fn three_stations() -> ProblemInstance {
    ProblemInstanceBuilder::new(100.0)
        .min_soc_fraction(0.1)
        .initial_energy(80.0)
        .route(150.0, 120.0)
        .charging_curve(0.8, 0.25)
        .station(20.0, 16.0, 50.0, 0.3)
        .station(65.0, 52.0, 50.0, 0.5)
        .station(90.0, 72.0, 50.0, 0.4)
        .build()
        .unwrap()
}

#[test]
fn forced_stop_is_optimal_in_every_mode() {
    let instance = single_forced_stop();

    for mode in [
        ObjectiveMode::TravelTime,
        ObjectiveMode::Cost,
        ObjectiveMode::NumberOfStops,
        ObjectiveMode::Multi,
    ] {
        let outcome = plan(&instance, ObjectiveConfig::new(mode));
        assert_eq!(outcome.status, SolveStatus::Optimal, "mode {mode}");
        assert_eq!(stop_orders(&outcome), vec![1], "mode {mode}");

        // 100 min driving + 70 kWh at 0.96 min/kWh + 20 kWh at 4.8 min/kWh
        let kpis = outcome.kpis.unwrap();
        assert_close(kpis.travel_time, 263.2, "travel time");
        assert_close(kpis.cost, 36.0, "cost");
        assert_close(kpis.stop_count, 1.0, "stops");

        let assignment = outcome.assignment.as_ref().unwrap();
        let stop = assignment.locations[1];
        assert_close(stop.arrival_energy, 10.0, "arrival energy");
        assert_close(stop.departure_energy, 100.0, "departure energy");
        assert!(assignment.audit(&instance, TOL).is_empty());
    }
}

#[test]
fn multi_reports_every_stage() {
    let outcome = plan(&single_forced_stop(), ObjectiveConfig::new(ObjectiveMode::Multi));
    assert_eq!(outcome.objective_values.len(), 2);
    assert_close(outcome.objective_values[0], 36.0, "cost stage");
    assert_close(outcome.objective_values[1], 263.2, "time stage");
    assert_close(outcome.objective_value.unwrap(), 263.2, "last stage");
}

#[test]
fn unbridgeable_gap_is_infeasible() {
    // Station 1 reaches station 2 with 5 kWh left, below the 10 kWh reserve
    let instance = ProblemInstanceBuilder::new(100.0)
        .min_soc_fraction(0.1)
        .initial_energy(50.0)
        .route(200.0, 160.0)
        .station(30.0, 24.0, 50.0, 0.3)
        .station(125.0, 100.0, 50.0, 0.3)
        .build()
        .unwrap();
    assert!(!instance.reachable_from_origin().is_empty());
    assert!(!instance.reaching_destination().is_empty());

    let outcome = plan(&instance, ObjectiveConfig::default());
    assert_eq!(outcome.status, SolveStatus::Infeasible);
    assert!(outcome.assignment.is_none());
    assert!(outcome.kpis.is_none());
}

#[test]
fn initial_energy_below_reserve_is_infeasible() {
    let instance = ProblemInstanceBuilder::new(100.0)
        .min_soc_fraction(0.1)
        .initial_energy(5.0)
        .route(100.0, 80.0)
        .station(20.0, 16.0, 50.0, 0.3)
        .build()
        .unwrap();

    let outcome = plan(&instance, ObjectiveConfig::default());
    assert_eq!(outcome.status, SolveStatus::Infeasible);
    assert!(outcome.assignment.is_none());
}

#[test]
fn travel_time_charges_only_in_fast_phase() {
    let instance = three_stations();
    let outcome = plan(&instance, ObjectiveConfig::new(ObjectiveMode::TravelTime));

    assert_eq!(outcome.status, SolveStatus::Optimal);
    // 80 kWh short, all of it below the breakpoint
    assert_close(outcome.objective_value.unwrap(), 120.0 + 80.0 * 0.96, "travel time");
    assert!(stop_orders(&outcome).len() >= 2);
    assert!(outcome
        .assignment
        .as_ref()
        .unwrap()
        .audit(&instance, TOL)
        .is_empty());
}

#[test]
fn fewest_stops_accepts_tapered_charging() {
    let instance = three_stations();
    let outcome = plan(&instance, ObjectiveConfig::new(ObjectiveMode::NumberOfStops));

    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(stop_orders(&outcome), vec![2]);
    assert_close(outcome.objective_value.unwrap(), 1.0, "stops");

    let assignment = outcome.assignment.as_ref().unwrap();
    assert!(assignment.locations[2].departure_energy >= 95.0 - TOL);
    assert!(assignment.audit(&instance, TOL).is_empty());
}

#[test]
fn cost_prefers_cheap_stations() {
    let instance = three_stations();
    let outcome = plan(&instance, ObjectiveConfig::new(ObjectiveMode::Cost));

    // 40 kWh at 0.3 (station 1 filled up), 40 kWh at 0.4
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_close(outcome.objective_value.unwrap(), 28.0, "cost");

    let assignment = outcome.assignment.as_ref().unwrap();
    assert_close(assignment.locations[1].charged_energy(), 40.0, "charged at 1");
    assert_close(assignment.locations[2].charged_energy(), 0.0, "charged at 2");
    assert_close(assignment.locations[3].charged_energy(), 40.0, "charged at 3");
    assert!(assignment.audit(&instance, TOL).is_empty());
}

#[test]
fn cost_on_charging_time_basis() {
    let instance = three_stations();
    let config =
        ObjectiveConfig::new(ObjectiveMode::Cost).with_cost_basis(CostBasis::ChargingTime);
    let outcome = plan(&instance, config);

    // 19.2 min at 0.3 plus 57.6 min at 0.4
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_close(outcome.objective_value.unwrap(), 28.8, "cost");

    let assignment = outcome.assignment.as_ref().unwrap();
    assert_close(assignment.locations[1].dwell_time(), 19.2, "dwell at 1");
    assert_close(assignment.locations[3].dwell_time(), 57.6, "dwell at 3");
}

#[test]
fn lexicographic_multi_keeps_optimal_cost() {
    let instance = three_stations();
    let outcome = plan(&instance, ObjectiveConfig::new(ObjectiveMode::Multi));

    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_close(outcome.objective_values[0], 28.0, "cost stage");

    // Station 1: 60 -> 100 kWh (19.2 + 96 min), station 3: 30 -> 70 kWh (38.4 min)
    let kpis = outcome.kpis.unwrap();
    assert!((kpis.cost - 28.0).abs() < 1e-2);
    assert!((kpis.travel_time - (120.0 + 115.2 + 38.4)).abs() < 1e-2);
}

#[test]
fn weighted_multi_on_time_only_matches_travel_time() {
    let instance = three_stations();
    let config = ObjectiveConfig::new(ObjectiveMode::Multi).with_multi_policy(
        MultiObjectivePolicy::Weighted {
            weights: vec![0.0, 1.0],
        },
    );
    let outcome = plan(&instance, config);

    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(outcome.objective_values.len(), 1);
    assert_close(outcome.objective_value.unwrap(), 196.8, "weighted objective");
}

#[test]
fn microlp_ignores_time_limit() {
    let instance = single_forced_stop();
    let system = ModelBuilder::new(&instance).build().unwrap();
    let outcome = solve(&system, &SolverConfig::default().with_time_limit(60.0)).unwrap();

    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert!(outcome.elapsed.as_secs_f64() < 60.0);
}

#[test]
fn exhausted_budget_reports_timeout() {
    let instance = three_stations();

    for mode in [ObjectiveMode::TravelTime, ObjectiveMode::Multi] {
        let system = ModelBuilder::new(&instance)
            .objective(ObjectiveConfig::new(mode))
            .build()
            .unwrap();
        let outcome = solve(&system, &SolverConfig::default().with_time_limit(0.0)).unwrap();

        assert_eq!(outcome.status, SolveStatus::Timeout, "mode {mode}");
        assert_ne!(outcome.status, SolveStatus::Optimal);
        assert!(outcome.assignment.is_none());
        assert!(outcome.kpis.is_none());
        assert!(outcome.objective_values.is_empty());
    }
}

#[cfg(not(feature = "solver-highs"))]
#[test]
fn disabled_backend_is_an_error() {
    use chargestop_model::{MilpBackend, PlanError, SolverError};

    let instance = single_forced_stop();
    let system = ModelBuilder::new(&instance).build().unwrap();
    let err = solve(&system, &SolverConfig::default().with_backend(MilpBackend::Highs)).unwrap_err();

    assert!(matches!(
        err,
        PlanError::Solver(SolverError::BackendUnavailable(MilpBackend::Highs))
    ));
}

fn small_instance() -> impl Strategy<Value = ProblemInstance> {
    (
        40.0f64..100.0,
        prop::collection::vec((10.0f64..60.0, 20.0f64..150.0, 0.1f64..0.6), 1..=3),
        10.0f64..60.0,
    )
        .prop_map(|(initial, stations, tail)| {
            let mut builder = ProblemInstanceBuilder::new(100.0)
                .min_soc_fraction(0.1)
                .initial_energy(initial)
                .charging_curve(0.8, 0.5);
            let mut energy = 0.0;
            for (gap, power, price) in stations {
                energy += gap;
                builder = builder.station(energy, 0.8 * energy, power, price);
            }
            let length = energy + tail;
            builder.route(length, 0.8 * length).build().unwrap()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn solved_plans_pass_audit(instance in small_instance()) {
        let outcome = plan(&instance, ObjectiveConfig::new(ObjectiveMode::TravelTime));

        match outcome.status {
            SolveStatus::Optimal => {
                let assignment = outcome.assignment.unwrap();
                let violations = assignment.audit(&instance, TOL);
                prop_assert!(violations.is_empty(), "{:?}", violations);

                // Arrival time is the drive plus every dwell
                let dwell: f64 = assignment.locations.iter().map(|l| l.dwell_time()).sum();
                let kpis = outcome.kpis.unwrap();
                prop_assert!((kpis.travel_time - instance.nonstop_time() - dwell).abs() < 1e-3);
            }
            SolveStatus::Infeasible => prop_assert!(outcome.assignment.is_none()),
            other => prop_assert!(false, "unexpected status {other}"),
        }
    }
}
