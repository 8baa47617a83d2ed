//! Model assembly
//!
//! [`ModelBuilder`] declares every decision variable, wires in the ordering
//! indicators and the charging curves, emits the feasibility constraints and
//! attaches the objective and KPI expressions. The result is an immutable
//! [`ConstraintSystem`].
//!
//! ## Formulation
//!
//! Indices run over route locations `0..=n+1` (origin, candidates,
//! destination); `e_i`/`t_i` are the nonstop energy/time needed to reach `i`.
//!
//! ```text
//! visit_0 = visit_{n+1} = 1, Rd_0 = r0, Td_0 = 0              boundary
//! Σ_{e_i <= r0 - B·α, i>0} visit_i >= 1                        reach from origin
//! Σ_{l - e_i <= B(1-α), i<=n} visit_i >= 1                     reach destination
//! |Rd_j - Ra_i - (e_i - e_j)| <= M_e (1 - adj(i,j))            energy continuity
//! Ta_i - Td_{i-1} = t_i - t_{i-1}                              time continuity
//! 0 <= Rd_i - Ra_i <= B · visit_i                              pass-through
//! Td_i - Ta_i <= ctime_i(B) · visit_i                          pass-through
//! Ra_i >= B·α · visit_i                                        minimum reserve
//! Td_i - Ta_i = ctime_i(Rd_i) - ctime_i(Ra_i)                  charging duration
//! ```
//!
//! with `adj(i,j) = both[i,j] - inter[i,j]` (see [`crate::ordering`]) and
//! `M_e = B + l`, which bounds `|Rd_j - Ra_i - (e_i - e_j)|` for energies in
//! `[0, B]` and legs in `[0, l]`.
//!
//! ## Charging curve encoding
//!
//! `ctime(s)` of a model variable `s` uses the incremental formulation:
//!
//! ```text
//! s = f + o,  0 <= f <= B·bp,  0 <= o <= B(1-bp),  z ∈ {0,1}
//! f >= B·bp · z,  o <= B(1-bp) · z
//! ctime(s) = slope_fast · f + slope_taper · o
//! ```
//!
//! The binary `z` forces the fast piece to fill before the taper starts, so
//! `ctime` is exact for both the added departure term and the subtracted
//! arrival term.

use crate::charging::PiecewiseChargingFunction;
use crate::error::{PlanError, PlanResult};
use crate::instance::ProblemInstance;
use crate::kpi::KpiExtractor;
use crate::objective::{ObjectiveConfig, ObjectiveSelector};
use crate::ordering::{OrderingEncoder, OrderingVariables};
use crate::system::{ConstraintFamily, ConstraintSink, ConstraintSystem, Sense, VariableArena};
use good_lp::{Expression, Variable};
use tracing::debug;

/// Named decision variables, indexed by location order `0..=n+1`.
#[derive(Debug, Clone)]
pub struct PlanVariables {
    /// `visit[i]`: location `i` is used as a stop
    pub visit: Vec<Variable>,
    /// State of charge on arrival (kWh)
    pub arrival_energy: Vec<Variable>,
    /// State of charge on departure (kWh)
    pub departure_energy: Vec<Variable>,
    /// Arrival clock time (min)
    pub arrival_time: Vec<Variable>,
    /// Departure clock time (min)
    pub departure_time: Vec<Variable>,
    pub ordering: OrderingVariables,
}

impl PlanVariables {
    /// Number of route locations, `n + 2`.
    pub fn locations(&self) -> usize {
        self.visit.len()
    }
}

/// Assembles a [`ConstraintSystem`] from a [`ProblemInstance`].
///
/// # Example
///
/// ```
/// use chargestop_model::{ModelBuilder, ObjectiveConfig, ObjectiveMode, ProblemInstanceBuilder};
///
/// let instance = ProblemInstanceBuilder::new(100.0)
///     .initial_energy(50.0)
///     .route(130.0, 100.0)
///     .station(40.0, 30.0, 50.0, 0.4)
///     .build()?;
///
/// let system = ModelBuilder::new(&instance)
///     .objective(ObjectiveConfig::new(ObjectiveMode::Cost))
///     .build()?;
/// assert_eq!(system.plan().locations(), 3);
/// # Ok::<(), chargestop_model::PlanError>(())
/// ```
pub struct ModelBuilder<'a> {
    instance: &'a ProblemInstance,
    objective: ObjectiveConfig,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(instance: &'a ProblemInstance) -> Self {
        Self {
            instance,
            objective: ObjectiveConfig::default(),
        }
    }

    pub fn objective(mut self, config: ObjectiveConfig) -> Self {
        self.objective = config;
        self
    }

    /// Declare variables and constraints, then attach objective and KPIs.
    pub fn build(self) -> PlanResult<ConstraintSystem> {
        let instance = self.instance;
        let mut vars = VariableArena::new();
        let mut sink = ConstraintSink::default();

        let plan = declare_plan_variables(instance, &mut vars, &mut sink);
        check_dimensions(instance, &plan)?;

        add_boundary_constraints(instance, &plan, &mut sink);
        add_reachability_constraints(instance, &plan, &mut sink);
        add_energy_continuity(instance, &plan, &mut sink);
        add_time_continuity(instance, &plan, &mut sink);
        add_station_constraints(instance, &plan, &mut vars, &mut sink);

        let objective = ObjectiveSelector::select(&self.objective, &plan, instance)?;
        let kpis = KpiExtractor::extract(&plan, instance, self.objective.cost_basis);

        let variables = vars.into_infos();
        let constraints = sink.into_rows();
        debug!(
            stations = instance.station_count(),
            variables = variables.len(),
            constraints = constraints.len(),
            mode = %self.objective.mode,
            "assembled charging stop model"
        );

        Ok(ConstraintSystem::new(
            variables,
            constraints,
            plan,
            objective,
            kpis,
        ))
    }
}

fn declare_plan_variables(
    instance: &ProblemInstance,
    vars: &mut VariableArena,
    sink: &mut ConstraintSink,
) -> PlanVariables {
    let locations = instance.stations().len();
    let capacity = instance.battery_capacity();

    let visit: Vec<Variable> = (0..locations)
        .map(|i| vars.binary(format!("visit_{i}")))
        .collect();
    let arrival_energy = (0..locations)
        .map(|i| vars.continuous(format!("energy_arr_{i}"), 0.0, Some(capacity)))
        .collect();
    let departure_energy = (0..locations)
        .map(|i| vars.continuous(format!("energy_dep_{i}"), 0.0, Some(capacity)))
        .collect();
    let arrival_time = (0..locations)
        .map(|i| vars.continuous(format!("time_arr_{i}"), 0.0, None))
        .collect();
    let departure_time = (0..locations)
        .map(|i| vars.continuous(format!("time_dep_{i}"), 0.0, None))
        .collect();

    let ordering = OrderingEncoder::new(&visit).encode(vars, sink);

    PlanVariables {
        visit,
        arrival_energy,
        departure_energy,
        arrival_time,
        departure_time,
        ordering,
    }
}

fn check_dimensions(instance: &ProblemInstance, plan: &PlanVariables) -> PlanResult<()> {
    let locations = instance.stations().len();
    let pairs = locations * (locations - 1) / 2;

    let columns = [
        ("visit", plan.visit.len()),
        ("arrival energy", plan.arrival_energy.len()),
        ("departure energy", plan.departure_energy.len()),
        ("arrival time", plan.arrival_time.len()),
        ("departure time", plan.departure_time.len()),
    ];
    for (name, len) in columns {
        if len != locations {
            return Err(PlanError::ModelAssembly(format!(
                "{name} has {len} variables for {locations} locations"
            )));
        }
    }

    let tables = [
        ("both-visited", plan.ordering.both_visited.len()),
        ("has-intermediate", plan.ordering.has_intermediate.len()),
    ];
    for (name, len) in tables {
        if len != pairs {
            return Err(PlanError::ModelAssembly(format!(
                "{name} table has {len} pairs, expected {pairs}"
            )));
        }
    }
    Ok(())
}

fn add_boundary_constraints(
    instance: &ProblemInstance,
    plan: &PlanVariables,
    sink: &mut ConstraintSink,
) {
    use ConstraintFamily::BoundaryFixing;
    let dest = instance.destination();

    sink.add(BoundaryFixing, "visit_origin", plan.visit[0], Sense::Equal, 1.0);
    sink.add(BoundaryFixing, "visit_destination", plan.visit[dest], Sense::Equal, 1.0);
    sink.add(
        BoundaryFixing,
        "energy_origin",
        plan.departure_energy[0],
        Sense::Equal,
        instance.initial_energy(),
    );
    sink.add(BoundaryFixing, "time_origin", plan.departure_time[0], Sense::Equal, 0.0);

    // Nobody charges at the endpoints
    sink.add(
        BoundaryFixing,
        "energy_origin_arrival",
        plan.arrival_energy[0],
        Sense::Equal,
        plan.departure_energy[0],
    );
    sink.add(
        BoundaryFixing,
        "time_origin_arrival",
        plan.arrival_time[0],
        Sense::Equal,
        plan.departure_time[0],
    );
    sink.add(
        BoundaryFixing,
        "energy_destination_departure",
        plan.departure_energy[dest],
        Sense::Equal,
        plan.arrival_energy[dest],
    );
    sink.add(
        BoundaryFixing,
        "time_destination_departure",
        plan.departure_time[dest],
        Sense::Equal,
        plan.arrival_time[dest],
    );

    sink.add(
        BoundaryFixing,
        "reserve_destination",
        plan.arrival_energy[dest],
        Sense::GreaterEqual,
        instance.reserve_energy(),
    );
}

fn add_reachability_constraints(
    instance: &ProblemInstance,
    plan: &PlanVariables,
    sink: &mut ConstraintSink,
) {
    // An empty eligible set leaves `0 >= 1`: infeasible by construction
    let from_origin = instance
        .reachable_from_origin()
        .into_iter()
        .map(|i| plan.visit[i])
        .collect();
    sink.add_sum(
        ConstraintFamily::ReachFromOrigin,
        "reach_from_origin",
        from_origin,
        Sense::GreaterEqual,
        1.0,
    );

    let to_destination = instance
        .reaching_destination()
        .into_iter()
        .map(|i| plan.visit[i])
        .collect();
    sink.add_sum(
        ConstraintFamily::ReachDestination,
        "reach_destination",
        to_destination,
        Sense::GreaterEqual,
        1.0,
    );
}

fn add_energy_continuity(
    instance: &ProblemInstance,
    plan: &PlanVariables,
    sink: &mut ConstraintSink,
) {
    let big_m = instance.battery_capacity() + instance.route_length();

    for i in 1..plan.locations() {
        for j in 0..i {
            let leg = instance.station(i).energy_to_reach - instance.station(j).energy_to_reach;
            let drop = plan.departure_energy[j] - plan.arrival_energy[i];
            let relax = (Expression::from(1.0) - plan.ordering.adjacency(i, j)) * big_m;

            sink.add(
                ConstraintFamily::EnergyContinuity,
                format!("energy_leg_hi_{i}_{j}"),
                drop.clone(),
                Sense::LessEqual,
                relax.clone() + leg,
            );
            sink.add(
                ConstraintFamily::EnergyContinuity,
                format!("energy_leg_lo_{i}_{j}"),
                drop,
                Sense::GreaterEqual,
                Expression::from(leg) - relax,
            );
        }
    }
}

fn add_time_continuity(
    instance: &ProblemInstance,
    plan: &PlanVariables,
    sink: &mut ConstraintSink,
) {
    for i in 1..plan.locations() {
        let drive = instance.station(i).time_to_reach - instance.station(i - 1).time_to_reach;
        sink.add(
            ConstraintFamily::TimeContinuity,
            format!("drive_{i}"),
            plan.arrival_time[i] - plan.departure_time[i - 1],
            Sense::Equal,
            drive,
        );
    }
}

/// Pass-through, reserve and charging-duration rows of every candidate.
fn add_station_constraints(
    instance: &ProblemInstance,
    plan: &PlanVariables,
    vars: &mut VariableArena,
    sink: &mut ConstraintSink,
) {
    let capacity = instance.battery_capacity();
    let reserve = instance.reserve_energy();

    for i in instance.candidate_orders() {
        let curve = instance.charging_function(i);
        let (ra, rd) = (plan.arrival_energy[i], plan.departure_energy[i]);
        let (ta, td) = (plan.arrival_time[i], plan.departure_time[i]);
        let visit = plan.visit[i];

        sink.add(
            ConstraintFamily::PassThrough,
            format!("charge_nonneg_{i}"),
            rd - ra,
            Sense::GreaterEqual,
            0.0,
        );
        sink.add(
            ConstraintFamily::PassThrough,
            format!("charge_if_visited_{i}"),
            rd - ra,
            Sense::LessEqual,
            visit * capacity,
        );
        sink.add(
            ConstraintFamily::PassThrough,
            format!("dwell_if_visited_{i}"),
            td - ta,
            Sense::LessEqual,
            visit * curve.max_duration(),
        );

        sink.add(
            ConstraintFamily::MinimumReserve,
            format!("reserve_{i}"),
            ra,
            Sense::GreaterEqual,
            visit * reserve,
        );

        let ctime_arrival = encode_charge_time(&curve, ra, &format!("ctime_arr_{i}"), vars, sink);
        let ctime_departure =
            encode_charge_time(&curve, rd, &format!("ctime_dep_{i}"), vars, sink);
        sink.add(
            ConstraintFamily::ChargingDuration,
            format!("dwell_{i}"),
            td - ta,
            Sense::Equal,
            ctime_departure - ctime_arrival,
        );
    }
}

/// Exact `ctime(soc)` for a model variable; see the module docs.
fn encode_charge_time(
    curve: &PiecewiseChargingFunction,
    soc: Variable,
    tag: &str,
    vars: &mut VariableArena,
    sink: &mut ConstraintSink,
) -> Expression {
    let [fast, taper] = curve.segments();

    let fill = vars.continuous(format!("{tag}_fast"), 0.0, Some(fast.width()));
    let over = vars.continuous(format!("{tag}_taper"), 0.0, Some(taper.width()));
    let full = vars.binary(format!("{tag}_full"));

    sink.add(
        ConstraintFamily::ChargingCurve,
        format!("{tag}_split"),
        soc,
        Sense::Equal,
        fill + over,
    );
    sink.add(
        ConstraintFamily::ChargingCurve,
        format!("{tag}_fill"),
        fill,
        Sense::GreaterEqual,
        full * fast.width(),
    );
    sink.add(
        ConstraintFamily::ChargingCurve,
        format!("{tag}_taper_gate"),
        over,
        Sense::LessEqual,
        full * taper.width(),
    );

    fill * fast.slope + over * taper.slope
}
