//! Objective selection
//!
//! | Mode | Minimizes |
//! |------|-----------|
//! | `traveltime` | arrival time at the destination |
//! | `cost` | `Σ cost_i · charged_i` over candidate stations |
//! | `number_of_stops` | `Σ visit_i` over candidate stations |
//! | `multi` | `(cost, arrival time)`, lexicographic unless weighted |
//!
//! ## Cost basis
//!
//! What a station's price is charged against is explicit, never implied:
//!
//! - [`CostBasis::Energy`] (default): `cost_i · (departure_energy_i - arrival_energy_i)`,
//!   price per kWh delivered.
//! - [`CostBasis::ChargingTime`]: `cost_i · (departure_time_i - arrival_time_i)`,
//!   price per minute plugged in.

use crate::builder::PlanVariables;
use crate::error::ConfigurationError;
use crate::instance::ProblemInstance;
use good_lp::Expression;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Requested optimization goal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveMode {
    #[default]
    #[serde(rename = "traveltime")]
    TravelTime,
    Cost,
    Multi,
    NumberOfStops,
}

impl ObjectiveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveMode::TravelTime => "traveltime",
            ObjectiveMode::Cost => "cost",
            ObjectiveMode::Multi => "multi",
            ObjectiveMode::NumberOfStops => "number_of_stops",
        }
    }

    pub fn all() -> &'static [ObjectiveMode] {
        &[
            ObjectiveMode::TravelTime,
            ObjectiveMode::Cost,
            ObjectiveMode::Multi,
            ObjectiveMode::NumberOfStops,
        ]
    }
}

impl std::fmt::Display for ObjectiveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ObjectiveMode {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "traveltime" | "travel_time" => Ok(ObjectiveMode::TravelTime),
            "cost" => Ok(ObjectiveMode::Cost),
            "multi" => Ok(ObjectiveMode::Multi),
            "number_of_stops" | "mincs" => Ok(ObjectiveMode::NumberOfStops),
            other => Err(ConfigurationError::UnknownOption {
                kind: "objective",
                value: other.to_string(),
                supported: "traveltime, cost, multi, number_of_stops",
            }),
        }
    }
}

/// Quantity a station's unit price applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasis {
    /// Price per kWh charged
    #[default]
    Energy,
    /// Price per minute spent charging
    ChargingTime,
}

impl CostBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostBasis::Energy => "energy",
            CostBasis::ChargingTime => "charging_time",
        }
    }
}

impl std::fmt::Display for CostBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CostBasis {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "energy" => Ok(CostBasis::Energy),
            "charging_time" | "time" => Ok(CostBasis::ChargingTime),
            other => Err(ConfigurationError::UnknownOption {
                kind: "cost basis",
                value: other.to_string(),
                supported: "energy, charging_time",
            }),
        }
    }
}

/// How the goals of the `multi` mode are combined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiObjectivePolicy {
    /// Optimize goals in priority order, never degrading an earlier one.
    #[default]
    Lexicographic,
    /// Minimize one weighted sum; weights follow goal order.
    Weighted { weights: Vec<f64> },
}

/// Objective settings of a planning request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveConfig {
    pub mode: ObjectiveMode,
    pub cost_basis: CostBasis,
    pub multi_policy: MultiObjectivePolicy,
}

impl ObjectiveConfig {
    pub fn new(mode: ObjectiveMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_cost_basis(mut self, basis: CostBasis) -> Self {
        self.cost_basis = basis;
        self
    }

    pub fn with_multi_policy(mut self, policy: MultiObjectivePolicy) -> Self {
        self.multi_policy = policy;
        self
    }
}

/// One expression to minimize.
#[derive(Debug, Clone)]
pub struct ObjectiveGoal {
    pub label: &'static str,
    pub expression: Expression,
}

/// Minimization target attached to a constraint system.
#[derive(Debug, Clone)]
pub struct Objective {
    pub mode: ObjectiveMode,
    /// Goals in priority order; a single entry for scalar modes
    pub goals: Vec<ObjectiveGoal>,
    pub policy: MultiObjectivePolicy,
}

impl Objective {
    /// Expressions to minimize one after another.
    ///
    /// Scalar modes and the weighted policy yield one stage; lexicographic
    /// yields one stage per goal.
    pub fn stages(&self) -> Vec<ObjectiveGoal> {
        match &self.policy {
            MultiObjectivePolicy::Weighted { weights } if self.goals.len() > 1 => {
                let expression = self
                    .goals
                    .iter()
                    .zip(weights)
                    .map(|(goal, &w)| goal.expression.clone() * w)
                    .sum();
                vec![ObjectiveGoal {
                    label: "weighted",
                    expression,
                }]
            }
            _ => self.goals.clone(),
        }
    }
}

/// `Σ cost_i · charged_i` over candidate stations.
pub fn cost_expression(
    plan: &PlanVariables,
    instance: &ProblemInstance,
    basis: CostBasis,
) -> Expression {
    instance
        .candidate_orders()
        .map(|i| {
            let price = instance.station(i).cost_per_unit;
            let charged = match basis {
                CostBasis::Energy => plan.departure_energy[i] - plan.arrival_energy[i],
                CostBasis::ChargingTime => plan.departure_time[i] - plan.arrival_time[i],
            };
            charged * price
        })
        .sum()
}

/// Arrival time at the destination.
pub fn travel_time_expression(plan: &PlanVariables, instance: &ProblemInstance) -> Expression {
    Expression::from(plan.arrival_time[instance.destination()])
}

/// Number of candidate stations used as stops.
pub fn stop_count_expression(plan: &PlanVariables, instance: &ProblemInstance) -> Expression {
    instance.candidate_orders().map(|i| plan.visit[i]).sum()
}

/// Maps an [`ObjectiveConfig`] to expressions over the plan variables.
pub struct ObjectiveSelector;

impl ObjectiveSelector {
    pub fn select(
        config: &ObjectiveConfig,
        plan: &PlanVariables,
        instance: &ProblemInstance,
    ) -> Result<Objective, ConfigurationError> {
        let goals = match config.mode {
            ObjectiveMode::TravelTime => vec![ObjectiveGoal {
                label: "travel time",
                expression: travel_time_expression(plan, instance),
            }],
            ObjectiveMode::Cost => vec![ObjectiveGoal {
                label: "cost",
                expression: cost_expression(plan, instance, config.cost_basis),
            }],
            ObjectiveMode::NumberOfStops => vec![ObjectiveGoal {
                label: "stops",
                expression: stop_count_expression(plan, instance),
            }],
            ObjectiveMode::Multi => vec![
                ObjectiveGoal {
                    label: "cost",
                    expression: cost_expression(plan, instance, config.cost_basis),
                },
                ObjectiveGoal {
                    label: "travel time",
                    expression: travel_time_expression(plan, instance),
                },
            ],
        };

        if let MultiObjectivePolicy::Weighted { weights } = &config.multi_policy {
            if config.mode != ObjectiveMode::Multi {
                return Err(ConfigurationError::WeightsRequireMulti {
                    mode: config.mode.as_str(),
                });
            }
            if weights.len() != goals.len() {
                return Err(ConfigurationError::ObjectiveWeights {
                    expected: goals.len(),
                    found: weights.len(),
                });
            }
        }

        Ok(Objective {
            mode: config.mode,
            goals,
            policy: config.multi_policy.clone(),
        })
    }
}
