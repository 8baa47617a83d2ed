//! Reporting expressions evaluated after a solve, whatever was optimized.

use crate::builder::PlanVariables;
use crate::instance::ProblemInstance;
use crate::objective::{cost_expression, stop_count_expression, travel_time_expression, CostBasis};
use good_lp::Expression;
use serde::{Deserialize, Serialize};

/// Derived expressions attached to a constraint system.
#[derive(Debug, Clone)]
pub struct KpiExpressions {
    pub travel_time: Expression,
    pub cost: Expression,
    pub stop_count: Expression,
    /// Basis the cost KPI is measured on
    pub cost_basis: CostBasis,
}

/// KPI values of a solved plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiValues {
    /// Arrival time at the destination (min)
    pub travel_time: f64,
    pub cost: f64,
    pub stop_count: f64,
}

impl KpiValues {
    /// `(name, value)` pairs in report order.
    pub fn entries(&self) -> [(&'static str, f64); 3] {
        [
            ("Travel time", self.travel_time),
            ("Cost", self.cost),
            ("Stops", self.stop_count),
        ]
    }
}

/// Declares the KPI expressions of a model.
pub struct KpiExtractor;

impl KpiExtractor {
    pub fn extract(
        plan: &PlanVariables,
        instance: &ProblemInstance,
        cost_basis: CostBasis,
    ) -> KpiExpressions {
        KpiExpressions {
            travel_time: travel_time_expression(plan, instance),
            cost: cost_expression(plan, instance, cost_basis),
            stop_count: stop_count_expression(plan, instance),
            cost_basis,
        }
    }
}
