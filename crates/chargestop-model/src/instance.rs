//! Problem instance data structures
//!
//! Defines the validated, read-only input of a charging stop planning problem:
//! the route, the vehicle battery and the ordered list of candidate stations.
//! The origin (order `0`) and destination (order `n + 1`) are synthesized as
//! station records so downstream code indexes all `n + 2` locations uniformly.

use crate::charging::PiecewiseChargingFunction;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// A location on the route: a candidate charging station, or the synthetic
/// origin/destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    /// Position in route order (0 = origin, n + 1 = destination)
    pub order: usize,
    /// Energy needed to reach this point nonstop from the origin (kWh)
    pub energy_to_reach: f64,
    /// Driving time to reach this point nonstop from the origin (min)
    pub time_to_reach: f64,
    /// Charging power (kW); zero for origin and destination
    pub charging_power_kw: f64,
    /// Price per unit of the cost basis
    pub cost_per_unit: f64,
}

impl StationRecord {
    pub fn new(
        order: usize,
        energy_to_reach: f64,
        time_to_reach: f64,
        charging_power_kw: f64,
        cost_per_unit: f64,
    ) -> Self {
        Self {
            order,
            energy_to_reach,
            time_to_reach,
            charging_power_kw,
            cost_per_unit,
        }
    }

    fn origin() -> Self {
        Self::new(0, 0.0, 0.0, 0.0, 0.0)
    }

    fn destination(order: usize, route_length: f64, nonstop_time: f64) -> Self {
        Self::new(order, route_length, nonstop_time, 0.0, 0.0)
    }
}

/// Station row of the external input format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationInput {
    pub order: usize,
    pub energy_to_reach: f64,
    pub time_to_reach: f64,
    pub power_kw: f64,
    pub cost_per_unit: f64,
}

/// Raw instance as delivered by a data loader.
///
/// Percent fields are converted to fractions when the instance is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceData {
    /// Minimum state of charge, percent of capacity
    pub min_soc_percent: f64,
    /// Energy needed to drive the whole route nonstop (kWh)
    pub route_length: f64,
    /// Declared number of candidate stations
    pub station_count: usize,
    /// Driving time of the whole route without stops (min)
    pub nonstop_time: f64,
    /// Battery capacity (kWh)
    pub battery_capacity: f64,
    /// Energy in the battery at the origin (kWh)
    pub initial_energy: f64,
    /// End of the fast charging phase, percent of capacity
    pub breakpoint_percent: f64,
    /// Charging power in the tapered phase, percent of rated power
    pub slope_percent: f64,
    pub stations: Vec<StationInput>,
}

/// Validated charging stop planning problem.
///
/// Built once per request and read-only afterwards. Use
/// [`ProblemInstanceBuilder`] or [`ProblemInstance::from_data`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemInstance {
    battery_capacity: f64,
    min_soc_fraction: f64,
    initial_energy: f64,
    breakpoint_fraction: f64,
    slope_fraction: f64,
    /// Origin, candidates in route order, destination
    stations: Vec<StationRecord>,
}

impl ProblemInstance {
    /// Build an instance from the external input format.
    pub fn from_data(data: &InstanceData) -> Result<Self, ConfigurationError> {
        if data.station_count != data.stations.len() {
            return Err(ConfigurationError::StationCountMismatch {
                declared: data.station_count,
                found: data.stations.len(),
            });
        }

        let candidates = data
            .stations
            .iter()
            .map(|s| {
                StationRecord::new(
                    s.order,
                    s.energy_to_reach,
                    s.time_to_reach,
                    s.power_kw,
                    s.cost_per_unit,
                )
            })
            .collect();

        Self::new(
            data.battery_capacity,
            data.min_soc_percent / 100.0,
            data.initial_energy,
            data.route_length,
            data.nonstop_time,
            data.breakpoint_percent / 100.0,
            data.slope_percent / 100.0,
            candidates,
        )
    }

    /// Validate parameters and synthesize origin/destination records.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        battery_capacity: f64,
        min_soc_fraction: f64,
        initial_energy: f64,
        route_length: f64,
        nonstop_time: f64,
        breakpoint_fraction: f64,
        slope_fraction: f64,
        candidates: Vec<StationRecord>,
    ) -> Result<Self, ConfigurationError> {
        for (name, value) in [
            ("battery capacity", battery_capacity),
            ("min SoC fraction", min_soc_fraction),
            ("initial energy", initial_energy),
            ("route length", route_length),
            ("nonstop time", nonstop_time),
            ("breakpoint fraction", breakpoint_fraction),
            ("slope fraction", slope_fraction),
        ] {
            if !value.is_finite() {
                return Err(ConfigurationError::NotFinite { name, value });
            }
        }

        if candidates.is_empty() {
            return Err(ConfigurationError::TooFewStations(0));
        }
        if battery_capacity <= 0.0 {
            return Err(ConfigurationError::NonPositiveCapacity(battery_capacity));
        }
        check_open_fraction("min SoC fraction", min_soc_fraction)?;
        check_open_fraction("breakpoint fraction", breakpoint_fraction)?;
        if slope_fraction <= 0.0 {
            return Err(ConfigurationError::NonPositive {
                name: "slope fraction",
                value: slope_fraction,
            });
        }
        if breakpoint_fraction * slope_fraction > 1.0 {
            return Err(ConfigurationError::NonConvexChargingCurve {
                breakpoint: breakpoint_fraction,
                slope: slope_fraction,
            });
        }
        if !(0.0..=battery_capacity).contains(&initial_energy) {
            return Err(ConfigurationError::InitialEnergyOutOfRange {
                initial: initial_energy,
                capacity: battery_capacity,
            });
        }

        let n = candidates.len();
        let mut stations = Vec::with_capacity(n + 2);
        stations.push(StationRecord::origin());
        stations.extend(candidates);
        stations.push(StationRecord::destination(n + 1, route_length, nonstop_time));

        for (expected, station) in stations.iter().enumerate() {
            validate_station(expected, station, n)?;
        }
        for pair in stations.windows(2) {
            check_monotonic(&pair[0], &pair[1])?;
        }

        Ok(Self {
            battery_capacity,
            min_soc_fraction,
            initial_energy,
            breakpoint_fraction,
            slope_fraction,
            stations,
        })
    }

    /// Number of candidate stations `n` (origin and destination excluded).
    pub fn station_count(&self) -> usize {
        self.stations.len() - 2
    }

    /// Order of the synthetic destination record, `n + 1`.
    pub fn destination(&self) -> usize {
        self.stations.len() - 1
    }

    /// Orders of the candidate stations, `1..=n`.
    pub fn candidate_orders(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.station_count()
    }

    /// All `n + 2` records, indexed by order.
    pub fn stations(&self) -> &[StationRecord] {
        &self.stations
    }

    /// Record for a given order.
    ///
    /// # Panics
    ///
    /// Panics if `order > n + 1`.
    pub fn station(&self, order: usize) -> &StationRecord {
        &self.stations[order]
    }

    pub fn battery_capacity(&self) -> f64 {
        self.battery_capacity
    }

    pub fn min_soc_fraction(&self) -> f64 {
        self.min_soc_fraction
    }

    /// Lowest energy the battery may hold, `B · minSocFraction`.
    pub fn reserve_energy(&self) -> f64 {
        self.battery_capacity * self.min_soc_fraction
    }

    pub fn initial_energy(&self) -> f64 {
        self.initial_energy
    }

    pub fn route_length(&self) -> f64 {
        self.stations[self.destination()].energy_to_reach
    }

    pub fn nonstop_time(&self) -> f64 {
        self.stations[self.destination()].time_to_reach
    }

    pub fn breakpoint_fraction(&self) -> f64 {
        self.breakpoint_fraction
    }

    pub fn slope_fraction(&self) -> f64 {
        self.slope_fraction
    }

    /// Charging curve of a candidate station.
    pub fn charging_function(&self, order: usize) -> PiecewiseChargingFunction {
        PiecewiseChargingFunction::new(
            self.battery_capacity,
            self.stations[order].charging_power_kw,
            self.breakpoint_fraction,
            self.slope_fraction,
        )
    }

    /// Stations (order > 0) reachable from the origin without dropping below
    /// the reserve.
    pub fn reachable_from_origin(&self) -> Vec<usize> {
        let budget = self.initial_energy - self.reserve_energy();
        self.stations
            .iter()
            .skip(1)
            .filter(|s| s.energy_to_reach <= budget)
            .map(|s| s.order)
            .collect()
    }

    /// Stations (order <= n) from which a full battery reaches the
    /// destination above the reserve.
    pub fn reaching_destination(&self) -> Vec<usize> {
        let budget = self.battery_capacity * (1.0 - self.min_soc_fraction);
        let length = self.route_length();
        self.stations[..self.destination()]
            .iter()
            .filter(|s| length - s.energy_to_reach <= budget)
            .map(|s| s.order)
            .collect()
    }
}

fn check_open_fraction(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value <= 0.0 || value >= 1.0 {
        return Err(ConfigurationError::FractionOutOfRange { name, value });
    }
    Ok(())
}

fn validate_station(
    expected: usize,
    station: &StationRecord,
    n: usize,
) -> Result<(), ConfigurationError> {
    if station.order != expected {
        return Err(ConfigurationError::NonConsecutiveOrder {
            expected,
            found: station.order,
        });
    }

    for (field, value) in [
        ("energy to reach", station.energy_to_reach),
        ("time to reach", station.time_to_reach),
        ("charging power", station.charging_power_kw),
        ("cost per unit", station.cost_per_unit),
    ] {
        if !value.is_finite() {
            return Err(ConfigurationError::NotFinite { name: field, value });
        }
        if value < 0.0 {
            return Err(ConfigurationError::NegativeValue {
                order: station.order,
                field,
                value,
            });
        }
    }

    let is_candidate = (1..=n).contains(&station.order);
    if is_candidate && station.charging_power_kw <= 0.0 {
        return Err(ConfigurationError::ZeroChargingPower {
            order: station.order,
        });
    }
    Ok(())
}

fn check_monotonic(prev: &StationRecord, next: &StationRecord) -> Result<(), ConfigurationError> {
    if next.energy_to_reach < prev.energy_to_reach {
        return Err(ConfigurationError::NonMonotonic {
            order: next.order,
            field: "energy to reach",
            value: next.energy_to_reach,
            previous: prev.energy_to_reach,
        });
    }
    if next.time_to_reach < prev.time_to_reach {
        return Err(ConfigurationError::NonMonotonic {
            order: next.order,
            field: "time to reach",
            value: next.time_to_reach,
            previous: prev.time_to_reach,
        });
    }
    Ok(())
}

/// Builder for constructing problem instances
pub struct ProblemInstanceBuilder {
    battery_capacity: f64,
    min_soc_fraction: f64,
    initial_energy: f64,
    route_length: f64,
    nonstop_time: f64,
    breakpoint_fraction: f64,
    slope_fraction: f64,
    candidates: Vec<StationRecord>,
}

impl ProblemInstanceBuilder {
    /// Start from a battery capacity; the battery starts full and the
    /// charging curve defaults to an 80 % breakpoint with half power beyond it.
    pub fn new(battery_capacity: f64) -> Self {
        Self {
            battery_capacity,
            min_soc_fraction: 0.1,
            initial_energy: battery_capacity,
            route_length: 0.0,
            nonstop_time: 0.0,
            breakpoint_fraction: 0.8,
            slope_fraction: 0.5,
            candidates: Vec::new(),
        }
    }

    pub fn min_soc_fraction(mut self, fraction: f64) -> Self {
        self.min_soc_fraction = fraction;
        self
    }

    pub fn initial_energy(mut self, energy: f64) -> Self {
        self.initial_energy = energy;
        self
    }

    /// Set the route's total nonstop energy and driving time
    pub fn route(mut self, route_length: f64, nonstop_time: f64) -> Self {
        self.route_length = route_length;
        self.nonstop_time = nonstop_time;
        self
    }

    /// Set the charging curve breakpoint and tapered-phase power fraction
    pub fn charging_curve(mut self, breakpoint_fraction: f64, slope_fraction: f64) -> Self {
        self.breakpoint_fraction = breakpoint_fraction;
        self.slope_fraction = slope_fraction;
        self
    }

    /// Append the next candidate station in route order
    pub fn station(
        mut self,
        energy_to_reach: f64,
        time_to_reach: f64,
        charging_power_kw: f64,
        cost_per_unit: f64,
    ) -> Self {
        let order = self.candidates.len() + 1;
        self.candidates.push(StationRecord::new(
            order,
            energy_to_reach,
            time_to_reach,
            charging_power_kw,
            cost_per_unit,
        ));
        self
    }

    /// Validate and build the instance
    pub fn build(self) -> Result<ProblemInstance, ConfigurationError> {
        ProblemInstance::new(
            self.battery_capacity,
            self.min_soc_fraction,
            self.initial_energy,
            self.route_length,
            self.nonstop_time,
            self.breakpoint_fraction,
            self.slope_fraction,
            self.candidates,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_station_builder() -> ProblemInstanceBuilder {
        ProblemInstanceBuilder::new(100.0)
            .min_soc_fraction(0.1)
            .initial_energy(80.0)
            .route(150.0, 120.0)
            .station(20.0, 16.0, 50.0, 0.3)
            .station(65.0, 52.0, 50.0, 0.4)
            .station(90.0, 72.0, 50.0, 0.5)
    }

    #[test]
    fn test_builder_synthesizes_endpoints() {
        let instance = three_station_builder().build().unwrap();

        assert_eq!(instance.station_count(), 3);
        assert_eq!(instance.destination(), 4);
        assert_eq!(instance.stations().len(), 5);
        assert_eq!(instance.station(0), &StationRecord::new(0, 0.0, 0.0, 0.0, 0.0));
        assert_eq!(
            instance.station(4),
            &StationRecord::new(4, 150.0, 120.0, 0.0, 0.0)
        );
        assert_eq!(instance.route_length(), 150.0);
        assert_eq!(instance.nonstop_time(), 120.0);
        assert!((instance.reserve_energy() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_reachability_sets() {
        let instance = three_station_builder().build().unwrap();

        // r0 - reserve = 70: stations 1 and 2
        assert_eq!(instance.reachable_from_origin(), vec![1, 2]);
        // 150 - e <= 90: stations 2 and 3
        assert_eq!(instance.reaching_destination(), vec![2, 3]);
    }

    #[test]
    fn test_from_data_converts_percentages() {
        let data = InstanceData {
            min_soc_percent: 20.0,
            route_length: 100.0,
            station_count: 1,
            nonstop_time: 90.0,
            battery_capacity: 60.0,
            initial_energy: 50.0,
            breakpoint_percent: 80.0,
            slope_percent: 40.0,
            stations: vec![StationInput {
                order: 1,
                energy_to_reach: 30.0,
                time_to_reach: 27.0,
                power_kw: 100.0,
                cost_per_unit: 0.5,
            }],
        };

        let instance = ProblemInstance::from_data(&data).unwrap();
        assert!((instance.min_soc_fraction() - 0.2).abs() < 1e-12);
        assert!((instance.breakpoint_fraction() - 0.8).abs() < 1e-12);
        assert!((instance.slope_fraction() - 0.4).abs() < 1e-12);
        assert_eq!(instance.station(1).charging_power_kw, 100.0);
    }

    #[test]
    fn test_station_count_mismatch() {
        let data = InstanceData {
            min_soc_percent: 20.0,
            route_length: 100.0,
            station_count: 2,
            nonstop_time: 90.0,
            battery_capacity: 60.0,
            initial_energy: 50.0,
            breakpoint_percent: 80.0,
            slope_percent: 40.0,
            stations: vec![StationInput {
                order: 1,
                energy_to_reach: 30.0,
                time_to_reach: 27.0,
                power_kw: 100.0,
                cost_per_unit: 0.5,
            }],
        };

        assert_eq!(
            ProblemInstance::from_data(&data),
            Err(ConfigurationError::StationCountMismatch {
                declared: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_rejects_bad_scalars() {
        let err = ProblemInstanceBuilder::new(0.0)
            .route(10.0, 10.0)
            .station(5.0, 5.0, 50.0, 0.1)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::NonPositiveCapacity(0.0));

        let err = three_station_builder().min_soc_fraction(1.0).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::FractionOutOfRange {
                name: "min SoC fraction",
                ..
            }
        ));

        let err = three_station_builder()
            .charging_curve(0.0, 0.5)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::FractionOutOfRange { .. }));

        let err = three_station_builder()
            .charging_curve(0.8, 0.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::NonPositive { .. }));

        let err = three_station_builder()
            .charging_curve(0.8, 2.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::NonConvexChargingCurve { .. }));

        let err = three_station_builder().initial_energy(120.0).build().unwrap_err();
        assert!(matches!(err, ConfigurationError::InitialEnergyOutOfRange { .. }));
    }

    #[test]
    fn test_rejects_empty_station_list() {
        let err = ProblemInstanceBuilder::new(100.0)
            .route(50.0, 40.0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::TooFewStations(0));
    }

    #[test]
    fn test_rejects_non_monotonic_stations() {
        let err = ProblemInstanceBuilder::new(100.0)
            .route(150.0, 120.0)
            .station(60.0, 40.0, 50.0, 0.3)
            .station(50.0, 45.0, 50.0, 0.3)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::NonMonotonic {
                order: 2,
                field: "energy to reach",
                ..
            }
        ));

        // A station past the destination breaks monotonicity too
        let err = ProblemInstanceBuilder::new(100.0)
            .route(50.0, 120.0)
            .station(60.0, 40.0, 50.0, 0.3)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::NonMonotonic { order: 2, .. }));
    }

    #[test]
    fn test_rejects_negative_and_unpowered_stations() {
        let err = ProblemInstanceBuilder::new(100.0)
            .route(150.0, 120.0)
            .station(-1.0, 10.0, 50.0, 0.3)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::NegativeValue { order: 1, .. }));

        let err = ProblemInstanceBuilder::new(100.0)
            .route(150.0, 120.0)
            .station(10.0, 10.0, 0.0, 0.3)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::ZeroChargingPower { order: 1 });
    }

    #[test]
    fn test_rejects_out_of_order_records() {
        let candidates = vec![
            StationRecord::new(2, 10.0, 10.0, 50.0, 0.1),
            StationRecord::new(1, 20.0, 20.0, 50.0, 0.1),
        ];
        let err =
            ProblemInstance::new(100.0, 0.1, 100.0, 150.0, 120.0, 0.8, 0.5, candidates).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::NonConsecutiveOrder {
                expected: 1,
                found: 2
            }
        );
    }
}
