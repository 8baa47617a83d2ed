//! Piecewise-linear charging time curve
//!
//! Maps a state of charge (kWh, in `[0, B]`) to the minutes needed to charge
//! an empty battery up to it at a station of power `P`:
//!
//! ```text
//!  minutes
//!     │                         ╱  tapered phase: 60 / (P · slope)
//!     │                       ╱
//!     │                     ╱
//!     │              ___---·  breakpoint B · bp
//!     │      ___---‾‾          fast phase: 60 · bp / P
//!     └──────────────────────┴──── soc
//!     0                      B
//! ```
//!
//! The charging time of a stop is `ctime(departure) - ctime(arrival)`. The
//! curve only exposes its segments; encoding `ctime` of a model variable is
//! done by the model builder.

/// One linear piece of the charging curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeSegment {
    /// State of charge where the piece starts (kWh)
    pub start: f64,
    /// State of charge where the piece ends (kWh)
    pub end: f64,
    /// Minutes per kWh on this piece
    pub slope: f64,
}

impl ChargeSegment {
    /// Width of the segment in kWh.
    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Two-segment charging curve of a single station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiecewiseChargingFunction {
    capacity: f64,
    power_kw: f64,
    breakpoint_fraction: f64,
    slope_fraction: f64,
}

impl PiecewiseChargingFunction {
    pub fn new(capacity: f64, power_kw: f64, breakpoint_fraction: f64, slope_fraction: f64) -> Self {
        Self {
            capacity,
            power_kw,
            breakpoint_fraction,
            slope_fraction,
        }
    }

    /// State of charge where the tapered phase starts, `B · bp`.
    pub fn breakpoint(&self) -> f64 {
        self.capacity * self.breakpoint_fraction
    }

    pub fn fast_slope(&self) -> f64 {
        60.0 * self.breakpoint_fraction / self.power_kw
    }

    pub fn taper_slope(&self) -> f64 {
        60.0 / (self.power_kw * self.slope_fraction)
    }

    /// The fast and tapered pieces, in state-of-charge order.
    pub fn segments(&self) -> [ChargeSegment; 2] {
        [
            ChargeSegment {
                start: 0.0,
                end: self.breakpoint(),
                slope: self.fast_slope(),
            },
            ChargeSegment {
                start: self.breakpoint(),
                end: self.capacity,
                slope: self.taper_slope(),
            },
        ]
    }

    /// Minutes to charge from empty to `soc`. Values outside `[0, B]` are
    /// clamped.
    pub fn evaluate(&self, soc: f64) -> f64 {
        let soc = soc.clamp(0.0, self.capacity);
        self.segments()
            .iter()
            .map(|seg| seg.slope * (soc.min(seg.end) - seg.start).max(0.0))
            .sum()
    }

    /// Minutes to charge from `from` to `to`.
    pub fn duration(&self, from: f64, to: f64) -> f64 {
        self.evaluate(to) - self.evaluate(from)
    }

    /// Minutes for a full charge from empty; bounds any single stop.
    pub fn max_duration(&self) -> f64 {
        self.evaluate(self.capacity)
    }

    /// Slopes never decrease from one piece to the next.
    pub fn is_convex(&self) -> bool {
        self.taper_slope() >= self.fast_slope()
    }
}
