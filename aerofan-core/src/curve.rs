//! Temperature-to-duty curve evaluation
//!
//! A fan curve is an ordered list of (temperature, duty) points. Building a
//! [`DutyLookup`] precomputes a dense duty table for every integer
//! temperature covered by the curve, using ceiling-rounded linear
//! interpolation between consecutive points. The same table serves both
//! config-time validation and steady-state evaluation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AeroFanError, Result};

/// A single point on a fan curve mapping temperature to duty.
///
/// Serialized as a 2-element array `[temperature, duty]`, the settings
/// document's wire format. Values arrive as JSON numbers; temperatures must
/// be integral (the lookup is keyed by integer temperature), duties may be
/// fractional and are quantized by the ceiling rule at build time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct CurvePoint {
    /// Temperature in Celsius (0-100)
    pub temp: f64,
    /// Fan duty percentage (0-100)
    pub duty: f64,
}

impl CurvePoint {
    /// Create a new curve point.
    pub fn new(temp: f64, duty: f64) -> Self {
        Self { temp, duty }
    }
}

impl From<(f64, f64)> for CurvePoint {
    fn from((temp, duty): (f64, f64)) -> Self {
        Self { temp, duty }
    }
}

impl From<CurvePoint> for (f64, f64) {
    fn from(point: CurvePoint) -> Self {
        (point.temp, point.duty)
    }
}

/// An ordered temperature-to-duty control curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curve {
    /// Points defining the curve (strictly increasing temperature)
    pub points: Vec<CurvePoint>,
}

impl Curve {
    /// Create a new curve from the given points.
    pub fn new(points: Vec<CurvePoint>) -> Self {
        Self { points }
    }

    /// Validate the curve's structure.
    ///
    /// A buildable curve has at least 2 points with integral temperatures in
    /// 0-100, strictly increasing, and duties in 0-100.
    pub fn validate(&self) -> Result<()> {
        if self.points.len() < 2 {
            return Err(AeroFanError::InvalidCurve(
                "curve must have at least 2 points".to_string(),
            ));
        }

        for point in &self.points {
            if point.temp.fract() != 0.0 {
                return Err(AeroFanError::InvalidCurve(format!(
                    "temperature {} is not an integer",
                    point.temp
                )));
            }
            if !(0.0..=100.0).contains(&point.temp) {
                return Err(AeroFanError::InvalidCurve(format!(
                    "temperature {} is outside 0-100",
                    point.temp
                )));
            }
            if !(0.0..=100.0).contains(&point.duty) {
                return Err(AeroFanError::InvalidCurve(format!(
                    "duty {} is outside 0-100 at temperature {}",
                    point.duty, point.temp
                )));
            }
        }

        for window in self.points.windows(2) {
            if window[0].temp >= window[1].temp {
                return Err(AeroFanError::InvalidCurve(format!(
                    "temperatures must be strictly increasing: {} >= {}",
                    window[0].temp, window[1].temp
                )));
            }
        }

        Ok(())
    }
}

/// Ceiling-rounded duty value, kept within the 0-100 percent range.
fn ceil_duty(value: f64) -> u8 {
    value.ceil().clamp(0.0, 100.0) as u8
}

/// Precomputed duty table for a curve.
///
/// Holds one duty value per integer temperature in `[t_first, t_last]`.
/// For a segment (t1,s1)-(t2,s2) the stored duty at `t` is
/// `ceil(s1 + (t - t1) * (s2 - s1) / (t2 - t1))`.
#[derive(Debug, Clone)]
pub struct DutyLookup {
    t_first: i64,
    t_last: i64,
    duties: Vec<u8>,
}

impl DutyLookup {
    /// Build the dense lookup from a curve.
    ///
    /// Fails with `InvalidCurve` if the curve has fewer than 2 points or its
    /// temperatures are not strictly increasing.
    pub fn build(curve: &Curve) -> Result<Self> {
        curve.validate()?;

        let t_first = curve.points[0].temp as i64;
        let t_last = curve.points[curve.points.len() - 1].temp as i64;
        let mut duties = vec![0u8; (t_last - t_first + 1) as usize];

        for window in curve.points.windows(2) {
            let (t1, s1) = (window[0].temp, window[0].duty);
            let (t2, s2) = (window[1].temp, window[1].duty);
            let slope = (s2 - s1) / (t2 - t1);
            for t in t1 as i64..t2 as i64 {
                duties[(t - t_first) as usize] = ceil_duty(s1 + (t as f64 - t1) * slope);
            }
        }
        // The segment loop stops short of each segment's endpoint; store the
        // final table point so it evaluates to its own duty exactly.
        duties[(t_last - t_first) as usize] = ceil_duty(curve.points[curve.points.len() - 1].duty);

        Ok(Self {
            t_first,
            t_last,
            duties,
        })
    }

    /// Lowest temperature covered by the table.
    pub fn min_temp(&self) -> i64 {
        self.t_first
    }

    /// Highest temperature covered by the table.
    pub fn max_temp(&self) -> i64 {
        self.t_last
    }

    /// Table value at an integer temperature, clamped to the table's domain.
    ///
    /// Temperatures below the first point take the first point's duty,
    /// temperatures above the last take the last point's duty.
    fn table(&self, temp: i64) -> u8 {
        let clamped = temp.clamp(self.t_first, self.t_last);
        self.duties[(clamped - self.t_first) as usize]
    }

    /// Evaluate the duty for a temperature.
    ///
    /// - Temperatures above 100 return 100 (hard ceiling).
    /// - Temperatures below 0 return 0 (hard floor) and log a warning.
    /// - Integer temperatures hit the precomputed table directly.
    /// - Fractional temperatures interpolate between the neighboring table
    ///   entries with the same ceiling rounding, and log a diagnostic.
    pub fn evaluate(&self, temp: f64) -> u8 {
        if temp > 100.0 {
            return 100;
        }
        if temp < 0.0 {
            warn!(temp, "temperature below zero, forcing duty to 0");
            return 0;
        }
        if temp.fract() == 0.0 {
            return self.table(temp as i64);
        }

        debug!(temp, "non-integer temperature");
        let t1 = temp.floor();
        let s1 = self.table(t1 as i64) as f64;
        let s2 = self.table(temp.ceil() as i64) as f64;
        ceil_duty(s1 + (temp - t1) * (s2 - s1))
    }
}
