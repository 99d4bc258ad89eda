//! Meeting-probability models.
//!
//! Two vehicles meet on a road segment when their occupancy windows overlap.
//! With arrival times `A1 ~ N(μ1, σ1²)` and `A2 ~ N(μ2, σ2²)` at the segment
//! and travel times `tt1`, `tt2`, the windows `[A1, A1 + tt1]` and
//! `[A2, A2 + tt2]` overlap iff
//!
//! ```text
//! −tt2 ≤ A2 − A1 ≤ tt1
//! ```
//!
//! `A2 − A1` is normal with mean `μ2 − μ1` and variance `σ1² + σ2²`, so the
//! meeting probability is a difference of two normal CDFs.

/// Inputs to a meeting-probability evaluation.  All values in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeetingQuery {
    pub arrival_mean_2: f64,
    pub arrival_std_2:  f64,
    pub arrival_mean_1: f64,
    pub arrival_std_1:  f64,
    pub lower_bound:    f64,
    pub upper_bound:    f64,
    pub travel_time_1:  f64,
    pub travel_time_2:  f64,
}

impl MeetingQuery {
    /// Mean of `A2 − A1`.
    #[inline]
    pub fn mean_gap(&self) -> f64 {
        self.arrival_mean_2 - self.arrival_mean_1
    }

    /// Standard deviation of `A2 − A1`.
    #[inline]
    pub fn gap_std(&self) -> f64 {
        (self.arrival_std_1 * self.arrival_std_1 + self.arrival_std_2 * self.arrival_std_2).sqrt()
    }
}

/// Pluggable meeting-probability model.
///
/// Implementations must be deterministic and return a value in `[0, 1]`.
pub trait MeetingProbability: Send + Sync {
    fn probability(&self, query: &MeetingQuery) -> f64;
}

/// `P(lower ≤ A2 − A1 ≤ upper)` under independent normal arrival times.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianMeetingModel;

/// Spreads below this are treated as deterministic.
const MIN_STD: f64 = 1e-9;

impl MeetingProbability for GaussianMeetingModel {
    fn probability(&self, query: &MeetingQuery) -> f64 {
        let (lower, upper) = (query.lower_bound, query.upper_bound);
        if !(lower <= upper) {
            return 0.0;
        }
        let mu = query.mean_gap();
        let sigma = query.gap_std();
        if sigma < MIN_STD {
            return if (lower..=upper).contains(&mu) { 1.0 } else { 0.0 };
        }
        let p = normal_cdf((upper - mu) / sigma) - normal_cdf((lower - mu) / sigma);
        p.clamp(0.0, 1.0)
    }
}

/// Standard normal CDF.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Error function, Abramowitz & Stegun 7.1.26 (|error| < 1.5e-7).
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}
