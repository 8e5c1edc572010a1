//! Membership degrees and piecewise-linear membership functions

use crate::error::{ErrorCode, RiskResult};
use crate::risk_ensure;

/// A degree of membership in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Degree(f64);

impl Degree {
    pub const ZERO: Degree = Degree(0.0);
    pub const ONE: Degree = Degree(1.0);

    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Fuzzy AND (t-norm) - minimum
    pub fn and(&self, other: &Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Fuzzy OR (t-conorm) - maximum
    pub fn or(&self, other: &Self) -> Self {
        Self(self.0.max(other.0))
    }

    /// Mamdani implication: clip the consequent at the firing strength
    pub fn implies_mamdani(&self, consequent: &Self) -> Self {
        self.and(consequent)
    }
}

impl From<f64> for Degree {
    fn from(v: f64) -> Self {
        Self::new(v)
    }
}

/// Membership function shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MembershipFunction {
    /// Triangular: (left, peak, right)
    Triangular(f64, f64, f64),
    /// Trapezoidal: (left, left_top, right_top, right)
    Trapezoidal(f64, f64, f64, f64),
}

impl MembershipFunction {
    /// The four breakpoints of the equivalent trapezoid
    pub fn breakpoints(&self) -> [f64; 4] {
        match *self {
            MembershipFunction::Triangular(a, b, c) => [a, b, b, c],
            MembershipFunction::Trapezoidal(a, b, c, d) => [a, b, c, d],
        }
    }

    /// Check that breakpoints are finite and non-decreasing
    pub fn validate(&self) -> RiskResult<()> {
        let points = self.breakpoints();
        risk_ensure!(
            points.iter().all(|p| p.is_finite()),
            ErrorCode::InvalidMembership,
            "breakpoints must be finite: {:?}",
            points
        );
        risk_ensure!(
            points.windows(2).all(|w| w[0] <= w[1]),
            ErrorCode::InvalidMembership,
            "breakpoints must be non-decreasing: {:?}",
            points
        );
        Ok(())
    }

    /// Evaluate membership for a crisp value
    ///
    /// A vertical edge (`a == b` or `c == d`) is a step: the value at the
    /// shared breakpoint belongs to the flat top.
    pub fn evaluate(&self, x: f64) -> Degree {
        let [a, b, c, d] = self.breakpoints();
        let value = if x < a || x > d {
            0.0
        } else if x >= b && x <= c {
            1.0
        } else if x < b {
            (x - a) / (b - a)
        } else {
            (d - x) / (d - c)
        };
        Degree::new(value)
    }
}
