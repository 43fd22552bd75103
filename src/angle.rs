//! Angle utilities.
//!
//! Every angle inside the crate is carried as radians in an [`Angle`].
//! Degrees only appear at the edges (configuration, log lines) and are
//! converted through the named constructors below.
//!
//! Sign conventions:
//! - yaw: the subject's right is positive
//! - pitch: "looking all the way up" is the maximum, "all the way down" the
//!   minimum, and [`REFERENCE_PITCH`] (a quarter turn) is level with the
//!   observer's head

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Pitch of a gaze ray that arrives level at the observer's head.
pub const REFERENCE_PITCH: Angle = Angle(FRAC_PI_2);

/// An angle in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub const fn from_radians(radians: f64) -> Self {
        Self(radians)
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self(to_radians(degrees))
    }

    pub const fn radians(self) -> f64 {
        self.0
    }

    pub fn degrees(self) -> f64 {
        to_degrees(self.0)
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Fold into `(-π, π]`.
    pub fn normalized(self) -> Self {
        Self(normalize_to_pi(self.0))
    }

    /// Shortest unsigned angular distance to `other`.
    pub fn distance_to(self, other: Angle) -> Angle {
        (self - other).normalized().abs()
    }

    pub fn tan(self) -> f64 {
        self.0.tan()
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°", self.degrees())
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Angle) -> Angle {
        Angle(self.0 + rhs.0)
    }
}

impl AddAssign for Angle {
    fn add_assign(&mut self, rhs: Angle) {
        self.0 += rhs.0;
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Angle) -> Angle {
        Angle(self.0 - rhs.0)
    }
}

impl SubAssign for Angle {
    fn sub_assign(&mut self, rhs: Angle) {
        self.0 -= rhs.0;
    }
}

impl Neg for Angle {
    type Output = Angle;

    fn neg(self) -> Angle {
        Angle(-self.0)
    }
}

/// Fold an angle in radians into `(-π, π]`.
///
/// Values already inside the interval are returned bit-for-bit unchanged.
pub fn normalize_to_pi(radians: f64) -> f64 {
    if !radians.is_finite() {
        return radians;
    }
    let mut folded = radians % TAU;
    if folded > PI {
        folded -= TAU;
    } else if folded <= -PI {
        folded += TAU;
    }
    folded
}

pub fn to_degrees(radians: f64) -> f64 {
    radians.to_degrees()
}

pub fn to_radians(degrees: f64) -> f64 {
    degrees.to_radians()
}

/// Elementwise [`to_degrees`].
pub fn all_to_degrees(radians: &[f64]) -> Vec<f64> {
    radians.iter().copied().map(to_degrees).collect()
}

/// Elementwise [`to_radians`].
pub fn all_to_radians(degrees: &[f64]) -> Vec<f64> {
    degrees.iter().copied().map(to_radians).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn normalize_folds_into_half_open_interval() {
        assert!((normalize_to_pi(2.5 * PI) - FRAC_PI_2).abs() < EPS);
        assert!((normalize_to_pi(-PI) - PI).abs() < EPS);
        assert!((normalize_to_pi(TAU + 0.25) - 0.25).abs() < EPS);
        assert!((normalize_to_pi(-TAU - 0.25) + 0.25).abs() < EPS);
        assert_eq!(normalize_to_pi(PI), PI);
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut value = -25.0;
        while value < 25.0 {
            let once = normalize_to_pi(value);
            assert_eq!(normalize_to_pi(once), once, "not idempotent at {value}");
            assert!(once > -PI && once <= PI);
            value += 0.173;
        }
    }

    #[test]
    fn normalize_leaves_in_range_values_untouched() {
        let value = to_radians(15.0);
        assert_eq!(normalize_to_pi(value), value);
    }

    #[test]
    fn distance_wraps_across_the_seam() {
        let a = Angle::from_degrees(179.0);
        let b = Angle::from_degrees(-179.0);
        assert!((a.distance_to(b).degrees() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn elementwise_conversion() {
        let degrees = all_to_degrees(&[0.0, FRAC_PI_2, -PI]);
        assert_eq!(degrees.len(), 3);
        assert!((degrees[1] - 90.0).abs() < EPS);
        assert!((degrees[2] + 180.0).abs() < EPS);

        let radians = all_to_radians(&[90.0, 180.0]);
        assert!((radians[0] - FRAC_PI_2).abs() < EPS);
        assert!((radians[1] - PI).abs() < EPS);
    }

    #[test]
    fn display_uses_degrees() {
        assert_eq!(Angle::from_degrees(15.0).to_string(), "15.0°");
    }
}
