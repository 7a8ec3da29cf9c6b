//! Depth and time quantities.
//!
//! Metric is canonical: depths are stored in meters and times in seconds.
//! Imperial construction and read-back go through the 0.3048 m/ft factor;
//! physiological calculations consume minutes.

use core::fmt;
use core::ops::{Add, AddAssign, Mul, Sub};

/// Meters per foot.
const METERS_PER_FOOT: f64 = 0.3048;

/// Seconds per minute.
const SECONDS_PER_MINUTE: f64 = 60.0;

/// A water depth in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Depth(f64);

impl Depth {
    pub const fn from_meters(meters: f64) -> Self {
        Self(meters)
    }

    pub fn from_feet(feet: f64) -> Self {
        Self(feet * METERS_PER_FOOT)
    }

    pub const fn zero() -> Self {
        Self(0.0)
    }

    pub fn as_meters(&self) -> f64 {
        self.0
    }

    pub fn as_feet(&self) -> f64 {
        self.0 / METERS_PER_FOOT
    }
}

impl Add for Depth {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Depth {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f64> for Depth {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} m", self.0)
    }
}

/// An elapsed duration in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time(f64);

impl Time {
    pub const fn from_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    pub fn from_minutes(minutes: f64) -> Self {
        Self(minutes * SECONDS_PER_MINUTE)
    }

    pub const fn zero() -> Self {
        Self(0.0)
    }

    pub fn as_seconds(&self) -> f64 {
        self.0
    }

    pub fn as_minutes(&self) -> f64 {
        self.0 / SECONDS_PER_MINUTE
    }
}

impl Add for Time {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Time {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Time {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f64> for Time {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} s", self.0)
    }
}
