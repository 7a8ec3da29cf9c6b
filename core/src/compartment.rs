//! A single tissue compartment: Haldane loading and Bühlmann tolerances.
//!
//! Each compartment tracks its nitrogen and helium partial pressures and,
//! after every update, the minimum ambient pressure it tolerates at the
//! gradient factor in force. The a/b coefficients are weighted by the
//! current inert-gas mix (Workman/Baker method) before the gradient factor
//! is applied.

use core::f64::consts::LN_2;

use crate::gas::{ambient_pressure, Gas};
use crate::units::{Depth, Time};
use crate::zhl16c::{A_HE, A_N2, B_HE, B_N2, HE_HALF_TIMES, N2_HALF_TIMES};

/// Total inert load below which the N2 coefficients are used as-is.
const MIN_TOTAL_PRESSURE: f64 = 1e-10;

/// Current and surfacing supersaturation, as percentages of the M-value
/// gradient at 100% GF.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Supersaturation {
    pub gf_99: f64,
    pub gf_surf: f64,
}

/// Inert-gas partial pressures of one compartment (bar).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InertGasPressures {
    pub n2: f64,
    pub he: f64,
    pub total: f64,
}

/// One of the sixteen ZH-L16C tissue compartments.
#[derive(Debug, Clone, Copy)]
pub struct Compartment {
    idx: usize,
    p_n2: f64,
    p_he: f64,
    p_total: f64,
    min_tolerable_amb_pressure: f64,
}

impl Compartment {
    /// A compartment equilibrated with air at the surface.
    pub fn new(idx: usize, surface_pressure: u16, max_gf: u8) -> Self {
        let inspired = Gas::air().inspired_partial_pressures(Depth::zero(), surface_pressure);
        let mut compartment = Self {
            idx,
            p_n2: inspired.n2,
            p_he: 0.0,
            p_total: inspired.n2,
            min_tolerable_amb_pressure: 0.0,
        };
        compartment.min_tolerable_amb_pressure = compartment.min_tolerable_at(max_gf);
        compartment
    }

    /// Haldane update for both inert species over one segment, then
    /// re-derivation of the tolerated ambient pressure at `max_gf`.
    ///
    /// A zero-duration segment leaves the gas loading untouched and only
    /// re-derives the tolerance, which is how the sloped gradient factor is
    /// applied to the leading compartment.
    pub fn recalculate(
        &mut self,
        depth: Depth,
        time: Time,
        gas: &Gas,
        max_gf: u8,
        surface_pressure: u16,
    ) {
        let inspired = gas.inspired_partial_pressures(depth, surface_pressure);
        let minutes = time.as_minutes();
        self.p_n2 = haldane(self.p_n2, inspired.n2, minutes, N2_HALF_TIMES[self.idx]);
        self.p_he = haldane(self.p_he, inspired.he, minutes, HE_HALF_TIMES[self.idx]);
        self.p_total = self.p_n2 + self.p_he;
        self.min_tolerable_amb_pressure = self.min_tolerable_at(max_gf);
    }

    /// Minimum tolerable ambient pressure (bar) as of the last update.
    pub fn min_tolerable_amb_pressure(&self) -> f64 {
        self.min_tolerable_amb_pressure
    }

    /// Ceiling in meters implied by the tolerated ambient pressure.
    pub fn ceiling(&self, surface_pressure: u16) -> Depth {
        let meters =
            10.0 * (self.min_tolerable_amb_pressure - f64::from(surface_pressure) / 1000.0);
        Depth::from_meters(meters.max(0.0))
    }

    /// M-value at 100% gradient for an ambient pressure (bar).
    pub fn m_value(&self, amb_pressure: f64) -> f64 {
        let (a, b) = self.weighted_coefficients();
        a + amb_pressure / b
    }

    /// GF99 and GFSurf for the compartment at the given depth.
    pub fn supersaturation(&self, surface_pressure: u16, depth: Depth) -> Supersaturation {
        let p_surf = f64::from(surface_pressure) / 1000.0;
        let p_amb = ambient_pressure(depth, surface_pressure);
        Supersaturation {
            gf_99: self.gradient_at(p_amb),
            gf_surf: self.gradient_at(p_surf),
        }
    }

    /// Ambient pressure (bar) at which the compartment sits exactly at
    /// gradient `gf` (percent).
    pub fn amb_pressure_at_gf(&self, gf: u8) -> f64 {
        let g = f64::from(gf) / 100.0;
        let (a, b) = self.weighted_coefficients();
        (self.p_total - g * a) / (1.0 - g + g / b)
    }

    pub fn pressures(&self) -> InertGasPressures {
        InertGasPressures {
            n2: self.p_n2,
            he: self.p_he,
            total: self.p_total,
        }
    }

    /// Supersaturation as a percentage of the M-value gradient at `amb` (bar).
    fn gradient_at(&self, amb_pressure: f64) -> f64 {
        let denominator = self.m_value(amb_pressure) - amb_pressure;
        if denominator <= MIN_TOTAL_PRESSURE {
            return 0.0;
        }
        (((self.p_total - amb_pressure) / denominator) * 100.0).max(0.0)
    }

    /// a/b weighted by the current tissue partial-pressure ratio.
    fn weighted_coefficients(&self) -> (f64, f64) {
        if self.p_total > MIN_TOTAL_PRESSURE {
            let a = (A_N2[self.idx] * self.p_n2 + A_HE[self.idx] * self.p_he) / self.p_total;
            let b = (B_N2[self.idx] * self.p_n2 + B_HE[self.idx] * self.p_he) / self.p_total;
            (a, b)
        } else {
            (A_N2[self.idx], B_N2[self.idx])
        }
    }

    /// Weighted a/b with the gradient factor applied.
    fn gf_adjusted_coefficients(&self, max_gf: u8) -> (f64, f64) {
        let g = f64::from(max_gf) / 100.0;
        let (a, b) = self.weighted_coefficients();
        (a * g, b / (g - g * b + b))
    }

    fn min_tolerable_at(&self, max_gf: u8) -> f64 {
        let (a, b) = self.gf_adjusted_coefficients(max_gf);
        (self.p_total - a) * b
    }
}

/// Exponential compartment loading: P' = P + (P_insp - P)(1 - 2^(-t/ht)).
fn haldane(p: f64, p_inspired: f64, minutes: f64, half_time: f64) -> f64 {
    p_inspired + (p - p_inspired) * (-LN_2 * minutes / half_time).exp()
}
