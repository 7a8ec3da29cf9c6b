//! Breathing gas mixes and their pressure queries.
//!
//! A `Gas` is an immutable (fO2, fHe, fN2) triple; the nitrogen fraction is
//! derived from the other two and rounded to four decimals. Partial-pressure
//! queries come in two flavours: ambient, and inspired (alveolar, with the
//! water-vapour pressure subtracted).

use core::fmt;

use crate::error::GasError;
use crate::units::Depth;

/// Water vapour pressure in the lungs (bar), at 37°C.
pub(crate) const P_WATER_VAPOR: f64 = 0.0627;

/// Pressure increase per meter of seawater (bar/m).
const BAR_PER_METER: f64 = 0.1;

/// Absolute pressure (bar) at a depth under the given surface pressure (mbar).
pub(crate) fn ambient_pressure(depth: Depth, surface_pressure: u16) -> f64 {
    f64::from(surface_pressure) / 1000.0 + depth.as_meters() * BAR_PER_METER
}

/// Per-species partial pressures of a mix (bar).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartialPressures {
    pub o2: f64,
    pub n2: f64,
    pub he: f64,
}

/// An immutable breathing mix.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gas {
    fo2: f64,
    fhe: f64,
    fn2: f64,
}

impl Gas {
    /// Build a mix from its oxygen and helium fractions.
    pub fn new(fo2: f64, fhe: f64) -> Result<Self, GasError> {
        if !(0.0..=1.0).contains(&fo2) || !(0.0..=1.0).contains(&fhe) {
            return Err(GasError::FractionOutOfRange { fo2, fhe });
        }
        if fo2 + fhe > 1.0 {
            return Err(GasError::FractionSum { fo2, fhe });
        }
        // fN2 is derived; round to four decimals so 1 - 0.21 reads 0.79 exactly.
        let fn2 = ((1.0 - fo2 - fhe) * 10_000.0).round() / 10_000.0;
        Ok(Self { fo2, fhe, fn2 })
    }

    /// Atmospheric air (21/00).
    pub fn air() -> Self {
        Self {
            fo2: 0.21,
            fhe: 0.0,
            fn2: 0.79,
        }
    }

    /// Helium-free nitrox mix with the given oxygen fraction.
    pub fn nitrox(fo2: f64) -> Result<Self, GasError> {
        Self::new(fo2, 0.0)
    }

    pub fn fo2(&self) -> f64 {
        self.fo2
    }

    pub fn fhe(&self) -> f64 {
        self.fhe
    }

    pub fn fn2(&self) -> f64 {
        self.fn2
    }

    /// Ambient partial pressures at a depth.
    pub fn partial_pressures(&self, depth: Depth, surface_pressure: u16) -> PartialPressures {
        self.pressures_at(ambient_pressure(depth, surface_pressure))
    }

    /// Inspired (alveolar) partial pressures at a depth.
    pub fn inspired_partial_pressures(
        &self,
        depth: Depth,
        surface_pressure: u16,
    ) -> PartialPressures {
        self.pressures_at(ambient_pressure(depth, surface_pressure) - P_WATER_VAPOR)
    }

    /// Deepest depth at which the mix's oxygen partial pressure stays within
    /// the given limit.
    pub fn max_operating_depth(&self, ppo2_limit: f64) -> Depth {
        Depth::from_meters(10.0 * (ppo2_limit / self.fo2 - 1.0))
    }

    /// Air depth with the same narcotic loading as this mix at `depth`.
    pub fn equivalent_narcotic_depth(&self, depth: Depth) -> Depth {
        let end = (depth.as_meters() + 10.0) * (1.0 - self.fhe) - 10.0;
        Depth::from_meters(end.max(0.0))
    }

    fn pressures_at(&self, total_pressure: f64) -> PartialPressures {
        PartialPressures {
            o2: self.fo2 * total_pressure,
            n2: self.fn2 * total_pressure,
            he: self.fhe * total_pressure,
        }
    }
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o2 = (self.fo2 * 100.0).round() as u32;
        let he = (self.fhe * 100.0).round() as u32;
        if he > 0 {
            write!(f, "{o2}/{he}")
        } else if o2 == 21 {
            write!(f, "air")
        } else if o2 == 100 {
            write!(f, "oxygen")
        } else {
            write!(f, "EAN{o2}")
        }
    }
}
