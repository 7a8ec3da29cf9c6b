//! Engine configuration and validation.

use log::debug;

use crate::error::{ConfigError, ConfigField};

/// How the decompression ceiling is reported on the live model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CeilingType {
    Actual,
    /// Accounts for off-gassing during the ascent toward the ceiling.
    Adaptive,
}

/// How the no-decompression limit search decides "in deco".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NdlType {
    Actual,
    /// Treat NDL as the point where the ceiling first exceeds zero.
    ByCeiling,
}

/// Model parameters, validated once at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// (GF low, GF high) as integer percentages.
    pub gradient_factors: (u8, u8),
    /// Surface atmospheric pressure in millibars.
    pub surface_pressure: u16,
    /// Ascent rate used for deco scheduling, meters per minute.
    pub deco_ascent_rate: f64,
    pub ceiling_type: CeilingType,
    /// Round the reported ceiling up to the next whole meter.
    pub round_ceiling: bool,
    pub ndl_type: NdlType,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gradient_factors: (100, 100),
            surface_pressure: 1013,
            deco_ascent_rate: 10.0,
            ceiling_type: CeilingType::Actual,
            round_ceiling: false,
            ndl_type: NdlType::Actual,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gradient_factors(mut self, gf_low: u8, gf_high: u8) -> Self {
        self.gradient_factors = (gf_low, gf_high);
        self
    }

    pub fn with_surface_pressure(mut self, surface_pressure: u16) -> Self {
        self.surface_pressure = surface_pressure;
        self
    }

    pub fn with_deco_ascent_rate(mut self, rate: f64) -> Self {
        self.deco_ascent_rate = rate;
        self
    }

    pub fn with_ceiling_type(mut self, ceiling_type: CeilingType) -> Self {
        self.ceiling_type = ceiling_type;
        self
    }

    pub fn with_round_ceiling(mut self, round_ceiling: bool) -> Self {
        self.round_ceiling = round_ceiling;
        self
    }

    pub fn with_ndl_type(mut self, ndl_type: NdlType) -> Self {
        self.ndl_type = ndl_type;
        self
    }

    /// Check every parameter against its allowed range. All bounds are
    /// inclusive and validation fails closed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (gf_low, gf_high) = self.gradient_factors;
        if !(1..=100).contains(&gf_low) || !(1..=100).contains(&gf_high) {
            return Err(ConfigError::new(
                ConfigField::GradientFactors,
                "values must be in 1-100 range",
            ));
        }
        if gf_low > gf_high {
            return Err(ConfigError::new(
                ConfigField::GradientFactors,
                "GF low cannot exceed GF high",
            ));
        }
        if !(500..=1200).contains(&self.surface_pressure) {
            return Err(ConfigError::new(
                ConfigField::SurfacePressure,
                "must be in 500-1200 mbar range",
            ));
        }
        if !(self.deco_ascent_rate > 0.0 && self.deco_ascent_rate <= 30.0) {
            return Err(ConfigError::new(
                ConfigField::DecoAscentRate,
                "must be positive and at most 30 m/min",
            ));
        }
        debug!(
            "configuration accepted: GF {}/{}, surface {} mbar, ascent {} m/min",
            gf_low, gf_high, self.surface_pressure, self.deco_ascent_rate
        );
        Ok(())
    }
}
