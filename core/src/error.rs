//! Error types surfaced by the engine.
//!
//! Every failure is reported directly to the caller; validation precedes
//! mutation, so a rejected call leaves the model unchanged.

use core::fmt;

use thiserror::Error;

/// Configuration field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    GradientFactors,
    SurfacePressure,
    DecoAscentRate,
}

impl ConfigField {
    pub fn label(&self) -> &'static str {
        match self {
            ConfigField::GradientFactors => "gradient factors",
            ConfigField::SurfacePressure => "surface pressure",
            ConfigField::DecoAscentRate => "deco ascent rate",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Invalid configuration parameter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct ConfigError {
    pub field: ConfigField,
    pub reason: &'static str,
}

impl ConfigError {
    pub fn new(field: ConfigField, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

/// Rejected dive-segment input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("recorded depth {0:.1} m outside supported 0-200 m range")]
    DepthOutOfRange(f64),

    #[error("travel rate must be positive, got {0} m/min")]
    InvalidRate(f64),
}

/// Invalid breathing-gas composition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GasError {
    #[error("gas fraction outside 0-1 range: fO2={fo2}, fHe={fhe}")]
    FractionOutOfRange { fo2: f64, fhe: f64 },

    #[error("gas fractions exceed unity: fO2={fo2} + fHe={fhe} > 1")]
    FractionSum { fo2: f64, fhe: f64 },
}

/// Rejected decompression-schedule request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecoError {
    #[error("no gas mixes available for decompression")]
    EmptyGasList,

    #[error("current gas not present in available gas mixes")]
    CurrentGasNotInList,
}
