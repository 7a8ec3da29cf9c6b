//! Decompression-planning engine for scuba diving.
//!
//! Implements the Bühlmann ZH-L16C tissue model with gradient-factor
//! conservatism: sixteen parallel compartments integrate inert-gas loading
//! from recorded dive segments, and the model answers ceiling, NDL and full
//! decompression-schedule queries without perturbing the recorded state.
//!
//! ```
//! use profundum_deco::{Depth, Gas, Model, Time};
//!
//! let mut model = Model::default();
//! model.record(Depth::from_meters(30.0), Time::from_minutes(20.0), &Gas::air())?;
//! let ndl = model.ndl();
//! let runtime = model.deco(&[Gas::air()])?;
//! # assert!(ndl.as_minutes() >= 0.0);
//! # assert_eq!(runtime.tts, runtime.tts_surface);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compartment;
pub mod config;
pub mod deco;
pub mod error;
pub mod gas;
pub mod model;
pub mod oxtox;
pub mod units;
pub mod zhl16c;

pub use compartment::{Compartment, InertGasPressures, Supersaturation};
pub use config::{CeilingType, Config, NdlType};
pub use deco::{DecoRuntime, DecoStage, DecoStageType};
pub use error::{ConfigError, ConfigField, DecoError, GasError, RecordError};
pub use gas::{Gas, PartialPressures};
pub use model::{DiveState, Model};
pub use oxtox::{CnsCoeffRow, OxTox, CNS_COEFFICIENTS};
pub use units::{Depth, Time};
