//! The sixteen-compartment Bühlmann model and its queries.
//!
//! `record` and the travel variants mutate the live model; every query
//! (`ceiling`, `ndl`, `in_deco`, `deco`) operates on a value-semantic fork
//! so the caller's state is never perturbed. A fork is flagged `sim`, which
//! forces actual-ceiling mode (no recursive simulation) and suppresses
//! oxygen-toxicity accounting.

use log::debug;

use crate::compartment::{Compartment, InertGasPressures, Supersaturation};
use crate::config::{CeilingType, Config, NdlType};
use crate::deco::{self, DecoRuntime};
use crate::error::{ConfigError, DecoError, RecordError};
use crate::gas::Gas;
use crate::oxtox::OxTox;
use crate::units::{Depth, Time};
use crate::zhl16c::NUM_COMPARTMENTS;

/// Hard cut-off for the no-decompression search (minutes).
const NDL_CUT_OFF_MINUTES: u32 = 99;

/// Iteration cap for the adaptive-ceiling fixed point.
const MAX_CEILING_ITERATIONS: u32 = 50;

/// Deepest depth accepted at record sites (m).
const MAX_RECORD_DEPTH: f64 = 200.0;

/// Current position, elapsed time, breathing gas and oxygen exposure.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiveState {
    pub depth: Depth,
    pub time: Time,
    pub gas: Gas,
    pub ox_tox: OxTox,
}

/// Bühlmann ZH-L16C decompression model with gradient-factor conservatism.
#[derive(Debug, Clone)]
pub struct Model {
    config: Config,
    compartments: [Compartment; NUM_COMPARTMENTS],
    state: DiveState,
    gf_low_depth: Option<Depth>,
    sim: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(Config::default()).expect("default configuration is valid")
    }
}

impl Model {
    /// Build a model with compartments equilibrated to air at the configured
    /// surface pressure.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let (_, gf_high) = config.gradient_factors;
        let compartments =
            core::array::from_fn(|idx| Compartment::new(idx, config.surface_pressure, gf_high));
        Ok(Self {
            config,
            compartments,
            state: DiveState {
                depth: Depth::zero(),
                time: Time::zero(),
                gas: Gas::air(),
                ox_tox: OxTox::default(),
            },
            gf_low_depth: None,
            sim: false,
        })
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn dive_state(&self) -> DiveState {
        self.state
    }

    /// Register a constant-depth segment.
    pub fn record(&mut self, depth: Depth, time: Time, gas: &Gas) -> Result<(), RecordError> {
        validate_depth(depth)?;
        self.apply_record(depth, time, gas);
        Ok(())
    }

    /// Register a linear ascent or descent taking `time` to reach
    /// `target_depth`.
    pub fn record_travel(
        &mut self,
        target_depth: Depth,
        time: Time,
        gas: &Gas,
    ) -> Result<(), RecordError> {
        validate_depth(target_depth)?;
        self.apply_travel(target_depth, time, gas);
        Ok(())
    }

    /// Register a linear ascent or descent at `rate` meters per minute; the
    /// direction is derived from the start and target depths.
    pub fn record_travel_with_rate(
        &mut self,
        target_depth: Depth,
        rate: f64,
        gas: &Gas,
    ) -> Result<(), RecordError> {
        if rate <= 0.0 {
            return Err(RecordError::InvalidRate(rate));
        }
        validate_depth(target_depth)?;
        self.apply_travel_with_rate(target_depth, rate, gas);
        Ok(())
    }

    /// Remaining no-decompression time at the current depth and gas, capped
    /// at 99 minutes.
    pub fn ndl(&self) -> Time {
        if self.in_deco() {
            return Time::zero();
        }
        let mut sim = self.fork();
        for i in 0..NDL_CUT_OFF_MINUTES {
            sim.apply_record(self.state.depth, Time::from_minutes(1.0), &self.state.gas);
            let in_deco = match self.config.ndl_type {
                NdlType::Actual => sim.in_deco(),
                NdlType::ByCeiling => sim.ceiling() > Depth::zero(),
            };
            if in_deco {
                return Time::from_minutes(f64::from(i));
            }
        }
        Time::from_minutes(f64::from(NDL_CUT_OFF_MINUTES))
    }

    /// Current decompression ceiling in meters.
    pub fn ceiling(&self) -> Depth {
        match self.config.ceiling_type {
            CeilingType::Adaptive if !self.sim => self.ceiling_adaptive(),
            _ => self.ceiling_actual(),
        }
    }

    pub fn in_deco(&self) -> bool {
        self.ceiling() > Depth::zero()
    }

    /// Synthesize a full decompression schedule over the available gas mixes.
    pub fn deco(&self, gas_mixes: &[Gas]) -> Result<DecoRuntime, DecoError> {
        deco::plan(self.fork(), gas_mixes)
    }

    /// CNS loading in percent.
    pub fn cns(&self) -> f64 {
        self.state.ox_tox.cns()
    }

    /// Accumulated oxygen tolerance units.
    pub fn otu(&self) -> f64 {
        self.state.ox_tox.otu()
    }

    /// Maximum GF99/GFSurf over all compartments.
    pub fn supersaturation(&self) -> Supersaturation {
        let mut max = Supersaturation {
            gf_99: 0.0,
            gf_surf: 0.0,
        };
        for supersaturation in self.supersaturation_all() {
            if supersaturation.gf_99 > max.gf_99 {
                max.gf_99 = supersaturation.gf_99;
            }
            if supersaturation.gf_surf > max.gf_surf {
                max.gf_surf = supersaturation.gf_surf;
            }
        }
        max
    }

    /// GF99/GFSurf per compartment.
    pub fn supersaturation_all(&self) -> [Supersaturation; NUM_COMPARTMENTS] {
        self.compartments
            .map(|compartment| compartment.supersaturation(self.config.surface_pressure, self.state.depth))
    }

    /// Inert-gas partial pressures per compartment.
    pub fn tissue_pressures(&self) -> [InertGasPressures; NUM_COMPARTMENTS] {
        self.compartments.map(|compartment| compartment.pressures())
    }

    /// Independent simulation clone: actual-ceiling mode, no oxygen-toxicity
    /// accumulation.
    pub(crate) fn fork(&self) -> Self {
        let mut fork = self.clone();
        fork.sim = true;
        fork
    }

    pub(crate) fn apply_record(&mut self, depth: Depth, time: Time, gas: &Gas) {
        self.state.depth = depth;
        self.state.time += time;
        self.state.gas = *gas;

        // First pass: every compartment at GF high, establishing the floor.
        let (gf_low, gf_high) = self.config.gradient_factors;
        for compartment in &mut self.compartments {
            compartment.recalculate(depth, time, gas, gf_high, self.config.surface_pressure);
        }

        // Second pass: re-derive the leading compartment's tolerance at the
        // sloped gradient factor. Zero duration, only the coefficients move.
        if gf_low != gf_high {
            let max_gf = self.max_gf(depth);
            let leading = self.leading_compartment_index();
            self.compartments[leading].recalculate(
                depth,
                Time::zero(),
                gas,
                max_gf,
                self.config.surface_pressure,
            );
        }

        if !self.sim {
            let inspired = gas.inspired_partial_pressures(depth, self.config.surface_pressure);
            self.state.ox_tox.add_exposure(inspired.o2, time);
        }
    }

    pub(crate) fn apply_travel(&mut self, target_depth: Depth, time: Time, gas: &Gas) {
        let distance = target_depth.as_meters() - self.state.depth.as_meters();
        let seconds = time.as_seconds();
        let steps = seconds.floor() as u64;
        if steps > 0 {
            let rate_per_second = distance / seconds;
            let mut depth = self.state.depth.as_meters();
            for _ in 0..steps {
                depth += rate_per_second;
                self.apply_record(Depth::from_meters(depth), Time::from_seconds(1.0), gas);
            }
        }
        // Pin to the exact target; the sub-second remainder carries no
        // tissue time.
        self.apply_record(target_depth, Time::zero(), gas);
    }

    pub(crate) fn apply_travel_with_rate(&mut self, target_depth: Depth, rate: f64, gas: &Gas) {
        let distance = (target_depth.as_meters() - self.state.depth.as_meters()).abs();
        self.apply_travel(target_depth, Time::from_minutes(distance / rate), gas);
    }

    fn ceiling_actual(&self) -> Depth {
        let ceiling = self
            .leading_compartment()
            .ceiling(self.config.surface_pressure);
        if self.config.round_ceiling {
            Depth::from_meters(ceiling.as_meters().ceil())
        } else {
            ceiling
        }
    }

    /// Fixed-point ceiling: ascend a fork to the current ceiling and
    /// recompute until it stops moving, the fork surfaces, or the iteration
    /// cap is hit.
    fn ceiling_adaptive(&self) -> Depth {
        let mut sim = self.fork();
        let mut ceiling = sim.ceiling_actual();
        for _ in 0..MAX_CEILING_ITERATIONS {
            if sim.state.depth <= Depth::zero() || sim.state.depth <= ceiling {
                break;
            }
            let gas = sim.state.gas;
            sim.apply_travel_with_rate(ceiling, self.config.deco_ascent_rate, &gas);
            ceiling = sim.ceiling_actual();
        }
        ceiling
    }

    /// Sloped gradient factor in force at `depth`, as an integer percentage.
    ///
    /// Outside a decompression obligation this is GF high and any cached
    /// GF-low depth anchor is dropped; inside one, the anchor is computed
    /// once and the factor slopes linearly from GF high at the surface to
    /// GF low at the anchor.
    fn max_gf(&mut self, depth: Depth) -> u8 {
        let (gf_low, gf_high) = self.config.gradient_factors;
        if gf_low == gf_high {
            return gf_high;
        }

        let in_deco = self
            .leading_compartment()
            .ceiling(self.config.surface_pressure)
            > Depth::zero();
        if !in_deco {
            if self.gf_low_depth.take().is_some() {
                debug!("deco obligation cleared, dropping gf-low depth anchor");
            }
            return gf_high;
        }

        let anchor = match self.gf_low_depth {
            Some(anchor) => anchor,
            None => {
                let anchor = self.gf_low_depth_anchor();
                debug!("gf-low depth anchored at {anchor}");
                self.gf_low_depth = Some(anchor);
                anchor
            }
        };
        if anchor <= Depth::zero() {
            return gf_high;
        }
        if depth >= anchor {
            return gf_low;
        }
        let slope_point = f64::from(gf_high)
            - f64::from(gf_high - gf_low) * depth.as_meters() / anchor.as_meters();
        slope_point as u8
    }

    /// Deepest depth at which GF low just satisfies every compartment.
    fn gf_low_depth_anchor(&self) -> Depth {
        let (gf_low, _) = self.config.gradient_factors;
        let surface_bar = f64::from(self.config.surface_pressure) / 1000.0;
        let mut deepest = 0.0_f64;
        for compartment in &self.compartments {
            let depth_m = 10.0 * (compartment.amb_pressure_at_gf(gf_low) - surface_bar);
            if depth_m > deepest {
                deepest = depth_m;
            }
        }
        Depth::from_meters(deepest)
    }

    fn leading_compartment(&self) -> &Compartment {
        &self.compartments[self.leading_compartment_index()]
    }

    /// The compartment with the greatest minimum tolerable ambient pressure.
    fn leading_compartment_index(&self) -> usize {
        let mut leading = 0;
        for (idx, compartment) in self.compartments.iter().enumerate().skip(1) {
            if compartment.min_tolerable_amb_pressure()
                > self.compartments[leading].min_tolerable_amb_pressure()
            {
                leading = idx;
            }
        }
        leading
    }
}

fn validate_depth(depth: Depth) -> Result<(), RecordError> {
    let meters = depth.as_meters();
    if !(0.0..=MAX_RECORD_DEPTH).contains(&meters) {
        return Err(RecordError::DepthOutOfRange(meters));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meters(m: f64) -> Depth {
        Depth::from_meters(m)
    }

    fn minutes(m: f64) -> Time {
        Time::from_minutes(m)
    }

    #[test]
    fn test_rejects_out_of_range_depth() {
        let mut model = Model::default();
        assert_eq!(
            model.record(meters(-1.0), minutes(1.0), &Gas::air()),
            Err(RecordError::DepthOutOfRange(-1.0))
        );
        assert_eq!(
            model.record(meters(201.0), minutes(1.0), &Gas::air()),
            Err(RecordError::DepthOutOfRange(201.0))
        );
        // Validation precedes mutation.
        assert_eq!(model.dive_state().time, Time::zero());
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let mut model = Model::default();
        assert_eq!(
            model.record_travel_with_rate(meters(10.0), 0.0, &Gas::air()),
            Err(RecordError::InvalidRate(0.0))
        );
    }

    #[test]
    fn test_fresh_model_is_clean() {
        let model = Model::default();
        let supersaturation = model.supersaturation();
        assert_eq!(supersaturation.gf_99, 0.0);
        assert_eq!(supersaturation.gf_surf, 0.0);
        assert_eq!(model.ceiling(), Depth::zero());
        assert!(!model.in_deco());
        assert_eq!(model.ndl(), minutes(99.0));
    }

    #[test]
    fn test_surface_record_keeps_ndl_at_cutoff() {
        let mut model = Model::default();
        model.record(meters(0.0), minutes(0.0), &Gas::air()).unwrap();
        assert_eq!(model.ndl(), minutes(99.0));

        model.record(meters(10.0), minutes(10.0), &Gas::air()).unwrap();
        assert_eq!(model.ndl(), minutes(99.0), "10 m on air never reaches deco");
    }

    #[test]
    fn test_tissue_pressures_are_consistent() {
        let mut model = Model::default();
        model.record(meters(40.0), minutes(25.0), &Gas::air()).unwrap();
        for pressures in model.tissue_pressures() {
            assert!(pressures.n2 > 0.0);
            assert!(pressures.he >= 0.0);
            assert_eq!(pressures.total, pressures.n2 + pressures.he);
        }
    }

    #[test]
    fn test_surface_interval_offgasses() {
        let mut model = Model::default();
        model.record(meters(30.0), minutes(25.0), &Gas::air()).unwrap();
        let loaded = model.tissue_pressures();

        model.record(meters(0.0), minutes(10.0), &Gas::air()).unwrap();
        let rested = model.tissue_pressures();

        let equilibrium = Gas::air()
            .inspired_partial_pressures(Depth::zero(), 1013)
            .n2;
        for (before, after) in loaded.iter().zip(rested.iter()) {
            if before.total > equilibrium {
                assert!(
                    after.total < before.total,
                    "over-saturated compartment must off-gas at the surface: {} -> {}",
                    before.total,
                    after.total
                );
            }
        }
    }

    #[test]
    fn test_segment_subdivision_equivalence() {
        let gas = Gas::air();
        let mut whole = Model::default();
        whole.record(meters(30.0), minutes(30.0), &gas).unwrap();

        let mut divided = Model::default();
        for _ in 0..60 {
            divided.record(meters(30.0), minutes(0.5), &gas).unwrap();
        }

        assert_eq!(
            whole.ceiling().as_meters().round(),
            divided.ceiling().as_meters().round(),
            "one 30-minute segment and sixty 30-second segments must agree to the meter"
        );
    }

    #[test]
    fn test_zero_time_gas_switch_is_idempotent() {
        let ean50 = Gas::nitrox(0.5).unwrap();
        let mut once = Model::default();
        once.record(meters(21.0), minutes(20.0), &Gas::air()).unwrap();
        once.record(meters(21.0), Time::zero(), &ean50).unwrap();

        let mut twice = once.clone();
        twice.record(meters(21.0), Time::zero(), &ean50).unwrap();

        for (a, b) in once.tissue_pressures().iter().zip(twice.tissue_pressures().iter()) {
            assert_eq!(a.total, b.total);
        }
        assert_eq!(once.dive_state().gas, twice.dive_state().gas);
        assert_eq!(once.cns(), twice.cns());
    }

    #[test]
    fn test_queries_do_not_perturb_the_model() {
        let mut model = Model::default();
        model.record(meters(40.0), minutes(20.0), &Gas::air()).unwrap();
        let before = model.tissue_pressures();
        let cns_before = model.cns();

        let _ = model.ndl();
        let _ = model.ceiling();
        let _ = model.in_deco();
        let _ = model.deco(&[Gas::air()]).unwrap();

        for (a, b) in before.iter().zip(model.tissue_pressures().iter()) {
            assert_eq!(a.total, b.total, "queries must fork, not mutate");
        }
        assert_eq!(model.cns(), cns_before);
    }

    #[test]
    fn test_fork_suppresses_oxygen_toxicity() {
        let mut model = Model::default();
        model.record(meters(30.0), minutes(20.0), &Gas::air()).unwrap();
        let mut fork = model.fork();
        fork.apply_record(meters(30.0), minutes(30.0), &Gas::air());
        assert_eq!(fork.cns(), model.cns());
        assert_eq!(fork.otu(), model.otu());
    }

    #[test]
    fn test_oxygen_toxicity_accumulates_on_live_model() {
        let mut model = Model::default();
        model.record(meters(30.0), minutes(30.0), &Gas::nitrox(0.32).unwrap()).unwrap();
        assert!(model.cns() > 0.0, "EAN32 at 30 m is above the CNS floor");
        assert!(model.otu() > 0.0);
    }

    #[test]
    fn test_ceiling_multilevel_air_dive() {
        // 40 m for 30 min then 30 m for 30 min on air, GF 100/100.
        let mut model = Model::default();
        model.record(meters(40.0), minutes(30.0), &Gas::air()).unwrap();
        model.record(meters(30.0), minutes(30.0), &Gas::air()).unwrap();
        let ceiling = model.ceiling().as_meters();
        assert!(
            (ceiling - 7.80).abs() < 0.039,
            "expected a ceiling of about 7.80 m, got {ceiling:.2}"
        );
    }

    #[test]
    fn test_round_ceiling_rounds_up() {
        let config = Config::new().with_round_ceiling(true);
        let mut model = Model::new(config).unwrap();
        model.record(meters(40.0), minutes(30.0), &Gas::air()).unwrap();
        model.record(meters(30.0), minutes(30.0), &Gas::air()).unwrap();
        let ceiling = model.ceiling().as_meters();
        assert_eq!(ceiling, 8.0, "7.8 m rounds up to the next whole meter");
    }

    #[test]
    fn test_surfacing_gradient_on_deep_air_dive() {
        // 50 m for 20 min on air, GF 100/100.
        let mut model = Model::default();
        model.record(meters(50.0), minutes(20.0), &Gas::air()).unwrap();
        let supersaturation = model.supersaturation();
        assert!(
            (supersaturation.gf_surf - 193.86).abs() < 0.1,
            "expected GFSurf about 193.86, got {:.2}",
            supersaturation.gf_surf
        );
        assert_eq!(supersaturation.gf_99, 0.0, "no supersaturation at depth");

        // Ascending to 40 m shifts the lead to a slower compartment.
        model.record(meters(40.0), minutes(10.0), &Gas::air()).unwrap();
        let supersaturation = model.supersaturation();
        assert!(
            (supersaturation.gf_surf - 208.00).abs() < 0.1,
            "expected GFSurf about 208.00, got {:.2}",
            supersaturation.gf_surf
        );
    }

    #[test]
    fn test_ndl_counts_down_at_depth() {
        let mut model = Model::default();
        model.record(meters(30.0), Time::zero(), &Gas::air()).unwrap();
        assert_eq!(model.ndl(), minutes(16.0));

        model.record(meters(30.0), minutes(1.0), &Gas::air()).unwrap();
        assert_eq!(model.ndl(), minutes(15.0));

        model.record(meters(30.0), minutes(9.0), &Gas::air()).unwrap();
        assert_eq!(model.ndl(), minutes(6.0));
    }

    #[test]
    fn test_richer_mix_extends_ndl() {
        let mut model = Model::default();
        model.record(meters(30.0), minutes(10.0), &Gas::air()).unwrap();
        assert_eq!(model.ndl(), minutes(6.0));

        // Swap to EAN28 at depth without advancing time.
        let ean28 = Gas::nitrox(0.28).unwrap();
        model.record(meters(30.0), Time::zero(), &ean28).unwrap();
        assert_eq!(model.ndl(), minutes(10.0));
    }

    #[test]
    fn test_ndl_zero_once_in_deco() {
        let mut model = Model::default();
        model.record(meters(40.0), minutes(30.0), &Gas::air()).unwrap();
        assert!(model.in_deco());
        assert_eq!(model.ndl(), Time::zero());
    }

    #[test]
    fn test_sloped_gradient_multilevel_dive() {
        // GF 30/70 with a gas switch to EAN50 on the way up.
        let config = Config::new().with_gradient_factors(30, 70);
        let mut model = Model::new(config).unwrap();
        let ean50 = Gas::nitrox(0.5).unwrap();
        model.record(meters(40.0), minutes(40.0), &Gas::air()).unwrap();
        model.record(meters(30.0), minutes(3.0), &Gas::air()).unwrap();
        model.record(meters(21.0), minutes(10.0), &ean50).unwrap();
        let ceiling = model.ceiling().as_meters();
        assert!(
            (ceiling - 12.46).abs() < 0.15,
            "expected a ceiling of about 12.46 m, got {ceiling:.2}"
        );
    }

    #[test]
    fn test_travel_matches_stepped_profile() {
        let gas = Gas::air();
        let mut travelled = Model::default();
        travelled.record_travel(meters(40.0), minutes(4.0), &gas).unwrap();

        let mut stepped = Model::default();
        for second in 1..=240 {
            let depth = 40.0 * f64::from(second) / 240.0;
            stepped.record(meters(depth), Time::from_seconds(1.0), &gas).unwrap();
        }

        assert_eq!(
            travelled.ceiling().as_meters().round(),
            stepped.ceiling().as_meters().round()
        );
        assert_eq!(travelled.dive_state().depth, meters(40.0));
    }

    #[test]
    fn test_travel_with_rate_derives_duration() {
        let mut model = Model::default();
        model.record(meters(40.0), minutes(20.0), &Gas::air()).unwrap();
        let before = model.dive_state().time;
        model
            .record_travel_with_rate(meters(10.0), 10.0, &Gas::air())
            .unwrap();
        let elapsed = model.dive_state().time - before;
        assert_eq!(elapsed, minutes(3.0), "30 m at 10 m/min takes 3 minutes");
        assert_eq!(model.dive_state().depth, meters(10.0));
    }

    #[test]
    fn test_adaptive_ceiling_is_no_deeper_than_actual() {
        let gas = Gas::air();
        let mut actual = Model::default();
        actual.record(meters(40.0), minutes(30.0), &gas).unwrap();

        let adaptive_config = Config::new().with_ceiling_type(CeilingType::Adaptive);
        let mut adaptive = Model::new(adaptive_config).unwrap();
        adaptive.record(meters(40.0), minutes(30.0), &gas).unwrap();

        assert!(adaptive.ceiling() <= actual.ceiling());
        assert!(adaptive.in_deco());
    }
}
