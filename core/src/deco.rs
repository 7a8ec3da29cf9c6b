//! Decompression schedule synthesis.
//!
//! The planner runs on a simulated fork of the model and drives it to the
//! surface: ascend toward the ceiling, hold stops on the 3 m grid until they
//! clear, and switch to richer mixes once their operating depth allows.
//! Every second spent is recorded against the fork, so stop lengths come out
//! of the same tissue arithmetic as the live model.

use log::{debug, trace};

use crate::error::DecoError;
use crate::gas::Gas;
use crate::model::{DiveState, Model};
use crate::units::{Depth, Time};

/// Width of the decompression stop window (m).
const STOP_WINDOW: f64 = 3.0;

/// ppO2 limit used for gas-switch operating depths (bar).
const MOD_PPO2: f64 = 1.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecoStageType {
    Ascent,
    DecoStop,
    GasSwitch,
}

/// One leg of the decompression schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecoStage {
    pub stage_type: DecoStageType,
    pub start_depth: Depth,
    pub end_depth: Depth,
    pub duration: Time,
    pub gas: Gas,
}

/// A complete schedule: stages in execution order and the time to surface.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecoRuntime {
    pub deco_stages: Vec<DecoStage>,
    /// Time to surface: the sum of all stage durations.
    pub tts: Time,
    pub tts_surface: Time,
    /// Always true; the schedule is computed on a simulation fork.
    pub sim: bool,
}

enum DecoAction {
    Ascend { target: Depth },
    Stop,
    SwitchGas(Gas),
}

/// Drive the forked model to the surface, accumulating stages.
pub(crate) fn plan(mut model: Model, gas_mixes: &[Gas]) -> Result<DecoRuntime, DecoError> {
    if gas_mixes.is_empty() {
        return Err(DecoError::EmptyGasList);
    }
    let current_gas = model.dive_state().gas;
    if !gas_mixes.contains(&current_gas) {
        return Err(DecoError::CurrentGasNotInList);
    }

    let mut stages: Vec<DecoStage> = Vec::new();
    loop {
        let pre = model.dive_state();
        if pre.depth <= Depth::zero() {
            break;
        }
        let ceiling = model.ceiling();
        match next_action(&model, &pre, ceiling, gas_mixes) {
            DecoAction::Ascend { target } => {
                let rate = model.config().deco_ascent_rate;
                model.apply_travel_with_rate(target, rate, &pre.gas);
                let post = model.dive_state();
                let stage = DecoStage {
                    stage_type: DecoStageType::Ascent,
                    start_depth: pre.depth,
                    end_depth: post.depth,
                    duration: post.time - pre.time,
                    gas: pre.gas,
                };
                trace!(
                    "ascent {} -> {} over {}",
                    stage.start_depth,
                    stage.end_depth,
                    stage.duration
                );
                stages.push(stage);
            }
            DecoAction::Stop => {
                model.apply_record(pre.depth, Time::from_seconds(1.0), &pre.gas);
                push_coalesced(
                    &mut stages,
                    DecoStage {
                        stage_type: DecoStageType::DecoStop,
                        start_depth: pre.depth,
                        end_depth: pre.depth,
                        duration: Time::from_seconds(1.0),
                        gas: pre.gas,
                    },
                );
            }
            DecoAction::SwitchGas(next_gas) => {
                let mod_depth = next_gas.max_operating_depth(MOD_PPO2);
                if pre.depth > mod_depth {
                    // Too deep to breathe the richer mix; ascend to its
                    // operating depth on the current gas first.
                    let rate = model.config().deco_ascent_rate;
                    model.apply_travel_with_rate(mod_depth, rate, &pre.gas);
                    let post = model.dive_state();
                    stages.push(DecoStage {
                        stage_type: DecoStageType::Ascent,
                        start_depth: pre.depth,
                        end_depth: post.depth,
                        duration: post.time - pre.time,
                        gas: pre.gas,
                    });
                }
                let at = model.dive_state();
                model.apply_record(at.depth, Time::zero(), &next_gas);
                trace!("gas switch to {next_gas} at {}", at.depth);
                push_coalesced(
                    &mut stages,
                    DecoStage {
                        stage_type: DecoStageType::GasSwitch,
                        start_depth: at.depth,
                        end_depth: at.depth,
                        duration: Time::zero(),
                        gas: next_gas,
                    },
                );
            }
        }
    }

    let tts = stages
        .iter()
        .fold(Time::zero(), |total, stage| total + stage.duration);
    debug!("deco schedule: {} stages, TTS {}", stages.len(), tts);
    Ok(DecoRuntime {
        deco_stages: stages,
        tts,
        tts_surface: tts,
        sim: true,
    })
}

/// Stop depth for a ceiling: the ceiling rounded up to the next multiple of
/// 3 m, never above the surface.
fn stop_depth(ceiling: Depth) -> Depth {
    let window = (ceiling.as_meters() / STOP_WINDOW).ceil() * STOP_WINDOW;
    Depth::from_meters(window.max(0.0))
}

/// Decide the next planner step from the fork's current state.
fn next_action(model: &Model, pre: &DiveState, ceiling: Depth, gas_mixes: &[Gas]) -> DecoAction {
    let surface_pressure = model.config().surface_pressure;
    let stop = stop_depth(ceiling);

    // Cleared obligation: head straight for the surface.
    if ceiling <= Depth::zero() {
        return DecoAction::Ascend { target: stop };
    }
    // Below the stop grid (missed stop): get back onto it.
    if pre.depth < stop {
        return DecoAction::Ascend { target: stop };
    }

    let candidate = switch_candidate(gas_mixes, &pre.gas, pre.depth, surface_pressure);
    if let Some(next_gas) = candidate {
        if pre.depth <= next_gas.max_operating_depth(MOD_PPO2) {
            return DecoAction::SwitchGas(next_gas);
        }
    }
    if pre.depth == stop {
        return DecoAction::Stop;
    }
    if let Some(next_gas) = candidate {
        if next_gas.max_operating_depth(MOD_PPO2) >= ceiling {
            return DecoAction::SwitchGas(next_gas);
        }
    }
    DecoAction::Ascend { target: stop }
}

/// Best switch candidate: among mixes with a higher oxygen partial pressure
/// than the current gas at this depth, the least-rich improvement.
fn switch_candidate(
    gas_mixes: &[Gas],
    current: &Gas,
    depth: Depth,
    surface_pressure: u16,
) -> Option<Gas> {
    let current_ppo2 = current.partial_pressures(depth, surface_pressure).o2;
    gas_mixes
        .iter()
        .filter(|gas| gas.partial_pressures(depth, surface_pressure).o2 > current_ppo2)
        .min_by(|a, b| a.fo2().total_cmp(&b.fo2()))
        .copied()
}

/// Append a stage, folding it into the previous one when it continues the
/// same kind of leg on the same gas. Ascents always stand alone.
fn push_coalesced(stages: &mut Vec<DecoStage>, stage: DecoStage) {
    if let Some(last) = stages.last_mut() {
        if last.stage_type == stage.stage_type
            && last.gas == stage.gas
            && last.end_depth == stage.start_depth
        {
            last.duration = last.duration + stage.duration;
            last.end_depth = stage.end_depth;
            return;
        }
    }
    stages.push(stage);
}
