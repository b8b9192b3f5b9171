//! Gate, per-step gate and end-of-cycle pulse shaping.

use crate::dsp::clock::ClockRatio;
use crate::dsp::consts::{
    GATE_HIGH_VOLTS, GATE_LENGTH_MAX, GATE_LENGTH_MIN, MAX_DUTY, MIN_OFF_TIME, NUM_STEPS,
    TRIGGER_LENGTH,
};
use crate::dsp::seq::table::StepSlot;
use crate::dsp::utils::PulseGenerator;
use crate::poly::PolyOutput;
use crate::types::{GateMode, StepMode};

/// Timing context for computing a gate length.
#[derive(Debug, Clone, Copy)]
pub struct GateShape {
    pub mode: GateMode,
    pub ratio: ClockRatio,
    pub virt_period: f32,
    pub dt: f32,
}

/// Effective pulse length for a step of `duration` seconds.
///
/// Under clock multiplication in Gate mode the length is capped at 90% of
/// the virtual period and leaves at least `max(1ms, 2 samples)` low before
/// the next sub-pulse.
pub fn gate_length(duration: f32, shape: &GateShape) -> f32 {
    let mut len = match shape.mode {
        GateMode::Gate => duration.clamp(GATE_LENGTH_MIN, GATE_LENGTH_MAX),
        GateMode::Trigger => TRIGGER_LENGTH,
    };

    if shape.mode == GateMode::Gate && shape.ratio.multiplies() && shape.virt_period > 0.0 {
        len = len.min(shape.virt_period * MAX_DUTY);

        let min_off = MIN_OFF_TIME.max(2.0 * shape.dt);
        let max_len = shape.virt_period - min_off;
        if len > max_len {
            len = TRIGGER_LENGTH.max(max_len);
        }
    }

    len
}

/// Output levels for one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GateFrame {
    pub gate: f32,
    pub end_of_cycle: f32,
}

#[derive(Debug, Clone, Default)]
pub struct GateGenerator {
    gate: PulseGenerator,
    end_of_cycle: PulseGenerator,
    step_gates: [PulseGenerator; NUM_STEPS],
}

impl GateGenerator {
    /// Fire the aggregate and per-step pulses for `slot`, shown on channel
    /// `offset`. A muted or non-playing step cuts the aggregate gate instead.
    /// Returns the fired length.
    pub fn fire(
        &mut self,
        slot: &StepSlot,
        offset: usize,
        muted: bool,
        shape: &GateShape,
    ) -> Option<f32> {
        if muted || slot.mode != StepMode::Play {
            self.gate.reset();
            return None;
        }

        let len = gate_length(slot.duration, shape);
        self.gate.trigger(len);
        self.step_gates[offset & (NUM_STEPS - 1)].trigger(len);
        Some(len)
    }

    pub fn fire_end_of_cycle(&mut self) {
        self.end_of_cycle.trigger(TRIGGER_LENGTH);
    }

    /// Cut every pulse.
    pub fn clear(&mut self) {
        self.gate.reset();
        self.end_of_cycle.reset();
        for p in &mut self.step_gates {
            p.reset();
        }
    }

    /// Advance all pulses by `dt` and write the per-step channels.
    pub fn process(&mut self, dt: f32, step_gates: &mut PolyOutput, channels: usize) -> GateFrame {
        let gate = level(self.gate.process(dt));

        step_gates.set_channels(channels);
        for (ch, pulse) in self.step_gates.iter_mut().enumerate().take(channels) {
            step_gates.set(ch, level(pulse.process(dt)));
        }

        GateFrame {
            gate,
            end_of_cycle: level(self.end_of_cycle.process(dt)),
        }
    }

    /// Low outputs without advancing any pulse.
    pub fn silence(&self, step_gates: &mut PolyOutput, channels: usize) -> GateFrame {
        step_gates.fill(channels, 0.0);
        GateFrame::default()
    }

    pub fn is_gate_active(&self) -> bool {
        self.gate.is_active()
    }

    pub fn any_active(&self) -> bool {
        self.gate.is_active()
            || self.end_of_cycle.is_active()
            || self.step_gates.iter().any(|p| p.is_active())
    }
}

fn level(high: bool) -> f32 {
    if high { GATE_HIGH_VOLTS } else { 0.0 }
}
