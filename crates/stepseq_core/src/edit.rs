//! Row editing: randomize, clear and shift whole rows of the step table.
//!
//! These operate on parameter storage only and never touch timing state.

use crate::dsp::consts::{
    DURATION_DEFAULT, DURATION_MAX, DURATION_MIN, MOD_MAX, OCTAVE_MAX, OCTAVE_MIN, PITCH_MAX,
};
use crate::dsp::seq::table::{SequenceWindow, StepSlot, StepTable};
use crate::types::StepMode;

/// Duration shift increment, on a grid anchored at [`DURATION_MIN`].
pub const DURATION_SHIFT: f32 = 0.1;
/// Modulation shift increment.
pub const MOD_SHIFT: f32 = 1.0;

/// An editable row of the step table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Row {
    Pitch,
    Octave,
    Mode,
    Duration,
    ModA,
    ModB,
}

impl Row {
    pub const ALL: [Row; 6] = [
        Row::Pitch,
        Row::Octave,
        Row::Mode,
        Row::Duration,
        Row::ModA,
        Row::ModB,
    ];
}

fn random_mode(rng: &mut fastrand::Rng) -> StepMode {
    let r = rng.f32();
    if r < 0.70 {
        StepMode::Play
    } else if r < 0.90 {
        StepMode::Mute
    } else {
        StepMode::Skip
    }
}

/// Fill every slot of `row` with a fresh random value.
pub fn randomize_row(table: &mut StepTable, row: Row, rng: &mut fastrand::Rng) {
    for slot in table.iter_mut() {
        match row {
            Row::Pitch => slot.pitch = rng.i32(0..=PITCH_MAX),
            Row::Octave => slot.octave = rng.i32(OCTAVE_MIN..=OCTAVE_MAX),
            Row::Mode => slot.mode = random_mode(rng),
            Row::Duration => {
                slot.duration = DURATION_MIN + rng.f32() * (DURATION_MAX - DURATION_MIN)
            }
            Row::ModA => slot.mod_a = rng.f32() * MOD_MAX,
            Row::ModB => slot.mod_b = rng.f32() * MOD_MAX,
        }
    }
}

/// Reset every slot of `row` to its default.
pub fn clear_row(table: &mut StepTable, row: Row) {
    let default = StepSlot::default();
    for slot in table.iter_mut() {
        match row {
            Row::Pitch => slot.pitch = default.pitch,
            Row::Octave => slot.octave = default.octave,
            Row::Mode => slot.mode = default.mode,
            Row::Duration => slot.duration = DURATION_DEFAULT,
            Row::ModA => slot.mod_a = default.mod_a,
            Row::ModB => slot.mod_b = default.mod_b,
        }
    }
}

/// Snap `value` to the grid `min + n * step`.
pub fn quantize_to_step(value: f32, min: f32, step: f32) -> f32 {
    if step <= 0.0 {
        return value;
    }
    min + ((value - min) / step).round() * step
}

fn shift_float(value: f32, up: bool, step: f32, min: f32, max: f32) -> f32 {
    let sign = if up { 1.0 } else { -1.0 };
    let current = quantize_to_step(value, min, step);
    quantize_to_step(current + sign * step, min, step).clamp(min, max)
}

/// Move every slot of `row` inside `window` one increment up or down.
///
/// The mode row has no ordering and is left untouched.
pub fn shift_row(table: &mut StepTable, window: &SequenceWindow, row: Row, up: bool) {
    let delta = if up { 1 } else { -1 };
    for index in window.slots() {
        let slot = table.slot_mut(index);
        match row {
            Row::Pitch => slot.pitch = (slot.pitch + delta).clamp(0, PITCH_MAX),
            Row::Octave => slot.octave = (slot.octave + delta).clamp(OCTAVE_MIN, OCTAVE_MAX),
            Row::Mode => {}
            Row::Duration => {
                slot.duration =
                    shift_float(slot.duration, up, DURATION_SHIFT, DURATION_MIN, DURATION_MAX)
            }
            Row::ModA => slot.mod_a = shift_float(slot.mod_a, up, MOD_SHIFT, 0.0, MOD_MAX),
            Row::ModB => slot.mod_b = shift_float(slot.mod_b, up, MOD_SHIFT, 0.0, MOD_MAX),
        }
    }
}
