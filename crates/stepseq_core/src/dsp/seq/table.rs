//! Step storage and the active window.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;

use crate::dsp::consts::{
    DURATION_DEFAULT, MOD_MAX, NUM_STEPS, OCTAVE_MAX, OCTAVE_MIN, PITCH_MAX,
};
use crate::dsp::utils::wrap16;
use crate::types::{StepMode, deserialize_knob_int};

/// One of the sixteen step records.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct StepSlot {
    /// Semitone above C, 0..=11.
    #[serde(deserialize_with = "deserialize_knob_int")]
    #[schemars(with = "i32")]
    pub pitch: i32,
    /// Octave offset, -2..=2.
    #[serde(deserialize_with = "deserialize_knob_int")]
    #[schemars(with = "i32")]
    pub octave: i32,
    pub mode: StepMode,
    /// Gate length in seconds.
    pub duration: f32,
    /// Raw modulation lane values, 0..=10.
    pub mod_a: f32,
    pub mod_b: f32,
}

impl Default for StepSlot {
    fn default() -> Self {
        Self {
            pitch: 0,
            octave: 0,
            mode: StepMode::Play,
            duration: DURATION_DEFAULT,
            mod_a: 0.0,
            mod_b: 0.0,
        }
    }
}

impl StepSlot {
    pub fn pitch_class(&self) -> i32 {
        self.pitch.clamp(0, PITCH_MAX)
    }

    pub fn octave_offset(&self) -> i32 {
        self.octave.clamp(OCTAVE_MIN, OCTAVE_MAX)
    }

    pub fn mod_a_raw(&self) -> f32 {
        self.mod_a.clamp(0.0, MOD_MAX)
    }

    pub fn mod_b_raw(&self) -> f32 {
        self.mod_b.clamp(0.0, MOD_MAX)
    }

    pub fn is_playable(&self) -> bool {
        self.mode != StepMode::Skip
    }
}

/// The sixteen step slots, addressed by slot index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepTable {
    slots: [StepSlot; NUM_STEPS],
}

impl StepTable {
    /// Indices wrap modulo 16.
    pub fn slot(&self, index: usize) -> &StepSlot {
        &self.slots[index & (NUM_STEPS - 1)]
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut StepSlot {
        &mut self.slots[index & (NUM_STEPS - 1)]
    }

    pub fn mode(&self, index: usize) -> StepMode {
        self.slot(index).mode
    }

    pub fn is_playable(&self, index: usize) -> bool {
        self.slot(index).is_playable()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepSlot> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut StepSlot> {
        self.slots.iter_mut()
    }
}

impl Serialize for StepTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.slots.as_slice().serialize(serializer)
    }
}

// Shorter lists are padded with default slots, longer ones truncated.
impl<'de> Deserialize<'de> for StepTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = Vec::<StepSlot>::deserialize(deserializer)?;
        let mut table = StepTable::default();
        for (slot, value) in table.slots.iter_mut().zip(list) {
            *slot = value;
        }
        Ok(table)
    }
}

impl JsonSchema for StepTable {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed("StepTable")
    }

    fn json_schema(r#gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
        Vec::<StepSlot>::json_schema(r#gen)
    }
}

/// Circular sub-range of the slots that is played.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceWindow {
    start: usize,
    length: usize,
}

impl Default for SequenceWindow {
    fn default() -> Self {
        Self {
            start: 0,
            length: NUM_STEPS,
        }
    }
}

impl SequenceWindow {
    /// `start` is a 0-based slot, `length` a slot count; both are clamped.
    pub fn new(start: i64, length: i64) -> Self {
        Self {
            start: start.clamp(0, NUM_STEPS as i64 - 1) as usize,
            length: length.clamp(1, NUM_STEPS as i64) as usize,
        }
    }

    /// From the 1-based start knob and the steps knob.
    pub fn from_params(start: i32, steps: i32) -> Self {
        Self::new(start as i64 - 1, steps as i64)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.length
    }

    /// Position of `step` relative to the window start, modulo 16.
    pub fn offset_of(&self, step: usize) -> usize {
        (step + NUM_STEPS - self.start) & (NUM_STEPS - 1)
    }

    pub fn slot_at(&self, offset: usize) -> usize {
        wrap16((self.start + offset) as isize)
    }

    /// Bring a step that fell outside a shrunken window back inside it.
    pub fn fold(&self, step: usize) -> usize {
        let offset = self.offset_of(step);
        if offset >= self.length {
            self.slot_at(offset % self.length)
        } else {
            step
        }
    }

    pub fn contains(&self, step: usize) -> bool {
        self.offset_of(step) < self.length
    }

    /// Slot indices in window order.
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.length).map(move |k| self.slot_at(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_list_is_padded_with_defaults() {
        let table: StepTable =
            serde_json::from_str(r#"[{"pitch": 7, "mode": "skip"}, {"octave": -1}]"#).unwrap();
        assert_eq!(table.slot(0).pitch, 7);
        assert_eq!(table.mode(0), StepMode::Skip);
        assert_eq!(table.slot(1).octave, -1);
        assert_eq!(*table.slot(15), StepSlot::default());
        assert!((table.slot(2).duration - 0.1).abs() < 1e-6);
    }

    #[test]
    fn knob_values_accept_floats() {
        let table: StepTable =
            serde_json::from_str(r#"[{"pitch": 6.6, "octave": -1.0}, {"pitch": 1e12}]"#).unwrap();
        assert_eq!(table.slot(0).pitch, 7);
        assert_eq!(table.slot(0).octave, -1);
        assert_eq!(table.slot(1).pitch_class(), 11);
    }

    #[test]
    fn slot_accessors_clamp() {
        let slot = StepSlot {
            pitch: 14,
            octave: -5,
            mod_a: -1.0,
            ..Default::default()
        };
        assert_eq!(slot.pitch_class(), 11);
        assert_eq!(slot.octave_offset(), -2);
        assert_eq!(slot.mod_a_raw(), 0.0);
    }

    #[test]
    fn window_wraps_around_slot_16() {
        let w = SequenceWindow::new(14, 4);
        let slots: Vec<_> = w.slots().collect();
        assert_eq!(slots, vec![14, 15, 0, 1]);
        assert_eq!(w.offset_of(1), 3);
        assert!(w.contains(0));
        assert!(!w.contains(5));
    }

    #[test]
    fn window_params_are_clamped() {
        let w = SequenceWindow::from_params(0, 40);
        assert_eq!((w.start(), w.len()), (0, 16));
        let w = SequenceWindow::from_params(20, 0);
        assert_eq!((w.start(), w.len()), (15, 1));
    }

    #[test]
    fn fold_brings_step_back_into_window() {
        let w = SequenceWindow::new(2, 3);
        // offset 7 -> 7 % 3 = 1 -> slot 3
        assert_eq!(w.fold(9), 3);
        assert_eq!(w.fold(4), 4);
        let w = SequenceWindow::new(0, 1);
        assert_eq!(w.fold(11), 0);
    }
}
