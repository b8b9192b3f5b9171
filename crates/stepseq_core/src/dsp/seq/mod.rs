//! Sequence state: step storage, traversal, gates, reset and pitch.

pub mod gate;
pub mod navigator;
pub mod pitch;
pub mod reset;
pub mod table;

pub use gate::{GateFrame, GateGenerator, GateShape, gate_length};
pub use navigator::{Heading, Lookup, SequenceNavigator, Transition, any_playable, find_playable};
pub use pitch::{GlideCurve, PitchPath, target_voltage, transpose_semitones};
pub use reset::{ResetController, ResetRequest};
pub use table::{SequenceWindow, StepSlot, StepTable};
