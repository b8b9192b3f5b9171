//! Sample-clocked 16-step sequencer engine.
//!
//! The crate is a pure DSP library: it follows an external clock, derives a
//! multiplied or divided internal clock, walks a circular 16-slot sequence
//! and shapes gate, trigger and pitch outputs one sample at a time. Hosts
//! drive it through [`StepSequencer`] with JSON-shaped params.

#[macro_use]
extern crate lazy_static;

pub mod dsp;
pub mod edit;
pub mod error;
pub mod persist;
pub mod poly;
pub mod sequencer;
pub mod types;

pub use dsp::clock::ClockRatio;
pub use dsp::seq::{SequenceWindow, StepSlot, StepTable};
pub use edit::Row;
pub use error::{Result, SequencerError};
pub use persist::SequencerState;
pub use poly::{PORT_MAX_CHANNELS, PolyOutput};
pub use sequencer::{
    ButtonPair, RowInputs, SequencerOutputs, SequencerParams, ShiftButtons, StepEvent,
    StepSequencer,
};
pub use types::{Direction, EnumParam, GateMode, ModRange, Signal, StepMode};

lazy_static! {
    static ref PARAMS_SCHEMA: schemars::Schema = schemars::schema_for!(SequencerParams);
}

/// JSON Schema of [`SequencerParams`], for host-side validation and editors.
pub fn params_schema() -> &'static schemars::Schema {
    &PARAMS_SCHEMA
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_names_every_param() {
        let schema = serde_json::to_value(params_schema()).unwrap();
        let props = schema["properties"].as_object().unwrap();
        for key in [
            "slots",
            "start",
            "steps",
            "direction",
            "gateMode",
            "ratio",
            "clock",
            "reset",
            "randomize",
            "randomizeButtons",
            "shift",
        ] {
            assert!(props.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn schema_describes_per_row_inputs() {
        let schema = serde_json::to_value(params_schema()).unwrap();
        let defs = schema["$defs"].as_object().unwrap();
        let rows = defs
            .values()
            .filter(|def| def["properties"].get("modB").is_some())
            .count();
        // randomize triggers and randomize buttons
        assert!(rows >= 2, "{rows} per-row definitions");
    }
}
