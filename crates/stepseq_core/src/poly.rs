//! Multichannel output support.
//!
//! The per-step gate output carries one channel per slot of the active
//! window, VCV Rack-style: a single cable with up to 16 independent channels.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;

/// Maximum channels per cable (matches VCV Rack / MIDI convention)
pub const PORT_MAX_CHANNELS: usize = 16;

/// A polyphonic output buffer with channel count metadata.
///
/// Fixed capacity of 16 channels; `channels` says how many are valid.
/// Channels beyond the active count always read 0V.
#[derive(Clone, Copy, Debug)]
pub struct PolyOutput {
    voltages: [f32; PORT_MAX_CHANNELS],
    channels: usize,
}

impl Default for PolyOutput {
    fn default() -> Self {
        Self {
            voltages: [0.0; PORT_MAX_CHANNELS],
            channels: 0,
        }
    }
}

impl PartialEq for PolyOutput {
    fn eq(&self, other: &Self) -> bool {
        self.channels == other.channels && self.active() == other.active()
    }
}

impl PolyOutput {
    /// Get voltage for a specific channel (returns 0.0 if out of range)
    pub fn get(&self, channel: usize) -> f32 {
        if channel < self.channels {
            self.voltages[channel]
        } else {
            0.0
        }
    }

    /// Set voltage for a specific channel
    pub fn set(&mut self, channel: usize, value: f32) {
        if channel < PORT_MAX_CHANNELS {
            self.voltages[channel] = value;
        }
    }

    /// Set the number of active channels (clears higher channels to 0)
    pub fn set_channels(&mut self, channels: usize) {
        let channels = channels.min(PORT_MAX_CHANNELS);
        for c in channels..self.channels {
            self.voltages[c] = 0.0;
        }
        self.channels = channels;
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Resize to `channels` and drive every active channel to `value`.
    pub fn fill(&mut self, channels: usize, value: f32) {
        self.set_channels(channels);
        for v in &mut self.voltages[..self.channels] {
            *v = value;
        }
    }

    /// The active channels.
    pub fn active(&self) -> &[f32] {
        &self.voltages[..self.channels]
    }
}

impl Serialize for PolyOutput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("PolyOutput", 2)?;
        state.serialize_field("channels", &self.channels)?;
        state.serialize_field("voltages", self.active())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for PolyOutput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct PolyOutputDe {
            channels: usize,
            voltages: Vec<f32>,
        }

        let de = PolyOutputDe::deserialize(deserializer)?;
        let mut out = PolyOutput::default();
        out.channels = de.channels.min(PORT_MAX_CHANNELS);
        for (i, &v) in de.voltages.iter().enumerate().take(out.channels) {
            out.voltages[i] = v;
        }
        Ok(out)
    }
}

impl JsonSchema for PolyOutput {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed("PolyOutput")
    }

    fn json_schema(r#gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
        #[derive(JsonSchema)]
        #[allow(dead_code)]
        struct PolyOutputSchema {
            channels: usize,
            voltages: Vec<f32>,
        }
        PolyOutputSchema::json_schema(r#gen)
    }
}
