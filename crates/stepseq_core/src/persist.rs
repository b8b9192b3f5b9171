//! Saved module state: the two modulation ranges and the end-of-cycle on
//! reset flag. Everything else is rebuilt from params.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Result, SequencerError};
use crate::types::{EnumParam, ModRange};

fn serialize_range<S: Serializer>(
    range: &ModRange,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(range.index() as u64)
}

fn deserialize_range<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<ModRange>, D::Error> {
    let index = i64::deserialize(deserializer)?;
    Ok(Some(ModRange::from_index(index)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, JsonSchema)]
pub struct SequencerState {
    #[serde(rename = "m1Range", serialize_with = "serialize_range")]
    #[schemars(with = "u32")]
    pub mod_a_range: ModRange,
    #[serde(rename = "m2Range", serialize_with = "serialize_range")]
    #[schemars(with = "u32")]
    pub mod_b_range: ModRange,
    #[serde(rename = "eocOnReset")]
    pub eoc_on_reset: bool,
}

/// Keys present in a saved state document.
#[derive(Debug, Default, Deserialize)]
struct StatePatch {
    #[serde(rename = "m1Range", default, deserialize_with = "deserialize_range")]
    mod_a_range: Option<ModRange>,
    #[serde(rename = "m2Range", default, deserialize_with = "deserialize_range")]
    mod_b_range: Option<ModRange>,
    #[serde(rename = "eocOnReset", default)]
    eoc_on_reset: Option<bool>,
}

impl SequencerState {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Apply the keys present in `value`; missing keys keep their current
    /// value. On error nothing is changed.
    pub fn merge_json(&mut self, value: &Value) -> Result<()> {
        if !value.is_object() {
            return Err(SequencerError::StateNotObject(json_kind(value).to_string()));
        }
        let patch = StatePatch::deserialize(value).map_err(SequencerError::State)?;

        if let Some(range) = patch.mod_a_range {
            self.mod_a_range = range;
        }
        if let Some(range) = patch.mod_b_range {
            self.mod_b_range = range;
        }
        if let Some(flag) = patch.eoc_on_reset {
            self.eoc_on_reset = flag;
        }
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
