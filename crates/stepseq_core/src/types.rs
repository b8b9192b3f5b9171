use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;

/// Enumerated knob-style parameter.
///
/// Hosts send these either as an index (snapped knobs) or by name. Indices
/// outside the valid range are clamped rather than rejected, so a stale or
/// out-of-range value from the host always resolves to a usable variant.
pub trait EnumParam: Sized + Copy + 'static {
    const ALL: &'static [Self];
    const NAMES: &'static [&'static str];

    fn index(self) -> usize;

    fn from_index(index: i64) -> Self {
        let last = Self::ALL.len() as i64 - 1;
        Self::ALL[index.clamp(0, last) as usize]
    }

    fn name(self) -> &'static str {
        Self::NAMES[self.index()]
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(|i| Self::ALL[i])
    }
}

pub(crate) fn deserialize_enum_param<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: EnumParam,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IndexOrName {
        Index(f64),
        Name(String),
    }

    match IndexOrName::deserialize(deserializer)? {
        IndexOrName::Index(value) if value.is_finite() => Ok(T::from_index(value.round() as i64)),
        IndexOrName::Index(_) => Ok(T::from_index(0)),
        IndexOrName::Name(name) => T::from_name(&name).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown value '{name}', expected an index or one of {:?}",
                T::NAMES
            ))
        }),
    }
}

/// Integer knob values may arrive as floats from the host. They are rounded,
/// and anything beyond `i32` saturates so the owner's clamp still applies.
pub(crate) fn deserialize_knob_int<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() {
        Ok(value.round() as i32)
    } else {
        Ok(0)
    }
}

#[derive(JsonSchema)]
#[serde(untagged)]
#[allow(dead_code)]
enum EnumParamSchema {
    Index(i64),
    Name(String),
}

macro_rules! enum_param {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl EnumParam for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];
            const NAMES: &'static [&'static str] = &[$($label),+];

            fn index(self) -> usize {
                self as usize
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserialize_enum_param(deserializer)
            }
        }

        impl JsonSchema for $name {
            fn schema_name() -> Cow<'static, str> {
                Cow::Borrowed(stringify!($name))
            }

            fn json_schema(r#gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
                EnumParamSchema::json_schema(r#gen)
            }
        }
    };
}

enum_param! {
    /// Per-step playback mode.
    pub enum StepMode {
        /// Traversed and sounded.
        Play => "play",
        /// Traversed and counted as playable, but never fires a gate.
        Mute => "mute",
        /// Traversed over; never sounds and never counts as playable.
        Skip => "skip",
    }
}

impl Default for StepMode {
    fn default() -> Self {
        StepMode::Play
    }
}

enum_param! {
    /// Sequence traversal policy.
    pub enum Direction {
        Forward => "forward",
        Backward => "backward",
        PingPong => "pingPong",
        Random => "random",
        Drunk => "drunk",
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Forward
    }
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Forward => "Forward",
            Direction::Backward => "Backward",
            Direction::PingPong => "Ping-Pong",
            Direction::Random => "Random",
            Direction::Drunk => "Drunk",
        }
    }
}

enum_param! {
    pub enum GateMode {
        /// Gate length follows the step's duration.
        Gate => "gate",
        /// Fixed short trigger.
        Trigger => "trigger",
    }
}

impl Default for GateMode {
    fn default() -> Self {
        GateMode::Gate
    }
}

enum_param! {
    /// Output range for the per-step modulation lanes.
    pub enum ModRange {
        Bipolar10 => "bipolar10",
        Bipolar5 => "bipolar5",
        Bipolar3 => "bipolar3",
        Bipolar2 => "bipolar2",
        Bipolar1 => "bipolar1",
        Unipolar10 => "unipolar10",
        Unipolar5 => "unipolar5",
        Unipolar3 => "unipolar3",
        Unipolar2 => "unipolar2",
        Unipolar1 => "unipolar1",
    }
}

impl Default for ModRange {
    fn default() -> Self {
        ModRange::Unipolar10
    }
}

impl ModRange {
    /// (min, max) output voltage.
    pub fn bounds(self) -> (f32, f32) {
        match self {
            ModRange::Bipolar10 => (-10.0, 10.0),
            ModRange::Bipolar5 => (-5.0, 5.0),
            ModRange::Bipolar3 => (-3.0, 3.0),
            ModRange::Bipolar2 => (-2.0, 2.0),
            ModRange::Bipolar1 => (-1.0, 1.0),
            ModRange::Unipolar10 => (0.0, 10.0),
            ModRange::Unipolar5 => (0.0, 5.0),
            ModRange::Unipolar3 => (0.0, 3.0),
            ModRange::Unipolar2 => (0.0, 2.0),
            ModRange::Unipolar1 => (0.0, 1.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModRange::Bipolar10 => "+/-10V",
            ModRange::Bipolar5 => "+/-5V",
            ModRange::Bipolar3 => "+/-3V",
            ModRange::Bipolar2 => "+/-2V",
            ModRange::Bipolar1 => "+/-1V",
            ModRange::Unipolar10 => "0V-10V",
            ModRange::Unipolar5 => "0V-5V",
            ModRange::Unipolar3 => "0V-3V",
            ModRange::Unipolar2 => "0V-2V",
            ModRange::Unipolar1 => "0V-1V",
        }
    }

    /// Map a raw 0..10 lane value into this range.
    pub fn map(self, raw: f32) -> f32 {
        let (min, max) = self.bounds();
        crate::dsp::utils::map_range(raw.clamp(0.0, 10.0), 0.0, 10.0, min, max)
    }
}

/// A raw input voltage, or an unpatched jack.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Signal {
    Volts(f32),
    #[default]
    Disconnected,
}

// Accepts a bare number as volts, `null` or `{"type": "disconnected"}` for an
// unpatched input.
impl<'de> Deserialize<'de> for Signal {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum SignalDe {
            Number(f64),
            Tagged(SignalTagged),
        }

        #[derive(Deserialize)]
        #[serde(tag = "type", rename_all = "camelCase")]
        enum SignalTagged {
            Volts { value: f64 },
            Disconnected,
        }

        Ok(match Option::<SignalDe>::deserialize(deserializer)? {
            None => Signal::Disconnected,
            Some(SignalDe::Number(value)) => Signal::Volts(value as f32),
            Some(SignalDe::Tagged(SignalTagged::Volts { value })) => Signal::Volts(value as f32),
            Some(SignalDe::Tagged(SignalTagged::Disconnected)) => Signal::Disconnected,
        })
    }
}

impl Serialize for Signal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        match self {
            Signal::Volts(value) => serializer.serialize_f32(*value),
            Signal::Disconnected => {
                let mut state = serializer.serialize_struct("Signal", 1)?;
                state.serialize_field("type", "disconnected")?;
                state.end()
            }
        }
    }
}

#[derive(JsonSchema)]
#[serde(untagged)]
#[allow(dead_code)]
enum SignalSchema {
    Number(f64),
    Tagged(SignalTaggedSchema),
}

#[derive(JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
#[allow(dead_code)]
enum SignalTaggedSchema {
    Volts { value: f64 },
    Disconnected,
}

impl JsonSchema for Signal {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed("Signal")
    }

    fn json_schema(r#gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
        SignalSchema::json_schema(r#gen)
    }
}

impl Signal {
    pub fn volts(value: f32) -> Self {
        Signal::Volts(value)
    }

    /// Check if the input is unpatched
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Signal::Disconnected)
    }

    /// Voltage at the input; an unpatched input reads 0V.
    pub fn get_value(&self) -> f32 {
        self.get_value_or(0.0)
    }

    /// Get value with fallback for disconnected inputs (normalled input)
    pub fn get_value_or(&self, default: f32) -> f32 {
        match self {
            Signal::Volts(value) => *value,
            Signal::Disconnected => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::from_str;

    #[test]
    fn test_signal_deserialization_volts() {
        let s: Signal = from_str("0.5").unwrap();
        assert_eq!(s, Signal::Volts(0.5));
        assert!(!s.is_disconnected());
    }

    #[test]
    fn test_signal_deserialization_disconnected() {
        let s: Signal = from_str(r#"{"type": "disconnected"}"#).unwrap();
        assert!(s.is_disconnected());
        let s: Signal = from_str("null").unwrap();
        assert!(s.is_disconnected());
        assert_eq!(s.get_value_or(3.0), 3.0);
    }

    #[test]
    fn test_signal_serialization_round_trips() {
        let json = serde_json::to_string(&Signal::Disconnected).unwrap();
        let back: Signal = from_str(&json).unwrap();
        assert!(back.is_disconnected());
    }

    #[test]
    fn test_enum_param_clamps_out_of_range_index() {
        let d: Direction = from_str("7").unwrap();
        assert_eq!(d, Direction::Drunk);
        let d: Direction = from_str("-3").unwrap();
        assert_eq!(d, Direction::Forward);
        let m: StepMode = from_str("1.2").unwrap();
        assert_eq!(m, StepMode::Mute);
    }

    #[test]
    fn test_enum_param_by_name() {
        let d: Direction = from_str(r#""pingPong""#).unwrap();
        assert_eq!(d, Direction::PingPong);
        let g: GateMode = from_str(r#""trigger""#).unwrap();
        assert_eq!(g, GateMode::Trigger);
        assert!(from_str::<GateMode>(r#""legato""#).is_err());
    }

    #[test]
    fn test_enum_param_serializes_by_name() {
        assert_eq!(serde_json::to_string(&StepMode::Skip).unwrap(), r#""skip""#);
    }

    #[test]
    fn test_mod_range_mapping() {
        assert_eq!(ModRange::Bipolar10.map(0.0), -10.0);
        assert_eq!(ModRange::Bipolar10.map(5.0), 0.0);
        assert_eq!(ModRange::Unipolar1.map(10.0), 1.0);
        // raw values outside 0..10 are clamped
        assert_eq!(ModRange::Bipolar2.map(42.0), 2.0);
        assert_eq!(ModRange::Unipolar5.map(-1.0), 0.0);
    }
}
