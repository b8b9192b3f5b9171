//! Fixed tables and timing constants of the sequencer.
//!
//! The anti-bounce window and the duty clamp figures are tuned by ear and
//! kept as-is for behavioural compatibility.

/// Number of step slots.
pub const NUM_STEPS: usize = 16;

/// Clock ratios, ÷48 through ×48. Explicit table; never derived.
pub const RATIO_TABLE: [f32; 29] = [
    1.0 / 48.0,
    1.0 / 32.0,
    1.0 / 24.0,
    1.0 / 16.0,
    1.0 / 12.0,
    1.0 / 10.0,
    1.0 / 8.0,
    1.0 / 6.0,
    1.0 / 5.0,
    1.0 / 4.0,
    1.0 / 3.0,
    1.0 / 2.5,
    1.0 / 2.0,
    1.0 / 1.5,
    1.0,
    1.5,
    2.0,
    2.5,
    3.0,
    4.0,
    5.0,
    6.0,
    8.0,
    10.0,
    12.0,
    16.0,
    24.0,
    32.0,
    48.0,
];

pub const RATIO_LABELS: [&str; 29] = [
    "÷48", "÷32", "÷24", "÷16", "÷12", "÷10", "÷8", "÷6", "÷5", "÷4", "÷3", "÷2.5", "÷2", "÷1.5",
    "×1", "×1.5", "×2", "×2.5", "×3", "×4", "×5", "×6", "×8", "×10", "×12", "×16", "×24", "×32",
    "×48",
];

pub const RATIO_DEFAULT_INDEX: usize = 16;

/// Index of ×1 in [`RATIO_TABLE`].
pub const RATIO_UNITY_INDEX: usize = 14;

/// Output level of a high gate/trigger.
pub const GATE_HIGH_VOLTS: f32 = 10.0;

/// Schmitt thresholds for clock, reset and trigger inputs.
pub const TRIGGER_LOW_THRESHOLD: f32 = 0.1;
pub const TRIGGER_HIGH_THRESHOLD: f32 = 2.0;

/// Button level above which a momentary button counts as pressed.
pub const BUTTON_THRESHOLD: f32 = 0.5;

/// Length of trigger-mode gates and of the end-of-cycle pulse.
pub const TRIGGER_LENGTH: f32 = 0.010;

/// Gate length bounds applied to a step's duration in gate mode.
pub const GATE_LENGTH_MIN: f32 = 0.001;
pub const GATE_LENGTH_MAX: f32 = 10.0;

/// Under multiplication a gate never covers more than this share of the
/// virtual period.
pub const MAX_DUTY: f32 = 0.90;

/// Guaranteed low time between multiplied sub-pulses (also at least two samples).
pub const MIN_OFF_TIME: f32 = 0.001;

/// Zero-delay ticks closer than this to the previous tick are dropped.
pub const ANTI_BOUNCE_TIME: f32 = 0.0005;

/// Measured periods at or below this are treated as unknown.
pub const MIN_VALID_PERIOD: f32 = 1e-4;

/// Virtual period used until the first valid period is measured.
pub const DEFAULT_VIRTUAL_PERIOD: f32 = 0.125;

/// Phase timeout when no period is known yet.
pub const DEFAULT_PHASE_TIMEOUT: f32 = 0.5;
pub const PHASE_TIMEOUT_MIN: f32 = 0.1;
pub const PHASE_TIMEOUT_MAX: f32 = 1.0;

/// Swing amount range; odd ticks are delayed by `swing / 3` of the period.
pub const SWING_MAX: f32 = 0.6;

/// Glide times at or below this bypass the filter.
pub const GLIDE_BYPASS_TIME: f32 = 1e-6;
pub const GLIDE_MIN_TAU: f32 = 1e-5;

/// Transpose input limit in semitones.
pub const TRANSPOSE_LIMIT_SEMITONES: i32 = 48;

/// Step parameter ranges.
pub const PITCH_MAX: i32 = 11;
pub const OCTAVE_MIN: i32 = -2;
pub const OCTAVE_MAX: i32 = 2;
pub const DURATION_MIN: f32 = 0.005;
pub const DURATION_MAX: f32 = 2.0;
pub const DURATION_DEFAULT: f32 = 0.100;
pub const MOD_MAX: f32 = 10.0;
