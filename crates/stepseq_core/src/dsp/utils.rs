use crate::dsp::consts::{TRIGGER_HIGH_THRESHOLD, TRIGGER_LOW_THRESHOLD};

/// Map a value from one range to another. If the input range is degenerate, returns `y0`.
pub fn map_range(x: f32, x0: f32, x1: f32, y0: f32, y1: f32) -> f32 {
    let denom = x1 - x0;
    if denom.abs() < f32::EPSILON {
        return y0;
    }
    (x - x0) * (y1 - y0) / denom + y0
}

/// Wrap a (possibly negative) slot index into 0..16.
pub fn wrap16(x: isize) -> usize {
    (x & 15) as usize
}

/// One-sample coefficient of an exponential lag with time constant `tau`.
pub fn exp_coefficient(dt: f32, tau: f32) -> f32 {
    1.0 - (-dt / tau).exp()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchmittState {
    Low,
    High,
    Uninitialized,
}

/// Reusable Schmitt trigger with hysteresis
#[derive(Debug, Clone, Copy)]
pub struct SchmittTrigger {
    pub state: SchmittState,
    low_threshold: f32,
    high_threshold: f32,
}

impl SchmittTrigger {
    /// Create a new Schmitt trigger with the given thresholds
    pub fn new(low_threshold: f32, high_threshold: f32) -> Self {
        Self {
            state: SchmittState::Uninitialized,
            low_threshold,
            high_threshold,
        }
    }

    /// Process a sample through the Schmitt trigger
    /// Returns true if it toggled from low to high
    pub fn process(&mut self, input: f32) -> bool {
        match self.state {
            SchmittState::Uninitialized => {
                // An input that is already high on the first sample is not an edge
                if input >= self.high_threshold {
                    self.state = SchmittState::High;
                } else {
                    self.state = SchmittState::Low;
                }
            }
            SchmittState::High => {
                if input <= self.low_threshold {
                    self.state = SchmittState::Low;
                }
            }
            SchmittState::Low => {
                if input >= self.high_threshold {
                    self.state = SchmittState::High;
                    return true;
                }
            }
        }

        false
    }

    /// Get current state
    pub fn state(&self) -> SchmittState {
        self.state
    }

    /// Reset state to Uninitialized
    pub fn reset(&mut self) {
        self.state = SchmittState::Uninitialized;
    }
}

impl Default for SchmittTrigger {
    fn default() -> Self {
        Self::new(TRIGGER_LOW_THRESHOLD, TRIGGER_HIGH_THRESHOLD)
    }
}

/// Rising-edge detector for boolean levels (momentary buttons).
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanTrigger {
    state: bool,
}

impl BooleanTrigger {
    /// Returns true on a false -> true transition.
    pub fn process(&mut self, level: bool) -> bool {
        let rising = level && !self.state;
        self.state = level;
        rising
    }
}

/// Countdown pulse: high while time remains.
///
/// Retriggering keeps whichever is longer, the remaining time or the new
/// length.
#[derive(Debug, Clone, Copy, Default)]
pub struct PulseGenerator {
    remaining: f32,
}

impl PulseGenerator {
    pub fn trigger(&mut self, length: f32) {
        if length > self.remaining {
            self.remaining = length;
        }
    }

    /// Cut the pulse immediately.
    pub fn reset(&mut self) {
        self.remaining = 0.0;
    }

    /// Advance by `dt` and report whether the pulse was high for this sample.
    pub fn process(&mut self, dt: f32) -> bool {
        if self.remaining > 0.0 {
            self.remaining -= dt;
            true
        } else {
            false
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_range() {
        assert!((map_range(0.5, 0.0, 1.0, -1.0, 1.0) - 0.0).abs() < 1e-6);
        assert_eq!(map_range(1.0, 1.0, 1.0, 2.0, 4.0), 2.0);
    }

    #[test]
    fn test_wrap16() {
        assert_eq!(wrap16(17), 1);
        assert_eq!(wrap16(-1), 15);
        assert_eq!(wrap16(15), 15);
    }

    #[test]
    fn schmitt_fires_once_per_rising_edge() {
        let mut t = SchmittTrigger::default();
        assert!(!t.process(0.0));
        assert!(t.process(5.0));
        assert!(!t.process(5.0));
        // hysteresis band: 1V is neither low nor high, stays high
        assert!(!t.process(1.0));
        assert!(!t.process(3.0));
        assert!(!t.process(0.05));
        assert!(t.process(2.0));
    }

    #[test]
    fn schmitt_initially_high_input_is_not_an_edge() {
        let mut t = SchmittTrigger::default();
        assert!(!t.process(10.0));
        assert_eq!(t.state(), SchmittState::High);
        t.reset();
        assert_eq!(t.state(), SchmittState::Uninitialized);
    }

    #[test]
    fn boolean_trigger_detects_press() {
        let mut b = BooleanTrigger::default();
        assert!(b.process(true));
        assert!(!b.process(true));
        assert!(!b.process(false));
        assert!(b.process(true));
    }

    #[test]
    fn pulse_stays_high_for_its_length() {
        let dt = 0.001;
        let mut p = PulseGenerator::default();
        p.trigger(0.0105);
        let high = (0..100).filter(|_| p.process(dt)).count();
        assert_eq!(high, 11);
        assert!(!p.is_active());
    }

    #[test]
    fn pulse_retrigger_keeps_longer_remaining() {
        let mut p = PulseGenerator::default();
        p.trigger(0.5);
        p.trigger(0.1);
        let high = (0..1000).take_while(|_| p.process(0.001)).count();
        assert!((499..=501).contains(&high), "{high} samples");

        p.trigger(0.1);
        p.trigger(0.8);
        let high = (0..1000).take_while(|_| p.process(0.001)).count();
        assert!((799..=801).contains(&high), "{high} samples");

        p.trigger(0.5);
        p.reset();
        assert!(!p.process(0.001));
    }
}
