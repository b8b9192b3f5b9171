use crate::dsp::consts::{GLIDE_BYPASS_TIME, GLIDE_MIN_TAU, TRANSPOSE_LIMIT_SEMITONES};
use crate::dsp::seq::table::StepSlot;
use crate::dsp::utils::exp_coefficient;
use crate::types::Signal;

/// Shape of the glide toward a new pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlideCurve {
    /// Plain one-pole decay. Used while the clock is unpatched.
    Exponential,
    /// Square root of the one-pole coefficient: a faster, more linear glide.
    SquareRoot,
}

/// Transpose input in whole semitones (1V = 12), clamped to ±48.
/// Unpatched or non-finite inputs transpose by zero.
pub fn transpose_semitones(input: &Signal) -> i32 {
    match input {
        Signal::Volts(v) if v.is_finite() => ((v * 12.0).round() as i32)
            .clamp(-TRANSPOSE_LIMIT_SEMITONES, TRANSPOSE_LIMIT_SEMITONES),
        _ => 0,
    }
}

/// Unsmoothed 1V/oct pitch for `slot`.
pub fn target_voltage(slot: &StepSlot, transpose: i32) -> f32 {
    (slot.pitch_class() + transpose) as f32 / 12.0 + slot.octave_offset() as f32
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PitchPath {
    pitch_out: f32,
    initialized: bool,
}

impl PitchPath {
    /// One sample of glide toward `target`. The filter seeds itself with
    /// the first target after a reset.
    pub fn process(&mut self, target: f32, glide: f32, dt: f32, curve: GlideCurve) -> f32 {
        let glide = if glide.is_finite() { glide } else { 0.0 };

        if glide <= GLIDE_BYPASS_TIME {
            self.pitch_out = target;
            self.initialized = true;
            return self.pitch_out;
        }

        let tau = glide.max(GLIDE_MIN_TAU);
        let coeff = exp_coefficient(dt, tau);
        let alpha = match curve {
            GlideCurve::Exponential => coeff,
            GlideCurve::SquareRoot => coeff.min(1.0).sqrt(),
        };

        if !self.initialized {
            self.pitch_out = target;
            self.initialized = true;
        }
        self.pitch_out += (target - self.pitch_out) * alpha;
        self.pitch_out
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn value(&self) -> f32 {
        self.pitch_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 48_000.0;

    #[test]
    fn transpose_rounds_and_clamps() {
        assert_eq!(transpose_semitones(&Signal::Disconnected), 0);
        assert_eq!(transpose_semitones(&Signal::Volts(1.0)), 12);
        assert_eq!(transpose_semitones(&Signal::Volts(0.04)), 0);
        assert_eq!(transpose_semitones(&Signal::Volts(0.05)), 1);
        assert_eq!(transpose_semitones(&Signal::Volts(-10.0)), -48);
        assert_eq!(transpose_semitones(&Signal::Volts(f32::NAN)), 0);
        assert_eq!(transpose_semitones(&Signal::Volts(f32::INFINITY)), 0);
    }

    #[test]
    fn target_combines_pitch_octave_and_transpose() {
        let slot = StepSlot {
            pitch: 7,
            octave: -1,
            ..Default::default()
        };
        assert!((target_voltage(&slot, 5) - 0.0).abs() < 1e-6);
        assert!((target_voltage(&slot, 0) - (7.0 / 12.0 - 1.0)).abs() < 1e-6);
    }

    #[test]
    fn zero_glide_is_a_bypass() {
        let mut p = PitchPath::default();
        assert_eq!(p.process(1.0, 0.0, DT, GlideCurve::SquareRoot), 1.0);
        assert_eq!(p.process(-2.0, f32::NAN, DT, GlideCurve::SquareRoot), -2.0);
    }

    #[test]
    fn first_target_seeds_filter() {
        let mut p = PitchPath::default();
        assert_eq!(p.process(3.0, 0.5, DT, GlideCurve::Exponential), 3.0);
    }

    #[test]
    fn square_root_glide_is_faster() {
        let mut exp = PitchPath::default();
        let mut sqrt = PitchPath::default();
        exp.process(0.0, 0.1, DT, GlideCurve::Exponential);
        sqrt.process(0.0, 0.1, DT, GlideCurve::SquareRoot);
        for _ in 0..100 {
            exp.process(1.0, 0.1, DT, GlideCurve::Exponential);
            sqrt.process(1.0, 0.1, DT, GlideCurve::SquareRoot);
        }
        assert!(exp.value() > 0.0 && exp.value() < 1.0);
        assert!(sqrt.value() > exp.value());
    }

    #[test]
    fn exponential_glide_reaches_63_percent_after_tau() {
        let mut p = PitchPath::default();
        p.process(0.0, 0.01, DT, GlideCurve::Exponential);
        for _ in 0..480 {
            p.process(1.0, 0.01, DT, GlideCurve::Exponential);
        }
        assert!((p.value() - 0.632).abs() < 0.01, "{}", p.value());
    }
}
