use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;

use crate::dsp::consts::{
    DEFAULT_VIRTUAL_PERIOD, MIN_VALID_PERIOD, RATIO_DEFAULT_INDEX, RATIO_LABELS, RATIO_TABLE,
};

/// Entry of the clock ratio table (÷48 … ×48).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockRatio {
    index: usize,
}

impl Default for ClockRatio {
    fn default() -> Self {
        Self {
            index: RATIO_DEFAULT_INDEX,
        }
    }
}

impl ClockRatio {
    /// Out-of-range indices are clamped to the table.
    pub fn from_index(index: i64) -> Self {
        Self {
            index: index.clamp(0, RATIO_TABLE.len() as i64 - 1) as usize,
        }
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn value(self) -> f32 {
        RATIO_TABLE[self.index]
    }

    pub fn label(self) -> &'static str {
        RATIO_LABELS[self.index]
    }

    /// ×1 and above: the virtual clock realigns to every real edge.
    pub fn realigns(self) -> bool {
        self.value() >= 1.0
    }

    /// Strictly faster than the external clock.
    pub fn multiplies(self) -> bool {
        self.value() > 1.0
    }

    /// ×1, ×2, ×3 … (not ×1.5, ×2.5).
    pub fn is_integer_multiplier(self) -> bool {
        let r = self.value();
        r >= 1.0 && (r - r.round()).abs() < 1e-4
    }
}

impl Serialize for ClockRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.index as u64)
    }
}

impl<'de> Deserialize<'de> for ClockRatio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        if !raw.is_finite() {
            return Ok(Self::default());
        }
        Ok(Self::from_index(raw.round() as i64))
    }
}

impl JsonSchema for ClockRatio {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed("ClockRatio")
    }

    fn json_schema(r#gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
        u32::json_schema(r#gen)
    }
}

/// Count of base ticks waiting for the swing scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickQueue {
    pending: u32,
}

impl TickQueue {
    pub fn push(&mut self) {
        self.pending = self.pending.saturating_add(1);
    }

    /// Take one tick if any is queued.
    pub fn pop(&mut self) -> bool {
        if self.pending > 0 {
            self.pending -= 1;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.pending = 0;
    }

    pub fn len(&self) -> u32 {
        self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }
}

/// Free-running phase accumulator at `measured period / ratio`.
///
/// Multiplied and unity ratios snap back to zero phase on every real edge.
/// Divided ratios free-run across edges so the slow virtual clock does not
/// jitter with the incoming period.
#[derive(Debug, Clone)]
pub struct VirtualOscillator {
    virt_timer: f32,
    virt_period: f32,
}

impl Default for VirtualOscillator {
    fn default() -> Self {
        Self {
            virt_timer: 0.0,
            virt_period: DEFAULT_VIRTUAL_PERIOD,
        }
    }
}

impl VirtualOscillator {
    /// Re-seed from a real clock edge.
    pub fn on_edge(&mut self, measured_period: f32, ratio: ClockRatio, ticks: &mut TickQueue) {
        if measured_period > MIN_VALID_PERIOD {
            self.virt_period = measured_period / ratio.value().max(1e-6);
        }

        if ratio.realigns() {
            self.virt_timer = 0.0;
            // first sub-pulse lands on the real edge
            if ratio.is_integer_multiplier() {
                ticks.push();
            }
        }
    }

    /// Accumulate one sample of phase, queueing a tick per wrap.
    pub fn advance(&mut self, dt: f32, have_phase: bool, ticks: &mut TickQueue) {
        if !have_phase || self.virt_period <= 0.0 {
            return;
        }
        self.virt_timer += dt;
        while self.virt_timer >= self.virt_period {
            self.virt_timer -= self.virt_period;
            ticks.push();
        }
    }

    /// Zero the phase so the next real edge relocks it.
    pub fn realign(&mut self) {
        self.virt_timer = 0.0;
    }

    pub fn virt_period(&self) -> f32 {
        self.virt_period
    }

    pub fn phase_time(&self) -> f32 {
        self.virt_timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 1000.0;

    fn ratio_of(label: &str) -> ClockRatio {
        let index = RATIO_LABELS.iter().position(|l| *l == label).unwrap();
        ClockRatio::from_index(index as i64)
    }

    #[test]
    fn tick_queue_saturates() {
        let mut q = TickQueue {
            pending: u32::MAX - 1,
        };
        q.push();
        q.push();
        assert_eq!(q.len(), u32::MAX);
        assert!(q.pop());
        assert_eq!(q.len(), u32::MAX - 1);
    }

    #[test]
    fn ratio_index_is_clamped() {
        assert_eq!(ClockRatio::from_index(-4).label(), "÷48");
        assert_eq!(ClockRatio::from_index(400).label(), "×48");
        let r: ClockRatio = serde_json::from_str("19.2").unwrap();
        assert_eq!(r.label(), "×4");
    }

    #[test]
    fn integer_multiplier_detection() {
        assert!(ratio_of("×1").is_integer_multiplier());
        assert!(ratio_of("×4").is_integer_multiplier());
        assert!(!ratio_of("×2.5").is_integer_multiplier());
        assert!(!ratio_of("÷2").is_integer_multiplier());
        assert!(!ratio_of("×1").multiplies());
        assert!(ratio_of("×1.5").multiplies());
    }

    #[test]
    fn integer_multiplier_queues_tick_on_edge() {
        let mut osc = VirtualOscillator::default();
        let mut q = TickQueue::default();
        osc.on_edge(0.5, ratio_of("×4"), &mut q);
        assert_eq!(q.len(), 1);
        assert!((osc.virt_period() - 0.125).abs() < 1e-6);

        let mut q = TickQueue::default();
        osc.on_edge(0.5, ratio_of("×2.5"), &mut q);
        assert!(q.is_empty());
        assert!((osc.virt_period() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn trivial_period_keeps_previous_virtual_period() {
        let mut osc = VirtualOscillator::default();
        let mut q = TickQueue::default();
        osc.on_edge(0.00001, ratio_of("×2"), &mut q);
        assert_eq!(osc.virt_period(), DEFAULT_VIRTUAL_PERIOD);
    }

    #[test]
    fn divider_does_not_realign_phase() {
        let mut osc = VirtualOscillator::default();
        let mut q = TickQueue::default();
        osc.on_edge(0.1, ratio_of("÷4"), &mut q);
        for _ in 0..150 {
            osc.advance(DT, true, &mut q);
        }
        let before = osc.phase_time();
        osc.on_edge(0.1, ratio_of("÷4"), &mut q);
        assert_eq!(osc.phase_time(), before);
        assert!(q.is_empty());
    }

    #[test]
    fn advance_emits_one_tick_per_wrap() {
        let mut osc = VirtualOscillator::default();
        let mut q = TickQueue::default();
        osc.on_edge(0.1, ratio_of("×1"), &mut q);
        q.clear();
        for _ in 0..1000 {
            osc.advance(DT, true, &mut q);
        }
        // 1s at 100ms: 10 ticks, give or take rounding at the last boundary
        assert!((9..=10).contains(&q.len()), "{} ticks", q.len());
    }

    #[test]
    fn very_fast_ratio_wraps_several_times_per_sample() {
        let mut osc = VirtualOscillator::default();
        let mut q = TickQueue::default();
        osc.on_edge(0.0002, ratio_of("×48"), &mut q);
        q.clear();
        osc.advance(DT, true, &mut q);
        assert!(q.len() >= 200, "{} ticks", q.len());
    }

    #[test]
    fn idle_without_phase() {
        let mut osc = VirtualOscillator::default();
        let mut q = TickQueue::default();
        for _ in 0..1000 {
            osc.advance(DT, false, &mut q);
        }
        assert!(q.is_empty());
        assert_eq!(osc.phase_time(), 0.0);
    }
}
