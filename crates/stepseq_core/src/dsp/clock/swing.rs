use crate::dsp::clock::oscillator::TickQueue;
use crate::dsp::consts::{ANTI_BOUNCE_TIME, SWING_MAX};

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingTick {
    delay: f32,
    timer: f32,
}

/// Turns queued base ticks into at most one step-advance per sample.
///
/// Every odd tick of a pair is held back by `swing / 3` of the virtual
/// period. Zero-delay ticks arriving within [`ANTI_BOUNCE_TIME`] of the last
/// fired tick are dropped.
#[derive(Debug, Clone)]
pub struct SwingScheduler {
    parity: u32,
    pending: Option<PendingTick>,
    since_last_tick: f32,
}

impl Default for SwingScheduler {
    fn default() -> Self {
        Self {
            parity: 0,
            pending: None,
            since_last_tick: f32::MAX,
        }
    }
}

impl SwingScheduler {
    /// Advance the anti-bounce timer. Runs every sample, clock or not.
    pub fn elapse(&mut self, dt: f32) {
        self.since_last_tick += dt;
    }

    /// Returns true when a step-advance fires this sample.
    pub fn poll(&mut self, ticks: &mut TickQueue, swing: f32, virt_period: f32, dt: f32) -> bool {
        if let Some(pending) = self.pending.as_mut() {
            pending.timer += dt;
            if pending.timer >= pending.delay {
                self.pending = None;
                self.fire();
                return true;
            }
            return false;
        }

        if !ticks.pop() {
            return false;
        }

        let swing = if swing.is_finite() {
            swing.clamp(0.0, SWING_MAX)
        } else {
            0.0
        };
        let delay = if self.parity & 1 == 1 {
            swing / 3.0 * virt_period
        } else {
            0.0
        };

        if delay <= 1e-9 {
            if self.since_last_tick < ANTI_BOUNCE_TIME {
                return false;
            }
            self.fire();
            return true;
        }

        self.pending = Some(PendingTick { delay, timer: 0.0 });
        false
    }

    fn fire(&mut self) {
        self.parity = self.parity.wrapping_add(1);
        self.since_last_tick = 0.0;
    }

    /// Drop the deferred tick and restart the swing pair.
    pub fn clear(&mut self) {
        self.parity = 0;
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
