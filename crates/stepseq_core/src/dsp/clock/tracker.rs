use crate::dsp::consts::{
    DEFAULT_PHASE_TIMEOUT, MIN_VALID_PERIOD, PHASE_TIMEOUT_MAX, PHASE_TIMEOUT_MIN,
};
use crate::dsp::utils::SchmittTrigger;

/// Change in clock cable state between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionChange {
    Connected,
    Lost,
}

/// Follows the external clock: edge detection, period measurement and
/// phase-loss detection.
#[derive(Debug, Clone)]
pub struct ClockTracker {
    trigger: SchmittTrigger,
    /// Time since the previous edge, becomes the next measured period.
    time_since_clk: f32,
    /// Time since the last real edge, drives the phase timeout.
    since_last_edge: f32,
    last_period: f32,
    have_phase: bool,
    connected: bool,
}

impl Default for ClockTracker {
    fn default() -> Self {
        Self {
            trigger: SchmittTrigger::default(),
            time_since_clk: 0.0,
            since_last_edge: 0.0,
            last_period: 0.0,
            have_phase: false,
            connected: false,
        }
    }
}

impl ClockTracker {
    /// Advance the edge timers. Runs at the top of every sample.
    pub fn elapse(&mut self, connected: bool, dt: f32) {
        if connected {
            self.time_since_clk += dt;
            self.since_last_edge += dt;
        } else {
            self.time_since_clk = 0.0;
        }
    }

    /// Record the cable state for this sample and report a transition.
    pub fn set_connected(&mut self, connected: bool) -> Option<ConnectionChange> {
        let change = match (self.connected, connected) {
            (false, true) => Some(ConnectionChange::Connected),
            (true, false) => Some(ConnectionChange::Lost),
            _ => None,
        };
        self.connected = connected;
        change
    }

    /// Forget all timing after the clock cable was pulled.
    pub fn hard_stop(&mut self) {
        self.last_period = 0.0;
        self.have_phase = false;
        self.since_last_edge = 0.0;
        self.trigger.reset();
    }

    /// Feed the raw clock voltage. On a rising edge returns the measured
    /// inter-edge period (which may be trivially short on the first edge).
    pub fn detect_edge(&mut self, voltage: f32) -> Option<f32> {
        if !self.trigger.process(voltage) {
            return None;
        }
        self.last_period = self.time_since_clk;
        self.time_since_clk = 0.0;
        self.since_last_edge = 0.0;
        self.have_phase = true;
        Some(self.last_period)
    }

    /// No edge for longer than this drops the phase.
    pub fn phase_timeout(&self) -> f32 {
        if self.last_period > MIN_VALID_PERIOD {
            (self.last_period * 2.0).clamp(PHASE_TIMEOUT_MIN, PHASE_TIMEOUT_MAX)
        } else {
            DEFAULT_PHASE_TIMEOUT
        }
    }

    /// Returns true on the sample the phase is lost.
    pub fn check_timeout(&mut self) -> bool {
        if self.have_phase && self.since_last_edge > self.phase_timeout() {
            self.have_phase = false;
            return true;
        }
        false
    }

    pub fn has_phase(&self) -> bool {
        self.have_phase
    }

    pub fn last_period(&self) -> f32 {
        self.last_period
    }
}
