//! The step sequencer module: one `update` call per audio sample.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::dsp::clock::{
    ClockRatio, ClockTracker, ConnectionChange, SwingScheduler, TickQueue, VirtualOscillator,
};
use crate::dsp::consts::BUTTON_THRESHOLD;
use crate::dsp::seq::{
    GateGenerator, GateShape, GlideCurve, PitchPath, ResetController, ResetRequest,
    SequenceNavigator, SequenceWindow, StepTable, target_voltage, transpose_semitones,
};
use crate::dsp::utils::{BooleanTrigger, SchmittTrigger};
use crate::edit::{self, Row};
use crate::error::{Result, SequencerError};
use crate::persist::SequencerState;
use crate::poly::PolyOutput;
use crate::types::{Direction, GateMode, Signal, deserialize_knob_int};

/// One value per randomizable row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
#[schemars(bound = "T: JsonSchema + Default")]
pub struct RowInputs<T> {
    pub pitch: T,
    pub octave: T,
    pub mode: T,
    pub duration: T,
    pub mod_a: T,
    pub mod_b: T,
}

impl<T> RowInputs<T> {
    pub fn get(&self, row: Row) -> &T {
        match row {
            Row::Pitch => &self.pitch,
            Row::Octave => &self.octave,
            Row::Mode => &self.mode,
            Row::Duration => &self.duration,
            Row::ModA => &self.mod_a,
            Row::ModB => &self.mod_b,
        }
    }
}

/// Momentary up/down button levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ButtonPair {
    pub up: f32,
    pub down: f32,
}

/// Row shift buttons. The mode row cannot be shifted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ShiftButtons {
    pub pitch: ButtonPair,
    pub octave: ButtonPair,
    pub duration: ButtonPair,
    pub mod_a: ButtonPair,
    pub mod_b: ButtonPair,
}

impl ShiftButtons {
    pub fn get(&self, row: Row) -> Option<&ButtonPair> {
        match row {
            Row::Pitch => Some(&self.pitch),
            Row::Octave => Some(&self.octave),
            Row::Mode => None,
            Row::Duration => Some(&self.duration),
            Row::ModA => Some(&self.mod_a),
            Row::ModB => Some(&self.mod_b),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SequencerParams {
    /// the sixteen step slots
    pub slots: StepTable,
    /// first slot of the window, 1-based (1-16)
    #[serde(deserialize_with = "deserialize_knob_int")]
    #[schemars(with = "i32")]
    pub start: i32,
    /// window length (1-16)
    #[serde(deserialize_with = "deserialize_knob_int")]
    #[schemars(with = "i32")]
    pub steps: i32,
    pub direction: Direction,
    pub gate_mode: GateMode,
    /// index into the ratio table, ÷48 (0) to ×48 (28)
    pub ratio: ClockRatio,
    /// swing amount (0-0.6)
    pub swing: f32,
    /// glide time in seconds
    pub glide: f32,
    /// external clock input
    pub clock: Signal,
    /// reset trigger input
    pub reset: Signal,
    /// transpose input (1V/oct)
    pub transpose: Signal,
    /// randomize trigger inputs
    pub randomize: RowInputs<Signal>,
    /// randomize button levels
    pub randomize_buttons: RowInputs<f32>,
    pub shift: ShiftButtons,
}

impl Default for SequencerParams {
    fn default() -> Self {
        Self {
            slots: StepTable::default(),
            start: 1,
            steps: 16,
            direction: Direction::default(),
            gate_mode: GateMode::default(),
            ratio: ClockRatio::default(),
            swing: 0.0,
            glide: 0.0,
            clock: Signal::Disconnected,
            reset: Signal::Disconnected,
            transpose: Signal::Disconnected,
            randomize: RowInputs::default(),
            randomize_buttons: RowInputs::default(),
            shift: ShiftButtons::default(),
        }
    }
}

impl SequencerParams {
    pub fn window(&self) -> SequenceWindow {
        SequenceWindow::from_params(self.start, self.steps)
    }
}

#[derive(Clone, Debug, Default, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SequencerOutputs {
    /// pitch (1V/oct)
    pub pitch: f32,
    /// gate / trigger, 0 or 10V
    pub gate: f32,
    /// per-step gates, one channel per window slot
    pub step_gates: PolyOutput,
    /// end-of-cycle pulse
    pub end_of_cycle: f32,
    pub mod_a: f32,
    pub mod_b: f32,
    /// current slot index (0-15)
    pub current_step: usize,
}

/// What happened on a step-advance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepEvent {
    pub step: usize,
    /// fired gate length, `None` when the step stayed silent
    pub gate_length: Option<f32>,
    pub wrapped: bool,
    pub muted: bool,
}

#[derive(Debug, Clone, Default)]
struct EditTriggers {
    randomize_cv: [SchmittTrigger; 6],
    randomize_button: [BooleanTrigger; 6],
    shift_up: [BooleanTrigger; 6],
    shift_down: [BooleanTrigger; 6],
}

/// Sample-clocked 16-step sequencer.
///
/// Follows an external clock at a multiplied or divided rate, walks the
/// active window under one of five directions and emits gate, per-step gate,
/// end-of-cycle, pitch and two modulation voltages.
pub struct StepSequencer {
    params: SequencerParams,
    outputs: SequencerOutputs,
    state: SequencerState,
    clock: ClockTracker,
    oscillator: VirtualOscillator,
    ticks: TickQueue,
    swing: SwingScheduler,
    navigator: SequenceNavigator,
    gates: GateGenerator,
    reset: ResetController,
    pitch: PitchPath,
    edits: EditTriggers,
    rng: fastrand::Rng,
    event: Option<StepEvent>,
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new(SequencerParams::default())
    }
}

impl StepSequencer {
    pub fn new(params: SequencerParams) -> Self {
        Self::with_rng(params, fastrand::Rng::new())
    }

    /// Deterministic random directions and edits.
    pub fn with_seed(params: SequencerParams, seed: u64) -> Self {
        Self::with_rng(params, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(params: SequencerParams, rng: fastrand::Rng) -> Self {
        let mut seq = Self {
            params,
            outputs: SequencerOutputs::default(),
            state: SequencerState::default(),
            clock: ClockTracker::default(),
            oscillator: VirtualOscillator::default(),
            ticks: TickQueue::default(),
            swing: SwingScheduler::default(),
            navigator: SequenceNavigator::default(),
            gates: GateGenerator::default(),
            reset: ResetController::default(),
            pitch: PitchPath::default(),
            edits: EditTriggers::default(),
            rng,
            event: None,
        };
        seq.reset();
        seq
    }

    /// Full re-initialisation: back to the window start with every pulse,
    /// timer and glide cleared. Unlike a reset edge this does not arm replay.
    pub fn reset(&mut self) {
        let window = self.params.window();
        self.navigator = SequenceNavigator::default();
        self.navigator.set_current(window.start());
        self.gates.clear();
        self.clock = ClockTracker::default();
        self.oscillator = VirtualOscillator::default();
        self.ticks.clear();
        self.swing = SwingScheduler::default();
        self.pitch.reset();
        self.reset.clear();
        self.event = None;
        self.outputs.current_step = window.start();
    }

    pub fn update(&mut self, sample_rate: f32) {
        profiling::scope!("StepSequencer::update");

        let dt = 1.0 / sample_rate;
        let connected = !self.params.clock.is_disconnected();
        self.event = None;

        self.clock.elapse(connected, dt);
        self.swing.elapse(dt);

        self.process_edits();

        let window = self.params.window();
        self.navigator.fold_into(&window);

        if self.reset.detect(self.params.reset.get_value(), &window) {
            self.on_reset_edge();
        }

        // pitch and mods follow the step current before this sample's advance
        let slot = *self.params.slots.slot(self.navigator.current_step());
        let transpose = transpose_semitones(&self.params.transpose);
        let target = target_voltage(&slot, transpose);
        self.outputs.mod_a = self.state.mod_a_range.map(slot.mod_a_raw());
        self.outputs.mod_b = self.state.mod_b_range.map(slot.mod_b_raw());

        if !connected {
            if self.clock.set_connected(false) == Some(ConnectionChange::Lost) {
                self.hard_stop();
            }
            if let Some(req) = self.reset.take() {
                self.apply_reset(req);
            }

            let frame = self.gates.silence(&mut self.outputs.step_gates, window.len());
            self.outputs.gate = frame.gate;
            self.outputs.end_of_cycle = frame.end_of_cycle;
            self.outputs.current_step = self.navigator.current_step();
            self.outputs.pitch =
                self.pitch
                    .process(target, self.params.glide, dt, GlideCurve::Exponential);
            return;
        }

        if self.clock.set_connected(true) == Some(ConnectionChange::Connected) {
            debug!("clock connected");
        }

        let ratio = self.params.ratio;
        if let Some(period) = self.clock.detect_edge(self.params.clock.get_value()) {
            self.oscillator.on_edge(period, ratio, &mut self.ticks);
        }

        if self.clock.check_timeout() {
            self.oscillator.realign();
            // a backlog from a clock faster than one step per sample
            self.ticks.clear();
            debug!(
                timeout = self.clock.phase_timeout(),
                "clock phase lost, waiting for next edge"
            );
        }

        self.oscillator
            .advance(dt, self.clock.has_phase(), &mut self.ticks);

        let fired = self.swing.poll(
            &mut self.ticks,
            self.params.swing,
            self.oscillator.virt_period(),
            dt,
        );

        if fired {
            self.step_advance(&window, ratio, dt);
        }

        if let Some(req) = self.reset.take() {
            self.apply_reset(req);
        }

        let frame = self
            .gates
            .process(dt, &mut self.outputs.step_gates, window.len());
        self.outputs.gate = frame.gate;
        self.outputs.end_of_cycle = frame.end_of_cycle;
        self.outputs.current_step = self.navigator.current_step();
        self.outputs.pitch =
            self.pitch
                .process(target, self.params.glide, dt, GlideCurve::SquareRoot);
    }

    fn step_advance(&mut self, window: &SequenceWindow, ratio: ClockRatio, dt: f32) {
        let transition = self.navigator.advance(
            &self.params.slots,
            window,
            self.params.direction,
            &mut self.rng,
        );

        if transition.wrapped {
            self.gates.fire_end_of_cycle();
        }

        let shape = GateShape {
            mode: self.params.gate_mode,
            ratio,
            virt_period: self.oscillator.virt_period(),
            dt,
        };
        let gate_length = self.gates.fire(
            self.params.slots.slot(transition.step),
            window.offset_of(transition.step),
            transition.muted,
            &shape,
        );

        self.event = Some(StepEvent {
            step: transition.step,
            gate_length,
            wrapped: transition.wrapped,
            muted: transition.muted,
        });
    }

    fn on_reset_edge(&mut self) {
        self.gates.clear();
        if self.state.eoc_on_reset {
            self.gates.fire_end_of_cycle();
        }
        self.navigator.reset_auxiliary();
        self.navigator.arm_replay();
        self.swing.clear();
        self.ticks.clear();
        // the next real edge relocks the phase
        self.oscillator.realign();
        debug!(step = self.navigator.current_step(), "reset edge");
    }

    fn apply_reset(&mut self, req: ResetRequest) {
        self.navigator.set_current(req.target_step);
        self.navigator.arm_replay();
    }

    fn hard_stop(&mut self) {
        self.gates.clear();
        self.oscillator.realign();
        self.clock.hard_stop();
        self.ticks.clear();
        self.swing.clear();
        debug!(
            step = self.navigator.current_step(),
            "clock disconnected, hard stop"
        );
    }

    fn process_edits(&mut self) {
        let window = self.params.window();

        for (i, row) in Row::ALL.iter().copied().enumerate() {
            let pressed = *self.params.randomize_buttons.get(row) > BUTTON_THRESHOLD;
            if self.edits.randomize_button[i].process(pressed) {
                edit::randomize_row(&mut self.params.slots, row, &mut self.rng);
            }
        }

        for (i, row) in Row::ALL.iter().copied().enumerate() {
            let Some(buttons) = self.params.shift.get(row).copied() else {
                continue;
            };
            if self.edits.shift_up[i].process(buttons.up > BUTTON_THRESHOLD) {
                edit::shift_row(&mut self.params.slots, &window, row, true);
            }
            if self.edits.shift_down[i].process(buttons.down > BUTTON_THRESHOLD) {
                edit::shift_row(&mut self.params.slots, &window, row, false);
            }
        }

        for (i, row) in Row::ALL.iter().copied().enumerate() {
            let voltage = self.params.randomize.get(row).get_value();
            if self.edits.randomize_cv[i].process(voltage) {
                edit::randomize_row(&mut self.params.slots, row, &mut self.rng);
            }
        }
    }

    /// Replace params from a JSON document. Missing fields take defaults.
    pub fn try_update_params(&mut self, value: Value) -> Result<()> {
        let params: SequencerParams =
            serde_json::from_value(value).map_err(SequencerError::Params)?;
        self.params = params;
        Ok(())
    }

    pub fn params(&self) -> &SequencerParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut SequencerParams {
        &mut self.params
    }

    pub fn outputs(&self) -> &SequencerOutputs {
        &self.outputs
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn get_state(&self) -> Value {
        self.state.to_json()
    }

    pub fn load_state(&mut self, value: &Value) -> Result<()> {
        self.state.merge_json(value)?;
        debug!(state = ?self.state, "state loaded");
        Ok(())
    }

    /// The step-advance that fired during the last `update`, if any.
    pub fn last_step_event(&self) -> Option<StepEvent> {
        self.event
    }

    pub fn current_step(&self) -> usize {
        self.navigator.current_step()
    }

    pub fn virt_period(&self) -> f32 {
        self.oscillator.virt_period()
    }

    pub fn has_phase(&self) -> bool {
        self.clock.has_phase()
    }

    pub fn replay_armed(&self) -> bool {
        self.navigator.replay_armed()
    }

    pub fn pending_ticks(&self) -> u32 {
        self.ticks.len()
    }

    /// Apply an edit to the step table from outside the audio path.
    pub fn randomize_row(&mut self, row: Row) {
        edit::randomize_row(&mut self.params.slots, row, &mut self.rng);
    }

    pub fn clear_row(&mut self, row: Row) {
        edit::clear_row(&mut self.params.slots, row);
    }

    pub fn shift_row(&mut self, row: Row, up: bool) {
        let window = self.params.window();
        edit::shift_row(&mut self.params.slots, &window, row, up);
    }
}
