//! stepseq-render: drive the sequencer engine offline from a scene file
//!
//! A scene describes the params, saved state and a synthetic clock. The
//! engine is run sample by sample and every step-advance is printed:
//!
//! - `run`: render a scene and print its step events
//! - `schema`: print the JSON Schema of the params

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use stepseq_core::dsp::seq::{target_voltage, transpose_semitones};
use stepseq_core::{SequencerParams, Signal, StepEvent, StepSequencer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SAMPLE_RATE: f32 = 48000.0;
/// Length of the synthetic reset pulse.
const RESET_PULSE_MS: f32 = 1.0;

/// Offline renderer for the step sequencer engine
#[derive(Parser)]
#[command(name = "stepseq-render")]
#[command(about = "Render step events of the sequencer engine from a scene file")]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a scene and print every step-advance
    Run {
        /// Path to the scene JSON file
        scene: PathBuf,

        /// Seconds of audio to render
        #[arg(short, long, default_value_t = 10.0)]
        duration: f32,

        /// Sample rate in Hz
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f32,

        /// Seed for random directions and edits
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },

    /// Print the JSON Schema of the sequencer params
    Schema,
}

/// Synthetic external clock.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ClockSpec {
    period_ms: f32,
    pulse_ms: f32,
    /// unplug the clock cable at this time
    stop_at_ms: Option<f32>,
}

impl Default for ClockSpec {
    fn default() -> Self {
        Self {
            period_ms: 500.0,
            pulse_ms: 10.0,
            stop_at_ms: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Scene {
    params: SequencerParams,
    state: Option<serde_json::Value>,
    clock: ClockSpec,
    reset_at_ms: Vec<f32>,
}

/// One printed step-advance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventRow {
    time_ms: f64,
    step: usize,
    pitch: f32,
    gate_ms: Option<f32>,
    wrapped: bool,
    muted: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scene,
            duration,
            sample_rate,
            seed,
        } => cmd_run(&scene, duration, sample_rate, seed, cli.format),
        Commands::Schema => cmd_schema(),
    }
}

fn load_scene(path: &Path) -> Result<Scene> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scene file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse scene file {}", path.display()))
}

/// Samples in `ms`, at least one.
fn samples(ms: f32, sample_rate: f32) -> u64 {
    ((ms * sample_rate / 1000.0).round() as u64).max(1)
}

struct ClockDriver {
    period: u64,
    pulse: u64,
    stop_at: Option<u64>,
    resets: Vec<u64>,
    reset_len: u64,
}

impl ClockDriver {
    fn new(scene: &Scene, sample_rate: f32) -> Self {
        let period = samples(scene.clock.period_ms, sample_rate);
        Self {
            period,
            pulse: samples(scene.clock.pulse_ms, sample_rate).min(period.saturating_sub(1).max(1)),
            stop_at: scene.clock.stop_at_ms.map(|ms| samples(ms, sample_rate)),
            resets: scene
                .reset_at_ms
                .iter()
                .map(|&ms| samples(ms, sample_rate))
                .collect(),
            reset_len: samples(RESET_PULSE_MS, sample_rate),
        }
    }

    /// First rising edge lands one period in, never on frame 0.
    fn clock(&self, frame: u64) -> Signal {
        if self.stop_at.is_some_and(|stop| frame >= stop) {
            return Signal::Disconnected;
        }
        if frame >= self.period && frame % self.period < self.pulse {
            Signal::Volts(10.0)
        } else {
            Signal::Volts(0.0)
        }
    }

    fn reset(&self, frame: u64) -> Signal {
        let high = self
            .resets
            .iter()
            .any(|&start| frame >= start && frame < start + self.reset_len);
        Signal::Volts(if high { 10.0 } else { 0.0 })
    }
}

fn event_row(seq: &StepSequencer, event: &StepEvent, frame: u64, sample_rate: f32) -> EventRow {
    let params = seq.params();
    let transpose = transpose_semitones(&params.transpose);
    EventRow {
        time_ms: frame as f64 * 1000.0 / sample_rate as f64,
        step: event.step,
        pitch: target_voltage(params.slots.slot(event.step), transpose),
        gate_ms: event.gate_length.map(|s| s * 1000.0),
        wrapped: event.wrapped,
        muted: event.muted,
    }
}

fn print_row_table(row: &EventRow) {
    let time = format!("{:>10.2}", row.time_ms).dimmed();
    let step = format!("{:>4}", row.step + 1).cyan();
    let pitch = format!("{:>+8.3}V", row.pitch).white();
    let gate = match row.gate_ms {
        Some(ms) => format!("{:>9.2}ms", ms).green(),
        None => format!("{:>11}", "-").red(),
    };
    let eoc = if row.wrapped {
        "EOC".yellow().bold()
    } else {
        "".normal()
    };
    let muted = if row.muted { "muted".red() } else { "".normal() };

    println!("{} {} {} {} {} {}", time, step, pitch, gate, eoc, muted);
}

fn print_row_json(row: &EventRow) {
    if let Ok(json) = serde_json::to_string(row) {
        println!("{}", json);
    }
}

fn cmd_run(
    path: &Path,
    duration: f32,
    sample_rate: f32,
    seed: u64,
    format: OutputFormat,
) -> Result<()> {
    anyhow::ensure!(sample_rate > 0.0, "sample rate must be positive");
    anyhow::ensure!(duration >= 0.0, "duration must not be negative");

    let scene = load_scene(path)?;
    let driver = ClockDriver::new(&scene, sample_rate);
    let mut seq = StepSequencer::with_seed(scene.params, seed);
    if let Some(state) = &scene.state {
        seq.load_state(state)
            .with_context(|| format!("invalid state in {}", path.display()))?;
    }
    tracing::info!(
        period_ms = scene.clock.period_ms,
        ratio = seq.params().ratio.label(),
        direction = seq.params().direction.label(),
        "rendering scene"
    );

    if format == OutputFormat::Table {
        println!(
            "{:>10} {:>4} {:>9} {:>11}",
            "TIME(ms)", "STEP", "PITCH", "GATE"
        );
        println!("{}", "-".repeat(50));
    }

    let frames = (duration as f64 * sample_rate as f64).round() as u64;
    let mut count = 0usize;
    let mut cycles = 0usize;
    for frame in 0..frames {
        {
            let params = seq.params_mut();
            params.clock = driver.clock(frame);
            params.reset = driver.reset(frame);
        }
        seq.update(sample_rate);

        if let Some(event) = seq.last_step_event() {
            let row = event_row(&seq, &event, frame, sample_rate);
            match format {
                OutputFormat::Table => print_row_table(&row),
                OutputFormat::Json => print_row_json(&row),
            }
            count += 1;
            if event.wrapped {
                cycles += 1;
            }
        }
    }

    if format == OutputFormat::Table {
        println!("{}", "-".repeat(50));
        println!(
            "{} step events, {} cycles, final step {}",
            count,
            cycles,
            seq.current_step() + 1
        );
    }

    Ok(())
}

fn cmd_schema() -> Result<()> {
    let schema = serde_json::to_string_pretty(stepseq_core::params_schema())
        .context("failed to serialize params schema")?;
    println!("{}", schema);
    Ok(())
}
