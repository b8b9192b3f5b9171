//! stepseq-bench: Benchmark harness for engine profiling
//!
//! Runs the sequencer engine in a tight loop with a synthetic clock so the
//! per-sample path can be profiled with native tools like samply,
//! Instruments, or perf.
//!
//! Usage:
//!   stepseq-bench run --frames 4800000 --ratio 28
//!   stepseq-bench run --params params.json
//!   stepseq-bench smoke
//!   samply record ./target/profiling/stepseq-bench run

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::hint::black_box;
use std::path::PathBuf;
use std::time::Instant;
use stepseq_core::{Direction, EnumParam, SequencerParams, Signal, StepSequencer};

const DEFAULT_SAMPLE_RATE: f32 = 48000.0;
const DEFAULT_FRAMES: u64 = 48000 * 10; // 10 seconds at 48kHz

/// Benchmark harness for the step sequencer engine
#[derive(Parser)]
#[command(name = "stepseq-bench")]
#[command(about = "Profile and benchmark the step sequencer engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a benchmark
    Run {
        /// Params JSON file (defaults are used when omitted)
        #[arg(long)]
        params: Option<PathBuf>,

        /// Number of audio frames to process
        #[arg(short, long, default_value_t = DEFAULT_FRAMES)]
        frames: u64,

        /// Sample rate in Hz
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f32,

        /// Clock ratio index, overrides the params (0-28)
        #[arg(short, long)]
        ratio: Option<i64>,

        /// External clock period in milliseconds
        #[arg(long, default_value_t = 500.0)]
        clock_ms: f32,

        /// Warmup frames before measurement
        #[arg(short, long, default_value_t = 48000)]
        warmup: u64,
    },

    /// Run a quick pass over every direction mode
    Smoke {
        /// Frames per direction
        #[arg(short, long, default_value_t = 48000)]
        frames: u64,
    },
}

fn main() -> Result<()> {
    // Initialize Tracy if profile feature is enabled
    #[cfg(feature = "profile")]
    {
        use tracing_subscriber::prelude::*;
        let tracy_layer = tracing_tracy::TracyLayer::default();
        tracing_subscriber::registry().with(tracy_layer).init();
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            params,
            frames,
            sample_rate,
            ratio,
            clock_ms,
            warmup,
        } => {
            let mut params = match params {
                Some(path) => load_params(&path)?,
                None => SequencerParams::default(),
            };
            if let Some(index) = ratio {
                params.ratio = stepseq_core::ClockRatio::from_index(index);
            }
            run_benchmark(params, frames, sample_rate, clock_ms, warmup);
        }
        Commands::Smoke { frames } => {
            smoke_test(frames);
        }
    }

    Ok(())
}

fn load_params(path: &PathBuf) -> Result<SequencerParams> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read params file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse params file {}", path.display()))
}

/// Square clock, high for the first tenth of each period.
struct Clock {
    period: u64,
    frame: u64,
}

impl Clock {
    fn new(period_ms: f32, sample_rate: f32) -> Self {
        Self {
            period: ((period_ms * sample_rate / 1000.0) as u64).max(2),
            frame: 0,
        }
    }

    /// First rising edge lands one period in.
    fn next(&mut self) -> Signal {
        let high = self.frame >= self.period && self.frame % self.period < self.period / 10 + 1;
        self.frame += 1;
        Signal::Volts(if high { 10.0 } else { 0.0 })
    }
}

/// Process a single frame
#[inline(always)]
fn process_frame(seq: &mut StepSequencer, clock: &mut Clock, sample_rate: f32) {
    #[cfg(feature = "profile")]
    let _span = tracing::info_span!("process_frame").entered();

    seq.params_mut().clock = clock.next();
    seq.update(sample_rate);
}

fn output(seq: &StepSequencer) -> [f32; 4] {
    let out = seq.outputs();
    [out.pitch, out.gate, out.end_of_cycle, out.mod_a]
}

fn run_benchmark(
    params: SequencerParams,
    frames: u64,
    sample_rate: f32,
    clock_ms: f32,
    warmup: u64,
) {
    println!(
        "Engine: ratio {}, direction {}, window {} steps",
        params.ratio.label(),
        params.direction.label(),
        params.window().len()
    );

    let mut seq = StepSequencer::with_seed(params, 1);
    let mut clock = Clock::new(clock_ms, sample_rate);

    println!(
        "\nRunning benchmark: {} frames ({:.2}s at {}Hz)",
        frames,
        frames as f64 / sample_rate as f64,
        sample_rate
    );
    println!("  Warmup: {} frames", warmup);
    println!("  Clock:  {}ms", clock_ms);

    // Warmup phase
    print!("Warming up...");
    for _ in 0..warmup {
        process_frame(&mut seq, &mut clock, sample_rate);
        black_box(output(&seq));
    }
    println!(" done");

    // Benchmark phase
    print!("Benchmarking...");
    let start = Instant::now();
    let mut advances = 0u64;

    for _ in 0..frames {
        process_frame(&mut seq, &mut clock, sample_rate);
        black_box(output(&seq));
        if seq.last_step_event().is_some() {
            advances += 1;
        }
    }

    let elapsed = start.elapsed();
    println!(" done\n");

    // Results
    let total_ns = elapsed.as_nanos() as f64;
    let ns_per_frame = total_ns / frames.max(1) as f64;
    let frames_per_sec = 1_000_000_000.0 / ns_per_frame;
    let realtime_budget_ns = 1_000_000_000.0 / sample_rate as f64;
    let budget_usage = (ns_per_frame / realtime_budget_ns) * 100.0;

    println!("Results:");
    println!("  Total time:     {:?}", elapsed);
    println!("  Frames:         {}", frames);
    println!("  Step advances:  {}", advances);
    println!("  ns/frame:       {:.2}", ns_per_frame);
    println!("  frames/sec:     {:.0}", frames_per_sec);
    println!(
        "  Real-time budget: {:.2} ns/frame @ {}Hz",
        realtime_budget_ns, sample_rate
    );
    println!("  Budget usage:   {:.2}%", budget_usage);

    if budget_usage > 100.0 {
        println!("\n  ⚠️  WARNING: Exceeds real-time budget!");
    } else {
        println!(
            "\n  ✓ Within real-time budget ({:.1}x headroom)",
            100.0 / budget_usage
        );
    }
}

fn smoke_test(frames: u64) {
    println!("Running smoke test with {} frames per direction\n", frames);

    for &direction in Direction::ALL {
        print!("Testing {}... ", direction.label());

        let params = SequencerParams {
            direction,
            ..Default::default()
        };
        let mut seq = StepSequencer::with_seed(params, 7);
        let mut clock = Clock::new(250.0, DEFAULT_SAMPLE_RATE);

        let start = Instant::now();
        let mut advances = 0u64;
        for _ in 0..frames {
            process_frame(&mut seq, &mut clock, DEFAULT_SAMPLE_RATE);
            black_box(output(&seq));
            if seq.last_step_event().is_some() {
                advances += 1;
            }
        }
        let elapsed = start.elapsed();
        let ns_per_frame = elapsed.as_nanos() as f64 / frames.max(1) as f64;

        if advances > 0 || frames < DEFAULT_SAMPLE_RATE as u64 {
            println!("OK ({:.2} ns/frame, {} advances)", ns_per_frame, advances);
        } else {
            println!("FAILED: no step advances");
        }
    }
}
