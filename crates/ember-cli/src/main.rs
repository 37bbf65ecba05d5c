//! Ember CLI - inspect, simulate and convert particle effect files

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{convert, frames, info, simulate};
use config::SimulationConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Tools for 2D particle effects and keyframe sequences", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe the emitters in an effect file
    Info {
        /// Effect file (.toml or legacy text)
        file: String,
    },

    /// Run an effect headlessly and report particle counts
    Simulate {
        /// Effect file (.toml or legacy text)
        file: String,

        /// Simulated seconds
        #[arg(long)]
        seconds: Option<f32>,

        /// Seconds per update step
        #[arg(long)]
        dt: Option<f32>,

        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Print a status line every N steps (0 = never)
        #[arg(long)]
        report_every: Option<usize>,

        /// Run configuration file (default: ./ember.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Force every emitter to restart after its duration
        #[arg(long = "loop")]
        loop_effect: bool,
    },

    /// Convert between the text and TOML effect formats
    Convert {
        /// Source effect file
        input: String,

        /// Destination; a .toml extension writes TOML, anything else text
        output: String,
    },

    /// Preview the frame indices a keyframe sequence produces
    Frames {
        /// Number of frames in the sequence
        #[arg(long, default_value = "4")]
        count: usize,

        /// Seconds each frame is shown
        #[arg(long, default_value = "0.1")]
        frame_duration: f32,

        /// normal, reversed, loop, loop-reversed, loop-pingpong or loop-random
        #[arg(long, default_value = "normal")]
        mode: String,

        /// Preview up to this state time in seconds
        #[arg(long, default_value = "1.0")]
        time: f32,

        /// Sampling interval (default: one frame duration)
        #[arg(long)]
        step: Option<f32>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { file } => info::run(&file),
        Commands::Simulate {
            file,
            seconds,
            dt,
            seed,
            report_every,
            config,
            loop_effect,
        } => {
            let mut run_config = SimulationConfig::load(config.as_deref())?;
            run_config.apply_overrides(dt, seconds, seed, report_every);
            if !(run_config.dt.is_finite() && run_config.dt > 0.0) {
                anyhow::bail!("--dt must be positive, got {}", run_config.dt);
            }
            simulate::run(simulate::SimulateArgs {
                file,
                config: run_config,
                loop_effect,
            })
        }
        Commands::Convert { input, output } => convert::run(&input, &output),
        Commands::Frames {
            count,
            frame_duration,
            mode,
            time,
            step,
        } => frames::run(frames::FramesArgs {
            count,
            frame_duration,
            mode,
            time,
            step,
        }),
    }
}
