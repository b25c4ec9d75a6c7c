//! vibesynth - terminal polysynth with a 16-step sequencer
//!
//! Run with: cargo run -- --bpm 120

mod app;
mod audio;
mod midi_input;
mod ui;

use std::{fs::File, path::PathBuf, sync::Mutex};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing::Level;

use app::{App, AppOptions};
use vibesynth::{io::CutoffRange, sequencing::sequencer::DEFAULT_BPM};

#[derive(Debug, Parser)]
#[command(name = "vibesynth", version, about)]
struct Args {
    /// Sequencer tempo in beats per minute (30-300)
    #[arg(long, default_value_t = DEFAULT_BPM)]
    bpm: f32,

    /// First octave of the on-screen keyboard
    #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
    start_octave: i8,

    /// Range MIDI CC 43 sweeps the filter cutoff over
    #[arg(long, default_value_t = CutoffRange::Wide)]
    cutoff_range: CutoffRange,

    /// Voices that may sound at once
    #[arg(long, default_value_t = 32)]
    max_voices: usize,

    /// Connect to the first MIDI input whose name contains this text
    #[arg(long)]
    midi_port: Option<String>,

    /// Do not open a MIDI input
    #[arg(long)]
    no_midi: bool,

    /// Where log output goes; the terminal belongs to the UI
    #[arg(long, default_value = "vibesynth.log")]
    log_file: PathBuf,

    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();

    init_logging(&args)?;
    tracing::info!(?args, "starting");

    App::new(AppOptions {
        bpm: args.bpm,
        start_octave: args.start_octave,
        cutoff_range: args.cutoff_range,
        max_voices: args.max_voices.max(1),
        midi_port: args.midi_port,
        midi_enabled: !args.no_midi,
    })
    .run()
}

fn init_logging(args: &Args) -> EyreResult<()> {
    let file = File::create(&args.log_file)
        .wrap_err_with(|| format!("failed to create log file {}", args.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(args.log_level)
        .init();
    Ok(())
}
