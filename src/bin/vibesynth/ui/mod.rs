//! TUI module for vibesynth
//!
//! Everything here draws from a [`View`] built once per frame, so the engine
//! lock is never held while the terminal is being written.

mod grid;
mod keyboard;
mod patch;
mod transport;

use std::sync::Arc;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Paragraph, Wrap},
    Frame,
};

use vibesynth::{
    dsp::EnvelopeStage,
    io::{CutoffRange, KeyboardLayout},
    patch::Patch,
    sequencing::StepSequencer,
    OutputState, SynthEngine,
};

use super::audio::Meter;

/// Engine state copied out under the lock.
pub struct EngineSnapshot {
    pub patch: Arc<Patch>,
    pub active_voices: usize,
    /// Voices whose amplitude envelope is in its release tail.
    pub releasing_voices: usize,
    pub max_voices: usize,
    pub output: OutputState,
    /// MIDI numbers of on-screen keys that are currently held.
    pub held: Vec<u8>,
}

impl EngineSnapshot {
    pub fn capture(engine: &SynthEngine, keyboard: &KeyboardLayout) -> Self {
        let voices = engine.voices();
        let now = engine.now();
        Self {
            patch: engine.params(),
            active_voices: voices.active_count(),
            releasing_voices: voices
                .handles()
                .filter_map(|handle| voices.voice(handle))
                .filter(|voice| voice.amp_stage_at(now) == EnvelopeStage::Release)
                .count(),
            max_voices: voices.max_voices(),
            output: engine.output_state(),
            held: keyboard
                .keys()
                .iter()
                .filter(|key| voices.is_held(&key.name))
                .map(|key| key.midi)
                .collect(),
        }
    }
}

pub struct View<'a> {
    pub sequencer: &'a StepSequencer,
    pub keyboard: &'a KeyboardLayout,
    pub engine: &'a EngineSnapshot,
    pub meter: Meter,
    pub sample_rate: f32,
    pub cutoff_range: CutoffRange,
    pub midi_port: Option<&'a str>,
    pub status: Option<&'a str>,
}

const HELP: &str = " [a..;] Play  [Space] Play/Stop  [Tab] Rec  [←→] Step  [Enter] Toggle  \
[F5] Random  [Del] Clear  [↑↓] BPM  [PgUp/PgDn] Octave  [ [ ] ] Cutoff  [\\] Range  \
[1-3] Shapes  [4/5] LFO→flt/amp  [-=] Mix  [zx cv bn m,] Filter env  [Q] Quit";

pub fn render(frame: &mut Frame, view: &View) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Transport bar
            Constraint::Length(5), // Step grid
            Constraint::Length(6), // Patch readout
            Constraint::Length(4), // Keyboard
            Constraint::Min(0),
            Constraint::Length(2), // Help bar
        ])
        .split(frame.area());

    transport::render_transport(frame, chunks[0], view);
    grid::render_grid(frame, chunks[1], view.sequencer);
    patch::render_patch(frame, chunks[2], &view.engine.patch, view.cutoff_range);
    keyboard::render_keyboard(frame, chunks[3], view.keyboard, &view.engine.held);

    let help = Paragraph::new(HELP)
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true });
    frame.render_widget(help, chunks[5]);
}
