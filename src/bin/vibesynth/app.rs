//! App - wires the engine, sequencer, device input and UI together

use std::{
    collections::HashMap,
    io,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use color_eyre::eyre::{eyre, Result as EyreResult};
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
};
use ratatui::DefaultTerminal;
use tracing::{debug, info, trace, warn};

use vibesynth::{
    io::{
        key_to_midi, note_action, ControlAction, ControlMapper, CutoffRange, KeyboardKey,
        KeyboardLayout, MidiEvent, NoteAction, PanelEdit,
    },
    patch::{PatchUpdate, MAX_OCTAVE, MIN_OCTAVE},
    sequencing::{SequencerConfig, StepNote, StepSequencer},
    SynthEngine,
};

use super::{
    audio::{AudioOutput, Meter},
    midi_input::{self, MidiConnection},
    ui::{self, EngineSnapshot, View},
};

/// How long a computer-key note sounds when the terminal never reports key-up.
const AUTO_RELEASE: Duration = Duration::from_millis(300);
/// How long a status message stays in the transport bar.
const STATUS_TTL: Duration = Duration::from_secs(3);
const BPM_STEP: f32 = 5.0;
/// Cutoff changes by a sixth of an octave per `[` / `]` press.
const CUTOFF_STEP: f32 = 1.122_462;
const FRAME_POLL: Duration = Duration::from_millis(16);

pub struct AppOptions {
    pub bpm: f32,
    pub start_octave: i8,
    pub cutoff_range: CutoffRange,
    pub max_voices: usize,
    pub midi_port: Option<String>,
    pub midi_enabled: bool,
}

pub struct App {
    options: AppOptions,
    sequencer: StepSequencer,
    mapper: ControlMapper,
    keyboard: KeyboardLayout,
    /// Computer-key notes waiting for an automatic release.
    auto_release: HashMap<String, Instant>,
    key_release_reported: bool,
    meter: Meter,
    status: Option<(String, Instant)>,
    should_quit: bool,
}

impl App {
    pub fn new(options: AppOptions) -> Self {
        Self {
            sequencer: StepSequencer::new(SequencerConfig {
                bpm: options.bpm,
                ..Default::default()
            }),
            mapper: ControlMapper::new(options.cutoff_range),
            keyboard: KeyboardLayout::new(options.start_octave),
            auto_release: HashMap::new(),
            key_release_reported: false,
            meter: Meter::default(),
            status: None,
            should_quit: false,
            options,
        }
    }

    /// Open audio and MIDI, take over the terminal, and run until quit.
    pub fn run(mut self) -> EyreResult<()> {
        let mut audio = AudioOutput::open(self.options.max_voices)?;
        let engine = audio.engine();
        {
            let mut engine = lock(&engine)?;
            if !audio.start(&mut engine) {
                self.set_status("audio suspended: press a note to retry");
            }
        }

        let mut midi = if self.options.midi_enabled {
            match midi_input::connect(self.options.midi_port.as_deref()) {
                Ok(Some(connection)) => Some(connection),
                Ok(None) => {
                    info!("no MIDI input ports");
                    None
                }
                Err(err) => {
                    warn!(%err, "MIDI input skipped");
                    None
                }
            }
        } else {
            None
        };

        let mut terminal = ratatui::init();
        self.key_release_reported = enable_key_release();
        debug!(key_release = self.key_release_reported, "terminal ready");

        let result = self.event_loop(&mut terminal, &mut audio, &engine, midi.as_mut());

        if self.key_release_reported {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        ratatui::restore();
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut DefaultTerminal,
        audio: &mut AudioOutput,
        engine: &Arc<Mutex<SynthEngine>>,
        mut midi: Option<&mut MidiConnection>,
    ) -> EyreResult<()> {
        while !self.should_quit {
            while let Ok(meter) = audio.meter_rx.pop() {
                self.meter = meter;
            }

            let snapshot = {
                let mut engine = lock(engine)?;
                if engine.take_resume_request() && audio.start(&mut engine) {
                    info!("audio output resumed");
                    self.set_status("audio resumed");
                }
                if let Some(midi) = midi.as_deref_mut() {
                    self.drain_midi(midi, &mut engine);
                }
                self.sequencer.tick(&mut *engine);
                self.expire_auto_release(&mut engine);
                EngineSnapshot::capture(&engine, &self.keyboard)
            };

            if self
                .status
                .as_ref()
                .is_some_and(|(_, at)| at.elapsed() > STATUS_TTL)
            {
                self.status = None;
            }

            let view = View {
                sequencer: &self.sequencer,
                keyboard: &self.keyboard,
                engine: &snapshot,
                meter: self.meter,
                sample_rate: audio.sample_rate,
                cutoff_range: self.mapper.cutoff_range(),
                midi_port: midi.as_deref().map(|m| m.port_name.as_str()),
                status: self.status.as_ref().map(|(msg, _)| msg.as_str()),
            };
            terminal.draw(|frame| ui::render(frame, &view))?;

            if event::poll(FRAME_POLL)? {
                let event = event::read()?;
                let mut engine = lock(engine)?;
                if let Event::Key(key) = event {
                    self.handle_key(key, &mut engine);
                }
            }
        }

        lock(engine)?.release_all();
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, engine: &mut SynthEngine) {
        match key.kind {
            KeyEventKind::Repeat => return,
            KeyEventKind::Release => {
                if let KeyCode::Char(c) = key.code {
                    if let Some(midi) = key_to_midi(c) {
                        self.note_off(&KeyboardKey::from_midi(midi).name, engine);
                    }
                }
                return;
            }
            KeyEventKind::Press => {}
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(' ') => self.sequencer.toggle_playback(engine),
            KeyCode::Tab => self.sequencer.toggle_recording(),
            KeyCode::Left => self.sequencer.select_previous(),
            KeyCode::Right => self.sequencer.select_next(),
            KeyCode::Enter => {
                let step = self.sequencer.current_step();
                self.sequencer.toggle_step(step);
            }
            KeyCode::F(5) => self.sequencer.randomize(&mut rand::thread_rng()),
            KeyCode::Delete => self.sequencer.clear(),
            KeyCode::Up => self.sequencer.nudge_bpm(BPM_STEP),
            KeyCode::Down => self.sequencer.nudge_bpm(-BPM_STEP),
            KeyCode::PageUp => self.shift_octave(1, engine),
            KeyCode::PageDown => self.shift_octave(-1, engine),
            KeyCode::Char('[') => self.nudge_cutoff(-1, engine),
            KeyCode::Char(']') => self.nudge_cutoff(1, engine),
            KeyCode::Char('\\') => {
                let range = self.mapper.cutoff_range().next();
                self.mapper.set_cutoff_range(range);
                self.set_status(format!("cutoff range: {range}"));
            }
            KeyCode::Char(c) => {
                if let Some(edit) = PanelEdit::from_key(c) {
                    self.panel_edit(edit, engine);
                } else if let Some(midi) = key_to_midi(c) {
                    let key = KeyboardKey::from_midi(midi);
                    self.note_on(&key.name, key.frequency, engine);
                    if !self.key_release_reported {
                        self.auto_release.insert(key.name, Instant::now() + AUTO_RELEASE);
                    }
                }
            }
            _ => {}
        }
    }

    fn drain_midi(&mut self, midi: &mut MidiConnection, engine: &mut SynthEngine) {
        while let Ok(event) = midi.events.pop() {
            match note_action(event) {
                Some(NoteAction::On {
                    name, frequency, ..
                }) => self.note_on(&name, frequency, engine),
                Some(NoteAction::Off { name, .. }) => self.note_off(&name, engine),
                None => {
                    if let MidiEvent::ControlChange {
                        controller, value, ..
                    } = event
                    {
                        self.control_change(controller, value, engine);
                    }
                }
            }
        }
    }

    fn control_change(&mut self, controller: u8, value: u8, engine: &mut SynthEngine) {
        let patch = engine.params();
        match self.mapper.map_cc(controller, value, &patch) {
            Some(ControlAction::Patch(update)) => engine.update_params(update),
            Some(ControlAction::ReverbSend(level)) => {
                debug!(level, "reverb send has no stage to drive");
                self.set_status(format!("reverb send {level:.2}"));
            }
            None => trace!(controller, value, "unmapped controller"),
        }
    }

    fn note_on(&mut self, name: &str, frequency: f32, engine: &mut SynthEngine) {
        match engine.trigger_note(name, frequency) {
            Ok(Some(_)) => {}
            Ok(None) => return,
            Err(err) => {
                warn!(%err, note = name, "note dropped");
                self.set_status(err.to_string());
            }
        }
        if let Some(step) = self.sequencer.record_note(StepNote::new(name, frequency)) {
            debug!(step, note = name, "recorded");
        }
    }

    fn note_off(&mut self, name: &str, engine: &mut SynthEngine) {
        self.auto_release.remove(name);
        engine.release_note(name);
    }

    fn expire_auto_release(&mut self, engine: &mut SynthEngine) {
        if self.auto_release.is_empty() {
            return;
        }
        let now = Instant::now();
        let expired: Vec<String> = self
            .auto_release
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(name, _)| name.clone())
            .collect();
        for name in expired {
            self.note_off(&name, engine);
        }
    }

    fn shift_octave(&mut self, delta: i8, engine: &mut SynthEngine) {
        let octave = (engine.params().octave + delta).clamp(MIN_OCTAVE, MAX_OCTAVE);
        engine.update_params(PatchUpdate {
            octave: Some(octave),
            ..Default::default()
        });
    }

    fn nudge_cutoff(&mut self, direction: i32, engine: &mut SynthEngine) {
        let (lo, hi) = self.mapper.cutoff_range().bounds();
        let cutoff = (engine.params().filter_cutoff * CUTOFF_STEP.powi(direction)).clamp(lo, hi);
        engine.update_params(PatchUpdate {
            filter_cutoff: Some(cutoff),
            ..Default::default()
        });
    }

    fn panel_edit(&mut self, edit: PanelEdit, engine: &mut SynthEngine) {
        let update = edit.update(&engine.params());
        debug!(edit = edit.label(), ?update, "panel edit");
        engine.update_params(update);
        self.set_status(edit.label());
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
    }
}

fn lock(engine: &Mutex<SynthEngine>) -> EyreResult<MutexGuard<'_, SynthEngine>> {
    engine.lock().map_err(|_| eyre!("audio engine lock poisoned"))
}

/// Ask the terminal to report key releases. Returns whether it will.
fn enable_key_release() -> bool {
    matches!(crossterm::terminal::supports_keyboard_enhancement(), Ok(true))
        && execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )
        .is_ok()
}
