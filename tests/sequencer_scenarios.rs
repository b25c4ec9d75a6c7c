//! The step sequencer driving a real engine through the allocator seam.

use rand::{rngs::StdRng, SeedableRng};

use vibesynth::{
    engine::allocator::VoiceAllocator,
    sequencing::{
        sequencer::GATE_FRACTION, SequencerConfig, Step, StepNote, StepSequencer, STEP_COUNT,
    },
    synth::VoiceHandle,
    EngineConfig, SynthEngine, SynthError,
};

const SAMPLE_RATE: f32 = 8_000.0;
/// Control-thread tick period: 10 ms of audio.
const TICK_FRAMES: usize = 80;

/// Wraps the engine and remembers every trigger the sequencer makes.
struct Recorder {
    engine: SynthEngine,
    triggers: Vec<(f32, f64, VoiceHandle)>,
}

impl Recorder {
    fn new() -> Self {
        Self {
            engine: SynthEngine::new(
                EngineConfig::default()
                    .with_sample_rate(SAMPLE_RATE)
                    .with_max_voices(16),
            ),
            triggers: Vec::new(),
        }
    }
}

impl VoiceAllocator for Recorder {
    fn now(&self) -> f64 {
        self.engine.now()
    }

    fn trigger_at(&mut self, frequency: f32, at: f64) -> Result<VoiceHandle, SynthError> {
        let handle = self.engine.trigger_at(frequency, at)?;
        self.triggers.push((frequency, at, handle));
        Ok(handle)
    }

    fn release_at(&mut self, handle: VoiceHandle, at: f64) -> bool {
        self.engine.release_at(handle, at)
    }

    fn cancel(&mut self, handle: VoiceHandle) -> bool {
        self.engine.cancel(handle)
    }
}

/// Tick, then render one tick's worth of audio.
fn step_clock(seq: &mut StepSequencer, rec: &mut Recorder) {
    seq.tick(rec);
    let mut block = [0.0f32; TICK_FRAMES];
    rec.engine.render_block(&mut block);
    seq.tick(rec);
}

/// Run the clock until the visible step is `target`.
fn run_until_step(seq: &mut StepSequencer, rec: &mut Recorder, target: usize) {
    for _ in 0..1_000 {
        if seq.current_step() == target {
            return;
        }
        step_clock(seq, rec);
    }
    panic!("never reached step {target}");
}

fn full_pattern(seq: &mut StepSequencer) {
    for i in 0..STEP_COUNT {
        seq.pattern_mut().toggle(i);
    }
}

#[test]
fn steps_start_on_the_audio_grid_with_short_gates() {
    let mut seq = StepSequencer::new(SequencerConfig {
        bpm: 120.0,
        ..Default::default()
    });
    full_pattern(&mut seq);
    let mut rec = Recorder::new();

    seq.play(rec.now());
    for _ in 0..50 {
        step_clock(&mut seq, &mut rec);
    }

    let interval = seq.step_interval();
    assert!(rec.triggers.len() >= 4);
    for (k, &(freq, at, _)) in rec.triggers.iter().enumerate() {
        assert_eq!(freq, StepNote::default_note().frequency);
        assert!((at - k as f64 * interval).abs() < 1e-9, "step {k} at {at}");
    }

    // The newest voice is still live; its gate closes at 80% of a step
    let &(_, at, handle) = rec.triggers.last().unwrap();
    let voice = rec.engine.voices().voice(handle).unwrap();
    let released = voice.released_at().unwrap();
    assert!((released - (at + interval * GATE_FRACTION)).abs() < 1e-9);
}

#[test]
fn live_recording_writes_the_sounding_step() {
    let mut seq = StepSequencer::default();
    let mut rec = Recorder::new();
    seq.set_recording(true);

    seq.play(rec.now());
    run_until_step(&mut seq, &mut rec, 5);

    let written = seq.record_note(StepNote::new("G4", 392.0));
    assert_eq!(written, Some(5));
    assert_eq!(seq.current_step(), 5, "live recording does not move the playhead");
    assert_eq!(
        seq.pattern().get(5),
        &Step::Note {
            note: StepNote::new("G4", 392.0),
            active: true
        }
    );
    assert_eq!(seq.pattern().active_count(), 1);

    // Next time round, the recorded step plays
    for _ in 0..300 {
        step_clock(&mut seq, &mut rec);
    }
    assert!(rec.triggers.iter().any(|&(freq, _, _)| freq == 392.0));
}

#[test]
fn playhead_wraps_from_last_step_to_first() {
    let mut seq = StepSequencer::default();
    let mut rec = Recorder::new();
    seq.play(rec.now());

    let mut visited = vec![seq.current_step()];
    for _ in 0..250 {
        step_clock(&mut seq, &mut rec);
        if visited.last() != Some(&seq.current_step()) {
            visited.push(seq.current_step());
        }
    }

    let expected: Vec<usize> = (0..STEP_COUNT).chain(0..4).collect();
    assert_eq!(&visited[..expected.len()], &expected[..]);
}

#[test]
fn stop_cancels_future_steps_and_resume_continues() {
    let mut seq = StepSequencer::default();
    full_pattern(&mut seq);
    seq.pattern_mut().set_note(6, StepNote::new("A4", 440.0));
    let mut rec = Recorder::new();

    seq.play(rec.now());
    run_until_step(&mut seq, &mut rec, 5);
    seq.stop(&mut rec);

    assert!(!seq.is_playing());
    assert_eq!(seq.cursor(), 5);
    let now = rec.now();
    for handle in rec.engine.voices().handles() {
        let voice = rec.engine.voices().voice(handle).unwrap();
        assert!(voice.start_time() <= now, "future step survived stop");
    }

    // Selecting while stopped does not move the resume point
    seq.select_step(12);
    assert_eq!(seq.cursor(), 5);
    seq.select_step(5);

    for _ in 0..20 {
        step_clock(&mut seq, &mut rec);
    }
    assert_eq!(seq.current_step(), 5, "stopped transport does not advance");

    rec.triggers.clear();
    let resume_at = rec.now();
    seq.play(resume_at);
    run_until_step(&mut seq, &mut rec, 7);

    let (freq, at, _) = rec.triggers[0];
    assert!((at - resume_at).abs() < 1e-9, "resumes immediately");
    assert_eq!(freq, StepNote::default_note().frequency, "step 5 first");
    assert_eq!(rec.triggers[1].0, 440.0, "then step 6");
}

#[test]
fn step_entry_fills_pattern_while_stopped() {
    let mut seq = StepSequencer::default();
    seq.toggle_recording();
    assert!(seq.is_recording());

    for name in ["C3", "D#3", "F3", "G3"] {
        let midi = vibesynth::sequencing::parse_note_name(name).unwrap();
        seq.record_note(StepNote::from_midi(midi));
    }

    assert_eq!(seq.current_step(), 4);
    let names: Vec<&str> = (0..4)
        .filter_map(|i| seq.pattern().get(i).note())
        .map(|note| note.name.as_str())
        .collect();
    assert_eq!(names, ["C3", "D#3", "F3", "G3"]);
}

#[test]
fn randomize_is_seeded_and_clear_empties() {
    let mut a = StepSequencer::default();
    let mut b = StepSequencer::default();
    a.randomize(&mut StdRng::seed_from_u64(42));
    b.randomize(&mut StdRng::seed_from_u64(42));
    assert_eq!(a.pattern().steps(), b.pattern().steps());

    let palette = StepNote::palette();
    for step in a.pattern().steps() {
        match step {
            Step::Empty => {}
            Step::Note { note, active } => {
                assert!(*active);
                assert!(palette.contains(note), "{note:?} not in palette");
            }
        }
    }

    // Over many seeds, both rests and notes show up at roughly 40/60
    let mut rests = 0;
    for seed in 0..100 {
        let mut seq = StepSequencer::default();
        seq.randomize(&mut StdRng::seed_from_u64(seed));
        rests += STEP_COUNT - seq.pattern().active_count();
    }
    let rest_share = rests as f64 / (100 * STEP_COUNT) as f64;
    assert!((0.3..0.5).contains(&rest_share), "rest share {rest_share}");

    a.clear();
    assert_eq!(a.pattern().active_count(), 0);
    assert!(a.pattern().steps().iter().all(Step::is_empty));
}

#[test]
fn tempo_change_applies_to_next_unscheduled_step() {
    let mut seq = StepSequencer::default();
    full_pattern(&mut seq);
    let mut rec = Recorder::new();

    seq.play(rec.now());
    run_until_step(&mut seq, &mut rec, 2);
    seq.set_bpm(60.0);
    for _ in 0..200 {
        step_clock(&mut seq, &mut rec);
    }

    let gaps: Vec<f64> = rec
        .triggers
        .windows(2)
        .map(|pair| pair[1].1 - pair[0].1)
        .collect();
    assert!((gaps[0] - 0.125).abs() < 1e-9);
    assert!((gaps.last().unwrap() - 0.25).abs() < 1e-9);
}
