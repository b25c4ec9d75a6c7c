//! Transport bar widget - play state, tempo, voices and output level

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use vibesynth::{sequencing::STEP_COUNT, OutputState};

use super::View;

pub fn render_transport(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default().title(" vibesynth ").borders(Borders::ALL);
    let seq = view.sequencer;
    let engine = view.engine;

    let (play_symbol, play_state) = if seq.is_playing() {
        ("▶", "Playing")
    } else {
        ("■", "Stopped")
    };

    let mut spans = vec![
        Span::styled(
            format!(" {play_symbol} {play_state}  "),
            Style::default().fg(if seq.is_playing() {
                Color::Green
            } else {
                Color::Yellow
            }),
        ),
        Span::styled(
            if seq.is_recording() { "● REC  " } else { "○ rec  " },
            if seq.is_recording() {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            },
        ),
        Span::styled(
            format!("BPM: {:.0}  ", seq.bpm()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Step {:2}/{STEP_COUNT}  ", seq.current_step() + 1),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Oct {:+}  ", engine.patch.octave),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!(
                "Voices {}/{} ({} rel)  ",
                engine.active_voices, engine.max_voices, engine.releasing_voices
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{:.1}kHz  ", view.sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}  ", view.meter.peak, view.meter.rms),
            Style::default().fg(Color::Magenta),
        ),
    ];

    if engine.output == OutputState::Suspended {
        spans.push(Span::styled(
            "AUDIO SUSPENDED  ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    spans.push(Span::styled(
        format!("MIDI: {}  ", view.midi_port.unwrap_or("none")),
        Style::default().fg(Color::DarkGray),
    ));

    if let Some(status) = view.status {
        spans.push(Span::styled(
            status.to_string(),
            Style::default().fg(Color::Yellow),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
