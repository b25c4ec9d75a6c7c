//! On-screen keyboard widget - held notes lit, computer keys labelled

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use vibesynth::io::{keyboard::midi_to_key, KeyboardLayout};

pub fn render_keyboard(frame: &mut Frame, area: Rect, layout: &KeyboardLayout, held: &[u8]) {
    let block = Block::default()
        .title(format!(" Keys (octave {}) ", layout.start_octave()))
        .borders(Borders::ALL);

    let mut keys = Vec::with_capacity(layout.keys().len());
    let mut labels = Vec::with_capacity(layout.keys().len());

    for key in layout.keys() {
        let style = match (held.contains(&key.midi), key.is_black) {
            (true, _) => Style::default().fg(Color::Black).bg(Color::Cyan),
            (false, true) => Style::default().fg(Color::White).bg(Color::Black),
            (false, false) => Style::default().fg(Color::Black).bg(Color::White),
        };
        keys.push(Span::styled(if key.is_black { "▀ " } else { "  " }, style));

        let label = midi_to_key(key.midi).map_or(' ', |c| c.to_ascii_uppercase());
        labels.push(Span::styled(
            format!("{label} "),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let lines = vec![Line::from(keys), Line::from(labels)];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
