//! Step grid widget - 16 cells, active steps lit, current step marked

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use vibesynth::sequencing::{Step, StepSequencer, STEP_COUNT};

const CELL_WIDTH: usize = 5;

pub fn render_grid(frame: &mut Frame, area: Rect, seq: &StepSequencer) {
    let block = Block::default().title(" Steps ").borders(Borders::ALL);
    let current = seq.current_step();
    let cursor_color = if seq.is_playing() {
        Color::Green
    } else {
        Color::Yellow
    };

    let mut numbers = Vec::with_capacity(STEP_COUNT);
    let mut cells = Vec::with_capacity(STEP_COUNT);
    let mut marker = Vec::with_capacity(STEP_COUNT);

    for (i, step) in seq.pattern().steps().iter().enumerate() {
        // Beat boundaries every four steps
        let number_style = if i % 4 == 0 {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        numbers.push(Span::styled(
            format!("{:<width$}", i + 1, width = CELL_WIDTH),
            number_style,
        ));

        let (label, style) = match step {
            Step::Empty => ("·".to_string(), Style::default().fg(Color::DarkGray)),
            Step::Note { note, active: true } => (
                note.name.clone(),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Step::Note {
                note,
                active: false,
            } => (note.name.clone(), Style::default().fg(Color::DarkGray)),
        };
        cells.push(Span::styled(
            format!("{:<width$}", label, width = CELL_WIDTH - 1),
            style,
        ));
        cells.push(Span::raw(" "));

        marker.push(Span::styled(
            format!(
                "{:<width$}",
                if i == current { "▲" } else { "" },
                width = CELL_WIDTH
            ),
            Style::default().fg(cursor_color),
        ));
    }

    let lines = vec![Line::from(numbers), Line::from(cells), Line::from(marker)];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
