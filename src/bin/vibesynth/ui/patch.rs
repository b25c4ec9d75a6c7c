//! Patch readout widget

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use vibesynth::{io::CutoffRange, patch::Patch};

fn field(label: &str, value: String) -> [Span<'static>; 2] {
    [
        Span::styled(format!("{label} "), Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{value:<10}"), Style::default().fg(Color::White)),
    ]
}

pub fn render_patch(frame: &mut Frame, area: Rect, patch: &Patch, range: CutoffRange) {
    let block = Block::default().title(" Patch ").borders(Borders::ALL);
    let amp = patch.amp_adsr;
    let flt = patch.filter_adsr;

    let osc = [
        field("osc1", patch.osc1_waveform.to_string()),
        field("osc2", patch.osc2_waveform.to_string()),
        field("mix", format!("{:.2}", patch.osc_mix)),
        field("drive", format!("{:.2}", patch.distortion)),
    ];
    let filter = [
        field("cutoff", format!("{:.0}Hz", patch.filter_cutoff)),
        field("res", format!("{:.1}dB", patch.filter_resonance)),
        field("range", range.to_string()),
        field(
            "env",
            format!("{:.2}/{:.2}/{:.2}/{:.2}", flt.attack, flt.decay, flt.sustain, flt.release),
        ),
    ];
    let amp_line = [field(
        "amp",
        format!("{:.2}/{:.2}/{:.2}/{:.2}", amp.attack, amp.decay, amp.sustain, amp.release),
    )];
    let lfo = [
        field("lfo", patch.lfo_waveform.to_string()),
        field("rate", format!("{:.2}Hz", patch.lfo_rate)),
        field("depth", format!("{:.2}", patch.lfo_depth)),
        field(
            "to",
            match (patch.lfo_filter_mod, patch.lfo_amp_mod) {
                (true, true) => "filter+amp",
                (true, false) => "filter",
                (false, true) => "amp",
                (false, false) => "-",
            }
            .to_string(),
        ),
    ];

    let lines: Vec<Line> = [&osc[..], &filter[..], &amp_line[..], &lfo[..]]
        .into_iter()
        .map(|row| Line::from(row.iter().flatten().cloned().collect::<Vec<_>>()))
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
