/// A decoded channel-voice MIDI message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    /// Decode raw bytes as delivered by a MIDI input port.
    ///
    /// A note-on with velocity 0 is a note-off. Anything that is not a
    /// complete channel-voice message (sysex, clock, truncated data) is `None`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let status = *bytes.first()?;
        let channel = status & 0x0F;
        let data = |i: usize| bytes.get(i).map(|b| b & 0x7F);

        let event = match status & 0xF0 {
            0x90 => {
                let (key, velocity) = (data(1)?, data(2)?);
                if velocity > 0 {
                    MidiEvent::NoteOn {
                        channel,
                        key,
                        velocity,
                    }
                } else {
                    MidiEvent::NoteOff {
                        channel,
                        key,
                        velocity: 0,
                    }
                }
            }
            0x80 => MidiEvent::NoteOff {
                channel,
                key: data(1)?,
                velocity: data(2)?,
            },
            0xB0 => MidiEvent::ControlChange {
                channel,
                controller: data(1)?,
                value: data(2)?,
            },
            0xC0 => MidiEvent::ProgramChange {
                channel,
                program: data(1)?,
            },
            0xE0 => {
                let lsb = data(1)? as i16;
                let msb = data(2)? as i16;
                MidiEvent::PitchBend {
                    channel,
                    value: ((msb << 7) | lsb) - 8192,
                }
            }
            _ => return None,
        };

        Some(event)
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::ControlChange { channel, .. }
            | MidiEvent::PitchBend { channel, .. }
            | MidiEvent::ProgramChange { channel, .. } => channel,
        }
    }
}
