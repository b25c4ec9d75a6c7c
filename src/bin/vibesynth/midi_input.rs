//! MIDI input - midir connection decoding into a ring buffer

use color_eyre::eyre::{eyre, Result as EyreResult};
use midir::{Ignore, MidiInput, MidiInputConnection};
use rtrb::{Consumer, RingBuffer};
use tracing::{debug, info, trace};

use vibesynth::io::MidiEvent;

const EVENT_CAPACITY: usize = 512;

/// An open MIDI input. Dropping it closes the port.
pub struct MidiConnection {
    _connection: MidiInputConnection<()>,
    pub port_name: String,
    pub events: Consumer<MidiEvent>,
}

/// Connect to the first input port whose name contains `filter`, or the
/// first port at all. `Ok(None)` when there are no ports.
pub fn connect(filter: Option<&str>) -> EyreResult<Option<MidiConnection>> {
    let mut input = MidiInput::new("vibesynth").map_err(|err| eyre!("MIDI unavailable: {err}"))?;
    input.ignore(Ignore::All);

    let ports = input.ports();
    let mut named = Vec::with_capacity(ports.len());
    for port in ports {
        if let Ok(name) = input.port_name(&port) {
            named.push((port, name));
        }
    }
    debug!(ports = ?named.iter().map(|(_, n)| n).collect::<Vec<_>>(), "MIDI inputs");

    let chosen = match filter {
        Some(filter) => {
            let needle = filter.to_lowercase();
            named
                .into_iter()
                .find(|(_, name)| name.to_lowercase().contains(&needle))
        }
        None => named.into_iter().next(),
    };
    let Some((port, port_name)) = chosen else {
        return Ok(None);
    };

    let (mut tx, events) = RingBuffer::<MidiEvent>::new(EVENT_CAPACITY);
    let connection = input
        .connect(
            &port,
            "vibesynth-in",
            move |_stamp, bytes, _| match MidiEvent::from_bytes(bytes) {
                Some(event) => {
                    if tx.push(event).is_err() {
                        trace!(?event, "MIDI queue full, event dropped");
                    }
                }
                None => trace!(?bytes, "ignored MIDI message"),
            },
            (),
        )
        .map_err(|err| eyre!("failed to connect MIDI port {port_name}: {err}"))?;

    info!(port = %port_name, "MIDI input connected");
    Ok(Some(MidiConnection {
        _connection: connection,
        port_name,
        events,
    }))
}
