//! Audio output - cpal stream pulling blocks from the shared engine

use std::sync::{Arc, Mutex};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{debug, warn};

use vibesynth::{EngineConfig, OutputState, SynthEngine, MAX_BLOCK_SIZE};

/// Meter frames buffered between the audio thread and the UI.
const METER_CAPACITY: usize = 256;

/// Level of one rendered block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Meter {
    pub peak: f32,
    pub rms: f32,
}

impl Meter {
    pub fn from_block(block: &[f32]) -> Self {
        if block.is_empty() {
            return Self::default();
        }
        let peak = block.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (block.iter().map(|&x| x * x).sum::<f32>() / block.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub struct AudioOutput {
    stream: cpal::Stream,
    engine: Arc<Mutex<SynthEngine>>,
    pub meter_rx: Consumer<Meter>,
    pub sample_rate: f32,
}

impl AudioOutput {
    /// Open the default output device and build an engine running at its rate.
    ///
    /// The stream is created but not started; see [`AudioOutput::start`].
    pub fn open(max_voices: usize) -> EyreResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        debug!(
            device = device.name().unwrap_or_default(),
            sample_rate, channels, "audio device opened"
        );

        let engine = Arc::new(Mutex::new(SynthEngine::new(
            EngineConfig::default()
                .with_sample_rate(sample_rate)
                .with_max_voices(max_voices),
        )));

        let (meter_tx, meter_rx) = RingBuffer::<Meter>::new(METER_CAPACITY);
        let stream = build_stream(&device, &config.into(), channels, &engine, meter_tx)?;

        Ok(Self {
            stream,
            engine,
            meter_rx,
            sample_rate,
        })
    }

    pub fn engine(&self) -> Arc<Mutex<SynthEngine>> {
        Arc::clone(&self.engine)
    }

    /// Start (or restart) the stream. Failure leaves the engine suspended.
    pub fn start(&self, engine: &mut SynthEngine) -> bool {
        match self.stream.play() {
            Ok(()) => {
                engine.set_output_state(OutputState::Running);
                true
            }
            Err(err) => {
                warn!(%err, "audio output could not start");
                engine.set_output_state(OutputState::Suspended);
                false
            }
        }
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    engine: &Arc<Mutex<SynthEngine>>,
    mut meter_tx: Producer<Meter>,
) -> EyreResult<cpal::Stream> {
    let render_engine = Arc::clone(engine);
    let error_engine = Arc::clone(engine);
    let mut block_buf = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _| {
                let Ok(mut engine) = render_engine.lock() else {
                    data.fill(0.0);
                    return;
                };
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut block_buf[..frames];
                    engine.render_block(block);

                    // A full meter queue just drops the reading.
                    let _ = meter_tx.push(Meter::from_block(block));

                    // Mono to all channels
                    let out_off = frames_written * channels;
                    let out = &mut data[out_off..out_off + frames * channels];
                    for (frame, &s) in out.chunks_exact_mut(channels).zip(block.iter()) {
                        frame.fill(s);
                    }

                    frames_written += frames;
                }
            },
            move |err| {
                warn!(%err, "audio stream error");
                if let Ok(mut engine) = error_engine.lock() {
                    engine.set_output_state(OutputState::Suspended);
                }
            },
            None,
        )
        .wrap_err("failed to build output stream")?;

    Ok(stream)
}
