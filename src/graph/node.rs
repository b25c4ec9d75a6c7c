/// Context passed to graph nodes during rendering
///
/// Contains information about what to render:
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - time: Audio-clock time of the first sample in the block, in seconds
pub struct RenderCtx {
    pub sample_rate: f32,
    pub time: f64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, time: f64) -> Self {
        Self { sample_rate, time }
    }

    /// Audio-clock time of sample `index` within the block.
    #[inline]
    pub fn sample_time(&self, index: usize) -> f64 {
        self.time + index as f64 / self.sample_rate as f64
    }
}

/// The shared real-time clock.
///
/// Counts rendered frames; every scheduling call is expressed against `now()`.
#[derive(Debug, Clone, Copy)]
pub struct AudioClock {
    sample_rate: f32,
    frames: u64,
}

impl AudioClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frames: 0,
        }
    }

    pub fn now(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Context for the block starting at the current time.
    pub fn block_ctx(&self) -> RenderCtx {
        RenderCtx::new(self.sample_rate, self.now())
    }

    pub fn advance(&mut self, frames: usize) {
        self.frames += frames as u64;
    }
}

/// Core trait for audio processing graph nodes
///
/// Generators (oscillators, constant sources) overwrite `out`; processors
/// (gain, filter, shaper) transform `out` in place.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Drop automation that finished before `before`.
    ///
    /// Default implementation does nothing (nodes without parameters).
    fn prune(&mut self, _before: f64) {}
}
