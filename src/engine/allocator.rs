use crate::{error::Result, synth::VoiceHandle};

/// The note-trigger seam between anything that plays notes (the sequencer)
/// and whatever owns the voices.
///
/// Times are on the audio clock reported by `now`.
pub trait VoiceAllocator {
    fn now(&self) -> f64;

    /// Start a voice at `at`, which may lie in the future.
    fn trigger_at(&mut self, frequency: f32, at: f64) -> Result<VoiceHandle>;

    /// Schedule the release. Stale handles are ignored and return `false`.
    fn release_at(&mut self, handle: VoiceHandle, at: f64) -> bool;

    /// Drop a voice that should never have sounded.
    fn cancel(&mut self, handle: VoiceHandle) -> bool;
}
