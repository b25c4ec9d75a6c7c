use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{
    error::{Result, SynthError},
    graph::RenderCtx,
    patch::Patch,
    synth::voice::{Voice, VoiceState},
    MAX_BLOCK_SIZE,
};

/*
Voice Arena
===========

Voices live in a fixed set of slots. A handle is (slot index, generation):

  slot 0  gen 4  [ voice C4 ]
  slot 1  gen 7  [   free   ]
  slot 2  gen 2  [ voice G4 ]

Retiring a voice empties its slot and bumps the generation, so a handle held
by a caller after retirement no longer matches and every call with it is a
harmless no-op. Reuse of the slot can never be confused with the old voice.

Allocation
----------

  1. first free slot
  2. else steal the voice that has been releasing the longest
  3. else fail with VoicesExhausted

Held notes
----------

Triggers by note name are tracked until that note is released. Triggering a
name that is still held does nothing; the caller has to release it first.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceHandle {
    index: u32,
    generation: u32,
}

impl VoiceHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

struct Slot {
    generation: u32,
    voice: Option<Voice>,
}

pub struct VoiceManager {
    slots: Vec<Slot>,
    held: HashMap<String, VoiceHandle>,
    smoothing: f64,
    voice_buffer: Vec<f32>,
}

impl VoiceManager {
    /// `smoothing` is the time constant used when pushing patch updates.
    pub fn new(max_voices: usize, smoothing: f64) -> Self {
        let slots = (0..max_voices.max(1))
            .map(|_| Slot {
                generation: 0,
                voice: None,
            })
            .collect();

        Self {
            slots,
            held: HashMap::new(),
            smoothing,
            voice_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn max_voices(&self) -> usize {
        self.slots.len()
    }

    /// Start a voice at `at`. The patch octave is applied to `frequency`.
    pub fn trigger_at(&mut self, frequency: f32, patch: &Patch, at: f64) -> Result<VoiceHandle> {
        let index = self.allocate_slot()?;
        let frequency = patch.shifted_frequency(frequency);

        let slot = &mut self.slots[index];
        slot.voice = Some(Voice::new(frequency, patch, at));
        let handle = VoiceHandle {
            index: index as u32,
            generation: slot.generation,
        };

        trace!(slot = index, frequency, at, "voice triggered");
        Ok(handle)
    }

    /// Trigger a named note unless that note is already held.
    ///
    /// Returns `Ok(None)` for the duplicate case.
    pub fn trigger_note(
        &mut self,
        name: &str,
        frequency: f32,
        patch: &Patch,
        at: f64,
    ) -> Result<Option<VoiceHandle>> {
        if let Some(&handle) = self.held.get(name) {
            if self.voice(handle).is_some_and(|voice| !voice.is_released()) {
                trace!(note = name, "already held, ignoring trigger");
                return Ok(None);
            }
        }

        let handle = self.trigger_at(frequency, patch, at)?;
        self.held.insert(name.to_owned(), handle);
        Ok(Some(handle))
    }

    /// Release the voice at `at` (never before `now`).
    ///
    /// Returns `false` for stale handles and voices already released. A voice
    /// whose start time is still ahead is retired on the spot.
    pub fn release_at(&mut self, handle: VoiceHandle, at: f64, now: f64) -> bool {
        self.held.retain(|_, held| *held != handle);

        let Some(voice) = self.voice_mut(handle) else {
            return false;
        };
        if voice.is_released() {
            return false;
        }

        if voice.start_time() > now && at <= voice.start_time() {
            trace!(slot = handle.index, "released before start, retiring");
            self.free(handle.index());
            return true;
        }

        voice.release(at.max(now))
    }

    pub fn release_note(&mut self, name: &str, now: f64) -> bool {
        match self.held.get(name).copied() {
            Some(handle) => self.release_at(handle, now, now),
            None => false,
        }
    }

    /// Drop a voice immediately, whatever it is doing.
    pub fn cancel(&mut self, handle: VoiceHandle) -> bool {
        if self.voice(handle).is_none() {
            return false;
        }
        self.held.retain(|_, held| *held != handle);
        self.free(handle.index());
        true
    }

    /// Release every voice at `now`.
    pub fn release_all(&mut self, now: f64) {
        let handles: Vec<VoiceHandle> = self.handles().collect();
        for handle in handles {
            self.release_at(handle, now, now);
        }
    }

    /// Push the patch's steady-state values to every live voice.
    pub fn apply_model_update(&mut self, patch: &Patch, now: f64) {
        let smoothing = self.smoothing;
        for voice in self.slots.iter_mut().filter_map(|slot| slot.voice.as_mut()) {
            voice.apply_patch(patch, now, smoothing);
        }
    }

    /// Retire every voice whose tail has elapsed. Returns how many were retired.
    pub fn collect_retired(&mut self, now: f64) -> usize {
        let mut retired = 0;
        for index in 0..self.slots.len() {
            if self.slots[index]
                .voice
                .as_ref()
                .is_some_and(|voice| voice.is_retired(now))
            {
                self.free(index);
                retired += 1;
            }
        }
        if retired > 0 {
            trace!(retired, active = self.active_count(), "voices retired");
        }
        retired
    }

    /// Sum every live voice into `out` (added, not overwritten).
    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let len = out.len().min(self.voice_buffer.len());
        let scratch = &mut self.voice_buffer[..len];

        let block_end = ctx.sample_time(len);

        for voice in self.slots.iter_mut().filter_map(|slot| slot.voice.as_mut()) {
            // Not started yet, or already stopped: nothing to hear this block
            if voice.start_time() >= block_end || voice.stop_time().is_some_and(|stop| stop <= ctx.time) {
                continue;
            }
            voice.render(scratch, ctx);
            for (o, v) in out.iter_mut().zip(scratch.iter()) {
                *o += *v;
            }
        }
    }

    pub fn prune(&mut self, before: f64) {
        for voice in self.slots.iter_mut().filter_map(|slot| slot.voice.as_mut()) {
            voice.prune(before);
        }
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.voice.is_some()).count()
    }

    pub fn is_held(&self, name: &str) -> bool {
        self.held.contains_key(name)
    }

    pub fn voice(&self, handle: VoiceHandle) -> Option<&Voice> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.voice.as_ref()
    }

    fn voice_mut(&mut self, handle: VoiceHandle) -> Option<&mut Voice> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.voice.as_mut()
    }

    /// Handles of every live voice.
    pub fn handles(&self) -> impl Iterator<Item = VoiceHandle> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.voice.as_ref().map(|_| VoiceHandle {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    fn allocate_slot(&mut self) -> Result<usize> {
        if let Some(index) = self.slots.iter().position(|slot| slot.voice.is_none()) {
            return Ok(index);
        }

        // Steal the voice that has been releasing the longest
        let steal = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let released = slot.voice.as_ref()?.released_at()?;
                Some((index, released))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index);

        match steal {
            Some(index) => {
                debug!(slot = index, "stealing releasing voice");
                self.free(index);
                Ok(index)
            }
            None => Err(SynthError::VoicesExhausted {
                max: self.slots.len(),
            }),
        }
    }

    fn free(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        if slot.voice.take().is_some() {
            slot.generation = slot.generation.wrapping_add(1);
        }
    }

    /// State of the voice behind `handle` at `time`, if it is still live.
    pub fn state_at(&self, handle: VoiceHandle, time: f64) -> Option<VoiceState> {
        self.voice(handle).map(|voice| voice.state_at(time))
    }
}
