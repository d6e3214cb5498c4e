//! Input arbitration: three small state machines over one registry.
//!
//! Each modality keeps its own state and owns its own [`SourceId`]
//! namespace:
//!
//! - pointer: held gestures keyed by pointer id; down/move/up/cancel
//! - key: a down-set keyed by key name; guards OS key-repeat
//! - latch: a sounding-set keyed by step; one activation toggles
//!
//! Sustain mode changes only how future down events are interpreted:
//! with sustain on, pointer and key downs become latch activations.
//! Voices already sounding when the mode flips keep their original
//! machine, so a held key still stops on its up-event.
//!
//! Events are processed in arrival order per source; violations of that
//! order (a move before its down, an up with nothing held) are dropped
//! rather than allowed to corrupt state.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::backend::{BackendError, GeneratorBackend};
use crate::synth::registry::{SourceId, VoiceRegistry};

/// One held pointer gesture. A pointer with no gesture is idle.
#[derive(Debug, Clone, Copy)]
struct Gesture {
    step: i32,
}

#[derive(Debug, Default)]
pub struct InputRouter {
    pointers: HashMap<u32, Gesture>,
    keys_down: HashSet<String>,
    latched: HashSet<i32>,
    sustain: bool,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sustain(&self) -> bool {
        self.sustain
    }

    /// Flip sustain mode. Nothing already sounding is converted.
    pub fn set_sustain(&mut self, on: bool) {
        self.sustain = on;
    }

    /// Pointer pressed on `step`. With sustain on this is a latch
    /// activation; otherwise it opens a hold-to-sound gesture.
    ///
    /// A second down for a pointer that is already held is dropped.
    pub fn on_pointer_down<B: GeneratorBackend>(
        &mut self,
        registry: &mut VoiceRegistry<B>,
        pointer: u32,
        step: i32,
        now: Instant,
    ) -> Result<(), BackendError> {
        if self.sustain {
            return self.on_latch_activate(registry, step, now);
        }
        if self.pointers.contains_key(&pointer) {
            return Ok(());
        }
        registry.start(SourceId::Pointer(pointer), step)?;
        self.pointers.insert(pointer, Gesture { step });
        Ok(())
    }

    /// Pointer slid to `step` while held. Retunes in place; a move for
    /// an idle pointer (delivered out of order) is dropped.
    pub fn on_pointer_move<B: GeneratorBackend>(
        &mut self,
        registry: &mut VoiceRegistry<B>,
        pointer: u32,
        step: i32,
        now: Instant,
    ) {
        let Some(gesture) = self.pointers.get_mut(&pointer) else {
            return;
        };
        if gesture.step == step {
            return;
        }
        gesture.step = step;
        registry.retune(&SourceId::Pointer(pointer), step, now);
    }

    /// Pointer lifted. Stops the gesture's voice if one is held.
    pub fn on_pointer_up<B: GeneratorBackend>(
        &mut self,
        registry: &mut VoiceRegistry<B>,
        pointer: u32,
        now: Instant,
    ) {
        if self.pointers.remove(&pointer).is_some() {
            registry.stop(&SourceId::Pointer(pointer), now);
        }
    }

    /// Pointer gesture aborted by the platform; same outcome as an up.
    pub fn on_pointer_cancel<B: GeneratorBackend>(
        &mut self,
        registry: &mut VoiceRegistry<B>,
        pointer: u32,
        now: Instant,
    ) {
        self.on_pointer_up(registry, pointer, now);
    }

    /// Physical key pressed. With sustain on this is a latch activation;
    /// otherwise the key enters the down-set and starts a voice.
    ///
    /// A down-signal for a key already down (OS key-repeat) is dropped.
    pub fn on_key_down<B: GeneratorBackend>(
        &mut self,
        registry: &mut VoiceRegistry<B>,
        key: &str,
        step: i32,
        now: Instant,
    ) -> Result<(), BackendError> {
        if self.sustain {
            return self.on_latch_activate(registry, step, now);
        }
        if self.keys_down.contains(key) {
            return Ok(());
        }
        registry.start(SourceId::Key(key.to_string()), step)?;
        self.keys_down.insert(key.to_string());
        Ok(())
    }

    /// Physical key released. Stops only a key that actually went down
    /// through the key machine; latch-activated steps ignore up-events.
    pub fn on_key_up<B: GeneratorBackend>(
        &mut self,
        registry: &mut VoiceRegistry<B>,
        key: &str,
        now: Instant,
    ) {
        if self.keys_down.remove(key) {
            registry.stop(&SourceId::Key(key.to_string()), now);
        }
    }

    /// Toggle the latch for `step`: silent → sounding → silent. Driven
    /// by down events alone.
    pub fn on_latch_activate<B: GeneratorBackend>(
        &mut self,
        registry: &mut VoiceRegistry<B>,
        step: i32,
        now: Instant,
    ) -> Result<(), BackendError> {
        if self.latched.remove(&step) {
            registry.stop(&SourceId::Latch(step), now);
            return Ok(());
        }
        registry.start(SourceId::Latch(step), step)?;
        self.latched.insert(step);
        Ok(())
    }

    /// Global silence: clear every machine and release every voice.
    pub fn silence_all<B: GeneratorBackend>(
        &mut self,
        registry: &mut VoiceRegistry<B>,
        now: Instant,
    ) {
        self.pointers.clear();
        self.keys_down.clear();
        self.latched.clear();
        registry.stop_all(now);
    }

    pub fn held_pointer_step(&self, pointer: u32) -> Option<i32> {
        self.pointers.get(&pointer).map(|g| g.step)
    }

    pub fn is_key_down(&self, key: &str) -> bool {
        self.keys_down.contains(key)
    }

    pub fn is_latched(&self, step: i32) -> bool {
        self.latched.contains(&step)
    }
}
