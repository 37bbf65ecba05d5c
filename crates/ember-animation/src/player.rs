//! Named sequence registry and per-instance playback state

use crate::keyframes::KeyFrames;
use std::collections::HashMap;

/// Sequence registry: holds keyframe sequences by name.
#[derive(Debug, Clone)]
pub struct SequencePlayer<T> {
    sequences: HashMap<String, KeyFrames<T>>,
}

impl<T> SequencePlayer<T> {
    pub fn new() -> Self {
        Self {
            sequences: HashMap::new(),
        }
    }

    /// Register a sequence. Overwrites any existing sequence with the same name.
    pub fn add_sequence(&mut self, name: impl Into<String>, frames: KeyFrames<T>) {
        self.sequences.insert(name.into(), frames);
    }

    pub fn get_sequence(&self, name: &str) -> Option<&KeyFrames<T>> {
        self.sequences.get(name)
    }

    pub fn has_sequence(&self, name: &str) -> bool {
        self.sequences.contains_key(name)
    }

    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Advance `state` and return the frame it now shows.
    ///
    /// Returns `None` if the sequence isn't registered.
    pub fn advance(&self, state: &mut PlaybackState, dt: f32) -> Option<&T> {
        let frames = self.sequences.get(&state.sequence)?;
        Some(state.advance(frames, dt))
    }
}

impl<T> Default for SequencePlayer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-instance playback of one named sequence.
///
/// Keyframe lookups are pure, so the state time lives here and many
/// instances can share one [`KeyFrames`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// Name of the sequence being played
    pub sequence: String,
    /// Seconds since playback started, scaled by `speed`
    pub state_time: f32,
    /// Playback speed multiplier (1.0 = normal)
    pub speed: f32,
    /// Forces looping on or off regardless of the sequence's play mode
    pub looping: Option<bool>,
    pub playing: bool,
}

impl PlaybackState {
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            state_time: 0.0,
            speed: 1.0,
            looping: None,
            playing: true,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = Some(looping);
        self
    }

    pub fn restart(&mut self) {
        self.state_time = 0.0;
        self.playing = true;
    }

    /// Advance by `dt` seconds and return the current frame.
    ///
    /// A non-looping playback stops itself once the sequence is finished but
    /// keeps reporting its final frame.
    pub fn advance<'a, T>(&mut self, frames: &'a KeyFrames<T>, dt: f32) -> &'a T {
        if self.playing {
            self.state_time = (self.state_time + dt * self.speed).max(0.0);
            let looping = self
                .looping
                .unwrap_or_else(|| frames.play_mode().is_looping());
            if !looping && frames.is_finished(self.state_time) {
                self.playing = false;
            }
        }
        self.current(frames)
    }

    /// Frame at the current state time without advancing
    pub fn current<'a, T>(&self, frames: &'a KeyFrames<T>) -> &'a T {
        match self.looping {
            Some(looping) => frames.key_frame_looping(self.state_time, looping),
            None => frames.key_frame(self.state_time),
        }
    }
}
