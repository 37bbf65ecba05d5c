//! Discrete keyframe sequences
//!
//! A [`KeyFrames`] maps an externally tracked state time to one of its
//! frames. All lookups are pure apart from [`PlayMode::LoopRandom`], which
//! draws from the thread-local RNG.

use ember_core::{EmberError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a frame index is read from the state time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayMode {
    /// Play once, holding the last frame
    #[default]
    Normal,
    /// Play once backwards, holding the first frame
    Reversed,
    Loop,
    LoopReversed,
    /// Forward then backward without repeating the end frames
    #[serde(rename = "loop-pingpong")]
    LoopPingPong,
    /// A uniformly random frame on every lookup
    LoopRandom,
}

impl PlayMode {
    pub const ALL: [PlayMode; 6] = [
        PlayMode::Normal,
        PlayMode::Reversed,
        PlayMode::Loop,
        PlayMode::LoopReversed,
        PlayMode::LoopPingPong,
        PlayMode::LoopRandom,
    ];

    pub fn is_looping(self) -> bool {
        !matches!(self, PlayMode::Normal | PlayMode::Reversed)
    }

    /// The closest mode with the requested looping behaviour
    pub fn with_looping(self, looping: bool) -> PlayMode {
        match (self, looping) {
            (PlayMode::Normal, true) => PlayMode::Loop,
            (PlayMode::Reversed, true) => PlayMode::LoopReversed,
            (PlayMode::LoopReversed, false) => PlayMode::Reversed,
            (PlayMode::Loop | PlayMode::LoopPingPong | PlayMode::LoopRandom, false) => {
                PlayMode::Normal
            }
            (mode, _) => mode,
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlayMode::Normal => "normal",
            PlayMode::Reversed => "reversed",
            PlayMode::Loop => "loop",
            PlayMode::LoopReversed => "loop-reversed",
            PlayMode::LoopPingPong => "loop-pingpong",
            PlayMode::LoopRandom => "loop-random",
        })
    }
}

impl FromStr for PlayMode {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self> {
        PlayMode::ALL
            .into_iter()
            .find(|mode| mode.to_string() == s)
            .ok_or_else(|| EmberError::config(format!("unknown play mode '{s}'")))
    }
}

/// An ordered, immutable list of frames shown for `frame_duration` seconds each.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFrames<T> {
    frames: Vec<T>,
    frame_duration: f32,
    play_mode: PlayMode,
}

fn check_frame_duration(frame_duration: f32) -> Result<()> {
    if frame_duration.is_finite() && frame_duration > 0.0 {
        Ok(())
    } else {
        Err(EmberError::config(format!(
            "frame duration must be positive and finite, got {frame_duration}"
        )))
    }
}

impl<T> KeyFrames<T> {
    /// Sequence in [`PlayMode::Normal`]. Fails on an empty frame list or a
    /// non-positive frame duration.
    pub fn new(frame_duration: f32, frames: Vec<T>) -> Result<Self> {
        if frames.is_empty() {
            return Err(EmberError::config("a keyframe sequence needs at least one frame"));
        }
        check_frame_duration(frame_duration)?;
        Ok(Self {
            frames,
            frame_duration,
            play_mode: PlayMode::Normal,
        })
    }

    pub fn with_mode(mut self, play_mode: PlayMode) -> Self {
        self.play_mode = play_mode;
        self
    }

    pub fn frames(&self) -> &[T] {
        &self.frames
    }

    pub fn frame_duration(&self) -> f32 {
        self.frame_duration
    }

    pub fn set_frame_duration(&mut self, frame_duration: f32) -> Result<()> {
        check_frame_duration(frame_duration)?;
        self.frame_duration = frame_duration;
        Ok(())
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn set_play_mode(&mut self, play_mode: PlayMode) {
        self.play_mode = play_mode;
    }

    /// Whole frames elapsed at `state_time`; negative times count as zero
    fn frame_number(&self, state_time: f32) -> usize {
        // Float to int casts saturate, NaN becomes 0
        (state_time / self.frame_duration).floor().max(0.0) as usize
    }

    /// Frame index at `state_time` under `mode`
    pub fn index_at(&self, state_time: f32, mode: PlayMode) -> usize {
        let n = self.frames.len();
        if n == 1 {
            return 0;
        }
        let frame = self.frame_number(state_time);
        match mode {
            PlayMode::Normal => frame.min(n - 1),
            PlayMode::Reversed => (n - 1).saturating_sub(frame),
            PlayMode::Loop => frame % n,
            PlayMode::LoopReversed => n - 1 - frame % n,
            PlayMode::LoopPingPong => {
                let m = frame % (2 * n - 2);
                if m >= n {
                    n - 2 - (m - n)
                } else {
                    m
                }
            }
            PlayMode::LoopRandom => rand::thread_rng().gen_range(0..n),
        }
    }

    /// Frame index at `state_time` under the stored play mode
    pub fn key_frame_index(&self, state_time: f32) -> usize {
        self.index_at(state_time, self.play_mode)
    }

    pub fn key_frame(&self, state_time: f32) -> &T {
        &self.frames[self.key_frame_index(state_time)]
    }

    /// Frame at `state_time` with looping forced on or off for this lookup.
    ///
    /// The stored play mode is never touched.
    pub fn key_frame_looping(&self, state_time: f32, looping: bool) -> &T {
        let mode = self.play_mode.with_looping(looping);
        &self.frames[self.index_at(state_time, mode)]
    }

    /// True once a single forward pass would have run past the last frame,
    /// whatever the play mode
    pub fn is_finished(&self, state_time: f32) -> bool {
        self.frame_number(state_time) >= self.frames.len()
    }

    /// Length of one pass through every frame, in seconds
    pub fn animation_duration(&self) -> f32 {
        self.frames.len() as f32 * self.frame_duration
    }
}
