//! Ember Animation - frame sequences for sprite animation
//!
//! Provides:
//! - [`KeyFrames`]: pure state-time to frame lookup under six play modes
//! - [`SequencePlayer`] and [`PlaybackState`]: named sequences with
//!   per-instance playback time

pub mod keyframes;
pub mod player;

pub use keyframes::{KeyFrames, PlayMode};
pub use player::{PlaybackState, SequencePlayer};
