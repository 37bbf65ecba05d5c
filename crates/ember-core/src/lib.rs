//! Ember Core - Foundational types for the Ember particle engine
//!
//! This crate provides the types that the other Ember crates share:
//! - `Vec2`, `Color` - 2D spatial and colour values
//! - `Bounds` - axis-aligned bounding box with an empty (inverted) state
//! - Error types and Result alias

mod error;
mod types;

pub use error::{EmberError, Result};
pub use types::{Bounds, Color, Vec2};
