//! Rendering and texture collaborators
//!
//! The simulation never touches GPU state. It hands one [`SpriteQuad`] per live
//! particle to a [`SpriteBatch`], and asks a [`SpriteSource`] to turn image
//! paths into drawable [`Sprite`]s.

use ember_core::{Color, Vec2};
use serde::{Deserialize, Serialize};

/// Opaque handle to a texture region owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpriteHandle(pub u64);

/// A drawable region and its natural size.
///
/// Sprites are shared between effect clones; the host owns the texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub handle: SpriteHandle,
    pub width: f32,
    pub height: f32,
}

impl Sprite {
    pub fn new(handle: SpriteHandle, width: f32, height: f32) -> Self {
        Self {
            handle,
            width,
            height,
        }
    }

    /// Height over width, 1.0 for degenerate sprites
    pub fn aspect(&self) -> f32 {
        if self.width > 0.0 {
            self.height / self.width
        } else {
            1.0
        }
    }
}

/// How particle colors combine with what is already drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Alpha,
    Additive,
    Premultiplied,
}

/// Geometry for one particle draw call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteQuad {
    /// Lower-left corner before rotation
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Rotation origin relative to (x, y)
    pub origin: Vec2,
    /// Degrees counter-clockwise
    pub rotation: f32,
    pub color: Color,
    pub flip_x: bool,
    pub flip_y: bool,
}

/// Receives draw calls for live particles
pub trait SpriteBatch {
    fn set_blend_mode(&mut self, mode: BlendMode);
    fn draw(&mut self, sprite: &Sprite, quad: &SpriteQuad);
}

/// Resolves an emitter's image paths to sprites
pub trait SpriteSource {
    fn resolve(&mut self, image_path: &str) -> Option<Sprite>;
}

impl<F> SpriteSource for F
where
    F: FnMut(&str) -> Option<Sprite>,
{
    fn resolve(&mut self, image_path: &str) -> Option<Sprite> {
        self(image_path)
    }
}
