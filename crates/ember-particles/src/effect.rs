//! Multi-emitter effects
//!
//! An [`Effect`] owns an ordered list of emitters sharing one coordinate
//! frame. Every operation fans out in declaration order, which is also draw
//! order: later emitters draw on top.

use crate::deflect::RayQuery;
use crate::emitter::Emitter;
use crate::rand::ParticleRng;
use crate::render::{SpriteBatch, SpriteSource};
use ember_core::{Bounds, Result};

#[derive(Debug, Clone)]
pub struct Effect {
    emitters: Vec<Emitter>,
    /// Cumulative factors applied by `scale_effect*`, undone by `reset_scaling`
    x_size_scale: f32,
    y_size_scale: f32,
    motion_scale: f32,
}

impl Default for Effect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect {
    pub fn new() -> Self {
        Self::from_emitters(Vec::new())
    }

    pub fn from_emitters(emitters: Vec<Emitter>) -> Self {
        Self {
            emitters,
            x_size_scale: 1.0,
            y_size_scale: 1.0,
            motion_scale: 1.0,
        }
    }

    pub fn push_emitter(&mut self, emitter: Emitter) {
        self.emitters.push(emitter);
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn emitters_mut(&mut self) -> &mut Vec<Emitter> {
        &mut self.emitters
    }

    pub fn find_emitter(&self, name: &str) -> Option<&Emitter> {
        self.emitters.iter().find(|e| e.name() == name)
    }

    pub fn find_emitter_mut(&mut self, name: &str) -> Option<&mut Emitter> {
        self.emitters.iter_mut().find(|e| e.name() == name)
    }

    pub fn start(&mut self) {
        for emitter in &mut self.emitters {
            emitter.start();
        }
    }

    /// Clear every emitter's particles and timers, then start again
    pub fn reset(&mut self) {
        for emitter in &mut self.emitters {
            emitter.reset();
        }
    }

    /// Advance every emitter by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        for emitter in &mut self.emitters {
            emitter.update(dt);
        }
    }

    pub fn update_deflected<Q: RayQuery + ?Sized>(&mut self, dt: f32, deflector: &mut Q) {
        for emitter in &mut self.emitters {
            emitter.update_deflected(dt, deflector);
        }
    }

    pub fn draw(&self, batch: &mut dyn SpriteBatch) {
        for emitter in &self.emitters {
            emitter.draw(batch);
        }
    }

    pub fn allow_completion(&mut self) {
        for emitter in &mut self.emitters {
            emitter.allow_completion();
        }
    }

    /// True once every emitter is complete (vacuously true when empty)
    pub fn is_complete(&self) -> bool {
        self.emitters.iter().all(Emitter::is_complete)
    }

    /// Turn every emitter into a one-shot of `duration` ms
    pub fn set_duration(&mut self, duration: f32) {
        for emitter in &mut self.emitters {
            emitter.set_duration(duration);
        }
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        for emitter in &mut self.emitters {
            emitter.set_position(x, y);
        }
    }

    pub fn set_flip(&mut self, flip_x: bool, flip_y: bool) {
        for emitter in &mut self.emitters {
            emitter.set_flip(flip_x, flip_y);
        }
    }

    pub fn flip_y(&mut self) {
        for emitter in &mut self.emitters {
            emitter.flip_y();
        }
    }

    pub fn set_cleans_up_blend(&mut self, cleans_up: bool) {
        for emitter in &mut self.emitters {
            emitter.set_cleans_up_blend(cleans_up);
        }
    }

    /// Permanently scale sizes and motion by `factor`.
    ///
    /// Applying it twice compounds; use [`Effect::reset_scaling`] to undo.
    pub fn scale_effect(&mut self, factor: f32) {
        self.scale_effect_xy(factor, factor, factor);
    }

    /// Permanently scale widths by `x`, heights by `y` and motion by `motion`.
    ///
    /// Zero or non-finite factors cannot be undone by
    /// [`Effect::reset_scaling`], so such a call is ignored.
    pub fn scale_effect_xy(&mut self, x: f32, y: f32, motion: f32) {
        let invertible = |f: f32| f.is_finite() && f != 0.0;
        if !(invertible(x) && invertible(y) && invertible(motion)) {
            log::warn!("ignoring non-invertible effect scale ({x}, {y}, {motion})");
            return;
        }
        self.x_size_scale *= x;
        self.y_size_scale *= y;
        self.motion_scale *= motion;
        for emitter in &mut self.emitters {
            emitter.scale_size(x, y);
            emitter.scale_motion(motion);
        }
    }

    /// Cumulative (x size, y size, motion) factors applied so far
    pub fn scaling(&self) -> (f32, f32, f32) {
        (self.x_size_scale, self.y_size_scale, self.motion_scale)
    }

    /// Undo every `scale_effect*` call since construction or the last reset
    pub fn reset_scaling(&mut self) {
        let (x, y, motion) = self.scaling();
        if x == 1.0 && y == 1.0 && motion == 1.0 {
            return;
        }
        self.scale_effect_xy(1.0 / x, 1.0 / y, 1.0 / motion);
        self.x_size_scale = 1.0;
        self.y_size_scale = 1.0;
        self.motion_scale = 1.0;
    }

    /// Give each emitter its own random stream derived from `seed`
    pub fn reseed(&mut self, seed: u64) {
        let mut seeds = ParticleRng::new(seed);
        for emitter in &mut self.emitters {
            emitter.reseed(seeds.next_u64());
        }
    }

    /// Resolve and bind the sprites of every emitter. Stops at the first
    /// missing image.
    pub fn load_images(&mut self, source: &mut dyn SpriteSource) -> Result<()> {
        for emitter in &mut self.emitters {
            emitter.load_images(source)?;
        }
        Ok(())
    }

    /// Union of all emitters' particle bounds; empty when nothing is alive
    pub fn bounding_box(&self) -> Bounds {
        let mut bounds = Bounds::EMPTY;
        for emitter in &self.emitters {
            bounds.merge(&emitter.bounding_box());
        }
        bounds
    }
}
