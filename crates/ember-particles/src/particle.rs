//! Particle simulation state and the fixed-capacity particle pool

use crate::curves::CurveSpan;
use crate::render::SpriteQuad;
use ember_core::{Bounds, Color, Vec2};

/// One live particle. Times are in milliseconds, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Center of the particle quad
    pub position: Vec2,
    /// Width and height in world units
    pub size: Vec2,
    pub rotation: f32,
    pub color: Color,
    /// Base RGB picked at spawn, used while the tint is not animated
    pub tint: [f32; 3],
    pub age: f32,
    pub lifetime: f32,
    /// Index into the emitter's bound sprites
    pub sprite: usize,
    /// Height/width ratio of the sprite this particle was spawned with
    pub aspect: f32,
    pub alive: bool,

    pub x_scale: CurveSpan,
    pub y_scale: CurveSpan,
    pub spin: CurveSpan,
    pub velocity: CurveSpan,
    pub angle: CurveSpan,
    pub wind: CurveSpan,
    pub gravity: CurveSpan,
    pub transparency: CurveSpan,
    /// Travel angle while the angle curve is not animated
    pub heading: f32,
    pub heading_cos: f32,
    pub heading_sin: f32,
}

impl Particle {
    pub fn dead() -> Self {
        Self {
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            rotation: 0.0,
            color: Color::WHITE,
            tint: [1.0; 3],
            age: 0.0,
            lifetime: 0.0,
            sprite: 0,
            aspect: 1.0,
            alive: false,
            x_scale: CurveSpan::default(),
            y_scale: CurveSpan::default(),
            spin: CurveSpan::default(),
            velocity: CurveSpan::default(),
            angle: CurveSpan::default(),
            wind: CurveSpan::default(),
            gravity: CurveSpan::default(),
            transparency: CurveSpan::default(),
            heading: 0.0,
            heading_cos: 1.0,
            heading_sin: 0.0,
        }
    }

    /// Normalized age in [0, 1]
    pub fn age_ratio(&self) -> f32 {
        if self.lifetime <= 0.0 {
            1.0
        } else {
            (self.age / self.lifetime).min(1.0)
        }
    }

    pub fn set_heading(&mut self, degrees: f32) {
        let rad = degrees.to_radians();
        self.heading = degrees;
        self.heading_cos = rad.cos();
        self.heading_sin = rad.sin();
    }

    /// Axis-aligned bounds of the rotated quad
    pub fn bounds(&self) -> Bounds {
        let hw = self.size.x * 0.5;
        let hh = self.size.y * 0.5;
        let rad = self.rotation.to_radians();
        let (sin, cos) = (rad.sin().abs(), rad.cos().abs());
        let ex = hw * cos + hh * sin;
        let ey = hw * sin + hh * cos;
        let mut bounds = Bounds::EMPTY;
        bounds.ext(self.position.x - ex, self.position.y - ey);
        bounds.ext(self.position.x + ex, self.position.y + ey);
        bounds
    }

    pub fn quad(&self, flip_x: bool, flip_y: bool) -> SpriteQuad {
        SpriteQuad {
            x: self.position.x - self.size.x * 0.5,
            y: self.position.y - self.size.y * 0.5,
            width: self.size.x,
            height: self.size.y,
            origin: Vec2::new(self.size.x * 0.5, self.size.y * 0.5),
            rotation: self.rotation,
            color: self.color,
            flip_x,
            flip_y,
        }
    }
}

/// Swap-remove pool for O(1) particle kill and contiguous alive iteration.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    alive_count: usize,
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: vec![Particle::dead(); capacity],
            alive_count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    pub fn remaining(&self) -> usize {
        self.particles.len() - self.alive_count
    }

    /// Drop every particle and change the capacity
    pub fn resize(&mut self, capacity: usize) {
        self.particles = vec![Particle::dead(); capacity];
        self.alive_count = 0;
    }

    pub fn clear(&mut self) {
        for p in &mut self.particles[..self.alive_count] {
            p.alive = false;
        }
        self.alive_count = 0;
    }

    /// Claim a slot and overwrite it with `particle`.
    /// Returns false if the pool is full.
    pub fn spawn(&mut self, particle: Particle) -> bool {
        if self.alive_count >= self.particles.len() {
            return false;
        }
        let idx = self.alive_count;
        self.particles[idx] = Particle {
            alive: true,
            ..particle
        };
        self.alive_count += 1;
        true
    }

    /// Kill expired particles via swap-remove.
    pub fn retain_alive(&mut self) {
        let mut i = 0;
        while i < self.alive_count {
            if !self.particles[i].alive || self.particles[i].age >= self.particles[i].lifetime {
                self.particles[i].alive = false;
                self.alive_count -= 1;
                if i < self.alive_count {
                    self.particles.swap(i, self.alive_count);
                }
                // Same index again: the swapped-in particle is unchecked
            } else {
                i += 1;
            }
        }
    }

    /// Access alive particles slice for reading (first `alive_count` elements)
    pub fn alive_slice(&self) -> &[Particle] {
        &self.particles[..self.alive_count]
    }

    /// Access alive particles mutably
    pub fn alive_slice_mut(&mut self) -> &mut [Particle] {
        &mut self.particles[..self.alive_count]
    }
}
