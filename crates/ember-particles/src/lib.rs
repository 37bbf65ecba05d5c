//! Ember Particles - time-driven 2D particle effects
//!
//! Provides the emitter simulation and everything around it:
//! - Randomized, envelope-shaped parameter curves
//! - Swap-remove particle pool per emitter
//! - Multi-emitter effects, effect pooling and fluent builders
//! - Text and TOML persistence
//! - Collaborator traits for drawing, sprite lookup and deflection

pub mod builder;
pub mod curves;
pub mod deflect;
pub mod effect;
pub mod emitter;
pub mod format;
pub mod particle;
pub mod pool;
pub mod rand;
pub mod render;
pub mod spawn;

pub use builder::{EffectBuilder, EmitterBuilder};
pub use curves::{CurveSpan, GradientColor, RangedValue, ScaledValue};
pub use deflect::{NoDeflection, RayHit, RayQuery};
pub use effect::Effect;
pub use emitter::{Emitter, EmitterConfig, EmitterState, SpriteMode};
pub use format::EffectDocument;
pub use particle::{Particle, ParticlePool};
pub use pool::{EffectPool, PooledEffect};
pub use render::{BlendMode, Sprite, SpriteBatch, SpriteHandle, SpriteQuad, SpriteSource};
pub use spawn::{EllipseSide, SpawnShape, SpawnShapeValue};

/// Drives a set of fire-and-forget pooled effects from the host loop.
///
/// Effects are freed back to their pool as soon as they complete.
#[derive(Debug, Default)]
pub struct ParticleSystem {
    effects: Vec<PooledEffect>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain an effect from `pool`, place it and start tracking it
    pub fn spawn(&mut self, pool: &EffectPool, x: f32, y: f32) -> &mut Effect {
        let mut effect = pool.obtain();
        effect.set_position(x, y);
        self.effects.push(effect);
        let last = self.effects.len() - 1;
        &mut self.effects[last]
    }

    /// Track an effect obtained elsewhere
    pub fn add(&mut self, effect: PooledEffect) {
        self.effects.push(effect);
    }

    pub fn update(&mut self, dt: f32) {
        for effect in &mut self.effects {
            effect.update(dt);
        }
        let before = self.effects.len();
        self.effects.retain(|e| !e.is_complete());
        let finished = before - self.effects.len();
        if finished > 0 {
            log::trace!("[particles] {finished} effect(s) complete");
        }
    }

    pub fn update_deflected<Q: RayQuery + ?Sized>(&mut self, dt: f32, deflector: &mut Q) {
        for effect in &mut self.effects {
            effect.update_deflected(dt, deflector);
        }
        self.effects.retain(|e| !e.is_complete());
    }

    pub fn draw(&self, batch: &mut dyn SpriteBatch) {
        for effect in &self.effects {
            effect.draw(batch);
        }
    }

    /// Let every tracked effect finish without emitting more particles
    pub fn allow_completion(&mut self) {
        for effect in &mut self.effects {
            effect.allow_completion();
        }
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn particle_count(&self) -> usize {
        self.effects
            .iter()
            .flat_map(|e| e.emitters())
            .map(Emitter::active_count)
            .sum()
    }

    /// Free every tracked effect back to its pool
    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst_pool() -> EffectPool {
        let emitter = EmitterBuilder::new("burst")
            .count(0, 8)
            .duration(100.0, 100.0)
            .emission_high(40.0, 40.0)
            .life_high(200.0, 200.0)
            .build();
        EffectPool::with_seed(Effect::from_emitters(vec![emitter]), 2, 4, 11)
    }

    #[test]
    fn finished_effects_return_to_pool() {
        let pool = burst_pool();
        let mut system = ParticleSystem::new();
        system.spawn(&pool, 5.0, 5.0);
        system.spawn(&pool, -5.0, 0.0);
        assert_eq!(system.effect_count(), 2);

        system.update(0.05);
        assert!(system.particle_count() > 0);

        for _ in 0..20 {
            system.update(0.05);
        }
        assert_eq!(system.effect_count(), 0);
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn clear_frees_everything() {
        let pool = burst_pool();
        let mut system = ParticleSystem::new();
        system.add(pool.obtain());
        system.clear();
        assert_eq!(system.effect_count(), 0);
        assert_eq!(pool.free_count(), 1);
    }
}
