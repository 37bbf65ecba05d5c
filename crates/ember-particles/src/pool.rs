//! Recycling of whole effects
//!
//! Cloning an effect copies every emitter's particle array, so hosts that fire
//! the same effect repeatedly keep finished instances around instead. An
//! [`EffectPool`] hands out [`PooledEffect`]s that go back to the free list
//! when freed or dropped.

use crate::effect::Effect;
use crate::rand::ParticleRng;
use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::{Rc, Weak};

#[derive(Debug)]
struct PoolState {
    template: Effect,
    free: Vec<Effect>,
    max: usize,
    peak: usize,
    /// Source of per-instance seeds so pooled copies never share a stream
    seeds: ParticleRng,
}

impl PoolState {
    fn release(&mut self, effect: Effect) {
        if self.free.len() < self.max {
            self.free.push(effect);
            self.peak = self.peak.max(self.free.len());
        } else {
            log::debug!("effect pool full ({}), discarding freed effect", self.max);
        }
    }
}

/// Handle to a single-threaded pool of effects cloned from one template.
///
/// Cloning the handle shares the pool.
#[derive(Debug, Clone)]
pub struct EffectPool {
    state: Rc<RefCell<PoolState>>,
}

impl EffectPool {
    /// Pool that keeps at most `max` freed effects
    pub fn new(template: Effect, initial_capacity: usize, max: usize) -> Self {
        Self::with_seed_source(template, initial_capacity, max, ParticleRng::from_entropy())
    }

    /// Pool whose obtained effects are seeded deterministically from `seed`
    pub fn with_seed(template: Effect, initial_capacity: usize, max: usize, seed: u64) -> Self {
        Self::with_seed_source(template, initial_capacity, max, ParticleRng::new(seed))
    }

    fn with_seed_source(
        template: Effect,
        initial_capacity: usize,
        max: usize,
        seeds: ParticleRng,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(PoolState {
                template,
                free: Vec::with_capacity(initial_capacity.min(max)),
                max,
                peak: 0,
                seeds,
            })),
        }
    }

    /// A reset effect: recycled if one is free, otherwise a fresh clone of
    /// the template
    pub fn obtain(&self) -> PooledEffect {
        let (mut effect, seed) = {
            let mut state = self.state.borrow_mut();
            let effect = match state.free.pop() {
                Some(effect) => effect,
                None => state.template.clone(),
            };
            (effect, state.seeds.next_u64())
        };
        effect.reseed(seed);
        effect.reset_scaling();
        effect.reset();
        PooledEffect {
            effect,
            pool: Rc::downgrade(&self.state),
        }
    }

    /// Number of effects waiting to be reused
    pub fn free_count(&self) -> usize {
        self.state.borrow().free.len()
    }

    /// Highest number of free effects held at once
    pub fn peak(&self) -> usize {
        self.state.borrow().peak
    }

    pub fn max(&self) -> usize {
        self.state.borrow().max
    }

    /// Drop every free effect
    pub fn clear(&self) {
        self.state.borrow_mut().free.clear();
    }

    /// Run `f` against the template without cloning it
    pub fn with_template<R>(&self, f: impl FnOnce(&Effect) -> R) -> R {
        f(&self.state.borrow().template)
    }
}

/// An effect on loan from an [`EffectPool`].
///
/// Returns to its pool when freed or dropped. If the pool is gone the effect
/// is simply dropped.
#[derive(Debug)]
pub struct PooledEffect {
    effect: Effect,
    pool: Weak<RefCell<PoolState>>,
}

impl PooledEffect {
    /// Return the effect to its pool
    pub fn free(self) {
        drop(self);
    }

    /// Keep the effect and sever it from the pool
    pub fn into_inner(mut self) -> Effect {
        self.pool = Weak::new();
        std::mem::take(&mut self.effect)
    }
}

impl Deref for PooledEffect {
    type Target = Effect;

    fn deref(&self) -> &Effect {
        &self.effect
    }
}

impl DerefMut for PooledEffect {
    fn deref_mut(&mut self) -> &mut Effect {
        &mut self.effect
    }
}

impl Drop for PooledEffect {
    fn drop(&mut self) {
        let Some(state) = self.pool.upgrade() else {
            return;
        };
        let effect = std::mem::take(&mut self.effect);
        state.borrow_mut().release(effect);
    }
}
