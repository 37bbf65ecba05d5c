//! Fluent construction and in-place editing of emitters and effects
//!
//! [`EmitterBuilder`] is generic over how it holds its config:
//! - `EmitterBuilder::new(name)` owns a fresh config and `build()` produces a
//!   new [`Emitter`].
//! - `EmitterBuilder::edit(emitter.config_mut())` borrows an existing config
//!   and every call mutates it in place.
//!
//! Curve setters switch the curve on. Envelope and tint setters validate like
//! the underlying curve setters and return `Result<Self>`.

use crate::curves::ScaledValue;
use crate::effect::Effect;
use crate::emitter::{Emitter, EmitterConfig, SpriteMode};
use crate::spawn::{EllipseSide, SpawnShape};
use ember_core::{Result, Vec2};
use std::borrow::BorrowMut;

pub struct EmitterBuilder<C: BorrowMut<EmitterConfig> = EmitterConfig> {
    config: C,
    position: Option<Vec2>,
}

impl EmitterBuilder<EmitterConfig> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(EmitterConfig::new(name))
    }

    /// Start from a copy of an existing config
    pub fn from_config(config: EmitterConfig) -> Self {
        Self {
            config,
            position: None,
        }
    }

    pub fn into_config(self) -> EmitterConfig {
        self.config
    }

    /// A new emitter; the builder's position is applied if one was given
    pub fn build(self) -> Emitter {
        let position = self.position;
        let mut emitter = Emitter::new(self.config);
        if let Some(p) = position {
            emitter.set_position(p.x, p.y);
        }
        emitter
    }

    /// Like [`EmitterBuilder::build`] with a deterministic random stream
    pub fn build_seeded(self, seed: u64) -> Emitter {
        let position = self.position;
        let mut emitter = Emitter::with_seed(self.config, seed);
        if let Some(p) = position {
            emitter.set_position(p.x, p.y);
        }
        emitter
    }
}

impl<'a> EmitterBuilder<&'a mut EmitterConfig> {
    /// Forward every call into `config`
    pub fn edit(config: &'a mut EmitterConfig) -> Self {
        Self {
            config,
            position: None,
        }
    }
}

macro_rules! scaled_curve_setters {
    ($($curve:ident: $low:ident, $high:ident, $envelope:ident, $relative:ident;)*) => {
        $(
            pub fn $low(mut self, min: f32, max: f32) -> Self {
                let curve = self.curve_mut(|c| &mut c.$curve);
                curve.set_low(min, max);
                self
            }

            pub fn $high(mut self, min: f32, max: f32) -> Self {
                let curve = self.curve_mut(|c| &mut c.$curve);
                curve.set_high(min, max);
                self
            }

            pub fn $envelope(mut self, timeline: &[f32], scaling: &[f32]) -> Result<Self> {
                let curve = self.curve_mut(|c| &mut c.$curve);
                curve.set_envelope(scaling.to_vec(), timeline.to_vec())?;
                Ok(self)
            }

            pub fn $relative(mut self, relative: bool) -> Self {
                self.curve_mut(|c| &mut c.$curve).relative = relative;
                self
            }

            /// Envelope and both ranges in one step
            pub fn $curve(
                mut self,
                scaling: &[f32],
                timeline: &[f32],
                low_min: f32,
                low_max: f32,
                high_min: f32,
                high_max: f32,
            ) -> Result<Self> {
                let curve = self.curve_mut(|c| &mut c.$curve);
                curve.set_envelope(scaling.to_vec(), timeline.to_vec())?;
                curve.set_low(low_min, low_max);
                curve.set_high(high_min, high_max);
                Ok(self)
            }
        )*
    };
}

impl<C: BorrowMut<EmitterConfig>> EmitterBuilder<C> {
    pub fn config(&self) -> &EmitterConfig {
        self.config.borrow()
    }

    fn config_mut(&mut self) -> &mut EmitterConfig {
        self.config.borrow_mut()
    }

    fn curve_mut(
        &mut self,
        pick: impl FnOnce(&mut EmitterConfig) -> &mut ScaledValue,
    ) -> &mut ScaledValue {
        let curve = pick(self.config.borrow_mut());
        curve.active = true;
        curve
    }

    scaled_curve_setters! {
        emission: emission_low, emission_high, emission_envelope, emission_relative;
        life: life_low, life_high, life_envelope, life_relative;
        life_offset: life_offset_low, life_offset_high, life_offset_envelope, life_offset_relative;
        x_offset: x_offset_low, x_offset_high, x_offset_envelope, x_offset_relative;
        y_offset: y_offset_low, y_offset_high, y_offset_envelope, y_offset_relative;
        spawn_width: spawn_width_low, spawn_width_high, spawn_width_envelope, spawn_width_relative;
        spawn_height: spawn_height_low, spawn_height_high, spawn_height_envelope, spawn_height_relative;
        x_scale: x_scale_low, x_scale_high, x_scale_envelope, x_scale_relative;
        y_scale: y_scale_low, y_scale_high, y_scale_envelope, y_scale_relative;
        velocity: velocity_low, velocity_high, velocity_envelope, velocity_relative;
        angle: angle_low, angle_high, angle_envelope, angle_relative;
        rotation: rotation_low, rotation_high, rotation_envelope, rotation_relative;
        wind: wind_low, wind_high, wind_envelope, wind_relative;
        gravity: gravity_low, gravity_high, gravity_envelope, gravity_relative;
        transparency: transparency_low, transparency_high, transparency_envelope, transparency_relative;
    }

    /// Re-sample life per particle instead of once per cycle
    pub fn life_independent(mut self, independent: bool) -> Self {
        self.config_mut().life.independent = independent;
        self
    }

    pub fn life_offset_independent(mut self, independent: bool) -> Self {
        self.config_mut().life_offset.independent = independent;
        self
    }

    /// Delay in ms before the first spawn of each cycle
    pub fn delay(mut self, min: f32, max: f32) -> Self {
        let delay = &mut self.config_mut().delay;
        delay.active = true;
        delay.set_low(min, max);
        self
    }

    /// Emission cycle length in ms
    pub fn duration(mut self, min: f32, max: f32) -> Self {
        self.config_mut().duration.set_low(min, max);
        self
    }

    pub fn count(mut self, min: usize, max: usize) -> Self {
        let config = self.config_mut();
        config.min_particles = min;
        config.max_particles = max;
        self
    }

    pub fn shape(mut self, shape: SpawnShape) -> Self {
        self.config_mut().spawn_shape.shape = shape;
        self
    }

    /// Spawn on the ellipse outline, optionally limited to one half
    pub fn ellipse_edges(mut self, edges: bool, side: EllipseSide) -> Self {
        let spawn = &mut self.config_mut().spawn_shape;
        spawn.edges = edges;
        spawn.side = side;
        self
    }

    /// Tint gradient: three floats per timeline entry
    pub fn tint(mut self, colors: &[f32], timeline: &[f32]) -> Result<Self> {
        self.config_mut()
            .tint
            .set_colors(colors.to_vec(), timeline.to_vec())?;
        Ok(self)
    }

    pub fn attached(mut self, attached: bool) -> Self {
        self.config_mut().attached = attached;
        self
    }

    pub fn continuous(mut self, continuous: bool) -> Self {
        self.config_mut().continuous = continuous;
        self
    }

    pub fn aligned(mut self, aligned: bool) -> Self {
        self.config_mut().aligned = aligned;
        self
    }

    pub fn additive(mut self, additive: bool) -> Self {
        self.config_mut().additive = additive;
        self
    }

    pub fn behind(mut self, behind: bool) -> Self {
        self.config_mut().behind = behind;
        self
    }

    pub fn premultiplied_alpha(mut self, premultiplied: bool) -> Self {
        self.config_mut().premultiplied_alpha = premultiplied;
        self
    }

    pub fn sprite_mode(mut self, mode: SpriteMode) -> Self {
        self.config_mut().sprite_mode = mode;
        self
    }

    pub fn image_path(mut self, path: impl Into<String>) -> Self {
        self.config_mut().image_paths.push(path.into());
        self
    }

    pub fn image_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config_mut().image_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Initial emitter position, applied by `build`
    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Vec2::new(x, y));
        self
    }
}

/// Assembles an [`Effect`] from emitter builders
#[derive(Default)]
pub struct EffectBuilder {
    emitters: Vec<Emitter>,
    position: Option<Vec2>,
    duration: Option<f32>,
    seed: Option<u64>,
}

impl EffectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitter(mut self, emitter: Emitter) -> Self {
        self.emitters.push(emitter);
        self
    }

    /// Build an emitter in place from a named builder
    pub fn emitter_with(
        mut self,
        name: impl Into<String>,
        f: impl FnOnce(EmitterBuilder) -> EmitterBuilder,
    ) -> Self {
        self.emitters.push(f(EmitterBuilder::new(name)).build());
        self
    }

    /// Like [`EffectBuilder::emitter_with`] for setters that can fail
    pub fn try_emitter_with(
        mut self,
        name: impl Into<String>,
        f: impl FnOnce(EmitterBuilder) -> Result<EmitterBuilder>,
    ) -> Result<Self> {
        self.emitters.push(f(EmitterBuilder::new(name))?.build());
        Ok(self)
    }

    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Vec2::new(x, y));
        self
    }

    /// Make every emitter a one-shot of `duration` ms once built
    pub fn duration(mut self, duration: f32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Effect {
        let mut effect = Effect::from_emitters(self.emitters);
        if let Some(seed) = self.seed {
            effect.reseed(seed);
        }
        if let Some(p) = self.position {
            effect.set_position(p.x, p.y);
        }
        if let Some(duration) = self.duration {
            effect.set_duration(duration);
        }
        effect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::RangedValue;
    use ember_core::EmberError;

    #[test]
    fn build_produces_configured_emitter() {
        let emitter = EmitterBuilder::new("smoke")
            .count(2, 40)
            .life_low(500.0, 800.0)
            .velocity_high(10.0, 20.0)
            .velocity_relative(true)
            .shape(SpawnShape::Square)
            .continuous(true)
            .image_path("smoke.png")
            .position(3.0, 4.0)
            .build();

        let config = emitter.config();
        assert_eq!(config.name, "smoke");
        assert_eq!((config.min_particles, config.max_particles), (2, 40));
        assert_eq!((config.life.low_min, config.life.low_max), (500.0, 800.0));
        assert!(config.velocity.active && config.velocity.relative);
        assert_eq!(config.velocity.high_max, 20.0);
        assert_eq!(config.spawn_shape.shape, SpawnShape::Square);
        assert_eq!(config.image_paths, vec!["smoke.png".to_string()]);
        assert_eq!(emitter.position(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn edit_mutates_existing_config_in_place() {
        let mut emitter = EmitterBuilder::new("fire").build();
        EmitterBuilder::edit(emitter.config_mut())
            .gravity_low(-5.0, -5.0)
            .additive(false)
            .angle_envelope(&[0.0, 1.0], &[1.0, 0.0])
            .unwrap();

        let config = emitter.config();
        assert!(config.gravity.active);
        assert_eq!(config.gravity.low_min, -5.0);
        assert!(!config.additive);
        assert_eq!(config.angle.scaling(), &[1.0, 0.0]);
        assert_eq!(config.angle.timeline(), &[0.0, 1.0]);
    }

    #[test]
    fn one_step_curve_sets_everything() {
        let builder = EmitterBuilder::new("a")
            .transparency(&[0.0, 1.0], &[0.0, 1.0], 1.0, 1.0, 0.0, 0.0)
            .unwrap();
        let t = &builder.config().transparency;
        assert_eq!((t.low_min, t.high_max), (1.0, 0.0));
        assert!(t.is_animated());
    }

    #[test]
    fn tint_rejects_mismatched_colors() {
        let err = EmitterBuilder::new("a")
            .tint(&[1.0, 0.0, 0.0, 1.0], &[0.0, 1.0])
            .err()
            .unwrap();
        assert!(matches!(err, EmberError::Configuration(_)));

        let ok = EmitterBuilder::new("a")
            .tint(&[1.0, 0.0, 0.0, 0.0, 0.0, 1.0], &[0.0, 1.0])
            .unwrap();
        assert!(ok.config().tint.is_animated());
    }

    #[test]
    fn envelope_mismatch_is_rejected() {
        let result = EmitterBuilder::new("a").life_envelope(&[0.0, 0.5, 1.0], &[1.0, 0.0]);
        assert!(result.is_err());
    }

    #[test]
    fn effect_builder_collects_emitters_in_order() {
        let effect = EffectBuilder::new()
            .emitter_with("back", |b| b.count(0, 8))
            .emitter(EmitterBuilder::new("front").build())
            .position(10.0, 0.0)
            .duration(250.0)
            .seed(9)
            .build();
        let names: Vec<_> = effect.emitters().iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, ["back", "front"]);
        assert!(effect.emitters().iter().all(|e| e.position() == Vec2::new(10.0, 0.0)));
        assert!(effect.emitters().iter().all(|e| e.duration() == 250.0));
    }

    #[test]
    fn effect_duration_survives_start() {
        let mut effect = EffectBuilder::new()
            .emitter_with("a", |b| b.duration(1000.0, 1000.0).continuous(true))
            .duration(250.0)
            .build();
        effect.start();
        let emitter = &effect.emitters()[0];
        assert_eq!(emitter.duration(), 250.0);
        assert!(!emitter.config().continuous);
        assert_eq!(emitter.config().duration, RangedValue::new(250.0, 250.0));

        effect.reset();
        assert_eq!(effect.emitters()[0].duration(), 250.0);
    }

    #[test]
    fn fallible_emitter_closure_propagates() {
        let result = EffectBuilder::new().try_emitter_with("bad", |b| {
            b.tint(&[1.0], &[0.0])
        });
        assert!(result.is_err());
    }
}
