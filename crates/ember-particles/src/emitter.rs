//! Emitter configuration and runtime simulation
//!
//! Time-valued curves (delay, duration, life, life offset) are in
//! milliseconds, emission in particles per second, spatial curves in world
//! units and angles in degrees.

use crate::curves::{CurveSpan, GradientColor, RangedValue, ScaledValue};
use crate::deflect::{NoDeflection, RayQuery};
use crate::particle::{Particle, ParticlePool};
use crate::rand::ParticleRng;
use crate::render::{BlendMode, Sprite, SpriteBatch, SpriteSource};
use crate::spawn::SpawnShapeValue;
use ember_core::{Bounds, Color, EmberError, Result, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How particles pick a sprite from the emitter's bound sprites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpriteMode {
    /// Always the first sprite
    #[default]
    Single,
    /// A random sprite per particle
    Random,
    /// Step through the sprites over the particle's life
    Animated,
}

impl fmt::Display for SpriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SpriteMode::Single => "single",
            SpriteMode::Random => "random",
            SpriteMode::Animated => "animated",
        })
    }
}

impl FromStr for SpriteMode {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single" => Ok(SpriteMode::Single),
            "random" => Ok(SpriteMode::Random),
            "animated" => Ok(SpriteMode::Animated),
            other => Err(EmberError::config(format!("unknown sprite mode '{other}'"))),
        }
    }
}

/// Everything that describes an emitter, independent of its runtime state.
///
/// This is the persisted part of an emitter: the text and TOML formats both
/// read and write exactly these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub name: String,
    pub min_particles: usize,
    pub max_particles: usize,
    /// Live particles follow the emitter when it moves
    pub attached: bool,
    /// Restart emission after each duration instead of stopping
    pub continuous: bool,
    /// Add the travel angle to each particle's rotation
    pub aligned: bool,
    pub additive: bool,
    /// Draw behind the host's foreground (hint for editors and hosts)
    pub behind: bool,
    pub premultiplied_alpha: bool,
    pub sprite_mode: SpriteMode,
    pub image_paths: Vec<String>,

    pub delay: RangedValue,
    pub duration: RangedValue,
    pub emission: ScaledValue,
    pub life: ScaledValue,
    pub life_offset: ScaledValue,
    pub x_offset: ScaledValue,
    pub y_offset: ScaledValue,
    pub spawn_shape: SpawnShapeValue,
    pub spawn_width: ScaledValue,
    pub spawn_height: ScaledValue,
    pub x_scale: ScaledValue,
    pub y_scale: ScaledValue,
    pub velocity: ScaledValue,
    pub angle: ScaledValue,
    pub rotation: ScaledValue,
    pub wind: ScaledValue,
    pub gravity: ScaledValue,
    pub tint: GradientColor,
    pub transparency: ScaledValue,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            min_particles: 0,
            max_particles: 4,
            attached: false,
            continuous: false,
            aligned: false,
            additive: true,
            behind: false,
            premultiplied_alpha: false,
            sprite_mode: SpriteMode::Single,
            image_paths: Vec::new(),
            delay: RangedValue::default(),
            duration: RangedValue::new(1000.0, 1000.0),
            emission: ScaledValue::active(),
            life: ScaledValue::active(),
            life_offset: ScaledValue::default(),
            x_offset: ScaledValue::default(),
            y_offset: ScaledValue::default(),
            spawn_shape: SpawnShapeValue::default(),
            spawn_width: ScaledValue::active(),
            spawn_height: ScaledValue::active(),
            x_scale: ScaledValue::active(),
            y_scale: ScaledValue::default(),
            velocity: ScaledValue::default(),
            angle: ScaledValue::default(),
            rotation: ScaledValue::default(),
            wind: ScaledValue::default(),
            gravity: ScaledValue::default(),
            tint: GradientColor::default(),
            transparency: ScaledValue::active(),
        }
    }
}

impl EmitterConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// All scaled curves with their display names
    pub fn curves(&self) -> [(&'static str, &ScaledValue); 15] {
        [
            ("emission", &self.emission),
            ("life", &self.life),
            ("life offset", &self.life_offset),
            ("x offset", &self.x_offset),
            ("y offset", &self.y_offset),
            ("spawn width", &self.spawn_width),
            ("spawn height", &self.spawn_height),
            ("x scale", &self.x_scale),
            ("y scale", &self.y_scale),
            ("velocity", &self.velocity),
            ("angle", &self.angle),
            ("rotation", &self.rotation),
            ("wind", &self.wind),
            ("gravity", &self.gravity),
            ("transparency", &self.transparency),
        ]
    }

    /// Check curve invariants for a config that bypassed the setters
    pub fn validate(&self) -> Result<()> {
        for (label, curve) in self.curves() {
            curve.validate().map_err(|e| {
                EmberError::config(format!("emitter '{}', {label}: {e}", self.name))
            })?;
        }
        self.tint
            .validate()
            .map_err(|e| EmberError::config(format!("emitter '{}', tint: {e}", self.name)))?;
        if self.min_particles > self.max_particles {
            return Err(EmberError::config(format!(
                "emitter '{}': min particles {} exceeds max {}",
                self.name, self.min_particles, self.max_particles
            )));
        }
        Ok(())
    }

    /// Permanently scale every size-related range
    pub fn scale_size(&mut self, scale_x: f32, scale_y: f32) {
        if scale_x == 1.0 && scale_y == 1.0 {
            return;
        }
        for value in [&mut self.x_scale, &mut self.spawn_width, &mut self.x_offset] {
            value.scale(scale_x);
        }
        for value in [&mut self.y_scale, &mut self.spawn_height, &mut self.y_offset] {
            value.scale(scale_y);
        }
    }

    /// Permanently scale every motion-related range
    pub fn scale_motion(&mut self, scale: f32) {
        if scale == 1.0 {
            return;
        }
        for value in [&mut self.velocity, &mut self.wind, &mut self.gravity] {
            value.scale(scale);
        }
    }

    pub fn match_x_size(&mut self, template: &EmitterConfig) {
        self.x_scale.set_from(&template.x_scale);
        self.spawn_width.set_from(&template.spawn_width);
        self.x_offset.set_from(&template.x_offset);
    }

    pub fn match_y_size(&mut self, template: &EmitterConfig) {
        self.y_scale.set_from(&template.y_scale);
        self.spawn_height.set_from(&template.spawn_height);
        self.y_offset.set_from(&template.y_offset);
    }

    pub fn match_size(&mut self, template: &EmitterConfig) {
        self.match_x_size(template);
        self.match_y_size(template);
    }

    pub fn match_motion(&mut self, template: &EmitterConfig) {
        self.velocity.set_from(&template.velocity);
        self.wind.set_from(&template.wind);
        self.gravity.set_from(&template.gravity);
    }

    /// Mirror the effect vertically
    pub fn flip_y(&mut self) {
        self.angle.negate();
        self.gravity.negate();
        self.wind.negate();
        self.rotation.negate();
        self.y_offset.low_min = -self.y_offset.low_min;
        self.y_offset.low_max = -self.y_offset.low_max;
    }

    pub fn blend_mode(&self) -> BlendMode {
        if self.premultiplied_alpha {
            BlendMode::Premultiplied
        } else if self.additive {
            BlendMode::Additive
        } else {
            BlendMode::Alpha
        }
    }
}

/// Lifecycle phase reported by [`Emitter::state`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterState {
    NotStarted,
    Delaying,
    Emitting,
    /// Emission has ended; live particles are still finishing
    Draining,
    Complete,
}

/// Which particle attributes change after spawn (recomputed each cycle)
#[derive(Debug, Clone, Copy, Default)]
struct Animated {
    scale: bool,
    angle: bool,
    rotation: bool,
    velocity: bool,
    wind: bool,
    gravity: bool,
    tint: bool,
    sprite: bool,
}

impl Animated {
    fn from_config(config: &EmitterConfig) -> Self {
        Self {
            scale: config.x_scale.is_animated()
                || (config.y_scale.active && config.y_scale.is_animated()),
            angle: config.angle.active && config.angle.is_animated(),
            rotation: config.rotation.active && config.rotation.is_animated(),
            velocity: config.velocity.active,
            wind: config.wind.active,
            gravity: config.gravity.active,
            tint: config.tint.is_animated(),
            sprite: config.sprite_mode == SpriteMode::Animated,
        }
    }
}

/// One independently timed source of particles.
#[derive(Debug, Clone)]
pub struct Emitter {
    config: EmitterConfig,
    pool: ParticlePool,
    sprites: Vec<Sprite>,
    rng: ParticleRng,
    position: Vec2,
    flip_x: bool,
    flip_y: bool,
    cleans_up_blend: bool,

    /// Sub-millisecond carry between updates
    accumulator: f32,
    /// Elapsed ms not yet converted into particles
    emission_delta: f32,
    emission: CurveSpan,
    life: CurveSpan,
    life_offset: CurveSpan,
    spawn_width: CurveSpan,
    spawn_height: CurveSpan,
    duration: f32,
    duration_timer: f32,
    delay: f32,
    delay_timer: f32,
    started: bool,
    first_update: bool,
    allow_completion: bool,
    animated: Animated,
}

impl Emitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self::with_rng(config, ParticleRng::from_entropy())
    }

    /// Emitter with a deterministic random stream
    pub fn with_seed(config: EmitterConfig, seed: u64) -> Self {
        Self::with_rng(config, ParticleRng::new(seed))
    }

    fn with_rng(config: EmitterConfig, rng: ParticleRng) -> Self {
        let pool = ParticlePool::new(config.max_particles);
        let animated = Animated::from_config(&config);
        Self {
            config,
            pool,
            sprites: Vec::new(),
            rng,
            position: Vec2::ZERO,
            flip_x: false,
            flip_y: false,
            cleans_up_blend: true,
            accumulator: 0.0,
            emission_delta: 0.0,
            emission: CurveSpan::default(),
            life: CurveSpan::default(),
            life_offset: CurveSpan::default(),
            spawn_width: CurveSpan::default(),
            spawn_height: CurveSpan::default(),
            duration: 1.0,
            duration_timer: 0.0,
            delay: 0.0,
            delay_timer: 0.0,
            started: false,
            first_update: false,
            allow_completion: false,
            animated,
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Mutable access to the persisted configuration. Changes to timings and
    /// animated attributes take effect at the next cycle; a changed
    /// `max_particles` resizes the pool (dropping live particles) at the
    /// next `start`.
    pub fn config_mut(&mut self) -> &mut EmitterConfig {
        &mut self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = ParticleRng::new(seed);
    }

    /// Begin a fresh emission cycle, keeping live particles
    pub fn start(&mut self) {
        if self.pool.capacity() != self.config.max_particles {
            self.pool.resize(self.config.max_particles);
        }
        self.started = true;
        self.first_update = true;
        self.allow_completion = false;
        self.restart();
        self.duration_timer = 0.0;
    }

    /// Drop all particles and timers, then start again
    pub fn reset(&mut self) {
        self.emission_delta = 0.0;
        self.accumulator = 0.0;
        self.pool.clear();
        self.start();
    }

    fn restart(&mut self) {
        self.delay = if self.config.delay.active {
            self.config.delay.new_low_value(&mut self.rng)
        } else {
            0.0
        };
        self.delay_timer = 0.0;

        self.duration_timer -= self.duration;
        self.duration = self.config.duration.new_low_value(&mut self.rng);

        self.emission = self.config.emission.sample_span(&mut self.rng);

        if !self.config.life.independent {
            self.generate_life_values();
        }
        if !self.config.life_offset.independent {
            self.generate_life_offset_values();
        }

        self.spawn_width = self.config.spawn_width.sample_span(&mut self.rng);
        self.spawn_height = self.config.spawn_height.sample_span(&mut self.rng);

        self.animated = Animated::from_config(&self.config);
        log::trace!(
            "emitter '{}' cycle: delay {:.0}ms, duration {:.0}ms",
            self.config.name,
            self.delay,
            self.duration
        );
    }

    fn generate_life_values(&mut self) {
        self.life = self.config.life.sample_span(&mut self.rng);
    }

    fn generate_life_offset_values(&mut self) {
        self.life_offset = if self.config.life_offset.active {
            self.config.life_offset.sample_span(&mut self.rng)
        } else {
            CurveSpan {
                low: 0.0,
                diff: self.config.life_offset.sample_high(&mut self.rng),
            }
        };
    }

    /// Fraction of the current duration elapsed
    fn duration_percent(&self) -> f32 {
        if self.duration > 0.0 {
            self.duration_timer / self.duration
        } else {
            1.0
        }
    }

    /// Advance the simulation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.step(dt, None::<&mut NoDeflection>);
    }

    /// Advance by `dt` seconds, routing each particle's movement through `deflector`
    pub fn update_deflected<Q: RayQuery + ?Sized>(&mut self, dt: f32, deflector: &mut Q) {
        self.step(dt, Some(deflector));
    }

    fn step<Q: RayQuery + ?Sized>(&mut self, dt: f32, mut deflector: Option<&mut Q>) {
        self.accumulator += dt * 1000.0;
        if self.accumulator < 1.0 {
            return;
        }
        let delta_millis = self.accumulator.floor();
        self.accumulator -= delta_millis;

        if self.started {
            if self.delay_timer < self.delay {
                self.delay_timer += delta_millis;
            } else {
                self.emit(delta_millis);
            }
        }

        let config = &self.config;
        let animated = self.animated;
        let sprite_count = self.sprites.len();
        for p in self.pool.alive_slice_mut() {
            advance_particle(
                config,
                animated,
                sprite_count,
                p,
                delta_millis,
                deflector.as_deref_mut(),
            );
        }
        self.pool.retain_alive();
    }

    fn emit(&mut self, delta_millis: f32) {
        if self.first_update {
            self.first_update = false;
            self.add_particle();
        }

        if self.duration_timer < self.duration {
            self.duration_timer += delta_millis;
        } else if !self.config.continuous || self.allow_completion {
            return;
        } else {
            self.restart();
        }

        self.emission_delta += delta_millis;
        let rate = self.emission.at(self.config.emission.scale_at(self.duration_percent()));
        if rate > 0.0 {
            let interval = 1000.0 / rate;
            if self.emission_delta >= interval {
                let due = (self.emission_delta / interval) as usize;
                let count = due.min(self.pool.remaining());
                self.emission_delta -= count as f32 * interval;
                self.emission_delta %= interval;
                self.add_particles(count);
            }
        }
        let active = self.pool.alive_count();
        if active < self.config.min_particles {
            self.add_particles(self.config.min_particles - active);
        }
    }

    pub fn add_particle(&mut self) {
        self.add_particles(1);
    }

    /// Spawn up to `count` particles; extra requests beyond capacity are dropped
    pub fn add_particles(&mut self, count: usize) {
        let count = count.min(self.pool.remaining());
        for _ in 0..count {
            let particle = self.activate_particle();
            self.pool.spawn(particle);
        }
    }

    fn activate_particle(&mut self) -> Particle {
        let percent = self.duration_percent();
        let animated = self.animated;

        let sprite = match self.config.sprite_mode {
            SpriteMode::Random if !self.sprites.is_empty() => self.rng.index(self.sprites.len()),
            _ => 0,
        };
        let aspect = self.sprites.get(sprite).map_or(1.0, Sprite::aspect);

        if self.config.life.independent {
            self.generate_life_values();
        }
        if self.config.life_offset.independent {
            self.generate_life_offset_values();
        }

        let config = &self.config;
        let rng = &mut self.rng;
        let mut p = Particle::dead();
        p.sprite = sprite;
        p.aspect = aspect;
        p.lifetime = config.life.eval(self.life, percent);

        if config.velocity.active {
            p.velocity = config.velocity.sample_span(rng);
        }

        p.angle = config.angle.sample_span(rng);
        if !animated.angle {
            p.set_heading(config.angle.eval(p.angle, 0.0));
        }

        p.x_scale = config.x_scale.sample_span(rng);
        if config.y_scale.active {
            p.y_scale = config.y_scale.sample_span(rng);
        }
        p.size = particle_size(config, &p, 0.0);

        if config.rotation.active {
            p.spin = config.rotation.sample_span(rng);
            let mut rotation = config.rotation.eval(p.spin, 0.0);
            if config.aligned {
                rotation += p.heading;
            }
            p.rotation = rotation;
        }

        if config.wind.active {
            p.wind = config.wind.sample_span(rng);
        }
        if config.gravity.active {
            p.gravity = config.gravity.sample_span(rng);
        }

        p.tint = config.tint.color_at(0.0);
        let low = config.transparency.sample_low(rng);
        let high = config.transparency.sample_high(rng);
        p.transparency = CurveSpan::absolute(low, high);
        p.color = particle_color(config, p.tint, config.transparency.eval(p.transparency, 0.0));

        // Spawn position
        let mut x = self.position.x;
        if config.x_offset.active {
            x += config.x_offset.sample_low(rng);
        }
        let mut y = self.position.y;
        if config.y_offset.active {
            y += config.y_offset.sample_low(rng);
        }
        let width = config.spawn_width.eval(self.spawn_width, percent);
        let height = config.spawn_height.eval(self.spawn_height, percent);
        let offset = config.spawn_shape.offset(width, height, rng);
        if let Some(angle) = offset.angle {
            if !animated.angle {
                p.set_heading(angle);
            }
        }
        p.position = Vec2::new(x + offset.dx, y + offset.dy);

        let offset_time = config.life_offset.eval(self.life_offset, percent);
        if offset_time > 0.0 {
            let offset_time = offset_time.min(p.lifetime - 1.0).max(0.0);
            advance_particle(
                config,
                animated,
                self.sprites.len(),
                &mut p,
                offset_time,
                None::<&mut NoDeflection>,
            );
        }
        p
    }

    /// Let the emitter finish smoothly: ignores `continuous` until the next
    /// `start` and stops emitting new particles.
    pub fn allow_completion(&mut self) {
        self.allow_completion = true;
        self.duration_timer = self.duration;
    }

    pub fn is_complete(&self) -> bool {
        if !self.started {
            return false;
        }
        if self.config.continuous && !self.allow_completion {
            return false;
        }
        if self.delay_timer < self.delay {
            return false;
        }
        self.duration_timer >= self.duration && self.pool.alive_count() == 0
    }

    pub fn state(&self) -> EmitterState {
        if !self.started {
            EmitterState::NotStarted
        } else if self.delay_timer < self.delay {
            EmitterState::Delaying
        } else if self.is_complete() {
            EmitterState::Complete
        } else if self.duration_timer >= self.duration
            && (!self.config.continuous || self.allow_completion)
        {
            EmitterState::Draining
        } else {
            EmitterState::Emitting
        }
    }

    /// Progress through the current duration in [0, 1]
    pub fn percent_complete(&self) -> f32 {
        if self.delay_timer < self.delay {
            return 0.0;
        }
        self.duration_percent().min(1.0)
    }

    /// Truncate the current cycle to a one-shot of `duration` ms
    /// Turn the emitter into a one-shot of `duration` ms that survives
    /// later `start`/`reset` calls
    pub fn set_duration(&mut self, duration: f32) {
        self.config.continuous = false;
        self.config.duration = RangedValue::new(duration, duration);
        self.duration = duration;
        self.duration_timer = 0.0;
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn active_count(&self) -> usize {
        self.pool.alive_count()
    }

    pub fn particles(&self) -> &[Particle] {
        self.pool.alive_slice()
    }

    pub fn max_particles(&self) -> usize {
        self.config.max_particles
    }

    /// Change the pool capacity; live particles are dropped.
    pub fn set_max_particles(&mut self, max: usize) {
        self.config.max_particles = max;
        self.pool.resize(max);
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Move the emitter; attached emitters drag their live particles along.
    pub fn set_position(&mut self, x: f32, y: f32) {
        if self.config.attached {
            let dx = x - self.position.x;
            let dy = y - self.position.y;
            for p in self.pool.alive_slice_mut() {
                p.position.x += dx;
                p.position.y += dy;
            }
        }
        self.position = Vec2::new(x, y);
    }

    pub fn set_flip(&mut self, flip_x: bool, flip_y: bool) {
        self.flip_x = flip_x;
        self.flip_y = flip_y;
    }

    pub fn flip_y(&mut self) {
        self.config.flip_y();
    }

    pub fn scale_size(&mut self, scale_x: f32, scale_y: f32) {
        self.config.scale_size(scale_x, scale_y);
    }

    pub fn scale_motion(&mut self, scale: f32) {
        self.config.scale_motion(scale);
    }

    pub fn match_size(&mut self, template: &Emitter) {
        self.config.match_size(&template.config);
    }

    pub fn match_x_size(&mut self, template: &Emitter) {
        self.config.match_x_size(&template.config);
    }

    pub fn match_y_size(&mut self, template: &Emitter) {
        self.config.match_y_size(&template.config);
    }

    pub fn match_motion(&mut self, template: &Emitter) {
        self.config.match_motion(&template.config);
    }

    /// Whether `draw` restores alpha blending after an additive or
    /// premultiplied emitter
    pub fn cleans_up_blend(&self) -> bool {
        self.cleans_up_blend
    }

    pub fn set_cleans_up_blend(&mut self, cleans_up: bool) {
        self.cleans_up_blend = cleans_up;
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    /// Bind sprites and re-point live particles at valid indices
    pub fn bind_sprites(&mut self, sprites: Vec<Sprite>) {
        self.sprites = sprites;
        let n = self.sprites.len();
        if n == 0 {
            return;
        }
        for p in self.pool.alive_slice_mut() {
            p.sprite = match self.config.sprite_mode {
                SpriteMode::Single => 0,
                SpriteMode::Random => self.rng.index(n),
                SpriteMode::Animated => animated_frame(p.age_ratio(), n),
            };
        }
    }

    /// Resolve every image path through `source`
    pub fn load_images(&mut self, source: &mut dyn SpriteSource) -> Result<()> {
        let mut sprites = Vec::with_capacity(self.config.image_paths.len());
        for path in &self.config.image_paths {
            let sprite = source.resolve(path).ok_or_else(|| EmberError::MissingImage {
                emitter: self.config.name.clone(),
                path: path.clone(),
            })?;
            sprites.push(sprite);
        }
        log::debug!(
            "emitter '{}' bound {} sprite(s)",
            self.config.name,
            sprites.len()
        );
        self.bind_sprites(sprites);
        Ok(())
    }

    /// Issue one draw call per live particle
    pub fn draw(&self, batch: &mut dyn SpriteBatch) {
        if self.sprites.is_empty() {
            return;
        }
        let mode = self.config.blend_mode();
        batch.set_blend_mode(mode);
        let last = self.sprites.len() - 1;
        for p in self.pool.alive_slice() {
            let sprite = &self.sprites[p.sprite.min(last)];
            batch.draw(sprite, &p.quad(self.flip_x, self.flip_y));
        }
        if self.cleans_up_blend && mode != BlendMode::Alpha {
            batch.set_blend_mode(BlendMode::Alpha);
        }
    }

    /// Bounds of all live particles; empty when none are alive
    pub fn bounding_box(&self) -> Bounds {
        let mut bounds = Bounds::EMPTY;
        for p in self.pool.alive_slice() {
            bounds.merge(&p.bounds());
        }
        bounds
    }
}

fn animated_frame(percent: f32, frames: usize) -> usize {
    ((percent * frames as f32) as usize).min(frames.saturating_sub(1))
}

fn particle_size(config: &EmitterConfig, p: &Particle, percent: f32) -> Vec2 {
    let width = config.x_scale.eval(p.x_scale, percent);
    let height = if config.y_scale.active {
        config.y_scale.eval(p.y_scale, percent)
    } else {
        width * p.aspect
    };
    Vec2::new(width, height)
}

fn particle_color(config: &EmitterConfig, tint: [f32; 3], alpha: f32) -> Color {
    if config.premultiplied_alpha {
        let alpha_out = if config.additive { 0.0 } else { alpha };
        Color::new(tint[0] * alpha, tint[1] * alpha, tint[2] * alpha, alpha_out)
    } else {
        Color::from_rgb(tint, alpha)
    }
}

/// Age a particle by `delta_millis` and recompute its animated attributes.
/// Expired particles are only flagged; the pool retires them.
fn advance_particle<Q: RayQuery + ?Sized>(
    config: &EmitterConfig,
    animated: Animated,
    sprite_count: usize,
    p: &mut Particle,
    delta_millis: f32,
    deflector: Option<&mut Q>,
) {
    p.age += delta_millis;
    if p.age >= p.lifetime {
        p.alive = false;
        return;
    }
    let percent = p.age / p.lifetime;
    let delta = delta_millis / 1000.0;

    if animated.scale {
        p.size = particle_size(config, p, percent);
    }

    if animated.velocity {
        let speed = config.velocity.eval(p.velocity, percent) * delta;
        let (cos, sin, heading) = if animated.angle {
            let angle = config.angle.eval(p.angle, percent);
            let rad = angle.to_radians();
            (rad.cos(), rad.sin(), angle)
        } else {
            (p.heading_cos, p.heading_sin, p.heading)
        };
        if animated.rotation || config.aligned {
            let mut rotation = config.rotation.eval(p.spin, percent);
            if config.aligned {
                rotation += heading;
            }
            p.rotation = rotation;
        }

        let mut dx = speed * cos;
        let mut dy = speed * sin;
        if animated.wind {
            dx += config.wind.eval(p.wind, percent) * delta;
        }
        if animated.gravity {
            dy += config.gravity.eval(p.gravity, percent) * delta;
        }
        translate(p, Vec2::new(dx, dy), heading, deflector);
    } else if animated.rotation {
        p.rotation = config.rotation.eval(p.spin, percent);
    }

    let tint = if animated.tint {
        config.tint.color_at(percent)
    } else {
        p.tint
    };
    p.color = particle_color(config, tint, config.transparency.eval(p.transparency, percent));

    if animated.sprite && sprite_count > 0 {
        p.sprite = animated_frame(percent, sprite_count);
    }
}

/// Move a particle, reflecting off whatever the deflector reports.
fn translate<Q: RayQuery + ?Sized>(
    p: &mut Particle,
    displacement: Vec2,
    heading: f32,
    deflector: Option<&mut Q>,
) {
    let start = p.position;
    let end = start + displacement;
    let hit = match deflector {
        Some(query) if displacement != Vec2::ZERO => query.cast(start, end),
        _ => None,
    };
    let Some(hit) = hit else {
        p.position = end;
        return;
    };

    let fraction = hit.fraction.clamp(0.0, 1.0);
    let normal = hit.normal.normalized();
    let reflected = displacement.reflect(&normal);
    p.position = start + displacement * fraction + reflected * (1.0 - fraction);

    let new_heading = reflected.angle_deg();
    // Shift the angle curve so animated angles keep the reflected direction
    p.angle.low += new_heading - heading;
    p.set_heading(new_heading);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deflect::RayHit;
    use crate::render::{SpriteHandle, SpriteQuad};
    use crate::spawn::SpawnShape;

    fn one_shot(rate: f32, life_ms: f32) -> EmitterConfig {
        let mut config = EmitterConfig::new("burst");
        config.max_particles = 100;
        config.duration = RangedValue::new(1000.0, 1000.0);
        config.emission = ScaledValue::constant(rate);
        config.life = ScaledValue::constant(life_ms);
        config
    }

    struct RecordingBatch {
        modes: Vec<BlendMode>,
        quads: Vec<(SpriteHandle, SpriteQuad)>,
    }

    impl SpriteBatch for RecordingBatch {
        fn set_blend_mode(&mut self, mode: BlendMode) {
            self.modes.push(mode);
        }

        fn draw(&mut self, sprite: &Sprite, quad: &SpriteQuad) {
            self.quads.push((sprite.handle, *quad));
        }
    }

    #[test]
    fn default_config_is_sane() {
        let config = EmitterConfig::default();
        assert!(config.max_particles > 0);
        assert!(config.emission.active && config.life.active);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn not_started_emitter_spawns_nothing() {
        let mut emitter = Emitter::with_seed(one_shot(10.0, 500.0), 1);
        emitter.update(0.5);
        assert_eq!(emitter.active_count(), 0);
        assert_eq!(emitter.state(), EmitterState::NotStarted);
        assert!(!emitter.is_complete());
    }

    #[test]
    fn one_second_at_ten_per_second_then_completes() {
        let mut emitter = Emitter::with_seed(one_shot(10.0, 250.0), 7);
        emitter.start();
        for _ in 0..10 {
            emitter.update(0.1);
        }
        // Only the last couple of spawns are still alive
        assert!(emitter.active_count() > 0);
        assert!(!emitter.is_complete());

        let mut ticks = 0;
        while !emitter.is_complete() && ticks < 20 {
            emitter.update(0.1);
            ticks += 1;
        }
        assert!(emitter.is_complete());
        assert_eq!(emitter.state(), EmitterState::Complete);
        // Last spawn at 1.0s plus 250ms of life
        assert!(ticks <= 4, "took {ticks} extra ticks");
    }

    #[test]
    fn emission_counts_whole_particles_exactly() {
        let mut config = one_shot(10.0, 5000.0);
        config.max_particles = 50;
        let mut emitter = Emitter::with_seed(config, 3);
        emitter.start();
        for _ in 0..10 {
            emitter.update(0.1);
        }
        // Nothing expires within 5s, so the active count is the spawn count:
        // one immediate particle on the first update, then one per 100ms
        let spawned = emitter.active_count();
        assert!((10..=11).contains(&spawned), "spawned {spawned}");
        assert_eq!(spawned, 11);
        emitter.update(0.1);
        assert_eq!(emitter.active_count(), 11);
        assert_eq!(emitter.state(), EmitterState::Draining);
    }

    #[test]
    fn fractional_emission_carries_across_frames() {
        // 10/s at 62.5ms ticks: a particle every 100ms, never dropped
        let mut config = one_shot(10.0, 5000.0);
        config.duration = RangedValue::new(600.0, 600.0);
        let mut emitter = Emitter::with_seed(config, 5);
        emitter.start();
        for _ in 0..20 {
            emitter.update(0.0625);
        }
        // 1 initial + 6 over 600ms
        assert_eq!(emitter.active_count(), 7);
    }

    #[test]
    fn pool_exhaustion_caps_spawns() {
        let mut config = one_shot(1000.0, 5000.0);
        config.max_particles = 5;
        let mut emitter = Emitter::with_seed(config, 9);
        emitter.start();
        for _ in 0..5 {
            emitter.update(0.1);
        }
        assert_eq!(emitter.active_count(), 5);
    }

    #[test]
    fn delay_postpones_first_spawn() {
        let mut config = one_shot(10.0, 5000.0);
        config.delay = RangedValue::new(300.0, 300.0);
        let mut emitter = Emitter::with_seed(config, 11);
        emitter.start();
        emitter.update(0.1);
        emitter.update(0.1);
        assert_eq!(emitter.state(), EmitterState::Delaying);
        assert_eq!(emitter.active_count(), 0);
        assert_eq!(emitter.percent_complete(), 0.0);
        emitter.update(0.1);
        emitter.update(0.1);
        assert!(emitter.active_count() > 0);
    }

    #[test]
    fn continuous_emitter_never_completes_until_allowed() {
        let mut config = one_shot(20.0, 100.0);
        config.continuous = true;
        config.duration = RangedValue::new(200.0, 200.0);
        let mut emitter = Emitter::with_seed(config, 13);
        emitter.start();
        for _ in 0..30 {
            emitter.update(0.05);
            assert!(!emitter.is_complete());
        }
        assert!(emitter.active_count() > 0);

        emitter.allow_completion();
        for _ in 0..10 {
            emitter.update(0.05);
        }
        assert!(emitter.is_complete());

        // start() re-arms continuous emission
        emitter.start();
        emitter.update(0.05);
        assert!(!emitter.is_complete());
        assert!(emitter.active_count() > 0);
    }

    #[test]
    fn min_particles_are_topped_up() {
        let mut config = one_shot(0.0, 5000.0);
        config.min_particles = 3;
        let mut emitter = Emitter::with_seed(config, 17);
        emitter.start();
        emitter.update(0.05);
        assert_eq!(emitter.active_count(), 3);
    }

    #[test]
    fn particles_move_along_heading_with_gravity() {
        let mut config = one_shot(0.0, 5000.0);
        config.velocity = ScaledValue::constant(100.0);
        config.angle = ScaledValue::constant(0.0);
        config.gravity = ScaledValue::constant(-50.0);
        let mut emitter = Emitter::with_seed(config, 19);
        emitter.start();
        emitter.update(0.5);
        let p = emitter.particles()[0];
        assert!((p.position.x - 50.0).abs() < 1e-3);
        assert!((p.position.y + 25.0).abs() < 1e-3);
    }

    #[test]
    fn attached_particles_follow_the_emitter() {
        let mut config = one_shot(0.0, 5000.0);
        config.attached = true;
        config.min_particles = 1;
        let mut emitter = Emitter::with_seed(config, 23);
        emitter.start();
        emitter.update(0.1);
        emitter.set_position(10.0, 5.0);
        let p = emitter.particles()[0];
        assert_eq!(p.position, Vec2::new(10.0, 5.0));
    }

    #[test]
    fn transparency_fades_from_low_to_high() {
        let mut config = one_shot(0.0, 1000.0);
        config.transparency = ScaledValue::constant(0.0);
        config.transparency.set_low(1.0, 1.0);
        config
            .transparency
            .set_envelope(vec![0.0, 1.0], vec![0.0, 1.0])
            .unwrap();
        config.premultiplied_alpha = false;
        let mut emitter = Emitter::with_seed(config, 29);
        emitter.start();
        emitter.update(0.5);
        let alpha = emitter.particles()[0].color.a;
        assert!((alpha - 0.5).abs() < 1e-3, "alpha {alpha}");
    }

    #[test]
    fn life_offset_pre_ages_new_particles() {
        let mut config = one_shot(0.0, 1000.0);
        config.life_offset = ScaledValue::constant(400.0);
        let mut emitter = Emitter::with_seed(config, 31);
        emitter.start();
        emitter.update(0.1);
        let age = emitter.particles()[0].age;
        assert!((age - 500.0).abs() < 1e-3);
    }

    #[test]
    fn deflector_reflects_travel() {
        let mut config = one_shot(0.0, 5000.0);
        config.velocity = ScaledValue::constant(100.0);
        config.angle = ScaledValue::constant(-90.0);
        let mut emitter = Emitter::with_seed(config, 37);
        emitter.set_position(0.0, 10.0);
        emitter.start();

        // Floor at y = 0
        let mut floor = |start: Vec2, end: Vec2| -> Option<RayHit> {
            if end.y < 0.0 && start.y >= 0.0 {
                Some(RayHit {
                    fraction: start.y / (start.y - end.y),
                    normal: Vec2::new(0.0, 1.0),
                })
            } else {
                None
            }
        };
        emitter.update_deflected(0.2, &mut floor);
        let p = emitter.particles()[0];
        // 20 units down: 10 to the floor, 10 back up
        assert!((p.position.y - 10.0).abs() < 1e-3);
        assert!((p.heading - 90.0).abs() < 1e-3);

        emitter.update_deflected(0.1, &mut floor);
        assert!((emitter.particles()[0].position.y - 20.0).abs() < 1e-3);
    }

    #[test]
    fn point_emitter_without_velocity_has_tiny_bounds() {
        let mut config = one_shot(20.0, 5000.0);
        config.spawn_shape = SpawnShapeValue::new(SpawnShape::Point);
        config.x_scale = ScaledValue::constant(0.0);
        let mut emitter = Emitter::with_seed(config, 41);
        emitter.start();
        emitter.update(0.5);
        let bounds = emitter.bounding_box();
        assert!(!bounds.is_empty());
        assert!(bounds.width() < 1e-4 && bounds.height() < 1e-4);
        assert!(bounds.center().length() < 1e-4);
    }

    #[test]
    fn draw_sets_blend_and_restores_alpha() {
        let mut config = one_shot(0.0, 5000.0);
        config.min_particles = 2;
        config.x_scale = ScaledValue::constant(4.0);
        config.image_paths = vec!["spark.png".into()];
        let mut emitter = Emitter::with_seed(config, 43);
        let mut source = |path: &str| {
            (path == "spark.png").then(|| Sprite::new(SpriteHandle(9), 8.0, 16.0))
        };
        emitter.load_images(&mut source).unwrap();
        emitter.start();
        emitter.update(0.1);

        let mut batch = RecordingBatch {
            modes: vec![],
            quads: vec![],
        };
        emitter.draw(&mut batch);
        assert_eq!(batch.modes, vec![BlendMode::Additive, BlendMode::Alpha]);
        assert_eq!(batch.quads.len(), 2);
        let (handle, quad) = batch.quads[0];
        assert_eq!(handle, SpriteHandle(9));
        // Width from the scale curve, height from the sprite aspect
        assert!((quad.width - 4.0).abs() < 1e-5);
        assert!((quad.height - 8.0).abs() < 1e-5);
    }

    #[test]
    fn missing_image_names_emitter_and_path() {
        let mut config = one_shot(1.0, 1.0);
        config.image_paths = vec!["gone.png".into()];
        let mut emitter = Emitter::new(config);
        let mut source = |_: &str| -> Option<Sprite> { None };
        let err = emitter.load_images(&mut source).unwrap_err();
        match err {
            EmberError::MissingImage { emitter, path } => {
                assert_eq!(emitter, "burst");
                assert_eq!(path, "gone.png");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn flip_y_mirrors_vertical_motion() {
        let mut config = one_shot(1.0, 1.0);
        config.angle = ScaledValue::constant(30.0);
        config.gravity = ScaledValue::constant(-10.0);
        config.y_offset.set_low(2.0, 3.0);
        config.flip_y();
        assert_eq!(config.angle.low_min, -30.0);
        assert_eq!(config.gravity.high_max, 10.0);
        assert_eq!((config.y_offset.low_min, config.y_offset.low_max), (-2.0, -3.0));
    }

    #[test]
    fn sprite_mode_names_round_trip() {
        for mode in [SpriteMode::Single, SpriteMode::Random, SpriteMode::Animated] {
            assert_eq!(mode.to_string().parse::<SpriteMode>().unwrap(), mode);
        }
        assert!(matches!(
            "tiled".parse::<SpriteMode>(),
            Err(EmberError::Configuration(_))
        ));
    }

    #[test]
    fn set_duration_truncates_to_one_shot() {
        let mut config = one_shot(10.0, 50.0);
        config.continuous = true;
        let mut emitter = Emitter::with_seed(config, 47);
        emitter.start();
        emitter.update(0.1);
        emitter.set_duration(200.0);
        assert!(!emitter.config().continuous);
        for _ in 0..6 {
            emitter.update(0.1);
        }
        assert!(emitter.is_complete());

        emitter.start();
        assert_eq!(emitter.duration(), 200.0);
        emitter.reset();
        assert_eq!(emitter.duration(), 200.0);
        assert!(!emitter.config().continuous);
    }
}
