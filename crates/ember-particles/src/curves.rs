//! Randomized, time-shaped parameter curves
//!
//! Every animated particle attribute is driven by a [`ScaledValue`]: a random
//! "low" value picked at spawn, a random "high" value it moves toward, and an
//! envelope (`scaling` sampled over `timeline`) that says how far along that
//! move the attribute is at a given fraction of the particle's life.

use crate::rand::ParticleRng;
use ember_core::{EmberError, Result};
use serde::{Deserialize, Serialize};

/// Linear interpolation between two floats
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Linear interpolation between two RGB colors
pub fn lerp_rgb(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

/// A value picked uniformly from `[low_min, low_max]`.
///
/// Used for per-cycle emitter timings (delay, duration).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedValue {
    pub active: bool,
    pub low_min: f32,
    pub low_max: f32,
}

impl RangedValue {
    pub fn new(low_min: f32, low_max: f32) -> Self {
        Self {
            active: true,
            low_min,
            low_max,
        }
    }

    pub fn new_low_value(&self, rng: &mut ParticleRng) -> f32 {
        rng.range(self.low_min, self.low_max)
    }

    pub fn set_low(&mut self, min: f32, max: f32) {
        self.low_min = min;
        self.low_max = max;
    }

    /// Permanently scales the range by a scalar.
    pub fn scale(&mut self, factor: f32) {
        self.low_min *= factor;
        self.low_max *= factor;
    }
}

/// A particle's sampled start value and the distance it travels over its life.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CurveSpan {
    pub low: f32,
    pub diff: f32,
}

impl CurveSpan {
    /// Span that moves from `low` to `high` regardless of the curve's relative flag
    pub fn absolute(low: f32, high: f32) -> Self {
        Self {
            low,
            diff: high - low,
        }
    }

    pub fn at(&self, scale: f32) -> f32 {
        self.low + self.diff * scale
    }
}

/// Low/high ranges shaped by a scaling envelope over a normalized timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaledValue {
    pub active: bool,
    pub low_min: f32,
    pub low_max: f32,
    pub high_min: f32,
    pub high_max: f32,
    /// When set, `high` is an offset added to `low` rather than an absolute target
    pub relative: bool,
    /// Re-sample per particle instead of once per emitter cycle (life, life offset)
    pub independent: bool,
    scaling: Vec<f32>,
    timeline: Vec<f32>,
}

impl Default for ScaledValue {
    fn default() -> Self {
        Self {
            active: false,
            low_min: 0.0,
            low_max: 0.0,
            high_min: 0.0,
            high_max: 0.0,
            relative: false,
            independent: false,
            scaling: vec![1.0],
            timeline: vec![0.0],
        }
    }
}

impl ScaledValue {
    /// An always-on curve with a flat envelope
    pub fn active() -> Self {
        Self::with_active(true)
    }

    /// Zeroed curve with a flat envelope
    pub fn with_active(active: bool) -> Self {
        Self {
            active,
            ..Default::default()
        }
    }

    /// Flat curve whose low and high ranges are both `value`
    pub fn constant(value: f32) -> Self {
        Self {
            active: true,
            low_min: value,
            low_max: value,
            high_min: value,
            high_max: value,
            ..Default::default()
        }
    }

    pub fn set_low(&mut self, min: f32, max: f32) {
        self.low_min = min;
        self.low_max = max;
    }

    pub fn set_high(&mut self, min: f32, max: f32) {
        self.high_min = min;
        self.high_max = max;
    }

    pub fn sample_low(&self, rng: &mut ParticleRng) -> f32 {
        rng.range(self.low_min, self.low_max)
    }

    pub fn sample_high(&self, rng: &mut ParticleRng) -> f32 {
        rng.range(self.high_min, self.high_max)
    }

    /// Sample a low/high pair, honoring the relative flag
    pub fn sample_span(&self, rng: &mut ParticleRng) -> CurveSpan {
        let low = self.sample_low(rng);
        let high = self.sample_high(rng);
        CurveSpan {
            low,
            diff: if self.relative { high } else { high - low },
        }
    }

    pub fn scaling(&self) -> &[f32] {
        &self.scaling
    }

    pub fn timeline(&self) -> &[f32] {
        &self.timeline
    }

    pub fn has_envelope(&self) -> bool {
        !self.scaling.is_empty() && !self.timeline.is_empty()
    }

    /// True when the envelope changes over time (more than one breakpoint)
    pub fn is_animated(&self) -> bool {
        self.timeline.len() > 1
    }

    /// Replace the envelope. Both arrays must be the same length, with a
    /// timeline that starts at 0 and never decreases within [0, 1].
    pub fn set_envelope(&mut self, scaling: Vec<f32>, timeline: Vec<f32>) -> Result<()> {
        validate_envelope(&scaling, &timeline)?;
        self.scaling = scaling;
        self.timeline = timeline;
        Ok(())
    }

    /// Drop the envelope entirely; evaluation then returns the low value.
    pub fn clear_envelope(&mut self) {
        self.scaling.clear();
        self.timeline.clear();
    }

    /// Check the envelope invariants on a value built without the setter
    /// (for example, one deserialized from TOML).
    pub fn validate(&self) -> Result<()> {
        if self.scaling.is_empty() && self.timeline.is_empty() {
            return Ok(());
        }
        validate_envelope(&self.scaling, &self.timeline)
    }

    /// Envelope factor at `percent` of the particle's life.
    ///
    /// Interpolates between the breakpoints that bracket `percent`; past the
    /// last breakpoint the final scaling value holds.
    pub fn scale_at(&self, percent: f32) -> f32 {
        let n = self.timeline.len().min(self.scaling.len());
        if n == 0 {
            return 0.0;
        }
        let Some(end) = (1..n).find(|&i| self.timeline[i] > percent) else {
            return self.scaling[n - 1];
        };
        let start = end - 1;
        let start_time = self.timeline[start];
        let span = self.timeline[end] - start_time;
        if span <= 0.0 {
            return self.scaling[start];
        }
        lerp_f32(
            self.scaling[start],
            self.scaling[end],
            (percent - start_time) / span,
        )
    }

    /// Value at `percent` for a particle that sampled `low` and `high`.
    pub fn value_at(&self, percent: f32, low: f32, high: f32) -> f32 {
        let diff = if self.relative { high } else { high - low };
        self.eval(CurveSpan { low, diff }, percent)
    }

    /// Evaluate a previously sampled span at `percent`
    pub fn eval(&self, span: CurveSpan, percent: f32) -> f32 {
        if !self.has_envelope() {
            return span.low;
        }
        span.at(self.scale_at(percent))
    }

    /// Permanently scales both ranges by a scalar.
    pub fn scale(&mut self, factor: f32) {
        self.low_min *= factor;
        self.low_max *= factor;
        self.high_min *= factor;
        self.high_max *= factor;
    }

    /// Copy ranges, envelope and relative flag from another curve
    pub fn set_from(&mut self, other: &ScaledValue) {
        self.low_min = other.low_min;
        self.low_max = other.low_max;
        self.high_min = other.high_min;
        self.high_max = other.high_max;
        self.scaling.clone_from(&other.scaling);
        self.timeline.clone_from(&other.timeline);
        self.relative = other.relative;
    }

    /// Negate both ranges (mirrors the curve about the X axis)
    pub fn negate(&mut self) {
        self.scale(-1.0);
    }
}

fn validate_envelope(scaling: &[f32], timeline: &[f32]) -> Result<()> {
    if scaling.len() != timeline.len() {
        return Err(EmberError::config(format!(
            "scaling has {} values but timeline has {}",
            scaling.len(),
            timeline.len()
        )));
    }
    validate_timeline(timeline)
}

fn validate_timeline(timeline: &[f32]) -> Result<()> {
    let Some(&first) = timeline.first() else {
        return Err(EmberError::config("timeline must not be empty"));
    };
    if first != 0.0 {
        return Err(EmberError::config(format!(
            "timeline must start at 0, got {first}"
        )));
    }
    for pair in timeline.windows(2) {
        if pair[1] < pair[0] {
            return Err(EmberError::config(format!(
                "timeline must not decrease ({} after {})",
                pair[1], pair[0]
            )));
        }
    }
    if let Some(&bad) = timeline.iter().find(|t| !(0.0..=1.0).contains(*t)) {
        return Err(EmberError::config(format!(
            "timeline value {bad} is outside [0, 1]"
        )));
    }
    Ok(())
}

/// RGB colors sampled over a normalized timeline.
///
/// `colors` holds three floats (r, g, b) per timeline breakpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientColor {
    colors: Vec<f32>,
    timeline: Vec<f32>,
}

impl Default for GradientColor {
    fn default() -> Self {
        Self {
            colors: vec![1.0, 1.0, 1.0],
            timeline: vec![0.0],
        }
    }
}

impl GradientColor {
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn timeline(&self) -> &[f32] {
        &self.timeline
    }

    pub fn is_animated(&self) -> bool {
        self.timeline.len() > 1
    }

    /// Replace the gradient. `colors.len()` must equal `3 × timeline.len()`.
    pub fn set_colors(&mut self, colors: Vec<f32>, timeline: Vec<f32>) -> Result<()> {
        if colors.len() != timeline.len() * 3 {
            return Err(EmberError::config(format!(
                "colors array has {} values, expected 3 per timeline entry ({})",
                colors.len(),
                timeline.len() * 3
            )));
        }
        validate_timeline(&timeline)?;
        self.colors = colors;
        self.timeline = timeline;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.colors.len() != self.timeline.len() * 3 {
            return Err(EmberError::config(format!(
                "colors array has {} values, expected {}",
                self.colors.len(),
                self.timeline.len() * 3
            )));
        }
        validate_timeline(&self.timeline)
    }

    /// Interpolated color at `percent` of the particle's life
    pub fn color_at(&self, percent: f32) -> [f32; 3] {
        let n = self.timeline.len().min(self.colors.len() / 3);
        if n == 0 {
            return [1.0, 1.0, 1.0];
        }
        let mut start = 0;
        let mut end = None;
        for i in 1..n {
            if self.timeline[i] > percent {
                end = Some(i);
                break;
            }
            start = i;
        }
        let from = self.rgb(start);
        let Some(end) = end else {
            return from;
        };
        let start_time = self.timeline[start];
        let span = self.timeline[end] - start_time;
        if span <= 0.0 {
            return from;
        }
        lerp_rgb(from, self.rgb(end), (percent - start_time) / span)
    }

    fn rgb(&self, index: usize) -> [f32; 3] {
        let i = index * 3;
        [self.colors[i], self.colors[i + 1], self.colors[i + 2]]
    }
}
