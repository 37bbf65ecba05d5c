//! Optional physics deflection hook

use ember_core::Vec2;

/// Result of a ray query against the host's collision world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Fraction of the ray travelled before the hit, in [0, 1]
    pub fraction: f32,
    /// Surface normal at the hit point
    pub normal: Vec2,
}

/// Directed ray query consulted once per particle per tick.
///
/// A hit reflects the particle's remaining displacement about the normal and
/// changes its travel angle.
pub trait RayQuery {
    fn cast(&mut self, start: Vec2, end: Vec2) -> Option<RayHit>;
}

/// Query that never hits anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeflection;

impl RayQuery for NoDeflection {
    fn cast(&mut self, _start: Vec2, _end: Vec2) -> Option<RayHit> {
        None
    }
}

impl<F> RayQuery for F
where
    F: FnMut(Vec2, Vec2) -> Option<RayHit>,
{
    fn cast(&mut self, start: Vec2, end: Vec2) -> Option<RayHit> {
        self(start, end)
    }
}
