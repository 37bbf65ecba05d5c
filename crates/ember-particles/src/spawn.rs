//! Spawn shapes: where a new particle appears relative to the emitter

use crate::rand::ParticleRng;
use ember_core::{EmberError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geometric rule for a particle's initial offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnShape {
    #[default]
    Point,
    Line,
    Square,
    Ellipse,
}

/// Which half of an ellipse outline edge spawning may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EllipseSide {
    #[default]
    Both,
    Top,
    Bottom,
}

/// Spawn shape plus its edge/fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnShapeValue {
    pub shape: SpawnShape,
    /// Spawn on the outline instead of inside (ellipse only)
    pub edges: bool,
    pub side: EllipseSide,
}

/// Offset sampled for one particle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpawnOffset {
    pub dx: f32,
    pub dy: f32,
    /// Outline angle in degrees, reported by ellipse edge spawning
    pub angle: Option<f32>,
}

impl SpawnShapeValue {
    pub fn new(shape: SpawnShape) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    /// Sample an offset inside a `width` × `height` spawn area
    pub fn offset(&self, width: f32, height: f32, rng: &mut ParticleRng) -> SpawnOffset {
        match self.shape {
            SpawnShape::Point => SpawnOffset::default(),
            SpawnShape::Square => SpawnOffset {
                dx: rng.up_to(width) - width / 2.0,
                dy: rng.up_to(height) - height / 2.0,
                angle: None,
            },
            SpawnShape::Line => {
                if width != 0.0 {
                    let along = width * rng.next_f32();
                    SpawnOffset {
                        dx: along,
                        dy: along * (height / width),
                        angle: None,
                    }
                } else {
                    SpawnOffset {
                        dx: 0.0,
                        dy: height * rng.next_f32(),
                        angle: None,
                    }
                }
            }
            SpawnShape::Ellipse => self.ellipse_offset(width, height, rng),
        }
    }

    fn ellipse_offset(&self, width: f32, height: f32, rng: &mut ParticleRng) -> SpawnOffset {
        let radius_x = width / 2.0;
        let radius_y = height / 2.0;
        // Zero or non-finite radii would never satisfy the rejection test
        if radius_x == 0.0 || radius_y == 0.0 || !radius_x.is_finite() || !radius_y.is_finite() {
            return SpawnOffset::default();
        }

        if self.edges {
            let angle = match self.side {
                EllipseSide::Top => -rng.up_to(179.0),
                EllipseSide::Bottom => rng.up_to(179.0),
                EllipseSide::Both => rng.up_to(360.0),
            };
            let rad = angle.to_radians();
            return SpawnOffset {
                dx: rad.cos() * radius_x,
                dy: rad.sin() * radius_y,
                angle: Some(angle),
            };
        }

        // Rejection-sample a disc of radius_x, then squash it vertically
        let squash = radius_y / radius_x;
        let radius2 = radius_x * radius_x;
        loop {
            let px = rng.up_to(width) - radius_x;
            let py = rng.up_to(width) - radius_x;
            if px * px + py * py <= radius2 {
                return SpawnOffset {
                    dx: px,
                    dy: py * squash,
                    angle: None,
                };
            }
        }
    }
}

impl fmt::Display for SpawnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SpawnShape::Point => "point",
            SpawnShape::Line => "line",
            SpawnShape::Square => "square",
            SpawnShape::Ellipse => "ellipse",
        })
    }
}

impl FromStr for SpawnShape {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "point" => Ok(SpawnShape::Point),
            "line" => Ok(SpawnShape::Line),
            "square" => Ok(SpawnShape::Square),
            "ellipse" => Ok(SpawnShape::Ellipse),
            other => Err(EmberError::config(format!("unknown spawn shape '{other}'"))),
        }
    }
}

impl fmt::Display for EllipseSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EllipseSide::Both => "both",
            EllipseSide::Top => "top",
            EllipseSide::Bottom => "bottom",
        })
    }
}

impl FromStr for EllipseSide {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "both" => Ok(EllipseSide::Both),
            "top" => Ok(EllipseSide::Top),
            "bottom" => Ok(EllipseSide::Bottom),
            other => Err(EmberError::config(format!("unknown ellipse side '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_has_no_offset() {
        let mut rng = ParticleRng::new(1);
        let o = SpawnShapeValue::new(SpawnShape::Point).offset(10.0, 10.0, &mut rng);
        assert_eq!(o, SpawnOffset::default());
    }

    #[test]
    fn square_stays_centered_in_area() {
        let mut rng = ParticleRng::new(2);
        let shape = SpawnShapeValue::new(SpawnShape::Square);
        for _ in 0..500 {
            let o = shape.offset(4.0, 2.0, &mut rng);
            assert!(o.dx >= -2.0 && o.dx <= 2.0);
            assert!(o.dy >= -1.0 && o.dy <= 1.0);
        }
    }

    #[test]
    fn line_follows_the_diagonal() {
        let mut rng = ParticleRng::new(3);
        let shape = SpawnShapeValue::new(SpawnShape::Line);
        for _ in 0..100 {
            let o = shape.offset(10.0, 5.0, &mut rng);
            assert!((o.dy - o.dx * 0.5).abs() < 1e-4);
            assert!(o.dx >= 0.0 && o.dx <= 10.0);
        }
        let vertical = shape.offset(0.0, 5.0, &mut rng);
        assert_eq!(vertical.dx, 0.0);
    }

    #[test]
    fn ellipse_fill_stays_inside() {
        let mut rng = ParticleRng::new(4);
        let shape = SpawnShapeValue::new(SpawnShape::Ellipse);
        for _ in 0..500 {
            let o = shape.offset(10.0, 4.0, &mut rng);
            let e = (o.dx / 5.0).powi(2) + (o.dy / 2.0).powi(2);
            assert!(e <= 1.0 + 1e-4);
            assert!(o.angle.is_none());
        }
    }

    #[test]
    fn ellipse_edges_land_on_outline() {
        let mut rng = ParticleRng::new(5);
        let shape = SpawnShapeValue {
            shape: SpawnShape::Ellipse,
            edges: true,
            side: EllipseSide::Bottom,
        };
        for _ in 0..200 {
            let o = shape.offset(10.0, 4.0, &mut rng);
            let e = (o.dx / 5.0).powi(2) + (o.dy / 2.0).powi(2);
            assert!((e - 1.0).abs() < 1e-3);
            let angle = o.angle.unwrap();
            assert!((0.0..179.0).contains(&angle));
            assert!(o.dy >= -1e-4);
        }
    }

    #[test]
    fn degenerate_ellipse_is_a_point() {
        let mut rng = ParticleRng::new(6);
        let o = SpawnShapeValue::new(SpawnShape::Ellipse).offset(0.0, 4.0, &mut rng);
        assert_eq!(o, SpawnOffset::default());
    }

    #[test]
    fn non_finite_ellipse_is_a_point() {
        let mut rng = ParticleRng::new(7);
        let shape = SpawnShapeValue::new(SpawnShape::Ellipse);
        assert_eq!(shape.offset(f32::NAN, 4.0, &mut rng), SpawnOffset::default());
        assert_eq!(shape.offset(10.0, f32::INFINITY, &mut rng), SpawnOffset::default());
    }

    #[test]
    fn names_round_trip() {
        for shape in [SpawnShape::Point, SpawnShape::Line, SpawnShape::Square, SpawnShape::Ellipse] {
            assert_eq!(shape.to_string().parse::<SpawnShape>().unwrap(), shape);
        }
        assert!(matches!(
            "circle".parse::<SpawnShape>(),
            Err(EmberError::Configuration(_))
        ));
        for side in [EllipseSide::Both, EllipseSide::Top, EllipseSide::Bottom] {
            assert_eq!(side.to_string().parse::<EllipseSide>().unwrap(), side);
        }
        assert!(matches!(
            "left".parse::<EllipseSide>(),
            Err(EmberError::Configuration(_))
        ));
    }
}
