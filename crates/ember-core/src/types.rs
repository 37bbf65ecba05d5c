//! Spatial and common types

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A 2D vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
    pub const ONE: Self = Self { x: 1.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `degrees`, counter-clockwise from +X
    pub fn from_angle_deg(degrees: f32) -> Self {
        let rad = degrees.to_radians();
        Self {
            x: rad.cos(),
            y: rad.sin(),
        }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Angle of this vector in degrees, in (-180, 180]
    pub fn angle_deg(&self) -> f32 {
        self.y.atan2(self.x).to_degrees()
    }

    /// Mirror this vector about a surface with the given unit normal
    pub fn reflect(&self, normal: &Self) -> Self {
        let d = 2.0 * self.dot(normal);
        Self {
            x: self.x - d * normal.x,
            y: self.y - d * normal.y,
        }
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// RGBA color
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb(rgb: [f32; 3], a: f32) -> Self {
        Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            a,
        }
    }

    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Axis-aligned 2D bounding box.
///
/// A fresh or [`Bounds::inf`]-reset box is inverted (min = +inf, max = -inf)
/// and reports `is_empty()` until a point is added.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub const EMPTY: Self = Self {
        min: Vec2 {
            x: f32::INFINITY,
            y: f32::INFINITY,
        },
        max: Vec2 {
            x: f32::NEG_INFINITY,
            y: f32::NEG_INFINITY,
        },
    };

    /// Reset to the inverted sentinel state
    pub fn inf(&mut self) {
        *self = Self::EMPTY;
    }

    /// Grow to include a point
    pub fn ext(&mut self, x: f32, y: f32) {
        self.min.x = self.min.x.min(x);
        self.min.y = self.min.y.min(y);
        self.max.x = self.max.x.max(x);
        self.max.y = self.max.y.max(y);
    }

    /// Grow to include another box. Empty boxes contribute nothing.
    pub fn merge(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.ext(other.min.x, other.min.y);
        self.ext(other.max.x, other.max.y);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn width(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.max.x - self.min.x
        }
    }

    pub fn height(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.max.y - self.min.y
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: (self.min.x + self.max.x) * 0.5,
            y: (self.min.y + self.max.y) * 0.5,
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operations() {
        let v1 = Vec2::new(1.0, 2.0);
        let v2 = Vec2::new(4.0, 5.0);

        assert_eq!(v1 + v2, Vec2::new(5.0, 7.0));
        assert_eq!(v2 - v1, Vec2::new(3.0, 3.0));
        assert_eq!(v1 * 2.0, Vec2::new(2.0, 4.0));
    }

    #[test]
    fn test_vec2_reflect() {
        // Moving down-right, hitting a floor with an upward normal
        let d = Vec2::new(1.0, -1.0);
        let r = d.reflect(&Vec2::new(0.0, 1.0));
        assert_eq!(r, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_angle_round_trip() {
        let v = Vec2::from_angle_deg(90.0);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
        assert!((v.angle_deg() - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_bounds_empty_then_extend() {
        let mut b = Bounds::default();
        assert!(b.is_empty());
        assert_eq!(b.width(), 0.0);

        b.ext(-1.0, 2.0);
        b.ext(3.0, -2.0);
        assert!(!b.is_empty());
        assert_eq!(b.width(), 4.0);
        assert_eq!(b.height(), 4.0);
        assert_eq!(b.center(), Vec2::new(1.0, 0.0));

        b.inf();
        assert!(b.is_empty());
    }

    #[test]
    fn test_bounds_merge_skips_empty() {
        let mut a = Bounds::default();
        a.merge(&Bounds::default());
        assert!(a.is_empty());

        let mut b = Bounds::default();
        b.ext(1.0, 1.0);
        a.merge(&b);
        assert_eq!(a.min, Vec2::new(1.0, 1.0));
        assert_eq!(a.max, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex(0xFF8844);
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
        assert!((c.b - 0.267).abs() < 0.01);
    }
}
