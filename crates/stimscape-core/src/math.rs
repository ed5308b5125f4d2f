use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A 2D point (image space, pixels or percent of frame).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl Default for Point2D {
    fn default() -> Self {
        Self::zero()
    }
}

/// A 2D size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size2D {
    pub width: f64,
    pub height: f64,
}

impl Size2D {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A 3D vector / point in world space. `Z` is up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const UP: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Length of the XY projection.
    pub fn planar_length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction, or `None` for a (near) zero vector.
    pub fn normalized(&self) -> Option<Vec3> {
        let len = self.length();
        if len < 1e-12 {
            return None;
        }
        Some(*self * (1.0 / len))
    }

    pub fn distance(&self, other: &Vec3) -> f64 {
        (*self - *other).length()
    }

    /// Component-wise minimum.
    pub fn min(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    pub fn max(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Largest component.
    pub fn max_element(&self) -> f64 {
        self.x.max(self.y).max(self.z)
    }

    /// Linear interpolation between two points.
    pub fn lerp(&self, other: &Vec3, t: f64) -> Vec3 {
        *self + (*other - *self) * t
    }

    pub fn approx_eq(&self, other: &Vec3, tolerance: f64) -> bool {
        self.distance(other) <= tolerance
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Vec3::ZERO
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

/// A position in spherical coordinates. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spherical {
    /// Distance from the origin.
    pub r: f64,
    /// Azimuth (θ), counter-clockwise from +X, in (-180, 180].
    pub azimuth: f64,
    /// Elevation (φ) above the XY plane, in [-90, 90].
    pub elevation: f64,
}

/// Convert spherical coordinates around `origin` to a Cartesian point.
pub fn sph2cart(r: f64, azimuth_deg: f64, elevation_deg: f64, origin: Vec3) -> Vec3 {
    let az = azimuth_deg.to_radians();
    let el = elevation_deg.to_radians();
    Vec3::new(
        origin.x + r * el.cos() * az.cos(),
        origin.y + r * el.cos() * az.sin(),
        origin.z + r * el.sin(),
    )
}

/// Convert a Cartesian point to spherical coordinates around `origin`.
pub fn cart2sph(point: Vec3, origin: Vec3) -> Spherical {
    let d = point - origin;
    let planar = d.planar_length();
    Spherical {
        r: d.length(),
        azimuth: d.y.atan2(d.x).to_degrees(),
        elevation: d.z.atan2(planar).to_degrees(),
    }
}

/// Signed shortest angular delta `a - b` in degrees, in [-180, 180).
pub fn circular_distance(a: f64, b: f64) -> f64 {
    (a - b + 180.0).rem_euclid(360.0) - 180.0
}

/// Unsigned angle between the XY projections of two vectors, in degrees.
/// `None` if either projection is degenerate.
pub fn planar_angle_between(a: &Vec3, b: &Vec3) -> Option<f64> {
    let la = a.planar_length();
    let lb = b.planar_length();
    if la < 1e-12 || lb < 1e-12 {
        return None;
    }
    let cos = ((a.x * b.x + a.y * b.y) / (la * lb)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}
