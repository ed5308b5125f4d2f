//! Spatial position constraints built from three scalar distributions.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution4;
use crate::error::{StimError, StimResult};
use crate::math::{cart2sph, circular_distance, sph2cart, Vec3};

/// Independent X/Y/Z distributions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianSpec {
    pub x: Distribution4,
    pub y: Distribution4,
    pub z: Distribution4,
}

/// Radius, azimuth (θ) and elevation (φ) distributions, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphericalSpec {
    pub r: Distribution4,
    pub theta: Distribution4,
    pub phi: Distribution4,
}

/// The coordinate system a [`PositionSpec`] actually samples in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinates<'a> {
    Cartesian(&'a CartesianSpec),
    Spherical(&'a SphericalSpec),
}

/// A 3D position constraint. When both forms are given, Cartesian wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPositionSpec", into = "RawPositionSpec")]
pub struct PositionSpec {
    cartesian: Option<CartesianSpec>,
    spherical: Option<SphericalSpec>,
    origin: Vec3,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawPositionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cartesian: Option<CartesianSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    spherical: Option<SphericalSpec>,
    #[serde(default)]
    origin: Vec3,
}

impl TryFrom<RawPositionSpec> for PositionSpec {
    type Error = StimError;

    fn try_from(raw: RawPositionSpec) -> StimResult<Self> {
        PositionSpec::new(raw.cartesian, raw.spherical, raw.origin)
    }
}

impl From<PositionSpec> for RawPositionSpec {
    fn from(p: PositionSpec) -> Self {
        RawPositionSpec {
            cartesian: p.cartesian,
            spherical: p.spherical,
            origin: p.origin,
        }
    }
}

impl PositionSpec {
    pub fn new(
        cartesian: Option<CartesianSpec>,
        spherical: Option<SphericalSpec>,
        origin: Vec3,
    ) -> StimResult<Self> {
        if cartesian.is_none() && spherical.is_none() {
            return Err(StimError::config(
                "position spec needs cartesian or spherical distributions",
            ));
        }
        Ok(Self {
            cartesian,
            spherical,
            origin,
        })
    }

    pub fn cartesian(x: Distribution4, y: Distribution4, z: Distribution4) -> Self {
        Self {
            cartesian: Some(CartesianSpec { x, y, z }),
            spherical: None,
            origin: Vec3::ZERO,
        }
    }

    pub fn spherical(r: Distribution4, theta: Distribution4, phi: Distribution4, origin: Vec3) -> Self {
        Self {
            cartesian: None,
            spherical: Some(SphericalSpec { r, theta, phi }),
            origin,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn coordinates(&self) -> Coordinates<'_> {
        match (&self.cartesian, &self.spherical) {
            (Some(c), _) => Coordinates::Cartesian(c),
            (None, Some(s)) => Coordinates::Spherical(s),
            // Rejected by `new`; the struct is never built with neither.
            (None, None) => unreachable!("position spec without coordinates"),
        }
    }

    pub fn is_spherical(&self) -> bool {
        matches!(self.coordinates(), Coordinates::Spherical(_))
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        match self.coordinates() {
            Coordinates::Cartesian(c) => Vec3::new(
                c.x.sample(rng),
                c.y.sample(rng),
                c.z.sample(rng),
            ),
            Coordinates::Spherical(s) => sph2cart(
                s.r.sample(rng),
                s.theta.sample(rng),
                s.phi.sample(rng),
                self.origin,
            ),
        }
    }

    /// Whether `point` satisfies the bounds of the active coordinate system.
    pub fn contains(&self, point: &Vec3) -> bool {
        match self.coordinates() {
            Coordinates::Cartesian(c) => {
                c.x.contains(point.x) && c.y.contains(point.y) && c.z.contains(point.z)
            }
            Coordinates::Spherical(s) => {
                let sph = cart2sph(*point, self.origin);
                s.r.contains(sph.r)
                    && azimuth_within(&s.theta, sph.azimuth)
                    && s.phi.contains(sph.elevation)
            }
        }
    }

    /// Narrow the X/Y (or r) bounds by `size / 2` so an object of that extent
    /// centred on a draw stays inside the nominal envelope.
    pub fn shrink_for_extent(&self, size: f64) -> StimResult<Self> {
        let half = size / 2.0;
        let mut out = *self;
        match self.coordinates() {
            Coordinates::Cartesian(c) => {
                out.cartesian = Some(CartesianSpec {
                    x: c.x.shrink(half)?,
                    y: c.y.shrink(half)?,
                    z: c.z,
                });
            }
            Coordinates::Spherical(s) => {
                out.spherical = Some(SphericalSpec {
                    r: s.r.shrink(half)?,
                    theta: s.theta,
                    phi: s.phi,
                });
            }
        }
        Ok(out)
    }

    /// The Z distribution of a Cartesian spec. Spherical specs have none.
    pub fn base_height(&self) -> Option<&Distribution4> {
        match self.coordinates() {
            Coordinates::Cartesian(c) => Some(&c.z),
            Coordinates::Spherical(_) => None,
        }
    }
}

/// Azimuth bound check that respects the ±180 wrap: `[170, 190]` contains
/// `-175`.
pub fn azimuth_within(theta: &Distribution4, azimuth: f64) -> bool {
    match (theta.min(), theta.max()) {
        (Some(lo), Some(hi)) => {
            if hi - lo >= 360.0 {
                return true;
            }
            let offset = circular_distance(azimuth, lo).rem_euclid(360.0);
            offset <= hi - lo + 1e-9
        }
        (Some(lo), None) => circular_distance(azimuth, lo) >= 0.0,
        (None, Some(hi)) => circular_distance(azimuth, hi) <= 0.0,
        (None, None) => true,
    }
}
