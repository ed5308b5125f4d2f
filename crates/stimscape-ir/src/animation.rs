use serde::{Deserialize, Serialize};
use stimscape_core::{Coordinates, PositionSpec, StimError, StimResult, Vec3};

use crate::entity::BoundingBox;

/// The authored bounding box of a pre-baked animation at one frame, in the
/// object's own frame at unit size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsKeyframe {
    pub frame: u32,
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundsKeyframe {
    pub fn new(frame: u32, min: Vec3, max: Vec3) -> Self {
        Self { frame, min, max }
    }

    fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.min, self.max)
    }
}

/// Time-varying bounding box of an animated object. Between authored frames
/// the corners are interpolated linearly; outside them the nearest frame is
/// held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BoundsKeyframe>", into = "Vec<BoundsKeyframe>")]
pub struct BoundingTrajectory {
    keyframes: Vec<BoundsKeyframe>,
}

impl TryFrom<Vec<BoundsKeyframe>> for BoundingTrajectory {
    type Error = StimError;

    fn try_from(keyframes: Vec<BoundsKeyframe>) -> StimResult<Self> {
        BoundingTrajectory::new(keyframes)
    }
}

impl From<BoundingTrajectory> for Vec<BoundsKeyframe> {
    fn from(t: BoundingTrajectory) -> Self {
        t.keyframes
    }
}

impl BoundingTrajectory {
    /// Keyframes are sorted by frame; duplicates and empty input are errors.
    pub fn new(mut keyframes: Vec<BoundsKeyframe>) -> StimResult<Self> {
        if keyframes.is_empty() {
            return Err(StimError::config("animation has no keyframes"));
        }
        keyframes.sort_by_key(|k| k.frame);
        if keyframes.windows(2).any(|w| w[0].frame == w[1].frame) {
            return Err(StimError::config("animation has duplicate keyframes"));
        }
        Ok(Self { keyframes })
    }

    pub fn keyframes(&self) -> &[BoundsKeyframe] {
        &self.keyframes
    }

    pub fn frames(&self) -> impl Iterator<Item = u32> + '_ {
        self.keyframes.iter().map(|k| k.frame)
    }

    /// Local box at `frame`.
    pub fn at(&self, frame: u32) -> BoundingBox {
        let first = &self.keyframes[0];
        if frame <= first.frame {
            return first.bounds();
        }
        let last = &self.keyframes[self.keyframes.len() - 1];
        if frame >= last.frame {
            return last.bounds();
        }
        for w in self.keyframes.windows(2) {
            let (a, b) = (&w[0], &w[1]);
            if frame >= a.frame && frame <= b.frame {
                let t = (frame - a.frame) as f64 / (b.frame - a.frame) as f64;
                return BoundingBox::new(a.min.lerp(&b.min, t), a.max.lerp(&b.max, t));
            }
        }
        last.bounds()
    }

    /// Union of every authored box.
    pub fn envelope(&self) -> BoundingBox {
        self.keyframes
            .iter()
            .map(BoundsKeyframe::bounds)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_else(|| self.keyframes[0].bounds())
    }
}

/// Outcome of checking an animation against a background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compatibility {
    pub compatible: bool,
    pub reason: String,
}

impl Compatibility {
    pub fn ok() -> Self {
        Self {
            compatible: true,
            reason: String::new(),
        }
    }

    pub fn incompatible(reason: impl Into<String>) -> Self {
        Self {
            compatible: false,
            reason: reason.into(),
        }
    }
}

/// Check that an animation, scaled by `size`, can fit inside the
/// background's constrained horizontal axes under some 90° rotation.
pub fn check_compatibility(
    animation: &BoundingTrajectory,
    size: f64,
    envelope: &PositionSpec,
) -> Compatibility {
    let span = animation.envelope().extent() * size;
    let (long, short) = (span.x.max(span.y), span.x.min(span.y));
    match envelope.coordinates() {
        Coordinates::Cartesian(c) => {
            let (x_lo, x_hi) = c.x.bounds();
            let (y_lo, y_hi) = c.y.bounds();
            let (wx, wy) = (x_hi - x_lo, y_hi - y_lo);
            let (wide, narrow) = (wx.max(wy), wx.min(wy));
            if long > wide || short > narrow {
                return Compatibility::incompatible(format!(
                    "animation sweeps {:.2} x {:.2} but the background allows {:.2} x {:.2}",
                    span.x, span.y, wx, wy
                ));
            }
            Compatibility::ok()
        }
        Coordinates::Spherical(s) => {
            let (_, r_hi) = s.r.bounds();
            if long > 2.0 * r_hi {
                return Compatibility::incompatible(format!(
                    "animation sweeps {:.2} but the background radius is {:.2}",
                    long, r_hi
                ));
            }
            Compatibility::ok()
        }
    }
}
