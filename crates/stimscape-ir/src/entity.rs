use serde::{Deserialize, Serialize};
use stimscape_core::{StimError, StimResult, Vec3};

use crate::animation::BoundingTrajectory;

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(&b),
            max: a.max(&b),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.min.lerp(&self.max, 0.5)
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Strict overlap test. Boxes that only share a face, edge or corner do
    /// not collide.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
            && self.min.z < other.max.z
            && other.min.z < self.max.z
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    /// The eight corners.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Scale about the local origin, rotate about Z by `rotation_deg`, then
    /// translate. The result is the axis-aligned hull of the rotated box.
    pub fn transformed(&self, scale: f64, rotation_deg: f64, translation: Vec3) -> BoundingBox {
        let (sin, cos) = rotation_deg.to_radians().sin_cos();
        let mut lo = Vec3::new(f64::INFINITY, f64::INFINITY, self.min.z * scale);
        let mut hi = Vec3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, self.max.z * scale);
        for (x, y) in [
            (self.min.x, self.min.y),
            (self.max.x, self.min.y),
            (self.min.x, self.max.y),
            (self.max.x, self.max.y),
        ] {
            let rx = (x * cos - y * sin) * scale;
            let ry = (x * sin + y * cos) * scale;
            lo.x = lo.x.min(rx);
            lo.y = lo.y.min(ry);
            hi.x = hi.x.max(rx);
            hi.y = hi.y.max(ry);
        }
        BoundingBox {
            min: lo + translation,
            max: hi + translation,
        }
    }
}

/// An object (or static background obstacle) being placed in a scene.
///
/// `position` is the centre of the footprint in X/Y and the base height in Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceableEntity {
    pub name: String,
    pub position: Vec3,
    /// Largest dimension of the object's unanimated box.
    pub size: f64,
    /// Heading about Z, degrees.
    pub rotation_z: f64,
    /// Authored box dimensions at unit size; the largest component is 1.
    pub proportions: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<BoundingTrajectory>,
}

impl PlaceableEntity {
    pub fn new(name: impl Into<String>, proportions: Vec3) -> StimResult<Self> {
        Ok(Self {
            name: name.into(),
            position: Vec3::ZERO,
            size: 1.0,
            rotation_z: 0.0,
            proportions: normalize_proportions(proportions)?,
            animation: None,
        })
    }

    /// A unit cube.
    pub fn cube(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            size: 1.0,
            rotation_z: 0.0,
            proportions: Vec3::new(1.0, 1.0, 1.0),
            animation: None,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_rotation(mut self, rotation_z: f64) -> Self {
        self.rotation_z = rotation_z;
        self
    }

    pub fn with_animation(mut self, animation: BoundingTrajectory) -> Self {
        self.animation = Some(animation);
        self
    }

    /// Box at unit size in the object's own frame, before any animation.
    pub fn local_bounds(&self) -> BoundingBox {
        let p = self.proportions;
        BoundingBox::new(
            Vec3::new(-p.x / 2.0, -p.y / 2.0, 0.0),
            Vec3::new(p.x / 2.0, p.y / 2.0, p.z),
        )
    }

    /// World box of the resting pose.
    pub fn bounds(&self) -> BoundingBox {
        self.local_bounds()
            .transformed(self.size, self.rotation_z, self.position)
    }

    /// World box at `frame`, following the authored animation if any.
    pub fn bounds_at(&self, frame: u32) -> BoundingBox {
        match &self.animation {
            Some(anim) => anim
                .at(frame)
                .transformed(self.size, self.rotation_z, self.position),
            None => self.bounds(),
        }
    }

    /// Union of the world boxes over the whole animation.
    pub fn swept_bounds(&self) -> BoundingBox {
        match &self.animation {
            Some(anim) => anim
                .envelope()
                .transformed(self.size, self.rotation_z, self.position),
            None => self.bounds(),
        }
    }

    /// True if any pair of time-matched boxes overlaps. Static objects are
    /// compared at every authored frame of the animated one.
    pub fn collides_with(&self, other: &PlaceableEntity) -> bool {
        let frames: Vec<u32> = self
            .animation
            .iter()
            .chain(other.animation.iter())
            .flat_map(|a| a.frames())
            .collect();
        if frames.is_empty() {
            return self.bounds().overlaps(&other.bounds());
        }
        // Cheap reject before the per-frame test.
        if !self.swept_bounds().overlaps(&other.swept_bounds()) {
            return false;
        }
        frames
            .into_iter()
            .any(|f| self.bounds_at(f).overlaps(&other.bounds_at(f)))
    }
}

/// Scale proportions so the largest component is 1.
pub fn normalize_proportions(p: Vec3) -> StimResult<Vec3> {
    if !(p.x > 0.0 && p.y > 0.0 && p.z > 0.0) {
        return Err(StimError::config(format!(
            "object proportions must be positive, got {p:?}"
        )));
    }
    Ok(p * (1.0 / p.max_element()))
}

/// The caller's description of one object to place. Any `fixed_*` field is
/// taken as given and never sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRequest {
    pub name: String,
    #[serde(default = "unit_proportions")]
    pub proportions: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<BoundingTrajectory>,
}

fn unit_proportions() -> Vec3 {
    Vec3::new(1.0, 1.0, 1.0)
}

impl ObjectRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            proportions: unit_proportions(),
            fixed_position: None,
            fixed_size: None,
            fixed_rotation: None,
            animation: None,
        }
    }

    pub fn with_proportions(mut self, proportions: Vec3) -> Self {
        self.proportions = proportions;
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.fixed_size = Some(size);
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.fixed_position = Some(position);
        self
    }

    pub fn with_rotation(mut self, rotation_z: f64) -> Self {
        self.fixed_rotation = Some(rotation_z);
        self
    }

    pub fn with_animation(mut self, animation: BoundingTrajectory) -> Self {
        self.animation = Some(animation);
        self
    }

    /// Fresh entity for one sampling attempt, with the fixed fields applied.
    pub fn instantiate(&self) -> StimResult<PlaceableEntity> {
        let mut entity = PlaceableEntity::new(self.name.clone(), self.proportions)?;
        if let Some(p) = self.fixed_position {
            entity.position = p;
        }
        if let Some(s) = self.fixed_size {
            entity.size = s;
        }
        if let Some(r) = self.fixed_rotation {
            entity.rotation_z = r;
        }
        entity.animation = self.animation.clone();
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::BoundsKeyframe;

    fn unit_box_at(x: f64, y: f64, z: f64) -> BoundingBox {
        BoundingBox::new(Vec3::new(x, y, z), Vec3::new(x + 1.0, y + 1.0, z + 1.0))
    }

    #[test]
    fn test_separated_boxes_do_not_collide() {
        assert!(!unit_box_at(0.0, 0.0, 0.0).overlaps(&unit_box_at(3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_overlapping_boxes_collide() {
        assert!(unit_box_at(0.0, 0.0, 0.0).overlaps(&unit_box_at(0.5, 0.5, 0.5)));
    }

    #[test]
    fn test_touching_boxes_do_not_collide() {
        assert!(!unit_box_at(0.0, 0.0, 0.0).overlaps(&unit_box_at(1.0, 0.0, 0.0)));
        assert!(!unit_box_at(0.0, 0.0, 0.0).overlaps(&unit_box_at(1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_entity_bounds_follow_size_and_position() {
        let e = PlaceableEntity::new("crate", Vec3::new(2.0, 1.0, 1.0))
            .unwrap()
            .with_size(4.0)
            .with_position(Vec3::new(1.0, 1.0, 0.5));
        let b = e.bounds();
        assert!(b.min.approx_eq(&Vec3::new(-1.0, 0.0, 0.5), 1e-9));
        assert!(b.max.approx_eq(&Vec3::new(3.0, 2.0, 2.5), 1e-9));
    }

    #[test]
    fn test_rotation_swaps_footprint() {
        let e = PlaceableEntity::new("bench", Vec3::new(2.0, 1.0, 1.0))
            .unwrap()
            .with_size(2.0)
            .with_rotation(90.0);
        let ext = e.bounds().extent();
        assert!((ext.x - 1.0).abs() < 1e-9);
        assert!((ext.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_animated_entity_collides_mid_motion() {
        let walk = BoundingTrajectory::new(vec![
            BoundsKeyframe::new(0, Vec3::new(-0.5, -0.5, 0.0), Vec3::new(0.5, 0.5, 1.0)),
            BoundsKeyframe::new(10, Vec3::new(4.5, -0.5, 0.0), Vec3::new(5.5, 0.5, 1.0)),
        ])
        .unwrap();
        let walker = PlaceableEntity::cube("walker").with_animation(walk);
        let rock = PlaceableEntity::cube("rock").with_position(Vec3::new(5.0, 0.0, 0.0));
        assert!(!walker.bounds_at(0).overlaps(&rock.bounds()));
        assert!(walker.collides_with(&rock));
        assert!(rock.collides_with(&walker));
    }

    #[test]
    fn test_request_instantiates_fixed_fields() {
        let req = ObjectRequest::new("lamp")
            .with_size(3.0)
            .with_rotation(45.0)
            .with_proportions(Vec3::new(1.0, 1.0, 4.0));
        let e = req.instantiate().unwrap();
        assert_eq!(e.size, 3.0);
        assert_eq!(e.rotation_z, 45.0);
        assert_eq!(e.proportions, Vec3::new(0.25, 0.25, 1.0));
        assert!(ObjectRequest::new("bad")
            .with_proportions(Vec3::new(0.0, 1.0, 1.0))
            .instantiate()
            .is_err());
    }
}
