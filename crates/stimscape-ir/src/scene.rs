use serde::{Deserialize, Serialize};
use stimscape_core::{ContentHash, ContentHasher, Vec3};

use crate::animation::Compatibility;
use crate::camera::CameraState;
use crate::entity::PlaceableEntity;

/// An animation/background mismatch found while populating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub object: String,
    pub compatibility: Compatibility,
}

/// The result of one `populate` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulatedScene {
    pub camera: CameraState,
    /// Placed objects in caller order.
    pub objects: Vec<PlaceableEntity>,
    /// Whole-scene attempts used.
    pub attempts: usize,
    /// False when the result is a partial placement returned under the
    /// partial failure policy.
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reports: Vec<CompatibilityReport>,
}

impl PopulatedScene {
    pub fn object(&self, name: &str) -> Option<&PlaceableEntity> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Hash over camera keyframes and object poses. Attempt counts and
    /// reports are excluded so two runs landing on the same stimulus agree.
    pub fn content_hash(&self) -> ContentHash {
        fn vec(h: &mut ContentHasher, v: &Vec3) {
            h.update_f64(v.x).update_f64(v.y).update_f64(v.z);
        }
        let mut h = ContentHasher::new();
        h.update_f64(self.camera.lens.fov_degrees());
        h.update_u64(self.camera.len() as u64);
        for k in self.camera.keyframes() {
            h.update_u64(k.frame as u64);
            vec(&mut h, &k.location);
            vec(&mut h, &k.fixation);
        }
        h.update_u64(self.objects.len() as u64);
        for o in &self.objects {
            h.update_str(&o.name);
            vec(&mut h, &o.position);
            h.update_f64(o.size).update_f64(o.rotation_z);
        }
        h.finish()
    }
}
