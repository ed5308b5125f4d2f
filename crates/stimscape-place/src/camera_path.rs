//! Camera trajectories: a location path stepped at constant speed through a
//! spherical envelope, and fixation points per keyframe.

use std::f64::consts::TAU;

use rand::Rng;
use stimscape_core::{
    cart2sph, circular_distance, Lens, Spherical, StimError, StimResult, Vec3,
};
use stimscape_core::math::planar_angle_between;
use stimscape_ir::{CameraConstraints, CameraState, PlaceableEntity};
use tracing::{debug, trace};

/// Relative radius change tolerated per step under pan-only motion.
const PAN_RADIUS_TOLERANCE: f64 = 0.05;

/// Samples camera trajectories from a [`CameraConstraints`] record.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPathConstraint {
    params: CameraConstraints,
}

impl CameraPathConstraint {
    pub fn new(params: CameraConstraints) -> StimResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &CameraConstraints {
        &self.params
    }

    pub fn lens(&self) -> Lens {
        self.params.lens
    }

    /// Camera location at each keyframe.
    ///
    /// The first location is drawn from the location envelope. Each later
    /// one is a step of `speed * frames / fps` in a random horizontal
    /// direction from the previous location, chosen among the candidates
    /// that stay in the envelope and obey the pan/zoom and path-angle
    /// limits. A keyframe with no surviving candidate restarts the whole
    /// trajectory.
    pub fn sample_location<R: Rng + ?Sized>(
        &self,
        keyframes: &[u32],
        fps: f64,
        max_attempts: usize,
        candidates_per_step: usize,
        rng: &mut R,
    ) -> StimResult<Vec<Vec3>> {
        if keyframes.is_empty() {
            return Err(StimError::config("camera path needs at least one keyframe"));
        }
        if fps <= 0.0 {
            return Err(StimError::config(format!("fps must be positive, got {fps}")));
        }
        for attempt in 1..=max_attempts {
            if let Some(path) = self.try_path(keyframes, fps, candidates_per_step, rng) {
                debug!(attempt, keyframes = keyframes.len(), "camera path sampled");
                return Ok(path);
            }
            trace!(attempt, "camera path hit a dead end, restarting");
        }
        Err(StimError::placement(
            "no camera path satisfies the location constraints",
            max_attempts,
        ))
    }

    fn try_path<R: Rng + ?Sized>(
        &self,
        keyframes: &[u32],
        fps: f64,
        candidates_per_step: usize,
        rng: &mut R,
    ) -> Option<Vec<Vec3>> {
        let mut path = Vec::with_capacity(keyframes.len());
        path.push(self.params.location.sample(rng));
        let moving = self.params.pan || self.params.zoom;

        for pair in keyframes.windows(2) {
            let prev = path[path.len() - 1];
            if !moving {
                path.push(prev);
                continue;
            }
            let frames = pair[1].saturating_sub(pair[0]) as f64;
            let step = self.params.speed.sample(rng).max(0.0) * frames / fps;
            let heading = match path.len() {
                n if n >= 2 => Some(prev - path[n - 2]),
                _ => None,
            };
            let origin = self.params.location.origin();
            let prev_sph = cart2sph(prev, origin);

            let survivors: Vec<Vec3> = (0..candidates_per_step)
                .filter_map(|_| {
                    let angle = rng.gen_range(0.0..TAU);
                    let candidate = prev + Vec3::new(step * angle.cos(), step * angle.sin(), 0.0);
                    self.keeps(prev, &prev_sph, candidate, heading.as_ref())
                        .then_some(candidate)
                })
                .collect();
            if survivors.is_empty() {
                return None;
            }
            path.push(survivors[rng.gen_range(0..survivors.len())]);
        }
        Some(path)
    }

    /// Candidate filter for a camera that pans, zooms or both. A camera that
    /// does neither repeats its location in `try_path` and never gets here.
    fn keeps(&self, prev: Vec3, prev_sph: &Spherical, candidate: Vec3, heading: Option<&Vec3>) -> bool {
        if !self.params.location.contains(&candidate) {
            return false;
        }
        let sph = cart2sph(candidate, self.params.location.origin());
        let motion_ok = if !self.params.zoom {
            (sph.r - prev_sph.r).abs() <= PAN_RADIUS_TOLERANCE * prev_sph.r
        } else if !self.params.pan {
            circular_distance(sph.azimuth, prev_sph.azimuth).abs() <= self.params.zoom_tolerance
        } else {
            true
        };
        if !motion_ok {
            return false;
        }
        match (self.params.max_path_angle, heading) {
            (Some(limit), Some(heading)) => planar_angle_between(heading, &(candidate - prev))
                .map_or(true, |angle| angle <= limit),
            _ => true,
        }
    }

    /// Fixation point at each keyframe.
    ///
    /// Without objects each point is an independent draw from the fixation
    /// envelope. With objects, X and Y follow the centroid of their boxes at
    /// that keyframe, weighted by size over distance to the camera, and only
    /// Z is drawn.
    pub fn sample_fixation<R: Rng + ?Sized>(
        &self,
        locations: &[Vec3],
        keyframes: &[u32],
        objects: Option<&[PlaceableEntity]>,
        rng: &mut R,
    ) -> Vec<Vec3> {
        keyframes
            .iter()
            .zip(locations)
            .map(|(&frame, location)| {
                match objects.and_then(|o| weighted_centroid(o, frame, location)) {
                    Some(centroid) => {
                        let z = match self.params.fixation.base_height() {
                            Some(z) => z.sample(rng),
                            None => self.params.fixation.sample(rng).z,
                        };
                        Vec3::new(centroid.x, centroid.y, z)
                    }
                    None => self.params.fixation.sample(rng),
                }
            })
            .collect()
    }

    /// A full trajectory with fixations drawn from the fixation envelope.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        keyframes: &[u32],
        fps: f64,
        max_attempts: usize,
        candidates_per_step: usize,
        rng: &mut R,
    ) -> StimResult<CameraState> {
        let locations =
            self.sample_location(keyframes, fps, max_attempts, candidates_per_step, rng)?;
        let fixations = self.sample_fixation(&locations, keyframes, None, rng);
        let mut state = CameraState::new(self.params.lens);
        for ((&frame, location), fixation) in keyframes.iter().zip(locations).zip(fixations) {
            state.push(frame, location, fixation)?;
        }
        Ok(state)
    }
}

fn weighted_centroid(objects: &[PlaceableEntity], frame: u32, camera: &Vec3) -> Option<Vec3> {
    let mut sum = Vec3::ZERO;
    let mut total = 0.0;
    for object in objects {
        let center = object.bounds_at(frame).center();
        let weight = object.size / center.distance(camera).max(f64::EPSILON);
        sum = sum + center * weight;
        total += weight;
    }
    (total > 0.0).then(|| sum * (1.0 / total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use stimscape_core::{Distribution4, PositionSpec};

    fn constraints(pan: bool, zoom: bool) -> CameraConstraints {
        CameraConstraints::new(
            PositionSpec::spherical(
                Distribution4::uniform(15.0, 25.0).unwrap(),
                Distribution4::uniform(-180.0, 180.0).unwrap(),
                Distribution4::uniform(5.0, 30.0).unwrap(),
                Vec3::ZERO,
            ),
            PositionSpec::cartesian(
                Distribution4::uniform(-1.0, 1.0).unwrap(),
                Distribution4::uniform(-1.0, 1.0).unwrap(),
                Distribution4::uniform(0.0, 1.0).unwrap(),
            ),
            Distribution4::uniform(2.0, 4.0).unwrap(),
        )
        .with_motion(pan, zoom)
    }

    #[test]
    fn test_still_camera_repeats_location() {
        let path = CameraPathConstraint::new(constraints(false, false)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let locs = path
            .sample_location(&[1, 16, 31], 15.0, 10, 100, &mut rng)
            .unwrap();
        assert_eq!(locs.len(), 3);
        assert_eq!(locs[0], locs[1]);
        assert_eq!(locs[1], locs[2]);

        // No candidates are drawn for a camera that cannot move.
        let held = path
            .sample_location(&[1, 16, 31], 15.0, 1, 0, &mut rng)
            .unwrap();
        assert!(held.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_pan_keeps_radius() {
        let path = CameraPathConstraint::new(constraints(true, false)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let locs = path
            .sample_location(&[1, 16, 31, 46], 15.0, 50, 1000, &mut rng)
            .unwrap();
        for w in locs.windows(2) {
            let (a, b) = (cart2sph(w[0], Vec3::ZERO), cart2sph(w[1], Vec3::ZERO));
            assert!((b.r - a.r).abs() <= 0.05 * a.r + 1e-9);
            assert!(w[0].distance(&w[1]) > 0.0);
        }
    }

    #[test]
    fn test_zoom_keeps_azimuth() {
        let path = CameraPathConstraint::new(constraints(false, true)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let locs = path
            .sample_location(&[1, 11, 21], 15.0, 50, 1000, &mut rng)
            .unwrap();
        for w in locs.windows(2) {
            let (a, b) = (cart2sph(w[0], Vec3::ZERO), cart2sph(w[1], Vec3::ZERO));
            assert!(circular_distance(a.azimuth, b.azimuth).abs() <= 2.0 + 1e-9);
        }
    }

    #[test]
    fn test_path_angle_limits_heading_change() {
        let path =
            CameraPathConstraint::new(constraints(true, true).with_max_path_angle(20.0)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let locs = path
            .sample_location(&[1, 6, 11, 16, 21], 15.0, 50, 1000, &mut rng)
            .unwrap();
        for w in locs.windows(3) {
            let angle = planar_angle_between(&(w[1] - w[0]), &(w[2] - w[1])).unwrap();
            assert!(angle <= 20.0 + 1e-9);
        }
    }

    #[test]
    fn test_impossible_path_reports_exhaustion() {
        // A pan step far longer than the envelope allows.
        let mut c = constraints(true, false);
        c.speed = Distribution4::fixed(500.0).unwrap();
        let path = CameraPathConstraint::new(c).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let err = path
            .sample_location(&[1, 31], 15.0, 5, 50, &mut rng)
            .unwrap_err();
        assert!(err.is_placement());
    }

    #[test]
    fn test_fixation_follows_objects() {
        let path = CameraPathConstraint::new(constraints(false, false)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let camera = Vec3::new(0.0, -20.0, 5.0);
        let objects = vec![
            PlaceableEntity::cube("near").with_size(2.0).with_position(Vec3::new(2.0, 0.0, 0.0)),
            PlaceableEntity::cube("far").with_size(2.0).with_position(Vec3::new(-2.0, 0.0, 0.0)),
        ];
        let fix = path.sample_fixation(&[camera], &[1], Some(&objects), &mut rng);
        assert_eq!(fix.len(), 1);
        // Equal weights: symmetric about the Y axis.
        assert!(fix[0].x.abs() < 1e-9);
        assert!((0.0..=1.0).contains(&fix[0].z));

        let free = path.sample_fixation(&[camera, camera], &[1, 2], None, &mut rng);
        assert!(free.iter().all(|p| p.x.abs() <= 1.0 && p.y.abs() <= 1.0));
    }

    #[test]
    fn test_sample_builds_camera_state() {
        let path = CameraPathConstraint::new(constraints(true, true)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let state = path.sample(&[1, 10, 20], 15.0, 20, 500, &mut rng).unwrap();
        assert_eq!(state.frames().collect::<Vec<_>>(), vec![1, 10, 20]);
        assert_eq!(state.lens, Lens::default());
    }
}
