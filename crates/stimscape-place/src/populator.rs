//! Scene population: camera first, then every object in caller order, with
//! whole-scene restarts when an object cannot be placed.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use stimscape_core::{
    CameraView, FailurePolicy, PlacementStrategy, PopulateConfig, RenderConfig, StimError,
    StimResult, StimscapeConfig,
};
use stimscape_ir::{
    check_compatibility, validate_request, BackgroundRecord, CameraState, CompatibilityReport,
    ObjectConstraints, ObjectRequest, PlaceableEntity, PopulatedScene,
};
use tracing::{debug, info, warn};

use crate::camera_path::CameraPathConstraint;
use crate::gate::{project_box, GateSettings, ObstacleSet};
use crate::histogram::OccupancyHistogram;
use crate::object::{ObjectPlacementConstraint, PlacementContext};

/// The frames a scene spans and how many camera keyframes to spread over
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: u32,
    pub end: u32,
    pub keyframes: usize,
}

impl Default for FrameRange {
    fn default() -> Self {
        Self::still(1)
    }
}

impl FrameRange {
    pub fn new(start: u32, end: u32, keyframes: usize) -> Self {
        Self {
            start,
            end,
            keyframes,
        }
    }

    /// A single-frame scene.
    pub fn still(frame: u32) -> Self {
        Self::new(frame, frame, 1)
    }

    /// Keyframe numbers, evenly spaced and rounded, first and last included.
    pub fn keyframes(&self) -> Vec<u32> {
        if self.keyframes <= 1 || self.end <= self.start {
            return vec![self.start];
        }
        let span = (self.end - self.start) as f64;
        let last = (self.keyframes - 1) as f64;
        let mut frames: Vec<u32> = (0..self.keyframes)
            .map(|i| self.start + (span * i as f64 / last).round() as u32)
            .collect();
        frames.dedup();
        frames
    }
}

/// Where objects go and what is already standing there.
#[derive(Debug, Clone)]
pub struct Background {
    pub constraint: ObjectPlacementConstraint,
    pub obstacles: Vec<PlaceableEntity>,
}

impl Background {
    pub fn new(constraints: ObjectConstraints) -> StimResult<Self> {
        Ok(Self {
            constraint: ObjectPlacementConstraint::new(constraints)?,
            obstacles: Vec::new(),
        })
    }

    pub fn with_obstacles(mut self, obstacles: Vec<PlaceableEntity>) -> Self {
        self.obstacles = obstacles;
        self
    }

    pub fn from_record(record: &BackgroundRecord) -> StimResult<Self> {
        Ok(Self::new(record.objects.clone())?.with_obstacles(record.obstacles.clone()))
    }
}

/// One scene attempt's outcome.
struct SceneAttempt {
    camera: CameraState,
    objects: Vec<PlaceableEntity>,
    reports: Vec<CompatibilityReport>,
    complete: bool,
}

impl SceneAttempt {
    fn incomplete(
        camera: CameraState,
        obstacles: ObstacleSet,
        reports: Vec<CompatibilityReport>,
    ) -> Self {
        Self {
            camera,
            objects: obstacles.into_placed(),
            reports,
            complete: false,
        }
    }

    fn into_scene(self, attempts: usize) -> PopulatedScene {
        PopulatedScene {
            camera: self.camera,
            objects: self.objects,
            attempts,
            complete: self.complete,
            reports: self.reports,
        }
    }
}

/// Places a camera and a set of objects into a background.
///
/// Owns the random number generator and the occupancy histogram, both of
/// which carry over between `populate` calls so that a batch of scenes
/// spreads its objects across the frame.
pub struct ScenePopulator {
    config: PopulateConfig,
    render: RenderConfig,
    rng: ChaCha8Rng,
    histogram: OccupancyHistogram,
}

impl ScenePopulator {
    /// Build from a validated config, seeded from `[rng] seed` or from
    /// entropy when absent.
    pub fn new(config: &StimscapeConfig) -> StimResult<Self> {
        let rng = match config.rng.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_seed(config: &StimscapeConfig, seed: u64) -> StimResult<Self> {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(config: &StimscapeConfig, rng: ChaCha8Rng) -> StimResult<Self> {
        config.validate()?;
        Ok(Self {
            config: config.populate.clone(),
            render: config.render.clone(),
            rng,
            histogram: OccupancyHistogram::new(config.populate.histogram_bins)?,
        })
    }

    pub fn config(&self) -> &PopulateConfig {
        &self.config
    }

    pub fn histogram(&self) -> &OccupancyHistogram {
        &self.histogram
    }

    /// Place a camera trajectory and every requested object.
    ///
    /// Objects are placed in order, each becoming an obstacle for the ones
    /// after it. An object that cannot be placed aborts the scene attempt
    /// and the next attempt starts over with a fresh camera. When every
    /// attempt fails the outcome follows the configured failure policy;
    /// a camera that can never be placed is an error under either policy.
    pub fn populate(
        &mut self,
        objects: &[ObjectRequest],
        background: &Background,
        camera: &CameraPathConstraint,
        frames: &FrameRange,
    ) -> StimResult<PopulatedScene> {
        let keyframes = frames.keyframes();
        validate_request(
            objects,
            background.constraint.params(),
            camera.params(),
            &keyframes,
        )
        .map_err(|errors| {
            StimError::Validation(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;

        let mut best: Option<SceneAttempt> = None;
        let mut camera_error = None;
        for scene_attempt in 1..=self.config.max_scene_attempts {
            let attempt = match self.attempt_scene(objects, background, camera, &keyframes) {
                Ok(a) => a,
                Err(e) if e.is_placement() => {
                    debug!(scene_attempt, error = %e, "scene attempt failed before objects were placed");
                    camera_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if attempt.complete {
                info!(
                    objects = attempt.objects.len(),
                    attempts = scene_attempt,
                    "scene populated"
                );
                return Ok(attempt.into_scene(scene_attempt));
            }
            debug!(
                scene_attempt,
                placed = attempt.objects.len(),
                requested = objects.len(),
                "scene attempt incomplete, restarting"
            );
            if best
                .as_ref()
                .map_or(true, |b| attempt.objects.len() > b.objects.len())
            {
                best = Some(attempt);
            }
        }

        let attempts = self.config.max_scene_attempts;
        match (best, self.config.failure_policy) {
            (None, _) => Err(camera_error.unwrap_or_else(|| {
                StimError::placement("no scene attempt produced a camera", attempts)
            })),
            (Some(_), FailurePolicy::Raise) => Err(StimError::placement(
                format!("could not place all {} objects", objects.len()),
                attempts,
            )),
            (Some(partial), FailurePolicy::Partial) => {
                warn!(
                    placed = partial.objects.len(),
                    requested = objects.len(),
                    attempts,
                    "returning partial scene"
                );
                Ok(partial.into_scene(attempts))
            }
        }
    }

    fn attempt_scene(
        &mut self,
        objects: &[ObjectRequest],
        background: &Background,
        camera: &CameraPathConstraint,
        keyframes: &[u32],
    ) -> StimResult<SceneAttempt> {
        let camera_state = camera.sample(
            keyframes,
            self.render.fps,
            self.config.max_attempts,
            self.config.candidates_per_step,
            &mut self.rng,
        )?;
        let views = camera_state.views(self.render.image_size())?;
        let constraint = &background.constraint;
        let mut obstacles = ObstacleSet::new(background.obstacles.clone());
        let mut reports = Vec::new();

        for request in objects {
            let mut entity = request.instantiate()?;
            if request.fixed_rotation.is_none() {
                let facing = self.config.face_camera.then_some(&camera_state);
                entity.rotation_z = constraint.sample_rotation(&mut self.rng, facing)?;
            }
            if request.fixed_size.is_none() {
                entity.size = constraint.sample_size(&mut self.rng)?;
            }
            if let Some(animation) = &entity.animation {
                let compatibility =
                    check_compatibility(animation, entity.size, &constraint.params().position);
                if !compatibility.compatible {
                    warn!(object = %entity.name, reason = %compatibility.reason, "animation does not fit background");
                    let strict = self.config.strict_animation_compatibility;
                    reports.push(CompatibilityReport {
                        object: entity.name.clone(),
                        compatibility,
                    });
                    if strict {
                        return Ok(SceneAttempt::incomplete(camera_state, obstacles, reports));
                    }
                }
            }

            let placed = if request.fixed_position.is_some() {
                Some(entity.position)
            } else {
                let ctx = PlacementContext {
                    views: &views,
                    obstacles: &obstacles,
                    settings: GateSettings::from(&self.config),
                    max_attempts: self.config.max_attempts,
                    reference_depth: self.config.reference_depth,
                };
                match self.config.strategy {
                    PlacementStrategy::ThreeD => constraint.sample_3d(
                        &mut entity,
                        &ctx,
                        &mut self.rng,
                        FailurePolicy::Partial,
                    )?,
                    PlacementStrategy::ImagePlane => constraint.sample_image_plane(
                        &mut entity,
                        &ctx,
                        &self.histogram,
                        &mut self.rng,
                        FailurePolicy::Partial,
                    )?,
                }
            };
            if placed.is_none() {
                return Ok(SceneAttempt::incomplete(camera_state, obstacles, reports));
            }
            self.record_occupancy(&views, &entity);
            obstacles.push(entity);
        }

        Ok(SceneAttempt {
            camera: camera_state,
            objects: obstacles.into_placed(),
            reports,
            complete: true,
        })
    }

    /// Count an accepted object's projected centre at the first keyframe.
    fn record_occupancy(&mut self, views: &[(u32, CameraView)], entity: &PlaceableEntity) {
        let Some((frame, view)) = views.first() else {
            return;
        };
        if let Some(projected) = project_box(view, &entity.bounds_at(*frame)) {
            self.histogram.record(&projected.center());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stimscape_core::{Distribution4, PositionSpec, Vec3};
    use stimscape_ir::CameraConstraints;

    fn background() -> Background {
        Background::new(ObjectConstraints {
            position: PositionSpec::cartesian(
                Distribution4::uniform(-5.0, 5.0).unwrap(),
                Distribution4::uniform(-5.0, 5.0).unwrap(),
                Distribution4::fixed(0.0).unwrap(),
            ),
            size: Distribution4::uniform(1.0, 2.0).unwrap(),
            rotation_z: Distribution4::uniform(-180.0, 180.0).unwrap(),
        })
        .unwrap()
    }

    fn fixed_camera() -> CameraPathConstraint {
        CameraPathConstraint::new(CameraConstraints::new(
            PositionSpec::cartesian(
                Distribution4::fixed(0.0).unwrap(),
                Distribution4::fixed(-20.0).unwrap(),
                Distribution4::fixed(5.0).unwrap(),
            ),
            PositionSpec::cartesian(
                Distribution4::fixed(0.0).unwrap(),
                Distribution4::fixed(0.0).unwrap(),
                Distribution4::fixed(0.0).unwrap(),
            ),
            Distribution4::fixed(0.0).unwrap(),
        ))
        .unwrap()
    }

    fn populator() -> ScenePopulator {
        ScenePopulator::with_seed(&StimscapeConfig::default(), 11).unwrap()
    }

    #[test]
    fn test_frame_range_keyframes() {
        assert_eq!(FrameRange::still(5).keyframes(), vec![5]);
        assert_eq!(FrameRange::new(1, 31, 3).keyframes(), vec![1, 16, 31]);
        assert_eq!(FrameRange::new(1, 3, 10).keyframes(), vec![1, 2, 3]);
    }

    #[test]
    fn test_populates_in_caller_order() {
        let mut p = populator();
        let objects = vec![ObjectRequest::new("a"), ObjectRequest::new("b")];
        let scene = p
            .populate(&objects, &background(), &fixed_camera(), &FrameRange::still(1))
            .unwrap();
        assert!(scene.complete);
        let names: Vec<_> = scene.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(!scene.objects[0].collides_with(&scene.objects[1]));
        assert_eq!(p.histogram().total(), 2);
    }

    #[test]
    fn test_fixed_fields_are_kept() {
        let mut p = populator();
        let objects = vec![ObjectRequest::new("pinned")
            .with_position(Vec3::new(1.0, 2.0, 0.0))
            .with_size(1.5)
            .with_rotation(45.0)];
        let scene = p
            .populate(&objects, &background(), &fixed_camera(), &FrameRange::still(1))
            .unwrap();
        let pinned = scene.object("pinned").unwrap();
        assert_eq!(pinned.position, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(pinned.size, 1.5);
        assert_eq!(pinned.rotation_z, 45.0);
    }

    #[test]
    fn test_validation_errors_are_reported_together() {
        let mut p = populator();
        let objects = vec![
            ObjectRequest::new("dup").with_size(-1.0),
            ObjectRequest::new("dup"),
        ];
        let err = p
            .populate(&objects, &background(), &fixed_camera(), &FrameRange::still(1))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("duplicate"));
        assert!(msg.contains("non-positive size"));
    }

    #[test]
    fn test_partial_policy_returns_best_attempt() {
        let mut config = StimscapeConfig::default();
        config.populate.max_attempts = 50;
        config.populate.max_scene_attempts = 3;
        let mut p = ScenePopulator::with_seed(&config, 3).unwrap();
        let objects = vec![
            ObjectRequest::new("small").with_size(1.0),
            ObjectRequest::new("giant").with_size(50.0),
        ];
        let scene = p
            .populate(&objects, &background(), &fixed_camera(), &FrameRange::still(1))
            .unwrap();
        assert!(!scene.complete);
        assert_eq!(scene.attempts, 3);
        assert_eq!(scene.objects.len(), 1);
        // Every attempt placed "small" before giving up on "giant".
        assert_eq!(p.histogram().total(), 3);
    }
}
