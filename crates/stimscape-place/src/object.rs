//! Rejection sampling of an object's pose inside a background.

use rand::Rng;
use stimscape_core::projection::ray_plane_z;
use stimscape_core::{
    camera_matrix, circular_distance, FailurePolicy, StimError, StimResult, Vec3,
};
use stimscape_ir::{CameraState, ObjectConstraints, PlaceableEntity};
use tracing::{debug, trace};

use crate::gate::{FeasibilityGate, GateSettings, ObstacleSet};
use crate::histogram::OccupancyHistogram;

/// Redraws allowed when a size distribution reaches into non-positive values.
const MAX_SIZE_DRAWS: usize = 100;

/// Everything a position sampler needs to know about the current scene
/// attempt.
pub struct PlacementContext<'a> {
    pub views: &'a [(u32, stimscape_core::CameraView)],
    pub obstacles: &'a ObstacleSet,
    pub settings: GateSettings,
    pub max_attempts: usize,
    /// Camera-space depth at which image-plane draws are unprojected.
    pub reference_depth: f64,
}

/// Position, size and heading constraints for objects in one background.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPlacementConstraint {
    params: ObjectConstraints,
}

impl ObjectPlacementConstraint {
    pub fn new(params: ObjectConstraints) -> StimResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ObjectConstraints {
        &self.params
    }

    /// Draw a positive size.
    pub fn sample_size<R: Rng + ?Sized>(&self, rng: &mut R) -> StimResult<f64> {
        for _ in 0..MAX_SIZE_DRAWS {
            let size = self.params.size.sample(rng);
            if size > 0.0 {
                return Ok(size);
            }
        }
        Err(StimError::placement(
            "size distribution produced no positive draw",
            MAX_SIZE_DRAWS,
        ))
    }

    /// Draw a heading in degrees. With a camera, the heading is uniform
    /// within 90 degrees of the direction facing the first keyframe's
    /// camera and the configured distribution is ignored.
    pub fn sample_rotation<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        camera: Option<&CameraState>,
    ) -> StimResult<f64> {
        match camera.and_then(|c| c.keyframes().first()) {
            Some(k) => {
                let facing = camera_matrix(k.location, k.fixation)?.facing_azimuth();
                let heading = facing + rng.gen_range(-90.0..=90.0);
                Ok(circular_distance(heading, 0.0))
            }
            None => Ok(self.params.rotation_z.sample(rng)),
        }
    }

    /// Draw positions straight from the 3D envelope, narrowed by half the
    /// object's size, until one passes the gate.
    ///
    /// On success the entity's position is updated and returned. On
    /// exhaustion the result follows `policy`.
    pub fn sample_3d<R: Rng + ?Sized>(
        &self,
        entity: &mut PlaceableEntity,
        ctx: &PlacementContext<'_>,
        rng: &mut R,
        policy: FailurePolicy,
    ) -> StimResult<Option<Vec3>> {
        let proposal = match self.params.position.shrink_for_extent(entity.size) {
            Ok(p) => p,
            Err(e) => {
                debug!(object = %entity.name, size = entity.size, error = %e, "envelope cannot hold object");
                return exhausted(&entity.name, 0, policy);
            }
        };
        let gate = FeasibilityGate::new(&self.params.position, ctx.views, ctx.settings);
        let start = entity.position;
        for attempt in 1..=ctx.max_attempts {
            entity.position = proposal.sample(rng);
            match gate.check(entity, ctx.obstacles) {
                Ok(()) => {
                    debug!(object = %entity.name, attempt, "placed");
                    return Ok(Some(entity.position));
                }
                Err(reason) => {
                    trace!(object = %entity.name, attempt, %reason, "rejected candidate")
                }
            }
        }
        entity.position = start;
        exhausted(&entity.name, ctx.max_attempts, policy)
    }

    /// Draw an image location from `histogram`, cast it through the first
    /// camera view onto the support plane at a sampled base height, and gate
    /// the result. Falls back to [`Self::sample_3d`] without a camera view.
    pub fn sample_image_plane<R: Rng + ?Sized>(
        &self,
        entity: &mut PlaceableEntity,
        ctx: &PlacementContext<'_>,
        histogram: &OccupancyHistogram,
        rng: &mut R,
        policy: FailurePolicy,
    ) -> StimResult<Option<Vec3>> {
        let Some((_, view)) = ctx.views.first() else {
            return self.sample_3d(entity, ctx, rng, policy);
        };
        let gate = FeasibilityGate::new(&self.params.position, ctx.views, ctx.settings);
        let start = entity.position;
        for attempt in 1..=ctx.max_attempts {
            let pixel = view.from_percent(&histogram.sample(rng));
            let through = view.unproject(&pixel, ctx.reference_depth)?;
            let base = self.sample_base_height(rng);
            let Some(hit) = ray_plane_z(view.location, through, base) else {
                trace!(object = %entity.name, attempt, "ray misses support plane");
                continue;
            };
            entity.position = hit;
            match gate.check(entity, ctx.obstacles) {
                Ok(()) => {
                    debug!(object = %entity.name, attempt, "placed from image plane");
                    return Ok(Some(entity.position));
                }
                Err(reason) => {
                    trace!(object = %entity.name, attempt, %reason, "rejected candidate")
                }
            }
        }
        entity.position = start;
        exhausted(&entity.name, ctx.max_attempts, policy)
    }

    fn sample_base_height<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self.params.position.base_height() {
            Some(z) => z.sample(rng),
            None => self.params.position.sample(rng).z,
        }
    }
}

fn exhausted(name: &str, attempts: usize, policy: FailurePolicy) -> StimResult<Option<Vec3>> {
    match policy {
        FailurePolicy::Raise => Err(StimError::placement(
            format!("no feasible position for '{name}'"),
            attempts,
        )),
        FailurePolicy::Partial => {
            debug!(object = name, attempts, "placement exhausted");
            Ok(None)
        }
    }
}
