//! The feasibility gate every placement candidate has to pass.
//!
//! Checks, in order: the 3D envelope, 3D collision with obstacles, and then
//! for every camera keyframe the 2D edge margin, 2D overlap with placed
//! objects and 2D minimum size. Rejections carry the reason so callers can
//! log them; they are never errors.

use std::fmt;

use stimscape_core::position::azimuth_within;
use stimscape_core::{cart2sph, CameraView, Coordinates, Point2D, PositionSpec, PopulateConfig};
use stimscape_ir::{BoundingBox, PlaceableEntity};

/// Image-space thresholds, all in percent of frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateSettings {
    pub edge_margin: f64,
    pub overlap_fraction: f64,
    pub min_apparent_size: f64,
}

impl From<&PopulateConfig> for GateSettings {
    fn from(config: &PopulateConfig) -> Self {
        Self {
            edge_margin: config.edge_margin,
            overlap_fraction: config.overlap_fraction,
            min_apparent_size: config.min_apparent_size,
        }
    }
}

impl Default for GateSettings {
    fn default() -> Self {
        GateSettings::from(&PopulateConfig::default())
    }
}

/// Why a candidate was turned away.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    OutOfBounds,
    Collision { with: String },
    BehindCamera { frame: u32 },
    OffFrame { frame: u32 },
    Overlap { with: String, frame: u32 },
    TooSmall { frame: u32, apparent: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::OutOfBounds => write!(f, "outside the 3D envelope"),
            Rejection::Collision { with } => write!(f, "collides with '{with}'"),
            Rejection::BehindCamera { frame } => write!(f, "behind the camera at frame {frame}"),
            Rejection::OffFrame { frame } => write!(f, "outside the frame margin at frame {frame}"),
            Rejection::Overlap { with, frame } => {
                write!(f, "overlaps '{with}' in the image at frame {frame}")
            }
            Rejection::TooSmall { frame, apparent } => {
                write!(f, "apparent size {apparent:.2}% too small at frame {frame}")
            }
        }
    }
}

/// Projected extent of a box, in percent of frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedBox {
    pub min: Point2D,
    pub max: Point2D,
}

impl ProjectedBox {
    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Mean of projected width and height.
    pub fn apparent_size(&self) -> f64 {
        (self.width() + self.height()) / 2.0
    }

    pub fn within_margin(&self, margin: f64) -> bool {
        let hi = 100.0 - margin;
        self.min.x >= margin && self.min.y >= margin && self.max.x <= hi && self.max.y <= hi
    }
}

/// Project all eight corners; `None` if any lies at non-positive depth.
pub fn project_box(view: &CameraView, bbox: &BoundingBox) -> Option<ProjectedBox> {
    let mut min = Point2D::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point2D::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for corner in bbox.corners() {
        let px = view.project(&corner).ok()?;
        let pct = view.to_percent(&px);
        min.x = min.x.min(pct.x);
        min.y = min.y.min(pct.y);
        max.x = max.x.max(pct.x);
        max.y = max.y.max(pct.y);
    }
    Some(ProjectedBox { min, max })
}

/// Background geometry plus everything placed so far in this scene attempt.
#[derive(Debug, Clone, Default)]
pub struct ObstacleSet {
    background: Vec<PlaceableEntity>,
    placed: Vec<PlaceableEntity>,
}

impl ObstacleSet {
    pub fn new(background: Vec<PlaceableEntity>) -> Self {
        Self {
            background,
            placed: Vec::new(),
        }
    }

    pub fn push(&mut self, entity: PlaceableEntity) {
        self.placed.push(entity);
    }

    /// Objects accepted in this scene attempt, in placement order.
    pub fn placed(&self) -> &[PlaceableEntity] {
        &self.placed
    }

    pub fn into_placed(self) -> Vec<PlaceableEntity> {
        self.placed
    }

    /// Every obstacle relevant to 3D collision.
    pub fn all(&self) -> impl Iterator<Item = &PlaceableEntity> {
        self.background.iter().chain(self.placed.iter())
    }
}

/// A configured gate for one scene attempt.
pub struct FeasibilityGate<'a> {
    envelope: &'a PositionSpec,
    views: &'a [(u32, CameraView)],
    settings: GateSettings,
}

impl<'a> FeasibilityGate<'a> {
    pub fn new(
        envelope: &'a PositionSpec,
        views: &'a [(u32, CameraView)],
        settings: GateSettings,
    ) -> Self {
        Self {
            envelope,
            views,
            settings,
        }
    }

    /// Resting footprint inside X/Y and base inside Z, or distance ± size/2
    /// inside the radial band (with azimuth and elevation in range).
    /// Animated reach is checked separately against the background.
    pub fn within_bounds(&self, candidate: &PlaceableEntity) -> bool {
        match self.envelope.coordinates() {
            Coordinates::Cartesian(c) => {
                let b = candidate.bounds();
                let (x_lo, x_hi) = c.x.bounds();
                let (y_lo, y_hi) = c.y.bounds();
                b.min.x >= x_lo
                    && b.max.x <= x_hi
                    && b.min.y >= y_lo
                    && b.max.y <= y_hi
                    && c.z.contains(candidate.position.z)
            }
            Coordinates::Spherical(s) => {
                let sph = cart2sph(candidate.position, self.envelope.origin());
                let half = candidate.size / 2.0;
                let (r_lo, r_hi) = s.r.bounds();
                sph.r - half >= r_lo
                    && sph.r + half <= r_hi
                    && azimuth_within(&s.theta, sph.azimuth)
                    && s.phi.contains(sph.elevation)
            }
        }
    }

    pub fn check(
        &self,
        candidate: &PlaceableEntity,
        obstacles: &ObstacleSet,
    ) -> Result<(), Rejection> {
        if !self.within_bounds(candidate) {
            return Err(Rejection::OutOfBounds);
        }
        if let Some(hit) = obstacles.all().find(|o| candidate.collides_with(o)) {
            return Err(Rejection::Collision {
                with: hit.name.clone(),
            });
        }
        for (frame, view) in self.views {
            let frame = *frame;
            let projected = project_box(view, &candidate.bounds_at(frame))
                .ok_or(Rejection::BehindCamera { frame })?;
            if !projected.within_margin(self.settings.edge_margin) {
                return Err(Rejection::OffFrame { frame });
            }
            for other in obstacles.placed() {
                // Obstacles behind the camera cannot occlude anything.
                let Some(theirs) = project_box(view, &other.bounds_at(frame)) else {
                    continue;
                };
                let threshold = (projected.apparent_size() + theirs.apparent_size()) / 2.0
                    * (1.0 - self.settings.overlap_fraction);
                if projected.center().distance(&theirs.center()) < threshold {
                    return Err(Rejection::Overlap {
                        with: other.name.clone(),
                        frame,
                    });
                }
            }
            let apparent = projected.apparent_size();
            if apparent <= self.settings.min_apparent_size {
                return Err(Rejection::TooSmall { frame, apparent });
            }
        }
        Ok(())
    }
}
