//! Constraint records as they arrive from a library or scene file.
//!
//! These carry parameters only; the samplers that act on them live in
//! `stimscape-place`.

use serde::{Deserialize, Serialize};
use stimscape_core::{Distribution4, Lens, PositionSpec, StimError, StimResult};

/// Where and how objects may be placed in a background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectConstraints {
    /// Envelope for the object's position.
    pub position: PositionSpec,
    /// Object size (largest dimension).
    pub size: Distribution4,
    /// Heading about Z, degrees.
    pub rotation_z: Distribution4,
}

impl ObjectConstraints {
    pub fn validate(&self) -> StimResult<()> {
        let upper = self.size.max().or(self.size.mean()).unwrap_or(0.0);
        if upper <= 0.0 {
            return Err(StimError::config(
                "size distribution must allow positive sizes",
            ));
        }
        Ok(())
    }
}

fn default_zoom_tolerance() -> f64 {
    2.0
}

/// Parameters of a camera trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConstraints {
    /// Camera location envelope, normally spherical around the scene centre.
    pub location: PositionSpec,
    /// Fixation point envelope, normally Cartesian.
    pub fixation: PositionSpec,
    /// Camera speed in world units per second.
    pub speed: Distribution4,
    /// Maximum heading change between consecutive steps, degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_path_angle: Option<f64>,
    /// Allow motion around the origin at constant radius.
    #[serde(default)]
    pub pan: bool,
    /// Allow motion toward/away from the origin at constant azimuth.
    #[serde(default)]
    pub zoom: bool,
    #[serde(default)]
    pub lens: Lens,
    /// Azimuth tolerance for zoom-only motion, degrees.
    #[serde(default = "default_zoom_tolerance")]
    pub zoom_tolerance: f64,
}

impl CameraConstraints {
    pub fn new(location: PositionSpec, fixation: PositionSpec, speed: Distribution4) -> Self {
        Self {
            location,
            fixation,
            speed,
            max_path_angle: None,
            pan: false,
            zoom: false,
            lens: Lens::default(),
            zoom_tolerance: default_zoom_tolerance(),
        }
    }

    pub fn with_motion(mut self, pan: bool, zoom: bool) -> Self {
        self.pan = pan;
        self.zoom = zoom;
        self
    }

    pub fn with_lens(mut self, lens: Lens) -> Self {
        self.lens = lens;
        self
    }

    pub fn with_max_path_angle(mut self, degrees: f64) -> Self {
        self.max_path_angle = Some(degrees);
        self
    }

    pub fn validate(&self) -> StimResult<()> {
        self.lens.validate()?;
        if let Some(a) = self.max_path_angle {
            if !(0.0..=180.0).contains(&a) {
                return Err(StimError::config(format!(
                    "max_path_angle must be in [0, 180], got {a}"
                )));
            }
        }
        if self.zoom_tolerance < 0.0 {
            return Err(StimError::config("zoom_tolerance must be non-negative"));
        }
        if self.speed.max().is_some_and(|m| m < 0.0) {
            return Err(StimError::config("camera speed cannot be negative"));
        }
        Ok(())
    }
}
