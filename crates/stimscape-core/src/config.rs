use serde::{Deserialize, Serialize};

use crate::error::{StimError, StimResult};
use crate::math::Size2D;

/// How object positions are proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Draw directly from the 3D position constraint.
    ThreeD,
    /// Draw an image location from the occupancy histogram and cast it onto
    /// the support plane.
    #[default]
    ImagePlane,
}

/// What to do once every attempt is used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return a `Placement` error.
    Raise,
    /// Log a warning and return the best partial result.
    #[default]
    Partial,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PopulateConfig {
    /// Minimum distance of projected boxes from the frame edge, percent of
    /// frame. Negative values allow partial off-frame placement.
    pub edge_margin: f64,
    /// Tolerated 2D overlap, 0 (none) to 1 (any).
    pub overlap_fraction: f64,
    /// Floor on mean projected width/height, percent of frame.
    pub min_apparent_size: f64,
    /// Attempts per object position (and per camera trajectory).
    pub max_attempts: usize,
    /// Whole-scene restarts.
    pub max_scene_attempts: usize,
    /// Candidate steps drawn per camera keyframe.
    pub candidates_per_step: usize,
    pub strategy: PlacementStrategy,
    pub failure_policy: FailurePolicy,
    /// Refuse objects whose animation cannot fit the background envelope.
    pub strict_animation_compatibility: bool,
    /// Draw headings within 90 degrees of the camera-facing direction
    /// instead of from the background's rotation distribution.
    pub face_camera: bool,
    /// Camera-space depth used when casting image-plane samples.
    pub reference_depth: f64,
    /// Occupancy histogram resolution (bins per image axis).
    pub histogram_bins: usize,
}

impl Default for PopulateConfig {
    fn default() -> Self {
        Self {
            edge_margin: 0.0,
            overlap_fraction: 0.5,
            min_apparent_size: 0.0,
            max_attempts: 100,
            max_scene_attempts: 10,
            candidates_per_step: 1000,
            strategy: PlacementStrategy::ImagePlane,
            failure_policy: FailurePolicy::Partial,
            strict_animation_compatibility: false,
            face_camera: true,
            reference_depth: 1.0,
            histogram_bins: 10,
        }
    }
}

impl PopulateConfig {
    pub fn validate(&self) -> StimResult<()> {
        if !(0.0..=1.0).contains(&self.overlap_fraction) {
            return Err(StimError::config(format!(
                "overlap_fraction must be in [0, 1], got {}",
                self.overlap_fraction
            )));
        }
        if self.edge_margin >= 50.0 {
            return Err(StimError::config(format!(
                "edge_margin of {}% leaves no room in the frame",
                self.edge_margin
            )));
        }
        if self.max_attempts == 0 || self.max_scene_attempts == 0 {
            return Err(StimError::config("attempt limits must be at least 1"));
        }
        if self.candidates_per_step == 0 {
            return Err(StimError::config("candidates_per_step must be at least 1"));
        }
        if self.reference_depth <= 0.0 {
            return Err(StimError::config("reference_depth must be positive"));
        }
        if self.histogram_bins == 0 {
            return Err(StimError::config("histogram_bins must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 15.0,
        }
    }
}

impl RenderConfig {
    pub fn image_size(&self) -> Size2D {
        Size2D::new(self.width as f64, self.height as f64)
    }

    pub fn validate(&self) -> StimResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StimError::config("image resolution must be non-zero"));
        }
        if self.fps <= 0.0 {
            return Err(StimError::config("fps must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RngConfig {
    /// Fixed seed for reproducible output; entropy-seeded when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StimscapeConfig {
    #[serde(default)]
    pub populate: PopulateConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub rng: RngConfig,
}

impl StimscapeConfig {
    pub fn load_from_file(path: &std::path::Path) -> StimResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| StimError::load(e.to_string(), path))?;
        let config: StimscapeConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> StimResult<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> StimResult<()> {
        self.populate.validate()?;
        self.render.validate()
    }
}
