//! Scene files: a TOML document carrying the run configuration, the
//! background, the camera, and the objects to place.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stimscape_core::{
    Distribution4, Lens, PopulateConfig, PositionSpec, RenderConfig, RngConfig, StimscapeConfig,
    Vec3,
};
use stimscape_ir::{
    BackgroundRecord, CameraConstraints, InMemoryLibrary, Library, ObjectConstraints,
    ObjectRecord, ObjectRequest, Query, RecordId,
};
use stimscape_place::{Background, CameraPathConstraint, FrameRange};

/// Draw `count` objects from the scene's library records in `category`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    pub category: String,
    #[serde(default = "one")]
    pub count: usize,
}

fn one() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub populate: PopulateConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub rng: RngConfig,
    #[serde(default)]
    pub frames: FrameRange,
    pub background: BackgroundRecord,
    /// Overrides the background's own camera record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraConstraints>,
    #[serde(default)]
    pub objects: Vec<ObjectRequest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub library: Vec<ObjectRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub draw: Vec<Draw>,
}

impl SceneFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse scene file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("failed to serialize scene")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write scene file: {}", path.display()))
    }

    pub fn config(&self) -> StimscapeConfig {
        StimscapeConfig {
            populate: self.populate.clone(),
            render: self.render.clone(),
            rng: self.rng.clone(),
        }
    }

    pub fn background(&self) -> Result<Background> {
        Background::from_record(&self.background)
            .with_context(|| format!("invalid background '{}'", self.background.id))
    }

    pub fn camera_constraints(&self) -> Result<&CameraConstraints> {
        self.camera
            .as_ref()
            .or(self.background.camera.as_ref())
            .with_context(|| {
                format!(
                    "no [camera] section and background '{}' has no camera",
                    self.background.id
                )
            })
    }

    pub fn camera(&self) -> Result<CameraPathConstraint> {
        let constraints = self.camera_constraints()?.clone();
        CameraPathConstraint::new(constraints).context("invalid camera constraints")
    }

    /// Explicit objects followed by library draws. Drawn objects are named
    /// `<record>-<n>` and cycle through the matching records in id order.
    pub fn requests(&self) -> Result<Vec<ObjectRequest>> {
        let mut library = InMemoryLibrary::new();
        for record in &self.library {
            library.add_object(record.clone());
        }
        let mut requests = self.objects.clone();
        for draw in &self.draw {
            let matches = library.objects(&Query::category(&draw.category));
            if matches.is_empty() {
                anyhow::bail!("no library objects in category '{}'", draw.category);
            }
            for i in 0..draw.count {
                let record = matches[i % matches.len()];
                let mut request = record.to_request();
                request.name = format!("{}-{}", record.id, requests.len() + 1);
                requests.push(request);
            }
        }
        Ok(requests)
    }

    /// A small working scene used by `stimscape init`.
    pub fn example() -> Result<Self> {
        let background = BackgroundRecord {
            id: RecordId::new("floor"),
            categories: vec!["indoor".into()],
            objects: ObjectConstraints {
                position: PositionSpec::cartesian(
                    Distribution4::uniform(-5.0, 5.0)?,
                    Distribution4::uniform(-5.0, 5.0)?,
                    Distribution4::fixed(0.0)?,
                ),
                size: Distribution4::clipped_normal(1.5, 0.5, 0.5, 2.5)?,
                rotation_z: Distribution4::uniform(-180.0, 180.0)?,
            },
            obstacles: Vec::new(),
            camera: Some(
                CameraConstraints::new(
                    PositionSpec::spherical(
                        Distribution4::uniform(15.0, 25.0)?,
                        Distribution4::uniform(-120.0, -60.0)?,
                        Distribution4::uniform(10.0, 30.0)?,
                        Vec3::ZERO,
                    ),
                    PositionSpec::cartesian(
                        Distribution4::uniform(-1.0, 1.0)?,
                        Distribution4::uniform(-1.0, 1.0)?,
                        Distribution4::fixed(0.0)?,
                    ),
                    Distribution4::uniform(1.0, 3.0)?,
                )
                .with_motion(true, false)
                .with_lens(Lens::fov(40.0)),
            ),
        };
        Ok(Self {
            populate: PopulateConfig::default(),
            render: RenderConfig::default(),
            rng: RngConfig { seed: Some(1) },
            frames: FrameRange::new(1, 60, 4),
            background,
            camera: None,
            objects: vec![ObjectRequest::new("target").with_size(1.0)],
            library: vec![ObjectRecord::new("crate").with_category("prop")],
            draw: vec![Draw {
                category: "prop".into(),
                count: 2,
            }],
        })
    }
}
