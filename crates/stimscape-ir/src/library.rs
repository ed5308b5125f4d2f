//! Library records and the lookup interface for them.
//!
//! The real asset database is an external collaborator; [`InMemoryLibrary`]
//! is the registry used by scene files and tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stimscape_core::{StimError, StimResult, Vec3};

use crate::animation::BoundingTrajectory;
use crate::constraint::{CameraConstraints, ObjectConstraints};
use crate::entity::{ObjectRequest, PlaceableEntity};

/// Unique identifier for a library record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An object that can be placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: RecordId,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default = "unit_proportions")]
    pub proportions: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<BoundingTrajectory>,
}

fn unit_proportions() -> Vec3 {
    Vec3::new(1.0, 1.0, 1.0)
}

impl ObjectRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(id),
            categories: Vec::new(),
            proportions: unit_proportions(),
            animation: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    /// A request to place this object with nothing fixed.
    pub fn to_request(&self) -> ObjectRequest {
        ObjectRequest {
            name: self.id.0.clone(),
            proportions: self.proportions,
            fixed_position: None,
            fixed_size: None,
            fixed_rotation: None,
            animation: self.animation.clone(),
        }
    }
}

/// A background: where objects may go, what is already there, and how the
/// camera may move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundRecord {
    pub id: RecordId,
    #[serde(default)]
    pub categories: Vec<String>,
    pub objects: ObjectConstraints,
    /// Static geometry that placed objects must not intersect.
    #[serde(default)]
    pub obstacles: Vec<PlaceableEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraConstraints>,
}

/// A stand-alone camera constraint record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub id: RecordId,
    #[serde(default)]
    pub categories: Vec<String>,
    pub constraints: CameraConstraints,
}

/// Semantic query over library records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub id: Option<String>,
    pub category: Option<String>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            category: None,
        }
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self {
            id: None,
            category: Some(category.into()),
        }
    }

    fn matches(&self, id: &RecordId, categories: &[String]) -> bool {
        self.id.as_ref().map_or(true, |q| *q == id.0)
            && self
                .category
                .as_ref()
                .map_or(true, |q| categories.iter().any(|c| c == q))
    }
}

/// Source of object, background and camera records.
pub trait Library {
    fn objects(&self, query: &Query) -> Vec<&ObjectRecord>;
    fn backgrounds(&self, query: &Query) -> Vec<&BackgroundRecord>;
    fn cameras(&self, query: &Query) -> Vec<&CameraRecord>;

    fn object(&self, id: &str) -> StimResult<&ObjectRecord> {
        self.objects(&Query::id(id))
            .into_iter()
            .next()
            .ok_or_else(|| StimError::NotFound(format!("object '{id}'")))
    }

    fn background(&self, id: &str) -> StimResult<&BackgroundRecord> {
        self.backgrounds(&Query::id(id))
            .into_iter()
            .next()
            .ok_or_else(|| StimError::NotFound(format!("background '{id}'")))
    }

    fn camera(&self, id: &str) -> StimResult<&CameraRecord> {
        self.cameras(&Query::id(id))
            .into_iter()
            .next()
            .ok_or_else(|| StimError::NotFound(format!("camera '{id}'")))
    }
}

/// Registry of records held in memory, ordered by id for reproducible
/// iteration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryLibrary {
    #[serde(default)]
    objects: BTreeMap<RecordId, ObjectRecord>,
    #[serde(default)]
    backgrounds: BTreeMap<RecordId, BackgroundRecord>,
    #[serde(default)]
    cameras: BTreeMap<RecordId, CameraRecord>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, record: ObjectRecord) -> RecordId {
        let id = record.id.clone();
        self.objects.insert(id.clone(), record);
        id
    }

    pub fn add_background(&mut self, record: BackgroundRecord) -> RecordId {
        let id = record.id.clone();
        self.backgrounds.insert(id.clone(), record);
        id
    }

    pub fn add_camera(&mut self, record: CameraRecord) -> RecordId {
        let id = record.id.clone();
        self.cameras.insert(id.clone(), record);
        id
    }

    /// Number of registered records of all kinds.
    pub fn count(&self) -> usize {
        self.objects.len() + self.backgrounds.len() + self.cameras.len()
    }
}

impl Library for InMemoryLibrary {
    fn objects(&self, query: &Query) -> Vec<&ObjectRecord> {
        self.objects
            .values()
            .filter(|r| query.matches(&r.id, &r.categories))
            .collect()
    }

    fn backgrounds(&self, query: &Query) -> Vec<&BackgroundRecord> {
        self.backgrounds
            .values()
            .filter(|r| query.matches(&r.id, &r.categories))
            .collect()
    }

    fn cameras(&self, query: &Query) -> Vec<&CameraRecord> {
        self.cameras
            .values()
            .filter(|r| query.matches(&r.id, &r.categories))
            .collect()
    }
}
