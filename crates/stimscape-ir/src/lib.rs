//! # stimscape-ir
//!
//! The Stimscape scene model: the entities that get placed, the camera
//! trajectory that films them, the constraint records they are drawn from,
//! and the populated scene handed to a renderer.

pub mod animation;
pub mod camera;
pub mod constraint;
pub mod entity;
pub mod library;
pub mod scene;
pub mod validate;

pub use animation::{check_compatibility, BoundingTrajectory, BoundsKeyframe, Compatibility};
pub use camera::{CameraKeyframe, CameraState};
pub use constraint::{CameraConstraints, ObjectConstraints};
pub use entity::{BoundingBox, ObjectRequest, PlaceableEntity};
pub use library::{
    BackgroundRecord, CameraRecord, InMemoryLibrary, Library, ObjectRecord, Query, RecordId,
};
pub use scene::{CompatibilityReport, PopulatedScene};
pub use validate::validate_request;
