//! # stimscape-place
//!
//! The placement engine: samplers for object poses and camera paths, the
//! feasibility checks every candidate must pass, and the populator that
//! ties them together into whole scenes.

pub mod camera_path;
pub mod gate;
pub mod histogram;
pub mod object;
pub mod populator;
pub mod sink;

pub use camera_path::CameraPathConstraint;
pub use gate::{project_box, FeasibilityGate, GateSettings, ObstacleSet, ProjectedBox, Rejection};
pub use histogram::OccupancyHistogram;
pub use object::{ObjectPlacementConstraint, PlacementContext};
pub use populator::{Background, FrameRange, ScenePopulator};
pub use sink::{emit, RecordingSink, SceneSink};
