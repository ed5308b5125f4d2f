//! # stimscape-core
//!
//! Core types and primitives for the Stimscape scene generator.
//! This crate contains the foundations shared by every Stimscape crate:
//! vector math, spherical coordinates, the pinhole camera model, constraint
//! distributions, configuration and error types.

pub mod config;
pub mod distribution;
pub mod error;
pub mod hash;
pub mod math;
pub mod position;
pub mod projection;

pub use config::*;

pub use distribution::Distribution4;
pub use error::{StimError, StimResult};
pub use hash::{ContentHash, ContentHasher};
pub use math::{cart2sph, circular_distance, sph2cart, Point2D, Size2D, Spherical, Vec3};
pub use position::{CartesianSpec, Coordinates, PositionSpec, SphericalSpec};
pub use projection::{camera_matrix, project, unproject, CameraBasis, CameraView, Lens};
