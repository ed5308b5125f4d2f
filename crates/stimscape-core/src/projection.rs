//! Pinhole camera model: look-at basis, projection to pixels and the inverse
//! ray-cast.
//!
//! Image coordinates have their origin at the top-left corner with `v`
//! growing downward. Camera-space depth is measured along the look axis.

use serde::{Deserialize, Serialize};

use crate::error::{StimError, StimResult};
use crate::math::{Point2D, Size2D, Vec3};

/// Threshold below which the look axis counts as parallel to world-up.
const PARALLEL_EPSILON: f64 = 1e-9;

/// Camera lens, expressed either directly as a horizontal field of view or
/// as a physical focal length over a sensor width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Lens {
    /// Horizontal field of view in degrees.
    Fov { degrees: f64 },
    /// Focal length and sensor width, both in millimetres.
    Focal { focal_mm: f64, sensor_mm: f64 },
}

impl Lens {
    pub fn fov(degrees: f64) -> Self {
        Lens::Fov { degrees }
    }

    /// Horizontal field of view in degrees.
    pub fn fov_degrees(&self) -> f64 {
        match *self {
            Lens::Fov { degrees } => degrees,
            Lens::Focal {
                focal_mm,
                sensor_mm,
            } => 2.0 * (sensor_mm / (2.0 * focal_mm)).atan().to_degrees(),
        }
    }

    /// Focal term in pixels for an image of the given size.
    pub fn focal_px(&self, image: Size2D) -> f64 {
        (image.width / 2.0) / (self.fov_degrees().to_radians() / 2.0).tan()
    }

    pub fn validate(&self) -> StimResult<()> {
        if let Lens::Focal {
            focal_mm,
            sensor_mm,
        } = *self
        {
            if !(focal_mm > 0.0 && sensor_mm > 0.0) {
                return Err(StimError::config(format!(
                    "lens focal length ({focal_mm}) and sensor width ({sensor_mm}) must be positive"
                )));
            }
        }
        let fov = self.fov_degrees();
        if !(fov > 0.0 && fov < 180.0) {
            return Err(StimError::config(format!(
                "field of view must be in (0, 180) degrees, got {fov}"
            )));
        }
        Ok(())
    }
}

impl Default for Lens {
    fn default() -> Self {
        Lens::Fov { degrees: 50.0 }
    }
}

/// Orthonormal camera basis in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

impl CameraBasis {
    /// World-space vector expressed in camera coordinates (right, up, depth).
    pub fn to_camera(&self, v: &Vec3) -> Vec3 {
        Vec3::new(v.dot(&self.right), v.dot(&self.up), v.dot(&self.forward))
    }

    /// Camera-space vector expressed in world coordinates.
    pub fn to_world(&self, c: &Vec3) -> Vec3 {
        self.right * c.x + self.up * c.y + self.forward * c.z
    }

    /// Azimuth (degrees) of the direction pointing from the scene back at
    /// the camera.
    pub fn facing_azimuth(&self) -> f64 {
        let back = -self.forward;
        back.y.atan2(back.x).to_degrees()
    }
}

/// Look-at basis for a camera at `camera_loc` aimed at `fixation`, built from
/// world-up `+Z`.
pub fn camera_matrix(camera_loc: Vec3, fixation: Vec3) -> StimResult<CameraBasis> {
    let forward = (fixation - camera_loc).normalized().ok_or_else(|| {
        StimError::geometry("camera location and fixation point coincide")
    })?;
    let right = forward.cross(&Vec3::UP);
    if right.length() < PARALLEL_EPSILON {
        return Err(StimError::geometry(
            "camera look axis is parallel to world-up",
        ));
    }
    let right = right * (1.0 / right.length());
    let up = right.cross(&forward);
    Ok(CameraBasis { right, up, forward })
}

/// A camera pose with its basis resolved once, for repeated projection.
#[derive(Debug, Clone, Copy)]
pub struct CameraView {
    pub location: Vec3,
    pub basis: CameraBasis,
    pub image: Size2D,
    focal: f64,
}

impl CameraView {
    pub fn new(location: Vec3, fixation: Vec3, lens: Lens, image: Size2D) -> StimResult<Self> {
        lens.validate()?;
        if !(image.width > 0.0 && image.height > 0.0) {
            return Err(StimError::config("image size must be positive"));
        }
        Ok(Self {
            location,
            basis: camera_matrix(location, fixation)?,
            image,
            focal: lens.focal_px(image),
        })
    }

    /// Camera-space depth of a world point.
    pub fn depth(&self, point: &Vec3) -> f64 {
        (*point - self.location).dot(&self.basis.forward)
    }

    pub fn project(&self, point: &Vec3) -> StimResult<Point2D> {
        let c = self.basis.to_camera(&(*point - self.location));
        if c.z <= 0.0 {
            return Err(StimError::geometry(format!(
                "point is at non-positive depth {:.4}",
                c.z
            )));
        }
        Ok(Point2D::new(
            self.image.width / 2.0 + self.focal * c.x / c.z,
            self.image.height / 2.0 - self.focal * c.y / c.z,
        ))
    }

    pub fn unproject(&self, pixel: &Point2D, depth: f64) -> StimResult<Vec3> {
        if depth <= 0.0 {
            return Err(StimError::geometry(format!(
                "unproject depth must be positive, got {depth}"
            )));
        }
        let c = Vec3::new(
            (pixel.x - self.image.width / 2.0) * depth / self.focal,
            (self.image.height / 2.0 - pixel.y) * depth / self.focal,
            depth,
        );
        Ok(self.location + self.basis.to_world(&c))
    }

    /// Pixel coordinates to percent of frame.
    pub fn to_percent(&self, pixel: &Point2D) -> Point2D {
        to_percent(pixel, self.image)
    }

    /// Percent of frame to pixel coordinates.
    pub fn from_percent(&self, percent: &Point2D) -> Point2D {
        from_percent(percent, self.image)
    }
}

/// Project a world point into the image of a camera at `camera_loc` looking
/// at `fixation`.
pub fn project(
    point: Vec3,
    camera_loc: Vec3,
    fixation: Vec3,
    lens: Lens,
    image: Size2D,
) -> StimResult<Point2D> {
    CameraView::new(camera_loc, fixation, lens, image)?.project(&point)
}

/// Cast the ray through pixel `(u, v)` and return the point at camera-space
/// `depth`.
pub fn unproject(
    pixel: Point2D,
    camera_loc: Vec3,
    fixation: Vec3,
    lens: Lens,
    image: Size2D,
    depth: f64,
) -> StimResult<Vec3> {
    CameraView::new(camera_loc, fixation, lens, image)?.unproject(&pixel, depth)
}

pub fn to_percent(pixel: &Point2D, image: Size2D) -> Point2D {
    Point2D::new(
        pixel.x / image.width * 100.0,
        pixel.y / image.height * 100.0,
    )
}

pub fn from_percent(percent: &Point2D, image: Size2D) -> Point2D {
    Point2D::new(
        percent.x / 100.0 * image.width,
        percent.y / 100.0 * image.height,
    )
}

/// Intersection of the ray from `origin` through `through` with the
/// horizontal plane `Z = z`. `None` if the ray is parallel to the plane or
/// the plane lies behind the origin.
pub fn ray_plane_z(origin: Vec3, through: Vec3, z: f64) -> Option<Vec3> {
    let dir = through - origin;
    if dir.z.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = (z - origin.z) / dir.z;
    if t <= 0.0 {
        return None;
    }
    let mut hit = origin + dir * t;
    // Land exactly on the plane so fixed-height bounds accept the point.
    hit.z = z;
    Some(hit)
}
