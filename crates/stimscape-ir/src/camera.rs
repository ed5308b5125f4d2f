use serde::{Deserialize, Serialize};
use stimscape_core::{CameraView, Lens, Size2D, StimError, StimResult, Vec3};

/// One camera keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraKeyframe {
    pub frame: u32,
    pub location: Vec3,
    pub fixation: Vec3,
}

/// A sampled camera trajectory: location and fixation per keyframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub lens: Lens,
    keyframes: Vec<CameraKeyframe>,
}

impl CameraState {
    pub fn new(lens: Lens) -> Self {
        Self {
            lens,
            keyframes: Vec::new(),
        }
    }

    /// A camera that holds one pose.
    pub fn fixed(location: Vec3, fixation: Vec3, lens: Lens) -> Self {
        let mut cam = Self::new(lens);
        cam.keyframes.push(CameraKeyframe {
            frame: 1,
            location,
            fixation,
        });
        cam
    }

    /// Append a keyframe; frames must strictly increase.
    pub fn push(&mut self, frame: u32, location: Vec3, fixation: Vec3) -> StimResult<()> {
        if let Some(last) = self.keyframes.last() {
            if frame <= last.frame {
                return Err(StimError::config(format!(
                    "camera keyframe {frame} does not follow {}",
                    last.frame
                )));
            }
        }
        self.keyframes.push(CameraKeyframe {
            frame,
            location,
            fixation,
        });
        Ok(())
    }

    pub fn keyframes(&self) -> &[CameraKeyframe] {
        &self.keyframes
    }

    pub fn frames(&self) -> impl Iterator<Item = u32> + '_ {
        self.keyframes.iter().map(|k| k.frame)
    }

    pub fn locations(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.keyframes.iter().map(|k| k.location)
    }

    pub fn fixations(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.keyframes.iter().map(|k| k.fixation)
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Resolved projection for each keyframe, paired with its frame.
    pub fn views(&self, image: Size2D) -> StimResult<Vec<(u32, CameraView)>> {
        self.keyframes
            .iter()
            .map(|k| Ok((k.frame, CameraView::new(k.location, k.fixation, self.lens, image)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_requires_increasing_frames() {
        let mut cam = CameraState::new(Lens::fov(40.0));
        cam.push(1, Vec3::new(0.0, -10.0, 2.0), Vec3::ZERO).unwrap();
        cam.push(30, Vec3::new(1.0, -10.0, 2.0), Vec3::ZERO).unwrap();
        assert!(cam.push(30, Vec3::ZERO, Vec3::ZERO).is_err());
        assert_eq!(cam.frames().collect::<Vec<_>>(), vec![1, 30]);
        assert_eq!(cam.len(), 2);
    }

    #[test]
    fn test_views_surface_degenerate_basis() {
        let cam = CameraState::fixed(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Lens::fov(40.0));
        assert!(cam.views(Size2D::new(64.0, 48.0)).is_err());

        let cam = CameraState::fixed(Vec3::new(0.0, -10.0, 1.0), Vec3::ZERO, Lens::fov(40.0));
        assert_eq!(cam.views(Size2D::new(64.0, 48.0)).unwrap().len(), 1);
    }
}
