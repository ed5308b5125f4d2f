//! Handing a populated scene to whatever builds it: a renderer, an
//! exporter, or a test recorder.

use stimscape_core::StimResult;
use stimscape_ir::{CameraState, PlaceableEntity, PopulatedScene};

/// Receives the camera and each placed object of a scene.
pub trait SceneSink {
    /// Called once, before any object.
    fn place_camera(&mut self, camera: &CameraState) -> StimResult<()>;

    /// Called for each object, in placement order.
    fn place(&mut self, entity: &PlaceableEntity) -> StimResult<()>;

    /// Called after the last object.
    fn finish(&mut self) -> StimResult<()> {
        Ok(())
    }
}

/// Send `scene` to `sink`, stopping at the first error.
pub fn emit<S: SceneSink + ?Sized>(scene: &PopulatedScene, sink: &mut S) -> StimResult<()> {
    sink.place_camera(&scene.camera)?;
    for object in &scene.objects {
        sink.place(object)?;
    }
    sink.finish()
}

/// Keeps everything it is given.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub camera: Option<CameraState>,
    pub entities: Vec<PlaceableEntity>,
    pub finished: bool,
}

impl SceneSink for RecordingSink {
    fn place_camera(&mut self, camera: &CameraState) -> StimResult<()> {
        self.camera = Some(camera.clone());
        Ok(())
    }

    fn place(&mut self, entity: &PlaceableEntity) -> StimResult<()> {
        self.entities.push(entity.clone());
        Ok(())
    }

    fn finish(&mut self) -> StimResult<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stimscape_core::{Lens, StimError, Vec3};

    fn scene() -> PopulatedScene {
        PopulatedScene {
            camera: CameraState::fixed(Vec3::new(0.0, -10.0, 3.0), Vec3::ZERO, Lens::fov(40.0)),
            objects: vec![PlaceableEntity::cube("a"), PlaceableEntity::cube("b")],
            attempts: 1,
            complete: true,
            reports: Vec::new(),
        }
    }

    #[test]
    fn test_emit_forwards_everything() {
        let mut sink = RecordingSink::default();
        emit(&scene(), &mut sink).unwrap();
        assert!(sink.camera.is_some());
        assert_eq!(sink.entities.len(), 2);
        assert_eq!(sink.entities[1].name, "b");
        assert!(sink.finished);
    }

    struct FailingSink {
        placed: usize,
    }

    impl SceneSink for FailingSink {
        fn place_camera(&mut self, _camera: &CameraState) -> StimResult<()> {
            Ok(())
        }

        fn place(&mut self, _entity: &PlaceableEntity) -> StimResult<()> {
            self.placed += 1;
            Err(StimError::NotFound("asset".into()))
        }
    }

    #[test]
    fn test_emit_stops_on_error() {
        let mut sink = FailingSink { placed: 0 };
        assert!(emit(&scene(), &mut sink).is_err());
        assert_eq!(sink.placed, 1);
    }
}
