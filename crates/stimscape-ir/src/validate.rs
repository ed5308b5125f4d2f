use std::collections::HashSet;

use stimscape_core::StimError;

use crate::constraint::{CameraConstraints, ObjectConstraints};
use crate::entity::ObjectRequest;

/// Validate a population request for structural correctness before any
/// sampling happens. Collects every problem instead of stopping at the first.
pub fn validate_request(
    objects: &[ObjectRequest],
    background: &ObjectConstraints,
    camera: &CameraConstraints,
    keyframes: &[u32],
) -> Result<(), Vec<StimError>> {
    let mut errors = Vec::new();

    if let Err(e) = background.validate() {
        errors.push(e);
    }
    if let Err(e) = camera.validate() {
        errors.push(e);
    }

    if keyframes.is_empty() {
        errors.push(StimError::Validation(
            "at least one camera keyframe is required".into(),
        ));
    }
    if keyframes.windows(2).any(|w| w[0] >= w[1]) {
        errors.push(StimError::Validation(
            "camera keyframes must strictly increase".into(),
        ));
    }

    let mut names = HashSet::new();
    for object in objects {
        if !names.insert(object.name.as_str()) {
            errors.push(StimError::Validation(format!(
                "duplicate object name '{}'",
                object.name
            )));
        }
        if let Some(size) = object.fixed_size {
            if size <= 0.0 {
                errors.push(StimError::Validation(format!(
                    "object '{}' has non-positive size {size}",
                    object.name
                )));
            }
        }
        let p = object.proportions;
        if !(p.x > 0.0 && p.y > 0.0 && p.z > 0.0) {
            errors.push(StimError::Validation(format!(
                "object '{}' has non-positive proportions",
                object.name
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stimscape_core::{Distribution4, PositionSpec, Vec3};

    fn background() -> ObjectConstraints {
        ObjectConstraints {
            position: PositionSpec::cartesian(
                Distribution4::uniform(-5.0, 5.0).unwrap(),
                Distribution4::uniform(-5.0, 5.0).unwrap(),
                Distribution4::fixed(0.0).unwrap(),
            ),
            size: Distribution4::uniform(1.0, 2.0).unwrap(),
            rotation_z: Distribution4::uniform(-180.0, 180.0).unwrap(),
        }
    }

    fn camera() -> CameraConstraints {
        CameraConstraints::new(
            PositionSpec::cartesian(
                Distribution4::fixed(0.0).unwrap(),
                Distribution4::fixed(-20.0).unwrap(),
                Distribution4::fixed(5.0).unwrap(),
            ),
            PositionSpec::cartesian(
                Distribution4::fixed(0.0).unwrap(),
                Distribution4::fixed(0.0).unwrap(),
                Distribution4::fixed(0.0).unwrap(),
            ),
            Distribution4::fixed(0.0).unwrap(),
        )
    }

    #[test]
    fn test_validate_valid_request() {
        let objects = vec![ObjectRequest::new("a"), ObjectRequest::new("b")];
        assert!(validate_request(&objects, &background(), &camera(), &[1, 30]).is_ok());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let objects = vec![
            ObjectRequest::new("a").with_size(-1.0),
            ObjectRequest::new("a").with_proportions(Vec3::new(1.0, 0.0, 1.0)),
        ];
        let errors = validate_request(&objects, &background(), &camera(), &[30, 1]).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_validate_requires_keyframes() {
        assert!(validate_request(&[], &background(), &camera(), &[]).is_err());
    }
}
