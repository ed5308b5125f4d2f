use stimscape_core::{
    cart2sph, Distribution4, FailurePolicy, Lens, PlacementStrategy, PositionSpec, Size2D,
    StimError, StimscapeConfig, Vec3,
};
use stimscape_ir::{
    BoundingTrajectory, BoundsKeyframe, CameraConstraints, ObjectConstraints, ObjectRequest,
    PlaceableEntity,
};
use stimscape_place::{
    emit, project_box, Background, CameraPathConstraint, FrameRange, RecordingSink,
    ScenePopulator,
};

fn floor_background(size: Distribution4) -> Background {
    Background::new(ObjectConstraints {
        position: PositionSpec::cartesian(
            Distribution4::uniform(-5.0, 5.0).unwrap(),
            Distribution4::uniform(-5.0, 5.0).unwrap(),
            Distribution4::fixed(0.0).unwrap(),
        ),
        size,
        rotation_z: Distribution4::uniform(-180.0, 180.0).unwrap(),
    })
    .unwrap()
}

/// Camera parked at (0, -20, 5) looking at the origin with a 40° lens.
fn framing_camera() -> CameraPathConstraint {
    CameraPathConstraint::new(
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
        .with_lens(Lens::fov(40.0)),
    )
    .unwrap()
}

fn orbiting_camera(pan: bool, zoom: bool) -> CameraPathConstraint {
    CameraPathConstraint::new(
        CameraConstraints::new(
            PositionSpec::spherical(
                Distribution4::uniform(15.0, 20.0).unwrap(),
                Distribution4::uniform(-120.0, -60.0).unwrap(),
                Distribution4::uniform(10.0, 25.0).unwrap(),
                Vec3::ZERO,
            ),
            PositionSpec::cartesian(
                Distribution4::uniform(-0.5, 0.5).unwrap(),
                Distribution4::uniform(-0.5, 0.5).unwrap(),
                Distribution4::fixed(0.0).unwrap(),
            ),
            Distribution4::uniform(2.0, 3.0).unwrap(),
        )
        .with_motion(pan, zoom)
        .with_lens(Lens::fov(40.0)),
    )
    .unwrap()
}

fn config(strategy: PlacementStrategy, policy: FailurePolicy) -> StimscapeConfig {
    let mut config = StimscapeConfig::default();
    config.populate.strategy = strategy;
    config.populate.failure_policy = policy;
    config
}

#[test]
fn test_framed_objects_stay_in_envelope_and_frame() {
    let background = floor_background(Distribution4::fixed(2.0).unwrap());
    let camera = framing_camera();
    for strategy in [PlacementStrategy::ThreeD, PlacementStrategy::ImagePlane] {
        let cfg = config(strategy, FailurePolicy::Raise);
        let mut populator = ScenePopulator::with_seed(&cfg, 21).unwrap();
        for _ in 0..20 {
            let scene = populator
                .populate(
                    &[ObjectRequest::new("box")],
                    &background,
                    &camera,
                    &FrameRange::still(1),
                )
                .unwrap();
            let object = scene.object("box").unwrap();
            assert!(object.position.x.abs() <= 4.0 + 1e-9);
            assert!(object.position.y.abs() <= 4.0 + 1e-9);

            let views = scene.camera.views(Size2D::new(640.0, 480.0)).unwrap();
            let projected = project_box(&views[0].1, &object.bounds()).unwrap();
            assert!(projected.within_margin(0.0));
        }
    }
}

#[test]
fn test_still_camera_holds_position() {
    let cfg = config(PlacementStrategy::ImagePlane, FailurePolicy::Raise);
    let mut populator = ScenePopulator::with_seed(&cfg, 2).unwrap();
    let scene = populator
        .populate(
            &[],
            &floor_background(Distribution4::fixed(1.0).unwrap()),
            &orbiting_camera(false, false),
            &FrameRange::new(1, 31, 3),
        )
        .unwrap();
    let locations: Vec<Vec3> = scene.camera.locations().collect();
    assert_eq!(locations.len(), 3);
    assert!(locations.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_pan_only_camera_keeps_radius() {
    let cfg = config(PlacementStrategy::ImagePlane, FailurePolicy::Raise);
    let mut populator = ScenePopulator::with_seed(&cfg, 3).unwrap();
    let scene = populator
        .populate(
            &[],
            &floor_background(Distribution4::fixed(1.0).unwrap()),
            &orbiting_camera(true, false),
            &FrameRange::new(1, 61, 5),
        )
        .unwrap();
    let radii: Vec<f64> = scene
        .camera
        .locations()
        .map(|l| cart2sph(l, Vec3::ZERO).r)
        .collect();
    assert_eq!(radii.len(), 5);
    for w in radii.windows(2) {
        assert!((w[1] - w[0]).abs() <= 0.05 * w[0] + 1e-9);
    }
}

#[test]
fn test_oversized_objects_exhaust_attempts() {
    let background = Background::new(ObjectConstraints {
        position: PositionSpec::spherical(
            Distribution4::uniform(0.0, 10.0).unwrap(),
            Distribution4::uniform(-180.0, 180.0).unwrap(),
            Distribution4::fixed(0.0).unwrap(),
            Vec3::ZERO,
        ),
        size: Distribution4::uniform(20.0, 30.0).unwrap(),
        rotation_z: Distribution4::fixed(0.0).unwrap(),
    })
    .unwrap();
    let mut cfg = config(PlacementStrategy::ThreeD, FailurePolicy::Raise);
    cfg.populate.max_scene_attempts = 4;
    let mut populator = ScenePopulator::with_seed(&cfg, 4).unwrap();
    let objects = [
        ObjectRequest::new("a"),
        ObjectRequest::new("b"),
        ObjectRequest::new("c"),
    ];
    let err = populator
        .populate(&objects, &background, &framing_camera(), &FrameRange::still(1))
        .unwrap_err();
    match err {
        StimError::Placement { attempts, .. } => assert_eq!(attempts, 4),
        other => panic!("expected a placement error, got {other}"),
    }
}

#[test]
fn test_blocked_floor_exhausts_every_scene_attempt() {
    let slab = PlaceableEntity::cube("slab")
        .with_size(20.0)
        .with_position(Vec3::ZERO);
    let background =
        floor_background(Distribution4::fixed(1.0).unwrap()).with_obstacles(vec![slab]);
    let mut cfg = config(PlacementStrategy::ThreeD, FailurePolicy::Raise);
    cfg.populate.max_attempts = 25;
    cfg.populate.max_scene_attempts = 3;
    let mut populator = ScenePopulator::with_seed(&cfg, 8).unwrap();
    let err = populator
        .populate(
            &[ObjectRequest::new("box")],
            &background,
            &framing_camera(),
            &FrameRange::still(1),
        )
        .unwrap_err();
    match err {
        StimError::Placement { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected a placement error, got {other}"),
    }
    assert_eq!(populator.histogram().total(), 0);
}

#[test]
fn test_same_seed_same_scene() {
    let cfg = config(PlacementStrategy::ImagePlane, FailurePolicy::Raise);
    let objects = [ObjectRequest::new("a"), ObjectRequest::new("b")];
    let background = floor_background(Distribution4::uniform(1.0, 2.0).unwrap());
    let camera = orbiting_camera(true, true);
    let frames = FrameRange::new(1, 31, 3);

    let hash = |seed| {
        ScenePopulator::with_seed(&cfg, seed)
            .unwrap()
            .populate(&objects, &background, &camera, &frames)
            .unwrap()
            .content_hash()
    };
    assert_eq!(hash(99), hash(99));
    assert_ne!(hash(99), hash(100));
}

fn sweeping_animation() -> BoundingTrajectory {
    BoundingTrajectory::new(vec![
        BoundsKeyframe::new(1, Vec3::new(-0.5, -0.5, 0.0), Vec3::new(0.5, 0.5, 1.0)),
        BoundsKeyframe::new(30, Vec3::new(5.0, -0.5, 0.0), Vec3::new(6.0, 0.5, 1.0)),
    ])
    .unwrap()
}

#[test]
fn test_incompatible_animation_is_reported_but_placed() {
    let cfg = config(PlacementStrategy::ThreeD, FailurePolicy::Raise);
    let mut populator = ScenePopulator::with_seed(&cfg, 5).unwrap();
    let objects = [ObjectRequest::new("runner")
        .with_size(2.0)
        .with_animation(sweeping_animation())];
    let scene = populator
        .populate(
            &objects,
            &floor_background(Distribution4::fixed(2.0).unwrap()),
            &framing_camera(),
            &FrameRange::still(1),
        )
        .unwrap();
    assert!(scene.complete);
    assert_eq!(scene.reports.len(), 1);
    assert_eq!(scene.reports[0].object, "runner");
    assert!(!scene.reports[0].compatibility.compatible);
}

#[test]
fn test_strict_compatibility_refuses_object() {
    let mut cfg = config(PlacementStrategy::ThreeD, FailurePolicy::Partial);
    cfg.populate.strict_animation_compatibility = true;
    cfg.populate.max_scene_attempts = 2;
    let mut populator = ScenePopulator::with_seed(&cfg, 6).unwrap();
    let objects = [
        ObjectRequest::new("still").with_size(1.0),
        ObjectRequest::new("runner")
            .with_size(2.0)
            .with_animation(sweeping_animation()),
    ];
    let scene = populator
        .populate(
            &objects,
            &floor_background(Distribution4::fixed(2.0).unwrap()),
            &framing_camera(),
            &FrameRange::still(1),
        )
        .unwrap();
    assert!(!scene.complete);
    assert_eq!(scene.objects.len(), 1);
    assert_eq!(scene.objects[0].name, "still");
}

#[test]
fn test_scene_reaches_sink() {
    let cfg = config(PlacementStrategy::ImagePlane, FailurePolicy::Raise);
    let mut populator = ScenePopulator::with_seed(&cfg, 7).unwrap();
    let scene = populator
        .populate(
            &[ObjectRequest::new("a"), ObjectRequest::new("b")],
            &floor_background(Distribution4::uniform(1.0, 1.5).unwrap()),
            &framing_camera(),
            &FrameRange::still(1),
        )
        .unwrap();
    let mut sink = RecordingSink::default();
    emit(&scene, &mut sink).unwrap();
    assert_eq!(sink.camera.as_ref(), Some(&scene.camera));
    assert_eq!(sink.entities, scene.objects);
}
