//! Runs follow cameras inside a headless app, with real schedules and a manually stepped clock.

use std::time::Duration;

use bevy::{prelude::*, time::TimeUpdateStrategy, window::RequestRedraw};
use bevy_follow_cam::prelude::*;

const FRAME: Duration = Duration::from_millis(16);

fn app() -> App {
    let mut app = App::new();
    app.add_plugins((bevy::time::TimePlugin, FollowCamPlugin))
        .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
    app
}

fn run(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

fn camera_translation(app: &App, camera: Entity) -> Vec3 {
    app.world().get::<Transform>(camera).unwrap().translation
}

fn follow_cam(app: &App, camera: Entity) -> &FollowCam {
    app.world().get::<FollowCam>(camera).unwrap()
}

#[test]
fn attaches_to_discovered_target() {
    let mut app = app();
    let target = app
        .world_mut()
        .spawn((Transform::from_xyz(2.0, 0.0, -1.0), FollowTarget))
        .id();
    let camera = app.world_mut().spawn(FollowCam::default()).id();
    run(&mut app, 1);
    assert!(!app.world().resource::<Events<RequestRedraw>>().is_empty());
    run(&mut app, 2);

    let follow_cam = follow_cam(&app, camera);
    assert!(follow_cam.is_attached());
    assert_eq!(follow_cam.target, Some(target));
    let expected = Vec3::new(2.0, 0.0, 2.0);
    assert!(
        camera_translation(&app, camera).distance(expected) < 1e-3,
        "{}",
        camera_translation(&app, camera)
    );
}

#[test]
fn camera_keeps_its_own_scale() {
    let mut app = app();
    app.world_mut().spawn((Transform::IDENTITY, FollowTarget));
    let camera = app
        .world_mut()
        .spawn((FollowCam::default(), Transform::from_scale(Vec3::splat(2.0))))
        .id();
    run(&mut app, 3);

    let transform = *app.world().get::<Transform>(camera).unwrap();
    assert_eq!(transform.scale, Vec3::splat(2.0));
    assert!(transform.translation.distance(Vec3::Z * 3.0) < 1e-3);
}

#[test]
fn idles_without_a_target_then_attaches() {
    let mut app = app();
    let start = Transform::from_xyz(0.0, 5.0, 5.0);
    let camera = app.world_mut().spawn((FollowCam::default(), start)).id();
    run(&mut app, 5);

    assert!(!follow_cam(&app, camera).is_attached());
    assert_eq!(camera_translation(&app, camera), start.translation);

    app.world_mut().spawn((Transform::IDENTITY, FollowTarget));
    run(&mut app, 2);
    assert!(follow_cam(&app, camera).is_attached());
    assert!(camera_translation(&app, camera).distance(Vec3::Z * 3.0) < 1e-3);
}

#[test]
fn wall_behind_target_pulls_camera_in() {
    let mut app = app();
    app.insert_resource(CollisionBackend::new(
        StaticColliders::new().with(Collider::wall(Vec3::Z, Dir3::NEG_Z)),
    ));
    app.world_mut().spawn((Transform::IDENTITY, FollowTarget));
    let camera = app
        .world_mut()
        .spawn(FollowCam::default().with_occlusion_mode(OcclusionMode::Precise))
        .id();
    run(&mut app, 2);

    let diagnostics = *app.world().get::<FollowCamDiagnostics>(camera).unwrap();
    assert!(diagnostics.is_occluded);
    assert!(diagnostics.raycast_loops >= 1);
    let near = follow_cam(&app, camera).occlusion.near_plane().distance();
    let z = camera_translation(&app, camera).z;
    assert!(z > 0.0 && z <= 1.0 + near, "camera at z = {z}");

    // Once the wall is gone, the camera eases back out to where the user left it.
    app.insert_resource(CollisionBackend::new(EmptyScene));
    run(&mut app, 120);
    assert!(!app.world().get::<FollowCamDiagnostics>(camera).unwrap().is_occluded);
    assert!((camera_translation(&app, camera).z - 3.0).abs() < 1e-2);
}

#[test]
fn pivot_chases_a_moving_target() {
    let mut app = app();
    let target = app
        .world_mut()
        .spawn((Transform::IDENTITY, FollowTarget))
        .id();
    let camera = app
        .world_mut()
        .spawn(FollowCam::new(target).with_target_offset(Vec3::Y))
        .id();
    run(&mut app, 2);

    app.world_mut()
        .get_mut::<Transform>(target)
        .unwrap()
        .translation = Vec3::X * 5.0;
    run(&mut app, 2);
    let pivot = follow_cam(&app, camera).pivot.position;
    assert!(pivot.x > 0.0 && pivot.x < 5.0, "pivot {pivot}");

    run(&mut app, 120);
    let pivot = follow_cam(&app, camera).pivot.position;
    assert!(pivot.distance(Vec3::new(5.0, 1.0, 0.0)) < 1e-2, "pivot {pivot}");
    assert!(camera_translation(&app, camera).distance(Vec3::new(5.0, 1.0, 3.0)) < 1e-2);
}

#[test]
fn despawned_target_holds_pose() {
    let mut app = app();
    let target = app
        .world_mut()
        .spawn((Transform::IDENTITY, FollowTarget))
        .id();
    let camera = app.world_mut().spawn(FollowCam::default()).id();
    run(&mut app, 2);
    let pose = camera_translation(&app, camera);

    app.world_mut().despawn(target);
    run(&mut app, 5);
    assert!(!follow_cam(&app, camera).is_attached());
    assert_eq!(camera_translation(&app, camera), pose);
}

#[test]
fn input_turns_and_zooms() {
    let mut app = app();
    app.world_mut().spawn((Transform::IDENTITY, FollowTarget));
    let camera = app.world_mut().spawn(FollowCam::default()).id();
    run(&mut app, 2);

    app.world_mut()
        .get_mut::<FollowCamInput>(camera)
        .unwrap()
        .accumulate(Vec2::new(-15.0, 0.0), -1.0);
    run(&mut app, 120);

    let follow_cam = follow_cam(&app, camera);
    assert!((follow_cam.pivot.yaw - 90.0).abs() < 1e-2, "yaw {}", follow_cam.pivot.yaw);
    assert_eq!(follow_cam.distance.desired, 4.0);
    // Yawed a quarter turn left, the camera sits on the +X side of the pivot.
    assert!(camera_translation(&app, camera).distance(Vec3::X * 4.0) < 1e-2);
    assert_eq!(
        app.world().get::<FollowCamInput>(camera).unwrap().look,
        Vec2::ZERO
    );
}

#[test]
fn projection_changes_refresh_the_near_plane() {
    let mut app = app();
    app.world_mut().spawn((Transform::IDENTITY, FollowTarget));
    let camera = app
        .world_mut()
        .spawn((
            FollowCam::default(),
            Projection::Perspective(PerspectiveProjection {
                near: 0.5,
                ..default()
            }),
        ))
        .id();
    run(&mut app, 1);
    let near_plane = *follow_cam(&app, camera).occlusion.near_plane();
    assert_eq!(near_plane.distance(), 0.5);

    // An invalid projection is rejected and the last good near plane is kept.
    if let Projection::Perspective(perspective) =
        &mut *app.world_mut().get_mut::<Projection>(camera).unwrap()
    {
        perspective.near = -1.0;
    }
    run(&mut app, 1);
    assert_eq!(*follow_cam(&app, camera).occlusion.near_plane(), near_plane);

    if let Projection::Perspective(perspective) =
        &mut *app.world_mut().get_mut::<Projection>(camera).unwrap()
    {
        perspective.near = 0.2;
    }
    run(&mut app, 1);
    assert_eq!(follow_cam(&app, camera).occlusion.near_plane().distance(), 0.2);
}
