//! A walled courtyard with pillars to walk between. The camera pulls in whenever a wall or pillar
//! would come between it and the player.

use bevy::prelude::*;
use bevy_follow_cam::{extensions::occlusion_indicator::OcclusionIndicator, prelude::*};

/// Pillars sit on this layer, so they can be toggled out of the camera's collision mask.
const PILLAR_LAYER: u32 = 1;

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, DefaultFollowCamPlugins))
        .add_systems(Startup, (setup_camera, setup_scene, setup_ui))
        .add_systems(FixedUpdate, move_player.before(FollowCamSystems::TrackPivot))
        .add_systems(Update, (toggle_mode, toggle_pillars, toggle_indicator, update_ui))
        .run();
}

#[derive(Component)]
struct Player;

fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        FollowCam::default()
            .with_target_offset(Vec3::Y * 0.8)
            .with_distance(1.0, 6.0, 4.0)
            .with_occlusion_mode(OcclusionMode::Precise),
        OcclusionIndicator { enabled: false },
    ));
}

fn move_player(
    keys: Res<ButtonInput<KeyCode>>,
    cameras: Query<(&FollowCam, &FollowCamInput)>,
    mut players: Query<&mut Transform, With<Player>>,
    time: Res<Time>,
) {
    let Ok((follow_cam, input)) = cameras.single() else {
        return;
    };
    let Ok(mut player) = players.single_mut() else {
        return;
    };

    let mut direction = Vec3::ZERO;
    for (key, step) in [
        (KeyCode::KeyW, Vec3::NEG_Z),
        (KeyCode::KeyS, Vec3::Z),
        (KeyCode::KeyA, Vec3::NEG_X),
        (KeyCode::KeyD, Vec3::X),
    ] {
        if keys.pressed(key) {
            direction += step;
        }
    }
    let Some(direction) = direction.try_normalize() else {
        return;
    };

    // Walk relative to where the camera is facing.
    let facing = Quat::from_rotation_y(follow_cam.pivot.yaw.to_radians());
    let direction = facing * direction;
    let speed = if input.sprint { 8.0 } else { 4.0 };
    player.translation += direction * speed * time.delta_secs();
    player.rotation = facing;
}

fn toggle_mode(keys: Res<ButtonInput<KeyCode>>, mut cameras: Query<&mut FollowCam>) {
    if !keys.just_pressed(KeyCode::KeyM) {
        return;
    }
    for mut follow_cam in &mut cameras {
        follow_cam.occlusion_mode = match follow_cam.occlusion_mode {
            OcclusionMode::Fast => OcclusionMode::Precise,
            OcclusionMode::Precise => OcclusionMode::Fast,
        };
    }
}

fn toggle_pillars(keys: Res<ButtonInput<KeyCode>>, mut cameras: Query<&mut FollowCam>) {
    if !keys.just_pressed(KeyCode::KeyP) {
        return;
    }
    for mut follow_cam in &mut cameras {
        follow_cam.collision_mask = if follow_cam.collision_mask == CollisionMask::ALL {
            CollisionMask(!CollisionMask::layer(PILLAR_LAYER).0)
        } else {
            CollisionMask::ALL
        };
    }
}

fn toggle_indicator(
    keys: Res<ButtonInput<KeyCode>>,
    mut indicators: Query<&mut OcclusionIndicator>,
) {
    if keys.just_pressed(KeyCode::KeyI) {
        for mut indicator in &mut indicators {
            indicator.enabled = !indicator.enabled;
        }
    }
}

//
// --- The below code is not important for the example ---
//

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut colliders = StaticColliders::new().with(Collider::wall(Vec3::ZERO, Dir3::Y));

    let mut solid = |center: Vec3, half_extents: Vec3, color: Color, layer: Option<u32>| {
        let collider = Collider::cuboid(center, half_extents);
        colliders.push(match layer {
            Some(layer) => collider.on_layers(CollisionMask::layer(layer)),
            None => collider,
        });
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::from_size(half_extents * 2.0))),
            MeshMaterial3d(materials.add(color)),
            Transform::from_translation(center),
        ));
    };

    let wall_color = Color::srgb(0.6, 0.55, 0.5);
    for (center, half_extents) in [
        (Vec3::new(0.0, 1.5, -12.0), Vec3::new(12.0, 1.5, 0.25)),
        (Vec3::new(0.0, 1.5, 12.0), Vec3::new(12.0, 1.5, 0.25)),
        (Vec3::new(-12.0, 1.5, 0.0), Vec3::new(0.25, 1.5, 12.0)),
        (Vec3::new(12.0, 1.5, 0.0), Vec3::new(0.25, 1.5, 12.0)),
    ] {
        solid(center, half_extents, wall_color, None);
    }

    let pillar_color = Color::srgb(0.3, 0.4, 0.7);
    for x in [-6.0, -2.0, 2.0, 6.0] {
        for z in [-6.0, 0.0, 6.0] {
            solid(
                Vec3::new(x, 1.5, z),
                Vec3::new(0.2, 1.5, 0.2),
                pillar_color,
                Some(PILLAR_LAYER),
            );
        }
    }

    commands.insert_resource(CollisionBackend::new(colliders));

    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(24.0, 24.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.3, 0.5, 0.3))),
    ));
    commands.spawn((
        Mesh3d(meshes.add(Capsule3d::new(0.3, 1.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.9, 0.4, 0.2))),
        Transform::from_xyz(0.0, 0.8, 4.0),
        Player,
        FollowTarget,
    ));
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 2.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn setup_ui(mut commands: Commands) {
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        Node {
            margin: UiRect::all(Val::Px(20.0)),
            ..default()
        },
    ));
}

fn update_ui(
    cameras: Query<(&FollowCam, &FollowCamDiagnostics)>,
    mut text: Query<&mut Text>,
) {
    let (Ok((follow_cam, diagnostics)), Ok(mut text)) = (cameras.single(), text.single_mut())
    else {
        return;
    };
    *text = Text::new(format!(
        "WASD - Move\n\
         Space - Sprint\n\
         Mouse - Look\n\
         Scroll - Zoom\n\
         M - Occlusion mode: {:?}\n\
         P - Pillars block camera: {}\n\
         I - Toggle occlusion indicator\n\
         \n\
         Occluded: {}\n\
         Safe distance: {:.2}\n\
         Query passes: {}\n\
         Pivot pushed: {}",
        follow_cam.occlusion_mode,
        follow_cam.collision_mask == CollisionMask::ALL,
        diagnostics.is_occluded,
        diagnostics.safe_distance,
        diagnostics.raycast_loops,
        diagnostics.near_collision,
    ));
}
