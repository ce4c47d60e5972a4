//! The primary [`Component`] of the controller, [`FollowCam`].

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_render::prelude::*;
use bevy_time::prelude::*;
use bevy_transform::prelude::*;
use bevy_window::RequestRedraw;

use super::{inputs::FollowCamInput, pivot::PivotState, smoothing::Smoothing, zoom::DistanceState};
use crate::{
    collision::{scene_or_empty, CollisionBackend, CollisionMask, CollisionQuery},
    error::FollowCamError,
    occlusion::{
        CameraIntrinsics, NearCollision, OcclusionMode, OcclusionResolver, OcclusionResult,
        OcclusionSettings,
    },
};

/// Marks the entity a [`FollowCam`] follows when it hasn't been given a target explicitly.
///
/// Follow targets are read through their [`Transform`], so they should be root entities.
#[derive(Debug, Clone, Copy, Default, Component, Reflect)]
pub struct FollowTarget;

/// Tracks all state of a third-person follow camera: what it follows, where its pivot is, how far
/// back it sits, and how it avoids the scene.
///
/// # Frame contract
///
/// - On the fixed timestep, the pivot chases the target (plus [`FollowCam::target_offset`]) and is
///   nudged out of walls close to it. Doing this on the same clock as the target's own movement
///   avoids jitter.
/// - Each frame, look and zoom input from [`FollowCamInput`] update the desired angles and
///   distance, the angles are smoothed, an occlusion query finds how far back the camera may sit,
///   and the camera's [`Transform`] is written.
///
/// A camera with no target holds its pose until one is assigned or a [`FollowTarget`] appears.
#[derive(Debug, Clone, Reflect, Component)]
#[require(FollowCamInput, FollowCamDiagnostics, Transform)]
pub struct FollowCam {
    /// The entity to follow. If `None`, the first [`FollowTarget`] found is used.
    pub target: Option<Entity>,
    /// Offset from the target's origin to the pivot, in the target's local space.
    pub target_offset: Vec3,
    /// Scene layers that block the camera.
    pub collision_mask: CollisionMask,
    /// Which occlusion query to run each frame.
    pub occlusion_mode: OcclusionMode,
    /// Input sensitivity of the camera.
    pub sensitivity: Sensitivity,
    /// Smoothing of camera motion.
    pub smoothing: Smoothing,
    /// How quickly the pivot catches up with the target, per second.
    pub pivot_catch_up_rate: f32,
    /// Distance the camera starts at when it attaches to a target.
    pub initial_distance: f32,
    /// Pivot position and angles. Managed by the controller.
    pub pivot: PivotState,
    /// Camera distance. Managed by the controller.
    pub distance: DistanceState,
    /// Occlusion queries, with the camera's near plane cached. Refreshed from the camera's
    /// [`Projection`] whenever it changes.
    pub occlusion: OcclusionResolver,
    attached: bool,
}

impl Default for FollowCam {
    fn default() -> Self {
        let distance = DistanceState::default();
        FollowCam {
            target: None,
            target_offset: Vec3::ZERO,
            collision_mask: CollisionMask::ALL,
            occlusion_mode: OcclusionMode::default(),
            sensitivity: Sensitivity::default(),
            smoothing: Smoothing::default(),
            pivot_catch_up_rate: 20.0,
            initial_distance: distance.desired,
            pivot: PivotState::default(),
            distance,
            occlusion: OcclusionResolver::default(),
            attached: false,
        }
    }
}

/// What the rig produced on a render tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraUpdate {
    /// Where the camera goes. The rig only drives translation and rotation, so the scale is left
    /// at one; [`FollowCam::update_camera_positions`] keeps the camera's own scale.
    pub transform: Transform,
    /// The occlusion query that placed it.
    pub occlusion: OcclusionResult,
}

impl FollowCam {
    /// Create a follow camera for `target`.
    pub fn new(target: Entity) -> Self {
        Self {
            target: Some(target),
            ..Default::default()
        }
    }

    /// Follow `target`.
    #[must_use]
    pub fn with_target(self, target: Entity) -> Self {
        Self {
            target: Some(target),
            attached: false,
            ..self
        }
    }

    /// Place the pivot at `offset` from the target, in the target's local space.
    #[must_use]
    pub fn with_target_offset(self, offset: Vec3) -> Self {
        Self {
            target_offset: offset,
            ..self
        }
    }

    /// Only collide with the given layers.
    #[must_use]
    pub fn with_collision_mask(self, mask: CollisionMask) -> Self {
        Self {
            collision_mask: mask,
            ..self
        }
    }

    /// Choose the occlusion query.
    #[must_use]
    pub fn with_occlusion_mode(self, mode: OcclusionMode) -> Self {
        Self {
            occlusion_mode: mode,
            ..self
        }
    }

    /// Tune the occlusion queries.
    #[must_use]
    pub fn with_occlusion_settings(mut self, settings: OcclusionSettings) -> Self {
        self.occlusion.settings = settings;
        self
    }

    /// Set the zoom limits and starting distance.
    #[must_use]
    pub fn with_distance(mut self, min: f32, max: f32, initial: f32) -> Self {
        self.distance.set_limits(min, max);
        self.distance.snap_to(initial);
        self.initial_distance = self.distance.desired;
        self
    }

    /// Set the pitch limits, in degrees.
    #[must_use]
    pub fn with_pitch_limits(mut self, min: f32, max: f32) -> Self {
        self.pivot.set_pitch_limits(min, max);
        self
    }

    /// Is the camera attached to a target and following it?
    pub fn is_attached(&self) -> bool {
        self.attached && self.target.is_some()
    }

    /// Pick the entity to follow: the configured target if there is one, otherwise the first
    /// discovered [`FollowTarget`].
    pub fn resolve_target(
        &self,
        mut discovered: impl Iterator<Item = Entity>,
    ) -> Result<Entity, FollowCamError> {
        self.target
            .or_else(|| discovered.next())
            .ok_or(FollowCamError::MissingTarget)
    }

    /// The pivot location for a target at `target`.
    pub fn subject_pivot(&self, target: &Transform) -> Vec3 {
        target.translation + target.rotation * self.target_offset
    }

    /// Start following `target`. The pivot jumps to the target, yaw lines up behind it, and the
    /// distance resets to [`FollowCam::initial_distance`].
    pub fn attach(&mut self, entity: Entity, target: &Transform) {
        self.target = Some(entity);
        self.pivot.position = self.subject_pivot(target);
        let (yaw, _, _) = target.rotation.to_euler(EulerRot::YXZ);
        let pitch = self.pivot.desired_pitch;
        self.pivot.snap_to(yaw.to_degrees(), pitch);
        self.distance.snap_to(self.initial_distance);
        self.attached = true;
    }

    /// Stop following. The camera holds its pose.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Apply look and zoom input to the desired angles and distance.
    pub fn apply_input(&mut self, look: Vec2, zoom: f32) {
        self.pivot
            .turn(-look.x * self.sensitivity.look.x, -look.y * self.sensitivity.look.y);
        self.distance.zoom(zoom * self.sensitivity.zoom);
    }

    /// Simulation tick: move the pivot toward the target's pivot, nudged away from close walls.
    pub fn track_pivot(
        &mut self,
        scene: &dyn CollisionQuery,
        subject_pivot: Vec3,
        delta_time: f32,
    ) -> NearCollision {
        let near = self
            .occlusion
            .probe_near_collision(scene, subject_pivot, self.collision_mask);
        let goal = if near.is_near {
            subject_pivot + near.offset
        } else {
            subject_pivot
        };
        self.pivot
            .approach(goal, delta_time * self.pivot_catch_up_rate);
        near
    }

    /// Render tick: smooth the angles, find the clear distance, and place the camera.
    pub fn update_transform(&mut self, scene: &dyn CollisionQuery, delta_time: f32) -> CameraUpdate {
        self.pivot
            .smooth(self.smoothing.rotation.as_secs_f32(), delta_time);
        let rotation = self.pivot.rotation();
        let pivot = self.pivot.position;

        let desired_camera = pivot + rotation * (Vec3::Z * self.distance.desired);
        let occlusion = self.occlusion.resolve(
            self.occlusion_mode,
            scene,
            pivot,
            desired_camera,
            self.collision_mask,
        );
        self.distance
            .settle(&occlusion, self.smoothing.distance.as_secs_f32(), delta_time);

        CameraUpdate {
            transform: Transform::from_translation(pivot + rotation * (Vec3::Z * self.distance.adjusted))
                .with_rotation(rotation),
            occlusion,
        }
    }

    /// Attach cameras without a live target to one.
    pub fn acquire_targets(
        mut cameras: Query<(Entity, &mut FollowCam)>,
        discoverable: Query<Entity, With<FollowTarget>>,
        targets: Query<&Transform, Without<FollowCam>>,
    ) {
        for (camera, mut follow_cam) in &mut cameras {
            if follow_cam.is_attached() {
                match follow_cam.target {
                    Some(target) if targets.contains(target) => continue,
                    _ => {
                        warn!("Follow target of camera {camera} is gone; holding pose");
                        follow_cam.target = None;
                        follow_cam.detach();
                    }
                }
            }

            let target = match follow_cam.resolve_target(discoverable.iter()) {
                Ok(target) => target,
                Err(err) => {
                    error_once!("Camera {camera}: {err}");
                    continue;
                }
            };
            let Ok(transform) = targets.get(target) else {
                warn_once!("Follow target {target} has no Transform");
                continue;
            };
            follow_cam.attach(target, transform);
            debug!("Camera {camera} now following {target}");
        }
    }

    /// Recompute each camera's cached near plane when its projection changes.
    pub fn refresh_intrinsics(
        mut cameras: Query<
            (Entity, &mut FollowCam, &Projection),
            Or<(Changed<Projection>, Added<FollowCam>)>,
        >,
    ) {
        for (camera, mut follow_cam, projection) in &mut cameras {
            let Projection::Perspective(perspective) = projection else {
                warn_once!("Follow cameras only support perspective projections");
                continue;
            };
            let intrinsics = CameraIntrinsics::from_perspective(perspective);
            if let Err(err) = follow_cam.occlusion.update_intrinsics(&intrinsics) {
                error!("Camera {camera}: {err}");
            }
        }
    }

    /// Move every attached camera's pivot. Runs on the fixed timestep.
    pub fn track_pivots(
        mut cameras: Query<(&mut FollowCam, &mut FollowCamDiagnostics)>,
        targets: Query<&Transform, Without<FollowCam>>,
        backend: Option<Res<CollisionBackend>>,
        time: Res<Time>,
    ) {
        let scene = scene_or_empty(backend.as_deref());
        for (mut follow_cam, mut diagnostics) in &mut cameras {
            if !follow_cam.is_attached() {
                continue;
            }
            let Some(target) = follow_cam.target.and_then(|target| targets.get(target).ok())
            else {
                continue;
            };
            let subject_pivot = follow_cam.subject_pivot(target);
            let near = follow_cam.track_pivot(scene, subject_pivot, time.delta_secs());
            diagnostics.pivot_offset = near.offset;
            diagnostics.near_collision = near.is_near;
        }
    }

    /// Update transforms for all cameras. Called once per frame.
    pub fn update_camera_positions(
        mut cameras: Query<(
            &mut FollowCam,
            &mut FollowCamInput,
            &mut Transform,
            &mut FollowCamDiagnostics,
        )>,
        backend: Option<Res<CollisionBackend>>,
        mut redraw: EventWriter<RequestRedraw>,
        time: Res<Time>,
    ) {
        let scene = scene_or_empty(backend.as_deref());
        for (mut follow_cam, mut input, mut transform, mut diagnostics) in &mut cameras {
            if !follow_cam.is_attached() {
                continue;
            }
            let (look, zoom) = input.take();
            follow_cam.apply_input(look, zoom);
            let update = follow_cam.update_transform(scene, time.delta_secs());

            diagnostics.raycast_loops = update.occlusion.iterations;
            diagnostics.is_occluded = update.occlusion.is_occluded;
            diagnostics.safe_distance = update.occlusion.safe_distance;

            let next = Transform {
                scale: transform.scale,
                ..update.transform
            };
            if *transform != next {
                *transform = next;
                redraw.write(RequestRedraw);
            }
        }
    }
}

/// The sensitivity of the camera controller to inputs.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Sensitivity {
    /// Degrees of yaw (x) and pitch (y) per unit of look input.
    pub look: Vec2,
    /// World units of distance per unit of zoom input.
    pub zoom: f32,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            look: Vec2::new(6.0, 4.0),
            zoom: 5.5,
        }
    }
}

/// What the camera's last update did, for on-screen or logged display. Nothing reads this back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Component, Reflect)]
pub struct FollowCamDiagnostics {
    /// Occlusion query passes run on the last frame.
    pub raycast_loops: u32,
    /// Correction applied to the pivot on the last fixed tick.
    pub pivot_offset: Vec3,
    /// Was the camera occluded on the last frame?
    pub is_occluded: bool,
    /// Clear distance found on the last frame.
    pub safe_distance: f32,
    /// Was the pivot near a wall on the last fixed tick?
    pub near_collision: bool,
}
