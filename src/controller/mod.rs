//! The follow camera controller: the [`FollowCam`](component::FollowCam) component, the state it
//! carries between frames, and the systems that drive it.

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_transform::TransformSystem;
use bevy_window::RequestRedraw;

pub mod component;
pub mod inputs;
pub mod pivot;
pub mod smoothing;
pub mod zoom;

use component::{FollowCam, FollowCamDiagnostics, FollowTarget};

/// Ordering of the follow camera's systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum FollowCamSystems {
    /// Attach cameras to their targets. [`PreUpdate`].
    AcquireTarget,
    /// Recompute near planes after projection changes. [`PreUpdate`].
    RefreshIntrinsics,
    /// Move pivots toward their targets. [`FixedUpdate`].
    TrackPivot,
    /// Place cameras. [`PostUpdate`], before transform propagation.
    UpdateCamera,
}

/// Adds the follow camera systems, without any input handling.
pub struct FollowCamPlugin;

impl Plugin for FollowCamPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<RequestRedraw>()
            .configure_sets(
                PreUpdate,
                FollowCamSystems::AcquireTarget.before(FollowCamSystems::RefreshIntrinsics),
            )
            .configure_sets(
                PostUpdate,
                FollowCamSystems::UpdateCamera.before(TransformSystem::TransformPropagate),
            )
            .add_systems(
                PreUpdate,
                (
                    FollowCam::acquire_targets.in_set(FollowCamSystems::AcquireTarget),
                    FollowCam::refresh_intrinsics.in_set(FollowCamSystems::RefreshIntrinsics),
                ),
            )
            .add_systems(
                FixedUpdate,
                FollowCam::track_pivots.in_set(FollowCamSystems::TrackPivot),
            )
            .add_systems(
                PostUpdate,
                FollowCam::update_camera_positions.in_set(FollowCamSystems::UpdateCamera),
            )
            .register_type::<FollowCam>()
            .register_type::<FollowTarget>()
            .register_type::<FollowCamDiagnostics>()
            .register_type::<inputs::FollowCamInput>();
    }
}
