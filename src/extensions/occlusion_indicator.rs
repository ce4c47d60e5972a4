//! A `bevy_follow_cam` extension that draws what the occlusion queries see: the near clip plane
//! the camera keeps clear, the line from the pivot to the camera, and the correction applied to the
//! pivot when it is pushed out of a wall. Useful when tuning collision layers and distances.

use bevy_app::prelude::*;
use bevy_color::{Alpha, Color};
use bevy_ecs::prelude::*;
use bevy_gizmos::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_transform::TransformSystem;

use crate::{
    controller::{
        component::{FollowCam, FollowCamDiagnostics},
        FollowCamSystems,
    },
    occlusion::ClipPlaneCorners,
};

/// See the [module](self) docs.
pub struct OcclusionIndicatorPlugin;

impl Plugin for OcclusionIndicatorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            PostUpdate,
            draw_occlusion
                .after(FollowCamSystems::UpdateCamera)
                .after(TransformSystem::TransformPropagate),
        )
        .register_type::<OcclusionIndicator>();
    }
}

/// Optional. Turns the occlusion indicator on for a [`FollowCam`]. The indicator is disabled if
/// this component is not present.
#[derive(Debug, Component, Reflect)]
pub struct OcclusionIndicator {
    /// Should the indicator be visible on this camera?
    pub enabled: bool,
}

impl Default for OcclusionIndicator {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Use gizmos to draw each camera's near plane and pivot in world space.
pub fn draw_occlusion(
    cameras: Query<(&FollowCam, &FollowCamDiagnostics, &OcclusionIndicator)>,
    mut gizmos: Gizmos,
) {
    for (follow_cam, diagnostics, _) in cameras
        .iter()
        .filter(|(follow_cam, _, indicator)| indicator.enabled && follow_cam.is_attached())
    {
        let pivot = follow_cam.pivot.position;
        let rotation = follow_cam.pivot.rotation();
        let camera = pivot + rotation * (Vec3::Z * follow_cam.distance.adjusted);

        let plane_color = if diagnostics.is_occluded {
            Color::srgb(1.0, 0.2, 0.2)
        } else {
            Color::srgb(0.2, 1.0, 0.4)
        };
        let corners = ClipPlaneCorners::new(follow_cam.occlusion.near_plane(), rotation).at(camera);
        gizmos.linestrip(corners.into_iter().chain([corners[0]]), plane_color);
        for corner in corners {
            gizmos.line(pivot, corner, plane_color.with_alpha(0.25));
        }

        gizmos.line(pivot, camera, Color::WHITE);
        if diagnostics.near_collision {
            gizmos.arrow(pivot - diagnostics.pivot_offset, pivot, Color::srgb(1.0, 0.8, 0.0));
        }
    }
}
