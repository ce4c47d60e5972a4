//! Finds how far the camera can sit from its pivot before scene geometry gets in the way.

use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;

use super::{
    frustum::{look_rotation, ClipPlaneCorners},
    intrinsics::{CameraIntrinsics, NearPlane},
};
use crate::{
    collision::{hit_or_clear, BoxSweep, CollisionMask, CollisionQuery},
    error::FollowCamError,
};

/// Tuning for the occlusion queries.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct OcclusionSettings {
    /// How far to pull the camera in past a detected surface on each precise pass. Must be larger
    /// than floating point error at the scene's scale, or the same surface is found forever.
    pub distance_adjustment: f32,
    /// Upper bound on precise passes per frame.
    pub max_iterations: u32,
}

impl Default for OcclusionSettings {
    fn default() -> Self {
        Self {
            distance_adjustment: 0.001,
            max_iterations: 100,
        }
    }
}

impl OcclusionSettings {
    /// Default settings for a scene where one world unit is `unit_scale` meters.
    pub fn for_unit_scale(unit_scale: f32) -> Self {
        let default = Self::default();
        Self {
            distance_adjustment: default.distance_adjustment / unit_scale.abs().max(f32::EPSILON),
            ..default
        }
    }
}

/// Which occlusion query the camera runs each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub enum OcclusionMode {
    /// One box sweep the size of the near plane. Cheap, never refined.
    #[default]
    Fast,
    /// Iterative corner rays. Keeps the whole near plane clear.
    Precise,
}

/// What an occlusion query found this frame.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct OcclusionResult {
    /// Did any query hit geometry?
    pub is_occluded: bool,
    /// Largest clear camera distance from the pivot along the view ray.
    pub safe_distance: f32,
    /// Number of query passes run.
    pub iterations: u32,
    /// `false` if the precise resolver stopped before a pass came back clear, either because it
    /// ran out of iterations or because the camera was already at the near plane. The distance is
    /// still the best one found.
    pub converged: bool,
}

impl Default for OcclusionResult {
    fn default() -> Self {
        Self {
            is_occluded: false,
            safe_distance: 0.0,
            iterations: 0,
            converged: true,
        }
    }
}

/// Runs occlusion queries for one camera. Holds the camera's near plane, so it needs refreshing
/// when the camera's projection changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
pub struct OcclusionResolver {
    near_plane: NearPlane,
    /// Query tuning.
    pub settings: OcclusionSettings,
}

impl OcclusionResolver {
    /// Create a resolver for a camera with the given intrinsics.
    pub fn new(intrinsics: &CameraIntrinsics) -> Result<Self, FollowCamError> {
        Ok(Self {
            near_plane: intrinsics.near_plane()?,
            settings: OcclusionSettings::default(),
        })
    }

    /// Replace the query tuning.
    #[must_use]
    pub fn with_settings(self, settings: OcclusionSettings) -> Self {
        Self { settings, ..self }
    }

    /// The cached near plane.
    pub fn near_plane(&self) -> &NearPlane {
        &self.near_plane
    }

    /// Recompute the near plane. On error the previous near plane is kept.
    pub fn update_intrinsics(&mut self, intrinsics: &CameraIntrinsics) -> Result<(), FollowCamError> {
        self.near_plane = intrinsics.near_plane()?;
        Ok(())
    }

    /// Run the query selected by `mode`.
    pub fn resolve(
        &self,
        mode: OcclusionMode,
        scene: &dyn CollisionQuery,
        pivot: Vec3,
        desired_camera: Vec3,
        mask: CollisionMask,
    ) -> OcclusionResult {
        match mode {
            OcclusionMode::Fast => self.fast_occlusion_check(scene, pivot, desired_camera, mask),
            OcclusionMode::Precise => {
                self.precise_occlusion_resolve(scene, pivot, desired_camera, mask)
            }
        }
    }

    /// Sweep a flat box the size of the near plane from the pivot toward the camera.
    ///
    /// The box stops one near plane distance short of the camera, because the camera itself sits
    /// that far behind its near plane.
    pub fn fast_occlusion_check(
        &self,
        scene: &dyn CollisionQuery,
        pivot: Vec3,
        desired_camera: Vec3,
        mask: CollisionMask,
    ) -> OcclusionResult {
        let near = self.near_plane.distance();
        let Ok((direction, distance)) = Dir3::new_and_length(desired_camera - pivot) else {
            return OcclusionResult {
                safe_distance: near,
                ..Default::default()
            };
        };
        let max_distance = (distance - near).max(0.0);
        let sweep = BoxSweep {
            origin: pivot,
            half_extents: Vec3::new(self.near_plane.half_width(), self.near_plane.half_height(), 0.0),
            direction,
            orientation: look_rotation(*direction, Vec3::Y),
            max_distance,
        };

        let hit = hit_or_clear(scene.sweep_box(&sweep, mask));
        OcclusionResult {
            is_occluded: hit.is_some(),
            safe_distance: hit.map_or(max_distance, |hit| hit.distance) + near,
            iterations: 1,
            converged: true,
        }
    }

    /// Pull the camera toward the pivot until nothing blocks the lines from the pivot to any
    /// corner of the camera's near plane.
    ///
    /// A single center ray misses walls that only clip a corner of the view. Each pass casts from
    /// the pivot to all four near plane corners of the candidate camera, projects the closest hit
    /// back onto the center ray, and moves the candidate there. Passes repeat until one comes back
    /// clear or [`OcclusionSettings::max_iterations`] is reached.
    pub fn precise_occlusion_resolve(
        &self,
        scene: &dyn CollisionQuery,
        pivot: Vec3,
        desired_camera: Vec3,
        mask: CollisionMask,
    ) -> OcclusionResult {
        let near = self.near_plane.distance();
        let Ok((toward_pivot, mut hit_distance)) = Dir3::new_and_length(pivot - desired_camera)
        else {
            return OcclusionResult {
                safe_distance: near,
                ..Default::default()
            };
        };
        let corners = ClipPlaneCorners::new(&self.near_plane, look_rotation(*toward_pivot, Vec3::Y));

        let mut candidate = desired_camera;
        let mut is_occluded = false;
        let mut converged = false;
        let mut iterations = 0;
        while iterations < self.settings.max_iterations {
            iterations += 1;
            let Some(projected) = self.nearest_corner_hit(scene, pivot, candidate, &corners, mask)
            else {
                converged = true;
                break;
            };
            is_occluded = true;
            hit_distance = hit_distance.min(projected) - self.settings.distance_adjustment;
            if hit_distance <= near {
                hit_distance = near;
                break;
            }
            candidate = pivot - *toward_pivot * hit_distance;
        }

        if !converged {
            debug!("Occlusion resolve stopped after {iterations} passes at {hit_distance}");
        }
        trace!(is_occluded, hit_distance, iterations, "precise occlusion resolve");
        OcclusionResult {
            is_occluded,
            safe_distance: hit_distance.max(near),
            iterations,
            converged: converged || self.settings.max_iterations == 0,
        }
    }

    /// Cast from the pivot to each near plane corner of a camera at `candidate`, returning the
    /// closest hit rescaled onto the center ray, or `None` if every corner is visible.
    fn nearest_corner_hit(
        &self,
        scene: &dyn CollisionQuery,
        pivot: Vec3,
        candidate: Vec3,
        corners: &ClipPlaneCorners,
        mask: CollisionMask,
    ) -> Option<f32> {
        let near = self.near_plane.distance();
        // Depth of the near plane along the center ray.
        let depth = pivot.distance(candidate) - near;
        corners
            .at(candidate)
            .into_iter()
            .filter_map(|corner| {
                let hit = hit_or_clear(scene.linecast(pivot, corner, mask))?;
                let corner_distance = pivot.distance(corner);
                // Similar triangles: the hit is the same fraction of the way along the corner ray
                // as its projection is along the center ray.
                (corner_distance > f32::EPSILON)
                    .then(|| depth * hit.distance / corner_distance + near)
            })
            .reduce(f32::min)
    }
}
