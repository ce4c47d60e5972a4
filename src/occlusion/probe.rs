//! Keeps the pivot itself out of nearby walls.

use bevy_math::prelude::*;
use bevy_reflect::prelude::*;

use super::resolver::OcclusionResolver;
use crate::collision::{hit_or_clear, CollisionMask, CollisionQuery};

/// Number of horizontal directions sampled around the pivot.
pub const PROBE_DIRECTIONS: u32 = 8;

/// Walls found close to the pivot, and how far to push the pivot away from them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
pub struct NearCollision {
    /// Did any probe ray hit?
    pub is_near: bool,
    /// Sum of the corrections of every ray that hit. Points away from the walls.
    pub offset: Vec3,
}

/// Cast `PROBE_DIRECTIONS` horizontal rays of length `radius` from `position` and accumulate a
/// correction pushing it out of anything they hit.
pub fn probe_near_collision(
    scene: &dyn CollisionQuery,
    position: Vec3,
    radius: f32,
    mask: CollisionMask,
) -> NearCollision {
    let step = std::f32::consts::TAU / PROBE_DIRECTIONS as f32;
    (0..PROBE_DIRECTIONS)
        .map(|i| Quat::from_rotation_y(step * i as f32) * Dir3::NEG_Z)
        .filter_map(|direction| {
            let hit = hit_or_clear(scene.raycast(position, direction, radius, mask))?;
            Some(*direction * (hit.distance - radius))
        })
        .fold(NearCollision::default(), |probe, correction| NearCollision {
            is_near: true,
            offset: probe.offset + correction,
        })
}

impl OcclusionResolver {
    /// How far the near collision probe reaches: just past the corners of the near plane, so the
    /// camera can never be closer to a wall than its near plane can fit.
    pub fn probe_radius(&self) -> f32 {
        self.near_plane().half_diagonal() + self.settings.distance_adjustment
    }

    /// Probe for walls around `position` out to [`OcclusionResolver::probe_radius`].
    pub fn probe_near_collision(
        &self,
        scene: &dyn CollisionQuery,
        position: Vec3,
        mask: CollisionMask,
    ) -> NearCollision {
        probe_near_collision(scene, position, self.probe_radius(), mask)
    }
}
