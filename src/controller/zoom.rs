//! Provides [`DistanceState`], how far the camera sits behind its pivot.

use bevy_reflect::Reflect;

use super::smoothing::smooth_damp;
use crate::occlusion::OcclusionResult;

/// The user's requested camera distance, its limits, and the distance actually used after
/// occlusion.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct DistanceState {
    /// Distance the user asked for. Always within `[min_distance, max_distance]`.
    pub desired: f32,
    /// Closest the user may zoom in.
    pub min_distance: f32,
    /// Farthest the user may zoom out.
    pub max_distance: f32,
    /// Distance used to place the camera this frame.
    pub adjusted: f32,
    /// Smoothing state while returning to the desired distance.
    pub zoom_velocity: f32,
    /// Smoothing state while following a receding obstruction.
    pub adjust_velocity: f32,
}

impl Default for DistanceState {
    fn default() -> Self {
        Self {
            desired: 3.0,
            min_distance: 1.5,
            max_distance: 4.0,
            adjusted: 3.0,
            zoom_velocity: 0.0,
            adjust_velocity: 0.0,
        }
    }
}

impl DistanceState {
    /// Set the zoom limits, keeping the desired distance within them.
    pub fn set_limits(&mut self, min_distance: f32, max_distance: f32) {
        self.min_distance = min_distance.min(max_distance).max(0.0);
        self.max_distance = max_distance.max(self.min_distance);
        self.set_desired(self.desired);
    }

    /// Request a distance, clamped to the limits.
    pub fn set_desired(&mut self, distance: f32) {
        self.desired = distance.clamp(self.min_distance, self.max_distance);
    }

    /// Zoom in by `amount` world units. Negative values zoom out.
    pub fn zoom(&mut self, amount: f32) {
        self.set_desired(self.desired - amount);
    }

    /// Place the camera at `distance` immediately, with no smoothing in flight.
    pub fn snap_to(&mut self, distance: f32) {
        self.set_desired(distance);
        self.adjusted = self.desired;
        self.zoom_velocity = 0.0;
        self.adjust_velocity = 0.0;
    }

    /// Update the adjusted distance from this frame's occlusion result.
    ///
    /// An obstruction closer than the camera snaps the camera in front of it, so the camera never
    /// shows the inside of a wall. An obstruction that has moved farther away is followed
    /// smoothly, and with nothing in the way the camera eases back to the desired distance.
    pub fn settle(&mut self, occlusion: &OcclusionResult, smooth_time: f32, dt: f32) {
        if occlusion.is_occluded {
            self.zoom_velocity = 0.0;
            if occlusion.safe_distance > self.adjusted {
                self.adjusted = smooth_damp(
                    self.adjusted,
                    occlusion.safe_distance,
                    &mut self.adjust_velocity,
                    smooth_time,
                    dt,
                );
            } else {
                self.adjust_velocity = 0.0;
                self.adjusted = occlusion.safe_distance;
            }
        } else {
            self.adjust_velocity = 0.0;
            self.adjusted = smooth_damp(
                self.adjusted,
                self.desired,
                &mut self.zoom_velocity,
                smooth_time,
                dt,
            );
        }
    }
}
