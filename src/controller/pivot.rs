//! Provides [`PivotState`], the point the camera orbits and the angles it orbits at.

use bevy_math::prelude::*;
use bevy_reflect::prelude::*;

use super::smoothing::smooth_damp_angle;

/// Position and orientation of the camera's pivot. Angles are in degrees.
///
/// Yaw turns about world up. Positive pitch tilts the view up, which puts the camera below the
/// pivot.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PivotState {
    /// Where the camera orbits, in world space.
    pub position: Vec3,
    /// Smoothed yaw, kept within [0, 360].
    pub yaw: f32,
    /// Smoothed pitch.
    pub pitch: f32,
    /// Yaw the smoothing is heading toward.
    pub desired_yaw: f32,
    /// Pitch the smoothing is heading toward. Always within `[min_pitch, max_pitch]`.
    pub desired_pitch: f32,
    /// Lowest allowed pitch.
    pub min_pitch: f32,
    /// Highest allowed pitch.
    pub max_pitch: f32,
    /// Smoothing state for yaw.
    pub yaw_velocity: f32,
    /// Smoothing state for pitch.
    pub pitch_velocity: f32,
}

impl Default for PivotState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            desired_yaw: 0.0,
            desired_pitch: 0.0,
            min_pitch: -65.0,
            max_pitch: 65.0,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
        }
    }
}

impl PivotState {
    /// Set the pitch limits, keeping the desired pitch within them.
    pub fn set_pitch_limits(&mut self, min_pitch: f32, max_pitch: f32) {
        self.min_pitch = min_pitch.min(max_pitch);
        self.max_pitch = max_pitch.max(min_pitch);
        self.set_desired_pitch(self.desired_pitch);
    }

    /// Request a pitch, clamped to the limits.
    pub fn set_desired_pitch(&mut self, pitch: f32) {
        self.desired_pitch = pitch.clamp(self.min_pitch, self.max_pitch);
    }

    /// Turn the desired angles by `yaw` and `pitch` degrees.
    pub fn turn(&mut self, yaw: f32, pitch: f32) {
        self.desired_yaw += yaw;
        self.set_desired_pitch(self.desired_pitch + pitch);
    }

    /// Jump straight to the given angles, with no smoothing in flight.
    pub fn snap_to(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw.rem_euclid(360.0);
        self.desired_yaw = self.yaw;
        self.set_desired_pitch(pitch);
        self.pitch = self.desired_pitch;
        self.yaw_velocity = 0.0;
        self.pitch_velocity = 0.0;
    }

    /// Advance the smoothed angles toward the desired ones.
    pub fn smooth(&mut self, smooth_time: f32, dt: f32) {
        self.yaw = smooth_damp_angle(
            self.yaw,
            self.desired_yaw,
            &mut self.yaw_velocity,
            smooth_time,
            dt,
        );
        self.pitch = smooth_damp_angle(
            self.pitch,
            self.desired_pitch,
            &mut self.pitch_velocity,
            smooth_time,
            dt,
        );

        // Wrap both together so the smoothing doesn't see a jump.
        if self.yaw > 360.0 {
            self.yaw -= 360.0;
            self.desired_yaw -= 360.0;
        } else if self.yaw < 0.0 {
            self.yaw += 360.0;
            self.desired_yaw += 360.0;
        }
    }

    /// The camera rotation for the smoothed angles.
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw.to_radians(), self.pitch.to_radians(), 0.0)
    }

    /// Move the pivot a fraction `t` of the way to `goal`.
    pub fn approach(&mut self, goal: Vec3, t: f32) {
        self.position = self.position.lerp(goal, t.clamp(0.0, 1.0));
    }
}
