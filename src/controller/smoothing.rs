//! Critically damped smoothing of the camera's angles and distance.

use std::time::Duration;

use bevy_reflect::prelude::*;

/// How long the rig takes to settle on new targets.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Smoothing {
    /// Approximate time for yaw and pitch to reach their targets.
    pub rotation: Duration,
    /// Approximate time for the camera distance to reach its target. Also used when a wall
    /// recedes and the camera moves back out.
    pub distance: Duration,
}

impl Default for Smoothing {
    fn default() -> Self {
        Self {
            rotation: Duration::from_millis(30),
            distance: Duration::from_millis(200),
        }
    }
}

/// Move `current` toward `target` like a critically damped spring that settles in roughly
/// `smooth_time` seconds. `velocity` carries the spring's state between calls.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    // Padé style approximation of exp(-x).
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let output = target + (change + temp) * decay;

    // Never overshoot.
    if (target - current > 0.0) == (output > target) {
        *velocity = 0.0;
        return target;
    }
    output
}

/// [`smooth_damp`] for angles in degrees, taking the short way around.
pub fn smooth_damp_angle(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    let target = current + delta_angle(current, target);
    smooth_damp(current, target, velocity, smooth_time, dt)
}

/// Shortest signed difference from `current` to `target`, in degrees, in (-180, 180].
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}
