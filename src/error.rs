//! Error types for the follow camera.

use thiserror::Error;

/// Errors surfaced while configuring or starting a follow camera.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FollowCamError {
    /// The host camera's intrinsics cannot describe a near clip plane.
    #[error("invalid camera intrinsics (near = {near}, fov = {fov_degrees}°, aspect = {aspect}): {reason}")]
    InvalidIntrinsics {
        /// Near plane distance that was supplied.
        near: f32,
        /// Vertical field of view that was supplied, in degrees.
        fov_degrees: f32,
        /// Aspect ratio that was supplied.
        aspect: f32,
        /// Which constraint was broken.
        reason: &'static str,
    },

    /// No follow subject was configured and none could be discovered.
    #[error("no follow target assigned and no entity with a `FollowTarget` found")]
    MissingTarget,
}
