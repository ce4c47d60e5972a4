//! Occlusion avoidance: how close the camera has to be to its pivot so that nothing in the scene
//! cuts into its near clip plane, and how far the pivot has to move to stay out of walls.
//!
//! Everything here is a pure function of the camera's intrinsics, the query inputs, and the scene
//! as it is *this* frame. Nothing is cached across frames.

pub mod frustum;
pub mod intrinsics;
pub mod probe;
pub mod resolver;

pub use frustum::{compute_corners, look_rotation, ClipPlaneCorners};
pub use intrinsics::{CameraIntrinsics, NearPlane};
pub use probe::{probe_near_collision, NearCollision};
pub use resolver::{OcclusionMode, OcclusionResolver, OcclusionResult, OcclusionSettings};
