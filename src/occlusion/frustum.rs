//! Near clip plane corners in world orientation.

use bevy_math::prelude::*;

use super::intrinsics::{CameraIntrinsics, NearPlane};
use crate::error::FollowCamError;

/// The four corners of the near clip plane, relative to the camera position, in the order
/// top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlaneCorners(pub [Vec3; 4]);

impl ClipPlaneCorners {
    /// Corner offsets for a camera with the given rotation. Cameras look down their local -Z.
    pub fn new(plane: &NearPlane, orientation: Quat) -> Self {
        let (w, h, d) = (plane.half_width(), plane.half_height(), plane.distance());
        Self(
            [
                Vec3::new(-w, h, -d),
                Vec3::new(w, h, -d),
                Vec3::new(w, -h, -d),
                Vec3::new(-w, -h, -d),
            ]
            .map(|corner| orientation * corner),
        )
    }

    /// World space corners for a camera located at `position`.
    pub fn at(&self, position: Vec3) -> [Vec3; 4] {
        self.0.map(|corner| corner + position)
    }
}

/// Compute the near plane corners of a camera with the given intrinsics and rotation.
pub fn compute_corners(
    intrinsics: &CameraIntrinsics,
    orientation: Quat,
) -> Result<ClipPlaneCorners, FollowCamError> {
    Ok(ClipPlaneCorners::new(&intrinsics.near_plane()?, orientation))
}

/// Rotation of a camera looking along `forward` with its up axis as close to `up` as possible.
///
/// Falls back to an arbitrary perpendicular up axis when `forward` and `up` are parallel.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let back = -forward.try_normalize().unwrap_or(Vec3::NEG_Z);
    let up = up.try_normalize().unwrap_or(Vec3::Y);
    let right = up
        .cross(back)
        .try_normalize()
        .unwrap_or_else(|| back.any_orthonormal_vector());
    let up = back.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, back))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::new(0.3, 60.0, 16.0 / 9.0)
    }

    #[test]
    fn identity_corners_sit_in_front_of_the_camera() {
        let plane = intrinsics().near_plane().unwrap();
        let corners = compute_corners(&intrinsics(), Quat::IDENTITY).unwrap();
        let [top_left, top_right, bottom_right, bottom_left] = corners.0;
        for corner in corners.0 {
            assert!((corner.z + 0.3).abs() < 1e-6);
            assert!((corner.truncate().length() - plane.half_diagonal()).abs() < 1e-5);
        }
        assert!(top_left.x < 0.0 && top_left.y > 0.0);
        assert!(top_right.x > 0.0 && top_right.y > 0.0);
        assert!(bottom_right.x > 0.0 && bottom_right.y < 0.0);
        assert!(bottom_left.x < 0.0 && bottom_left.y < 0.0);
    }

    #[test]
    fn corners_follow_orientation() {
        let orientation = look_rotation(Vec3::X, Vec3::Y);
        let corners = compute_corners(&intrinsics(), orientation).unwrap();
        for corner in corners.0 {
            assert!((corner.x - 0.3).abs() < 1e-5);
        }
        let half_width = intrinsics().near_plane().unwrap().half_width();
        let world = corners.at(Vec3::new(0.0, 0.0, 5.0));
        assert!(world
            .iter()
            .all(|corner| ((corner.z - 5.0).abs() - half_width).abs() < 1e-5));
    }

    #[test]
    fn invalid_intrinsics_fail() {
        let result = compute_corners(&CameraIntrinsics::new(0.3, 190.0, 1.0), Quat::IDENTITY);
        assert!(matches!(result, Err(FollowCamError::InvalidIntrinsics { .. })));
    }

    #[test]
    fn look_rotation_faces_forward() {
        let forward = Vec3::new(1.0, -1.0, 2.0).normalize();
        let rotation = look_rotation(forward, Vec3::Y);
        assert!((rotation * Vec3::NEG_Z).distance(forward) < 1e-5);
        assert!((rotation * Vec3::X).y.abs() < 1e-5, "no roll");

        // Straight down still yields a valid rotation.
        let down = look_rotation(Vec3::NEG_Y, Vec3::Y);
        assert!((down * Vec3::NEG_Z).distance(Vec3::NEG_Y) < 1e-5);
        assert!(down.is_normalized());
    }
}
