//! Camera intrinsics and the near clip plane derived from them.

use bevy_reflect::prelude::*;
use bevy_render::prelude::*;

use crate::error::FollowCamError;

/// The parts of a perspective camera the occlusion queries depend on.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct CameraIntrinsics {
    /// Distance from the camera to the near clip plane.
    pub near: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Viewport width divided by height.
    pub aspect_ratio: f32,
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self::from_perspective(&PerspectiveProjection::default())
    }
}

impl CameraIntrinsics {
    /// Create intrinsics from raw values. Use [`CameraIntrinsics::near_plane`] to validate them.
    pub fn new(near: f32, fov_degrees: f32, aspect_ratio: f32) -> Self {
        Self {
            near,
            fov_degrees,
            aspect_ratio,
        }
    }

    /// Read the intrinsics of a Bevy perspective projection, whose field of view is in radians.
    pub fn from_perspective(perspective: &PerspectiveProjection) -> Self {
        Self {
            near: perspective.near,
            fov_degrees: perspective.fov.to_degrees(),
            aspect_ratio: perspective.aspect_ratio,
        }
    }

    /// Check that these intrinsics describe a real near clip plane.
    pub fn validate(&self) -> Result<(), FollowCamError> {
        let reason = if !(self.near.is_finite() && self.near > 0.0) {
            "near plane distance must be positive"
        } else if !(self.fov_degrees.is_finite() && self.fov_degrees > 0.0 && self.fov_degrees < 180.0)
        {
            "field of view must be between 0 and 180 degrees"
        } else if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            "aspect ratio must be positive"
        } else {
            return Ok(());
        };
        Err(FollowCamError::InvalidIntrinsics {
            near: self.near,
            fov_degrees: self.fov_degrees,
            aspect: self.aspect_ratio,
            reason,
        })
    }

    /// Compute the near clip plane dimensions.
    pub fn near_plane(&self) -> Result<NearPlane, FollowCamError> {
        self.validate()?;
        Ok(NearPlane::derive(self))
    }
}

/// Dimensions of the near clip plane rectangle. Always derived as a whole from
/// [`CameraIntrinsics`], so the values can never disagree with each other.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct NearPlane {
    distance: f32,
    half_height: f32,
    half_width: f32,
    half_diagonal: f32,
}

impl Default for NearPlane {
    fn default() -> Self {
        Self::derive(&CameraIntrinsics::default())
    }
}

impl NearPlane {
    fn derive(intrinsics: &CameraIntrinsics) -> Self {
        let half_height = (intrinsics.fov_degrees.to_radians() / 2.0).tan() * intrinsics.near;
        let half_width = half_height * intrinsics.aspect_ratio;
        Self {
            distance: intrinsics.near,
            half_height,
            half_width,
            half_diagonal: half_height.hypot(half_width),
        }
    }

    /// Distance from the camera to the plane.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Half the plane's height.
    pub fn half_height(&self) -> f32 {
        self.half_height
    }

    /// Half the plane's width.
    pub fn half_width(&self) -> f32 {
        self.half_width
    }

    /// Distance from the plane's center to any of its corners.
    pub fn half_diagonal(&self) -> f32 {
        self.half_diagonal
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    #[test]
    fn derived_dimensions_are_consistent_for_sampled_cameras() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let intrinsics = CameraIntrinsics::new(
                rng.gen_range(1e-3..10.0),
                rng.gen_range(0.5..179.5),
                rng.gen_range(0.1..5.0),
            );
            let plane = intrinsics.near_plane().unwrap();
            assert!(plane.half_height() >= 0.0);
            assert!(plane.half_width() >= 0.0);
            assert!(plane.half_diagonal() >= plane.half_height().max(plane.half_width()));
            assert_eq!(plane.distance(), intrinsics.near);
        }
    }

    #[test]
    fn sixty_degree_camera() {
        let plane = CameraIntrinsics::new(0.3, 60.0, 16.0 / 9.0).near_plane().unwrap();
        let half_height = 0.3 * (30f32).to_radians().tan();
        assert!((plane.half_height() - half_height).abs() < 1e-6);
        assert!((plane.half_width() - half_height * 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_degenerate_intrinsics() {
        for (near, fov, aspect) in [
            (0.0, 60.0, 1.0),
            (-1.0, 60.0, 1.0),
            (0.1, 0.0, 1.0),
            (0.1, 180.0, 1.0),
            (0.1, 60.0, 0.0),
            (0.1, f32::NAN, 1.0),
        ] {
            let result = CameraIntrinsics::new(near, fov, aspect).near_plane();
            assert!(
                matches!(result, Err(FollowCamError::InvalidIntrinsics { .. })),
                "{near} {fov} {aspect} should be rejected"
            );
        }
    }

    #[test]
    fn reads_bevy_projection_in_degrees() {
        let perspective = PerspectiveProjection {
            fov: std::f32::consts::FRAC_PI_2,
            aspect_ratio: 2.0,
            near: 0.5,
            ..Default::default()
        };
        let intrinsics = CameraIntrinsics::from_perspective(&perspective);
        assert!((intrinsics.fov_degrees - 90.0).abs() < 1e-4);
        assert_eq!(intrinsics.aspect_ratio, 2.0);
        assert_eq!(intrinsics.near, 0.5);
    }
}
