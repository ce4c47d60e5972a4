//! A third-person follow camera for Bevy that keeps its view clear of scene geometry.
//!
//! The camera orbits a pivot that chases a target entity. Every frame it asks the scene how far
//! back it may sit before something cuts into its near clip plane, and moves in front of any
//! obstruction before it can be seen through.
//!
//! # Getting started
//!
//! Add [`DefaultFollowCamPlugins`], insert a [`CollisionBackend`](collision::CollisionBackend)
//! that can answer queries against your scene, and add a [`FollowCam`](prelude::FollowCam) to a
//! camera:
//!
//! ```no_run
//! use bevy::prelude::*;
//! use bevy_follow_cam::prelude::*;
//!
//! fn setup(mut commands: Commands) {
//!     commands.insert_resource(CollisionBackend::new(
//!         StaticColliders::new().with(Collider::wall(Vec3::ZERO, Dir3::Y)),
//!     ));
//!     commands.spawn((Transform::from_xyz(0.0, 1.0, 0.0), FollowTarget));
//!     commands.spawn((Camera3d::default(), FollowCam::default()));
//! }
//!
//! App::new()
//!     .add_plugins((DefaultPlugins, DefaultFollowCamPlugins))
//!     .add_systems(Startup, setup)
//!     .run();
//! ```
//!
//! # Collision backends
//!
//! The camera doesn't ship a physics engine. Implement
//! [`CollisionQuery`](collision::CollisionQuery) for whatever your game already uses, or use
//! [`StaticColliders`](collision::StaticColliders) for scenes built from walls and boxes. With no
//! backend present, the camera behaves as if the scene were empty.
//!
//! # Occlusion modes
//!
//! [`OcclusionMode::Fast`](occlusion::OcclusionMode::Fast) sweeps the near plane rectangle from
//! the pivot toward the camera once. [`OcclusionMode::Precise`](occlusion::OcclusionMode::Precise)
//! casts from the pivot to each near plane corner and iterates until all four are clear, which
//! catches thin geometry that a single sweep can step over.

#![warn(missing_docs)]

pub mod collision;
pub mod controller;
pub mod error;
pub mod extensions;
pub mod occlusion;

/// Common imports.
pub mod prelude {
    pub use crate::{
        collision::{
            BoxSweep, Collider, CollisionBackend, CollisionMask, CollisionQuery, EmptyScene, Hit,
            StaticColliders,
        },
        controller::{
            component::{FollowCam, FollowCamDiagnostics, FollowTarget, Sensitivity},
            inputs::{FollowCamBindings, FollowCamInput, FollowCamInputPlugin},
            smoothing::Smoothing,
            FollowCamPlugin, FollowCamSystems,
        },
        error::FollowCamError,
        occlusion::{CameraIntrinsics, OcclusionMode, OcclusionResult, OcclusionSettings},
        DefaultFollowCamPlugins,
    };
}

/// Adds the follow camera, mouse and keyboard input, and enabled extensions.
pub struct DefaultFollowCamPlugins;

impl bevy_app::PluginGroup for DefaultFollowCamPlugins {
    fn build(self) -> bevy_app::PluginGroupBuilder {
        let group = bevy_app::PluginGroupBuilder::start::<Self>()
            .add(controller::FollowCamPlugin)
            .add(controller::inputs::FollowCamInputPlugin);

        #[cfg(feature = "extension_occlusion_indicator")]
        let group = group.add(extensions::occlusion_indicator::OcclusionIndicatorPlugin);

        group
    }
}
