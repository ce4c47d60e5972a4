//! The collision query seam the follow camera consults every frame.
//!
//! The camera never owns scene geometry. It asks a [`CollisionQuery`] backend three kinds of
//! questions: does a thin oriented box hit something while sweeping along a direction, does a
//! straight segment between two points hit something, and does a ray of bounded length hit
//! something. Hosts with a physics engine implement [`CollisionQuery`] on top of it and insert a
//! [`CollisionBackend`] resource. [`StaticColliders`] is a small exact backend for tests, tools
//! and scenes made of walls and boxes.
//!
//! A backend that cannot answer returns [`CollisionQueryError`]. The camera treats that as "no
//! hit": a camera that stays too far away is less disruptive than one that collapses onto its
//! pivot.

use std::sync::Arc;

use bevy_derive::Deref;
use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use thiserror::Error;

pub mod colliders;

pub use colliders::{Collider, Shape, StaticColliders};

/// Selects which scene layers count as solid for a query. Each bit is a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct CollisionMask(pub u32);

impl CollisionMask {
    /// Every layer is solid.
    pub const ALL: Self = Self(u32::MAX);
    /// No layer is solid; queries never hit.
    pub const NONE: Self = Self(0);

    /// A mask containing only `layer`.
    ///
    /// There are 32 layers, numbered `0..32`. Passing a larger number panics in debug builds, and
    /// wraps around to `layer % 32` in release builds.
    pub const fn layer(layer: u32) -> Self {
        debug_assert!(layer < 32, "collision layers are numbered 0..32");
        Self(1 << (layer % 32))
    }

    /// This mask with `layer` added.
    #[must_use]
    pub const fn with_layer(self, layer: u32) -> Self {
        Self(self.0 | Self::layer(layer).0)
    }

    /// Do the two masks share at least one layer?
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for CollisionMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// The first solid surface found by a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Distance travelled along the query direction before touching the surface.
    pub distance: f32,
    /// World space contact point.
    pub point: Vec3,
}

/// An oriented box swept along a direction.
///
/// The follow camera sweeps a box with zero depth, the size of its near clip plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSweep {
    /// Center of the box at the start of the sweep.
    pub origin: Vec3,
    /// Half size of the box along its local axes.
    pub half_extents: Vec3,
    /// Direction of travel.
    pub direction: Dir3,
    /// Rotation of the box's local axes.
    pub orientation: Quat,
    /// How far the box travels.
    pub max_distance: f32,
}

/// A backend failed to run a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollisionQueryError {
    /// The backend is not ready or has been torn down.
    #[error("collision backend unavailable: {0}")]
    Unavailable(String),
}

/// Answers the geometric questions the follow camera asks about the scene.
///
/// Queries that start inside a solid are expected to ignore that solid, matching the behavior of
/// common physics engines.
pub trait CollisionQuery: Send + Sync + 'static {
    /// Sweep an oriented box and report the first surface it touches.
    fn sweep_box(
        &self,
        sweep: &BoxSweep,
        mask: CollisionMask,
    ) -> Result<Option<Hit>, CollisionQueryError>;

    /// Report the first surface on the segment from `from` to `to`.
    fn linecast(
        &self,
        from: Vec3,
        to: Vec3,
        mask: CollisionMask,
    ) -> Result<Option<Hit>, CollisionQueryError>;

    /// Report the first surface on a ray no longer than `max_distance`.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Dir3,
        max_distance: f32,
        mask: CollisionMask,
    ) -> Result<Option<Hit>, CollisionQueryError>;
}

/// A scene with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScene;

impl CollisionQuery for EmptyScene {
    fn sweep_box(&self, _: &BoxSweep, _: CollisionMask) -> Result<Option<Hit>, CollisionQueryError> {
        Ok(None)
    }

    fn linecast(&self, _: Vec3, _: Vec3, _: CollisionMask) -> Result<Option<Hit>, CollisionQueryError> {
        Ok(None)
    }

    fn raycast(
        &self,
        _: Vec3,
        _: Dir3,
        _: f32,
        _: CollisionMask,
    ) -> Result<Option<Hit>, CollisionQueryError> {
        Ok(None)
    }
}

/// The scene backend used by all follow cameras in the world.
///
/// Without this resource, cameras behave as if the scene were empty.
#[derive(Resource, Clone, Deref)]
pub struct CollisionBackend(pub Arc<dyn CollisionQuery>);

impl CollisionBackend {
    /// Wrap a backend so it can be inserted as a resource.
    pub fn new(query: impl CollisionQuery) -> Self {
        Self(Arc::new(query))
    }
}

impl std::fmt::Debug for CollisionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CollisionBackend").field(&"<backend>").finish()
    }
}

/// Resolve the backend systems should query, falling back to an empty scene.
pub(crate) fn scene_or_empty(backend: Option<&CollisionBackend>) -> &dyn CollisionQuery {
    match backend {
        Some(backend) => backend.0.as_ref(),
        None => {
            warn_once!("No `CollisionBackend` resource; follow cameras will ignore scene geometry");
            &EmptyScene
        }
    }
}

/// Collapse a failed query into "no hit".
pub(crate) fn hit_or_clear(result: Result<Option<Hit>, CollisionQueryError>) -> Option<Hit> {
    result.unwrap_or_else(|err| {
        warn_once!("{err}; treating the query as unobstructed");
        None
    })
}

/// A backend whose every query fails.
#[cfg(test)]
pub(crate) struct Offline;

#[cfg(test)]
impl CollisionQuery for Offline {
    fn sweep_box(&self, _: &BoxSweep, _: CollisionMask) -> Result<Option<Hit>, CollisionQueryError> {
        Err(CollisionQueryError::Unavailable("offline".into()))
    }

    fn linecast(&self, _: Vec3, _: Vec3, _: CollisionMask) -> Result<Option<Hit>, CollisionQueryError> {
        Err(CollisionQueryError::Unavailable("offline".into()))
    }

    fn raycast(
        &self,
        _: Vec3,
        _: Dir3,
        _: f32,
        _: CollisionMask,
    ) -> Result<Option<Hit>, CollisionQueryError> {
        Err(CollisionQueryError::Unavailable("offline".into()))
    }
}
