//! Input sampling for follow cameras.
//!
//! [`FollowCamInput`] is what the rig reads. [`FollowCamInputPlugin`] fills it from the mouse and
//! keyboard, but any system can write to it instead, e.g. to drive the camera from a gamepad.

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_input::{
    mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit},
    prelude::*,
    InputSystem,
};
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;

use super::FollowCamSystems;

/// Look and zoom input gathered since the rig last ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Component, Reflect)]
pub struct FollowCamInput {
    /// Look delta in screen space: +x is right, +y is down.
    pub look: Vec2,
    /// Zoom delta: positive zooms in.
    pub zoom: f32,
    /// Is the sprint modifier held? Not used by the camera; exposed for locomotion controllers.
    pub sprint: bool,
}

impl FollowCamInput {
    /// Add to the pending look and zoom deltas.
    pub fn accumulate(&mut self, look: Vec2, zoom: f32) {
        self.look += look;
        self.zoom += zoom;
    }

    /// Take the pending look and zoom deltas, leaving zero behind.
    pub fn take(&mut self) -> (Vec2, f32) {
        let motion = (self.look, self.zoom);
        self.look = Vec2::ZERO;
        self.zoom = 0.0;
        motion
    }
}

/// How raw device input maps onto [`FollowCamInput`].
#[derive(Debug, Clone, Resource, Reflect)]
pub struct FollowCamBindings {
    /// Key that reports as [`FollowCamInput::sprint`].
    pub sprint: KeyCode,
    /// Look units per pixel of mouse motion.
    pub mouse_motion_scale: f32,
    /// Zoom units per scroll wheel line.
    pub scroll_line_scale: f32,
    /// Zoom units per scrolled pixel, for trackpads.
    pub scroll_pixel_scale: f32,
}

impl Default for FollowCamBindings {
    fn default() -> Self {
        Self {
            sprint: KeyCode::Space,
            mouse_motion_scale: 0.1,
            scroll_line_scale: 0.1,
            scroll_pixel_scale: 0.005,
        }
    }
}

/// Feeds mouse and keyboard input into every [`FollowCamInput`].
pub struct FollowCamInputPlugin;

impl Plugin for FollowCamInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FollowCamBindings>()
            .register_type::<FollowCamBindings>()
            .add_systems(
                PreUpdate,
                sample_mouse_and_keyboard
                    .after(InputSystem)
                    .before(FollowCamSystems::AcquireTarget),
            );
    }
}

/// Read this frame's mouse motion, scroll and sprint key.
pub fn sample_mouse_and_keyboard(
    bindings: Res<FollowCamBindings>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    keys: Res<ButtonInput<KeyCode>>,
    mut inputs: Query<&mut FollowCamInput>,
) {
    let look = motion.delta * bindings.mouse_motion_scale;
    let zoom = scroll.delta.y
        * match scroll.unit {
            MouseScrollUnit::Line => bindings.scroll_line_scale,
            MouseScrollUnit::Pixel => bindings.scroll_pixel_scale,
        };
    let sprint = keys.pressed(bindings.sprint);

    for mut input in &mut inputs {
        if look != Vec2::ZERO || zoom != 0.0 {
            input.accumulate(look, zoom);
        }
        if input.sprint != sprint {
            input.sprint = sprint;
        }
    }
}
