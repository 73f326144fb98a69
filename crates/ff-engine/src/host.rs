//! Host adapter boundary
//!
//! The engine reads exactly three things from the game each frame: the
//! player's body, whether the game is paused, and the physics velocity
//! limits. Lifecycle events (level start/end, teleports) arrive as explicit
//! calls on [`crate::FeedbackEngine`].

use serde::{Deserialize, Serialize};

use crate::TELEPORT_VELOCITY_MARGIN;

/// One frame's view of the player body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySample {
    /// Raw Y coordinate. Y decreases upward.
    pub y: f32,
    pub on_ground: bool,
    /// Standing on a soft surface (sand). Counts as grounded.
    #[serde(default)]
    pub on_soft_ground: bool,
}

impl BodySample {
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.on_ground || self.on_soft_ground
    }
}

/// Largest per-frame vertical speeds the host physics can produce
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsLimits {
    /// Upward jump speed (units per frame, sign ignored)
    pub max_rise_speed: f32,
    /// Terminal fall speed (units per frame, sign ignored)
    pub max_fall_speed: f32,
}

impl PhysicsLimits {
    /// Whether a per-frame Y change is beyond anything the physics can do
    pub fn is_teleport(&self, velocity: f32) -> bool {
        if velocity > 0.0 {
            velocity > self.max_fall_speed.abs() * TELEPORT_VELOCITY_MARGIN
        } else {
            -velocity > self.max_rise_speed.abs() * TELEPORT_VELOCITY_MARGIN
        }
    }
}

/// What the engine needs from the running game
pub trait HostAdapter {
    /// `None` while no player body exists (menus, loading)
    fn body(&self) -> Option<BodySample>;

    fn is_paused(&self) -> bool;

    fn physics(&self) -> PhysicsLimits;

    /// True while the user holds the manual test input
    fn test_requested(&self) -> bool {
        false
    }
}
