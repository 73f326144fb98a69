//! # Freefall Trigger Engine
//!
//! Per-frame state machine that turns a player's vertical movement into
//! feedback.
//!
//! ## Architecture
//!
//! - **Host**: the game loop, seen only through [`HostAdapter`] and explicit hook calls
//! - **Tracking**: grounded/airborne transitions, progress watermark, teleport offset
//! - **Curve**: distance → magnitude, see [`ff_core::evaluate`]
//! - **Device**: one live [`ff_device::FeedbackDevice`], swapped when settings change
//! - **HUD**: last action text and incoming punishment preview for the host to draw
//!
//! ## Frame Safety
//!
//! Nothing in the engine blocks or awaits. Device calls return immediately and
//! a missing body or device turns the frame into a no-op.

pub mod engine;
pub mod host;
pub mod hud;
pub mod tracking;

pub use engine::*;
pub use host::*;
pub use hud::*;
pub use tracking::*;

/// Nominal host timestep (seconds)
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;

/// Safety margin applied to host velocity limits before calling a jump a teleport
pub const TELEPORT_VELOCITY_MARGIN: f32 = 1.25;

/// Feedback stays off this long after a detected teleport (seconds)
pub const TELEPORT_COOLDOWN_SECS: f32 = 0.1;

/// How long the last action stays on screen (seconds)
pub const LAST_ACTION_DISPLAY_SECS: f32 = 3.0;

/// Intensity used for connectivity test pulses
pub const TEST_PULSE_INTENSITY: f32 = 50.0;

/// Duration used for connectivity test pulses (seconds)
pub const TEST_PULSE_DURATION: f32 = 1.0;
