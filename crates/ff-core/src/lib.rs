//! ff-core: Shared types, feedback curve and preferences for Freefall
//!
//! Freefall watches a player's height inside a host game loop and turns falls
//! into punishment and climbs into rewards on a networked feedback device.
//! This crate holds the pieces every other crate agrees on:
//!
//! - [`curve`]: the pure distance → (intensity, duration) mapping
//! - [`preferences`]: persisted user settings and the shared settings store
//! - [`hud`]: on-screen text formatting for feedback events
//!
//! Coordinates follow the host convention: Y decreases upward, so a fall is a
//! positive delta and progress is a negative one.

mod error;
pub mod curve;
pub mod hud;
pub mod preferences;

pub use curve::*;
pub use error::*;
pub use hud::*;
pub use preferences::*;

use serde::{Deserialize, Serialize};

/// Supported feedback devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeviceKind {
    /// No device configured, feedback goes nowhere
    #[default]
    None,
    /// PiShock networked shocker
    PiShock,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 2] = [DeviceKind::None, DeviceKind::PiShock];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::PiShock => "PiShock",
        }
    }
}

impl std::str::FromStr for DeviceKind {
    type Err = FfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "pishock" => Ok(Self::PiShock),
            other => Err(FfError::InvalidParam(format!("unknown device: {other}"))),
        }
    }
}
