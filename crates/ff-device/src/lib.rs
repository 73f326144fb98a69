//! # ff-device: Feedback Devices
//!
//! The trigger engine talks to hardware only through [`FeedbackDevice`].
//!
//! ## Policy
//!
//! - `punish` fires the strong effect (shock), or the weak one (vibrate) in easy mode
//! - `reward` always fires the weak effect
//! - `test` fires an intensity-independent pulse (beep) to confirm connectivity
//!
//! Every call returns immediately. Network work happens in the background and
//! failures never reach the caller.

pub mod pishock;

pub use pishock::*;

use ff_core::{DeviceKind, PiShockPreferences, SettingsStore};

/// A device that can deliver feedback to the player
pub trait FeedbackDevice: Send {
    /// Which device kind this implements
    fn kind(&self) -> DeviceKind;

    /// Advance any time-based device state
    fn update(&mut self, delta_secs: f32);

    /// Punish the player. `intensity` is 0-100, `duration` in seconds.
    fn punish(&mut self, intensity: f32, duration: f32, easy_mode: bool);

    /// Reward the player. `intensity` is 0-100, `duration` in seconds.
    fn reward(&mut self, intensity: f32, duration: f32);

    /// Fire a harmless pulse so the user can confirm the device is reachable
    fn test(&mut self, intensity: f32, duration: f32);

    /// Release network resources. In-flight requests are abandoned silently.
    fn dispose(&mut self);
}

/// Builds devices by kind
pub trait DeviceFactory {
    /// `None` when the kind has no device or the device could not be built
    fn create(&self, kind: DeviceKind) -> Option<Box<dyn FeedbackDevice>>;
}

/// Factory for the devices Freefall ships with
pub struct StandardDeviceFactory {
    pishock: SettingsStore<PiShockPreferences>,
}

impl StandardDeviceFactory {
    pub fn new(pishock: SettingsStore<PiShockPreferences>) -> Self {
        Self { pishock }
    }
}

impl DeviceFactory for StandardDeviceFactory {
    fn create(&self, kind: DeviceKind) -> Option<Box<dyn FeedbackDevice>> {
        match kind {
            DeviceKind::None => None,
            DeviceKind::PiShock => match PiShockDevice::connect(self.pishock.clone()) {
                Ok(device) => {
                    if !self.pishock.read(PiShockPreferences::is_complete) {
                        log::warn!("[Devices] PiShock selected but credentials are incomplete");
                    }
                    Some(Box::new(device))
                }
                Err(e) => {
                    log::error!("[Devices] Failed to create PiShock device: {}", e);
                    None
                }
            },
        }
    }
}
