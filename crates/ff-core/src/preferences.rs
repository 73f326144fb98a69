//! Preferences System
//!
//! Persistent user settings for Freefall:
//! - Punishment and reward curve parameters
//! - Device selection and on-screen display behavior
//! - PiShock credentials
//!
//! Settings are plain data. Persistence happens explicitly through
//! [`SettingsStore::update`], never from inside the data types themselves.
//! Missing or malformed files fall back to defaults and never block startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::curve::FeedbackConfig;
use crate::error::FfResult;
use crate::hud::DisplayBehavior;
use crate::DeviceKind;

/// Longest duration the settings allow (seconds)
pub const MAX_DURATION: f32 = 15.0;
/// Highest intensity the settings allow
pub const MAX_INTENSITY: f32 = 100.0;
/// Longest fall distance the settings allow
pub const MAX_FALL_DISTANCE: f32 = 5000.0;
/// Longest reward distance the settings allow
pub const MAX_REWARD_DISTANCE: f32 = 300.0;

/// A settings object that can live in a [`SettingsStore`]
pub trait Preferences: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static {
    /// File name inside the settings directory
    const FILE_NAME: &'static str;

    /// Repair hand-edited values after loading
    fn sanitize(&mut self) {}
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEEDBACK PREFERENCES
// ═══════════════════════════════════════════════════════════════════════════════

/// General feedback preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackPreferences {
    /// Master switch for the whole system
    pub mod_enabled: bool,
    /// Which device receives feedback
    pub feedback_device: DeviceKind,
    /// How feedback is described on screen
    pub display_behavior: DisplayBehavior,
    /// Round feedback durations to whole seconds
    pub round_durations: bool,
    /// Fall punishment settings
    pub punishment: PunishmentPreferences,
    /// Climb reward settings
    pub reward: RewardPreferences,
}

impl Default for FeedbackPreferences {
    fn default() -> Self {
        Self {
            mod_enabled: true,
            feedback_device: DeviceKind::None,
            display_behavior: DisplayBehavior::FeedbackIntensityAndDuration,
            round_durations: false,
            punishment: PunishmentPreferences::default(),
            reward: RewardPreferences::default(),
        }
    }
}

/// Punishment preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PunishmentPreferences {
    pub enabled: bool,
    pub min_duration: f32,
    pub max_duration: f32,
    pub min_intensity: f32,
    pub max_intensity: f32,
    pub min_fall_distance: f32,
    pub max_fall_distance: f32,
    /// Vibrate instead of shock
    pub easy_mode: bool,
}

impl Default for PunishmentPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            min_duration: 1.0,
            max_duration: 1.0,
            min_intensity: 1.0,
            max_intensity: 15.0,
            min_fall_distance: 150.0,
            max_fall_distance: 1000.0,
            easy_mode: false,
        }
    }
}

/// Reward preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardPreferences {
    pub enabled: bool,
    pub min_duration: f32,
    pub max_duration: f32,
    pub min_intensity: f32,
    pub max_intensity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Only reward height beyond the best point reached so far
    pub progress_only: bool,
}

impl Default for RewardPreferences {
    fn default() -> Self {
        Self {
            enabled: false,
            min_duration: 1.0,
            max_duration: 1.0,
            min_intensity: 10.0,
            max_intensity: 100.0,
            min_distance: 0.0,
            max_distance: 150.0,
            progress_only: true,
        }
    }
}

impl FeedbackPreferences {
    /// Curve used for falls
    pub fn punishment_curve(&self) -> FeedbackConfig {
        let p = &self.punishment;
        FeedbackConfig {
            min_distance: p.min_fall_distance,
            max_distance: p.max_fall_distance,
            min_intensity: p.min_intensity,
            max_intensity: p.max_intensity,
            min_duration: p.min_duration,
            max_duration: p.max_duration,
            round_durations: self.round_durations,
            enabled: p.enabled,
        }
    }

    /// Curve used for climbs
    pub fn reward_curve(&self) -> FeedbackConfig {
        let r = &self.reward;
        FeedbackConfig {
            min_distance: r.min_distance,
            max_distance: r.max_distance,
            min_intensity: r.min_intensity,
            max_intensity: r.max_intensity,
            min_duration: r.min_duration,
            max_duration: r.max_duration,
            round_durations: self.round_durations,
            enabled: r.enabled,
        }
    }
}

impl Preferences for FeedbackPreferences {
    const FILE_NAME: &'static str = "feedback.json";

    /// Clamp every slider value into its editable range and lift each
    /// maximum to at least its minimum.
    fn sanitize(&mut self) {
        let p = &mut self.punishment;
        clamp_pair(&mut p.min_duration, &mut p.max_duration, MAX_DURATION);
        clamp_pair(&mut p.min_intensity, &mut p.max_intensity, MAX_INTENSITY);
        clamp_pair(&mut p.min_fall_distance, &mut p.max_fall_distance, MAX_FALL_DISTANCE);

        let r = &mut self.reward;
        clamp_pair(&mut r.min_duration, &mut r.max_duration, MAX_DURATION);
        clamp_pair(&mut r.min_intensity, &mut r.max_intensity, MAX_INTENSITY);
        clamp_pair(&mut r.min_distance, &mut r.max_distance, MAX_REWARD_DISTANCE);
    }
}

fn clamp_pair(min: &mut f32, max: &mut f32, ceiling: f32) {
    let fix = |v: f32| if v.is_finite() { v.clamp(0.0, ceiling) } else { 0.0 };
    *min = fix(*min);
    *max = fix(*max).max(*min);
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEVICE PREFERENCES
// ═══════════════════════════════════════════════════════════════════════════════

/// PiShock API credentials
#[derive(Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PiShockPreferences {
    pub username: String,
    pub api_key: String,
    pub share_code: String,
}

impl PiShockPreferences {
    /// All three credentials are filled in
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.api_key.is_empty() && !self.share_code.is_empty()
    }
}

// Keep the API key out of logs
impl std::fmt::Debug for PiShockPreferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiShockPreferences")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .field("share_code", &self.share_code)
            .finish()
    }
}

impl Preferences for PiShockPreferences {
    const FILE_NAME: &'static str = "pishock.json";
}

// ═══════════════════════════════════════════════════════════════════════════════
// SETTINGS STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Shared, optionally file-backed handle to a settings object
///
/// Cloning the store clones the handle, not the settings.
pub struct SettingsStore<T> {
    inner: Arc<RwLock<T>>,
    path: Option<Arc<PathBuf>>,
}

impl<T> Clone for SettingsStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            path: self.path.clone(),
        }
    }
}

impl<T: Preferences> SettingsStore<T> {
    /// Store that is never written to disk
    pub fn in_memory(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
            path: None,
        }
    }

    /// Load from `dir/T::FILE_NAME`, falling back to defaults
    pub fn load_in(dir: &Path) -> Self {
        Self::load_or_default(dir.join(T::FILE_NAME))
    }

    /// Load from a file, falling back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut value = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("[Preferences] {:?} is malformed, using defaults: {}", path, e);
                T::default()
            }),
            Err(_) => T::default(),
        };
        value.sanitize();

        Self {
            inner: Arc::new(RwLock::new(value)),
            path: Some(Arc::new(path)),
        }
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().map(PathBuf::as_path)
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> T {
        self.inner.read().clone()
    }

    /// Read a value without cloning the whole object
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.read())
    }

    /// Mutate the settings and persist them
    ///
    /// A failed save is logged and otherwise ignored; the in-memory value is
    /// still updated.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.write());
        if let Err(e) = self.save() {
            log::warn!("[Preferences] Failed to save {}: {}", T::FILE_NAME, e);
        }
    }

    /// Write the current settings to the backing file
    pub fn save(&self) -> FfResult<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&*self.inner.read())?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Default settings directory
pub fn default_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("freefall"))
        .unwrap_or_else(|| PathBuf::from("."))
}
