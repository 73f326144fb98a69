//! Feedback Curve
//!
//! Maps a vertical movement distance onto a feedback magnitude by linear
//! interpolation between a configured minimum and maximum. The mapping is a
//! pure function so the trigger engine, the HUD preview and tests can all call
//! it with the same inputs and get the same answer.

use serde::{Deserialize, Serialize};

/// Interpolation settings for one kind of feedback (punishment or reward)
///
/// Values are user-editable and are not required to satisfy `min <= max`.
/// A distance range with `max_distance <= min_distance` has no interpolation
/// width and always yields the minimum magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Distance below which nothing triggers
    pub min_distance: f32,
    /// Distance at which the maximum magnitude is reached
    pub max_distance: f32,
    /// Intensity at `min_distance` (0-100)
    pub min_intensity: f32,
    /// Intensity at `max_distance` (0-100)
    pub max_intensity: f32,
    /// Duration at `min_distance` (seconds)
    pub min_duration: f32,
    /// Duration at `max_distance` (seconds)
    pub max_duration: f32,
    /// Round the resulting duration to whole seconds
    pub round_durations: bool,
    /// Master switch for this kind of feedback
    pub enabled: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            min_distance: 0.0,
            max_distance: 0.0,
            min_intensity: 0.0,
            max_intensity: 0.0,
            min_duration: 0.0,
            max_duration: 0.0,
            round_durations: false,
            enabled: false,
        }
    }
}

/// Outcome of a single curve evaluation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeedbackResult {
    /// Whether feedback should be sent at all
    pub trigger: bool,
    /// Position of the distance inside the configured range (0.0-1.0)
    pub fraction: f32,
    /// Interpolated intensity
    pub intensity: f32,
    /// Interpolated duration in seconds
    pub duration: f32,
}

impl FeedbackResult {
    /// A result that never fires
    pub const NONE: Self = Self {
        trigger: false,
        fraction: 0.0,
        intensity: 0.0,
        duration: 0.0,
    };
}

/// Evaluate the feedback curve for a movement distance
///
/// Only the magnitude of `distance` matters; callers decide whether it was a
/// fall or a climb.
pub fn evaluate(distance: f32, config: &FeedbackConfig) -> FeedbackResult {
    if !config.enabled || !distance.is_finite() {
        return FeedbackResult::NONE;
    }

    let distance = distance.abs();
    if distance < config.min_distance {
        return FeedbackResult::NONE;
    }

    let range = config.max_distance - config.min_distance;
    let fraction = if range > 0.0 {
        ((distance - config.min_distance) / range).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let intensity = lerp(config.min_intensity, config.max_intensity, fraction);
    let mut duration = lerp(config.min_duration, config.max_duration, fraction);
    if config.round_durations {
        // f32::round rounds half away from zero
        duration = duration.round();
    }

    FeedbackResult {
        // Degenerate settings must not fire silent zero-strength feedback
        trigger: duration > 0.0 && intensity > 0.0,
        fraction,
        intensity,
        duration,
    }
}

#[inline]
fn lerp(min: f32, max: f32, t: f32) -> f32 {
    min + (max - min) * t
}
