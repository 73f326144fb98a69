//! On-screen feedback text
//!
//! The host draws whatever text the engine hands it; this module only decides
//! what that text says and what color it has.

use serde::{Deserialize, Serialize};

use crate::curve::FeedbackResult;

/// How feedback events are described on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DisplayBehavior {
    /// "Punishment! (8% x 1s)"
    #[default]
    FeedbackIntensityAndDuration,
    /// "Punishment! (50%)" - position inside the distance range
    DistanceBasedPercentage,
    /// "Punishment!"
    MessageOnly,
}

impl DisplayBehavior {
    pub const ALL: [DisplayBehavior; 3] = [
        DisplayBehavior::FeedbackIntensityAndDuration,
        DisplayBehavior::DistanceBasedPercentage,
        DisplayBehavior::MessageOnly,
    ];
}

/// RGBA color (0.0-1.0 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const LIME: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Same color with a different alpha
    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Build the display string for a feedback result
///
/// Values are rounded to keep the string short: intensity to a whole
/// percent, duration to two decimals.
pub fn format_feedback(
    label: &str,
    feedback: &FeedbackResult,
    behavior: DisplayBehavior,
    suffix: &str,
) -> String {
    match behavior {
        DisplayBehavior::FeedbackIntensityAndDuration => format!(
            "{label} ({}% x {}s){suffix}",
            feedback.intensity.round(),
            round_to(feedback.duration, 2)
        ),
        DisplayBehavior::DistanceBasedPercentage => {
            format!("{label} ({}%){suffix}", (feedback.fraction * 100.0).round())
        }
        DisplayBehavior::MessageOnly => format!("{label}{suffix}"),
    }
}

fn round_to(value: f32, decimals: i32) -> f32 {
    let scale = 10f32.powi(decimals);
    (value * scale).round() / scale
}
