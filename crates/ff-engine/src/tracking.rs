//! Per-level movement tracking

/// Everything the engine remembers about the player between frames
///
/// All Y values here are logical: raw Y plus the accumulated teleport offset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackingState {
    /// Player was airborne on the previous evaluated frame
    pub airborne: bool,
    /// Y of the most recent landing
    pub last_grounded_y: Option<f32>,
    /// Highest (smallest Y) landing this level
    pub highest_progress_y: Option<f32>,
    /// Y of the previous sampled frame, for teleport detection
    pub last_sampled_y: Option<f32>,
    /// Accumulated `pre - post` over compensated teleports
    pub teleport_offset: f32,
    /// Remaining feedback suppression (seconds)
    pub suppressed_for: f32,
}

impl TrackingState {
    /// Forget everything and suppress feedback for `cooldown_secs`
    pub fn reset(&mut self, cooldown_secs: f32) {
        *self = Self {
            suppressed_for: cooldown_secs.max(0.0),
            ..Self::default()
        };
    }

    #[inline]
    pub fn logical_y(&self, raw_y: f32) -> f32 {
        raw_y + self.teleport_offset
    }

    #[inline]
    pub fn is_suppressed(&self) -> bool {
        self.suppressed_for > 0.0
    }

    pub fn tick_suppression(&mut self, delta_secs: f32) {
        if self.suppressed_for > 0.0 {
            self.suppressed_for = (self.suppressed_for - delta_secs).max(0.0);
        }
    }

    /// Record a landing at `y`. The watermark only moves upward.
    pub(crate) fn land(&mut self, y: f32, grounded: bool) {
        self.last_grounded_y = Some(y);
        if grounded {
            self.highest_progress_y = Some(self.highest_progress_y.map_or(y, |h| h.min(y)));
        }
    }
}
