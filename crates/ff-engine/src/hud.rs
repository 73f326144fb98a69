//! Text the host may draw on screen

use ff_core::Color;

use crate::LAST_ACTION_DISPLAY_SECS;

/// Most recent feedback event, shown for a few seconds
#[derive(Debug, Clone, PartialEq)]
pub struct LastAction {
    pub text: String,
    pub color: Color,
    remaining: f32,
}

impl LastAction {
    /// Seconds left on screen
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Opaque for the first half, then fades linearly to zero
    pub fn alpha(&self) -> f32 {
        let fade = LAST_ACTION_DISPLAY_SECS * 0.5;
        if self.remaining >= fade {
            1.0
        } else {
            (self.remaining / fade).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HudState {
    last_action: Option<LastAction>,
    incoming: Option<String>,
}

impl HudState {
    pub fn last_action(&self) -> Option<&LastAction> {
        self.last_action.as_ref()
    }

    /// Last action color with the fade applied
    pub fn last_action_color(&self) -> Option<Color> {
        self.last_action.as_ref().map(|a| a.color.with_alpha(a.alpha()))
    }

    /// Preview of the punishment a landing would trigger right now
    pub fn incoming(&self) -> Option<&str> {
        self.incoming.as_deref()
    }

    pub(crate) fn show_action(&mut self, text: String, color: Color) {
        self.last_action = Some(LastAction {
            text,
            color,
            remaining: LAST_ACTION_DISPLAY_SECS,
        });
    }

    pub(crate) fn set_incoming(&mut self, text: Option<String>) {
        self.incoming = text;
    }

    pub(crate) fn tick(&mut self, delta_secs: f32) {
        if let Some(action) = self.last_action.as_mut() {
            action.remaining -= delta_secs;
            if action.remaining <= 0.0 {
                self.last_action = None;
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.last_action = None;
        self.incoming = None;
    }
}
