//! Feedback trigger engine
//!
//! One [`FeedbackEngine`] per game session. The host calls [`FeedbackEngine::update`]
//! once per fixed frame and forwards lifecycle hooks as they happen.

use ff_core::{
    evaluate, format_feedback, Color, DeviceKind, FeedbackPreferences, FeedbackResult,
    SettingsStore,
};
use ff_device::{DeviceFactory, FeedbackDevice};

use crate::host::{BodySample, HostAdapter};
use crate::hud::HudState;
use crate::tracking::TrackingState;
use crate::{TELEPORT_COOLDOWN_SECS, TEST_PULSE_DURATION, TEST_PULSE_INTENSITY};

// ═══════════════════════════════════════════════════════════════════════════════
// PHASE / EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Coarse engine state, derived from the tracking fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnginePhase {
    /// No level running, or the mod is switched off
    Idle,
    /// Watching movement and dispatching feedback
    Tracking,
    /// Level running but feedback is held off after a teleport or reset
    Suppressed,
}

/// Feedback dispatched during a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedbackEvent {
    Punishment {
        result: FeedbackResult,
        easy_mode: bool,
        /// Fired because a teleport cut the fall short
        forced: bool,
    },
    Reward {
        result: FeedbackResult,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Turns vertical movement into device feedback
pub struct FeedbackEngine {
    settings: SettingsStore<FeedbackPreferences>,
    factory: Box<dyn DeviceFactory>,
    device: Option<Box<dyn FeedbackDevice>>,
    /// Kind last requested from the factory, live or not
    selected: DeviceKind,
    state: TrackingState,
    hud: HudState,
    was_enabled: bool,
    level_running: bool,
    test_was_held: bool,
    pre_teleport_y: Option<f32>,
}

impl FeedbackEngine {
    pub fn new(settings: SettingsStore<FeedbackPreferences>, factory: Box<dyn DeviceFactory>) -> Self {
        let prefs = settings.snapshot();
        let mut engine = Self {
            settings,
            factory,
            device: None,
            selected: DeviceKind::None,
            state: TrackingState::default(),
            hud: HudState::default(),
            was_enabled: prefs.mod_enabled,
            level_running: false,
            test_was_held: false,
            pre_teleport_y: None,
        };
        engine.select_device(prefs.feedback_device);
        engine
    }

    pub fn settings(&self) -> &SettingsStore<FeedbackPreferences> {
        &self.settings
    }

    pub fn tracking(&self) -> &TrackingState {
        &self.state
    }

    pub fn hud(&self) -> &HudState {
        &self.hud
    }

    /// Kind of the live device, if one exists
    pub fn device_kind(&self) -> Option<DeviceKind> {
        self.device.as_ref().map(|d| d.kind())
    }

    pub fn is_level_running(&self) -> bool {
        self.level_running
    }

    pub fn phase(&self) -> EnginePhase {
        if !self.level_running || !self.was_enabled {
            EnginePhase::Idle
        } else if self.state.is_suppressed() {
            EnginePhase::Suppressed
        } else {
            EnginePhase::Tracking
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle hooks
    // ─────────────────────────────────────────────────────────────────────────

    pub fn on_level_start(&mut self) {
        log::info!("[Engine] Level started");
        self.state.reset(0.0);
        self.hud.clear();
        self.level_running = true;
    }

    pub fn on_level_end(&mut self) {
        log::info!("[Engine] Level ended");
        self.state.reset(0.0);
        self.hud.clear();
        self.level_running = false;
    }

    /// Forget tracked positions, e.g. after the host restores a save state
    pub fn reset_tracking(&mut self, cooldown_secs: f32) {
        self.state.reset(cooldown_secs);
    }

    /// Host is about to move the player through a level link
    pub fn pre_teleport(&mut self, raw_y: f32) {
        self.pre_teleport_y = Some(raw_y);
    }

    /// Host finished moving the player. The jump is folded into the teleport
    /// offset so logical Y stays continuous.
    pub fn post_teleport(&mut self, raw_y: f32) {
        if let Some(pre) = self.pre_teleport_y.take() {
            if pre != raw_y {
                self.state.teleport_offset += pre - raw_y;
                log::debug!(
                    "[Engine] Teleport compensated: {} -> {} (offset {})",
                    pre,
                    raw_y,
                    self.state.teleport_offset
                );
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Frame
    // ─────────────────────────────────────────────────────────────────────────

    /// Advance one frame. Returns the feedback dispatched this frame, if any.
    pub fn update<H: HostAdapter + ?Sized>(&mut self, host: &H, delta_secs: f32) -> Option<FeedbackEvent> {
        let prefs = self.settings.snapshot();

        if prefs.mod_enabled != self.was_enabled {
            log::info!(
                "[Engine] Mod {}",
                if prefs.mod_enabled { "enabled" } else { "disabled" }
            );
            self.was_enabled = prefs.mod_enabled;
            self.state.reset(0.0);
            self.hud.clear();
        }
        if !prefs.mod_enabled {
            return None;
        }

        let paused = host.is_paused();
        if !paused {
            self.state.tick_suppression(delta_secs);
        }

        self.update_device(prefs.feedback_device, delta_secs);
        self.update_test_request(host.test_requested());

        let body = host.body();
        let mut event = None;
        if self.feedback_active() && !paused {
            if let Some(body) = body {
                event = self.track(host, &body, &prefs);
            }
        }

        self.update_hud(body.as_ref(), delta_secs, &prefs);
        event
    }

    fn feedback_active(&self) -> bool {
        self.level_running && !self.state.is_suppressed()
    }

    fn track<H: HostAdapter + ?Sized>(
        &mut self,
        host: &H,
        body: &BodySample,
        prefs: &FeedbackPreferences,
    ) -> Option<FeedbackEvent> {
        let y = self.state.logical_y(body.y);

        if let Some(previous) = self.state.last_sampled_y {
            if host.physics().is_teleport(y - previous) {
                log::info!("[Engine] Teleport detected: {} -> {}", previous, y);
                let event = self.check_and_trigger(body, Some(previous), prefs);
                self.state.reset(TELEPORT_COOLDOWN_SECS);
                return event;
            }
        }

        self.state.last_sampled_y = Some(y);
        self.check_and_trigger(body, None, prefs)
    }

    /// Landing check. `forced_y` evaluates as if the player landed there.
    fn check_and_trigger(
        &mut self,
        body: &BodySample,
        forced_y: Option<f32>,
        prefs: &FeedbackPreferences,
    ) -> Option<FeedbackEvent> {
        let grounded = body.is_grounded();
        let mut event = None;

        if grounded || forced_y.is_some() {
            let y = forced_y.unwrap_or_else(|| self.state.logical_y(body.y));

            if self.state.airborne {
                if let Some(last_grounded) = self.state.last_grounded_y {
                    let mut delta = y - last_grounded;
                    match self.state.highest_progress_y {
                        Some(highest) if delta < 0.0 && grounded => {
                            if prefs.reward.progress_only {
                                delta = y - highest;
                            }
                            if delta < 0.0 {
                                event = self.dispatch_reward(delta, prefs);
                            }
                        }
                        _ if delta > 0.0 => {
                            event = self.dispatch_punishment(delta, forced_y.is_some(), prefs);
                        }
                        _ => {}
                    }
                }
            }

            self.state.land(y, grounded);
        }

        self.state.airborne = !grounded;
        event
    }

    fn dispatch_reward(&mut self, delta: f32, prefs: &FeedbackPreferences) -> Option<FeedbackEvent> {
        let result = evaluate(delta, &prefs.reward_curve());
        if !result.trigger {
            return None;
        }

        log::info!(
            "[Engine] Reward: climbed {:.1} -> {:.1}% for {:.2}s",
            -delta,
            result.intensity,
            result.duration
        );
        if let Some(device) = self.device.as_mut() {
            device.reward(result.intensity, result.duration);
        }
        self.hud.show_action(
            format_feedback("Reward!", &result, prefs.display_behavior, ""),
            Color::LIME,
        );
        Some(FeedbackEvent::Reward { result })
    }

    fn dispatch_punishment(
        &mut self,
        delta: f32,
        forced: bool,
        prefs: &FeedbackPreferences,
    ) -> Option<FeedbackEvent> {
        let result = evaluate(delta, &prefs.punishment_curve());
        if !result.trigger {
            return None;
        }

        let easy_mode = prefs.punishment.easy_mode;
        log::info!(
            "[Engine] Punishment: fell {:.1} -> {:.1}% for {:.2}s{}",
            delta,
            result.intensity,
            result.duration,
            if easy_mode { " (easy mode)" } else { "" }
        );
        if let Some(device) = self.device.as_mut() {
            device.punish(result.intensity, result.duration, easy_mode);
        }
        let color = if easy_mode { Color::LIME } else { Color::RED };
        self.hud.show_action(
            format_feedback("Punishment!", &result, prefs.display_behavior, ""),
            color,
        );
        Some(FeedbackEvent::Punishment {
            result,
            easy_mode,
            forced,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Device
    // ─────────────────────────────────────────────────────────────────────────

    fn update_device(&mut self, configured: DeviceKind, delta_secs: f32) {
        if configured != self.selected {
            self.select_device(configured);
        }
        if let Some(device) = self.device.as_mut() {
            device.update(delta_secs);
        }
    }

    fn select_device(&mut self, kind: DeviceKind) {
        if let Some(mut old) = self.device.take() {
            log::info!("[Engine] Disposing {} device", old.kind().display_name());
            old.dispose();
        }

        self.selected = kind;
        self.device = self.factory.create(kind);

        match self.device.as_mut() {
            Some(device) => {
                log::info!("[Engine] Using {} device", kind.display_name());
                device.test(TEST_PULSE_INTENSITY, TEST_PULSE_DURATION);
            }
            None if kind != DeviceKind::None => {
                log::warn!("[Engine] No {} device available", kind.display_name());
            }
            None => {}
        }
    }

    fn update_test_request(&mut self, held: bool) {
        if held && !self.test_was_held {
            if let Some(device) = self.device.as_mut() {
                log::info!("[Engine] Manual test pulse");
                device.test(TEST_PULSE_INTENSITY, TEST_PULSE_DURATION);
            }
        }
        self.test_was_held = held;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HUD
    // ─────────────────────────────────────────────────────────────────────────

    fn update_hud(&mut self, body: Option<&BodySample>, delta_secs: f32, prefs: &FeedbackPreferences) {
        self.hud.tick(delta_secs);

        let incoming = match (body, self.state.last_grounded_y) {
            (Some(body), Some(last_grounded)) if self.feedback_active() && self.state.airborne => {
                let delta = self.state.logical_y(body.y) - last_grounded;
                if delta > 0.0 {
                    let result = evaluate(delta, &prefs.punishment_curve());
                    result.trigger.then(|| {
                        format_feedback("Incoming punishment", &result, prefs.display_behavior, "...")
                    })
                } else {
                    None
                }
            }
            _ => None,
        };
        self.hud.set_incoming(incoming);
    }
}

impl Drop for FeedbackEngine {
    fn drop(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.dispose();
        }
    }
}
