//! Frame-by-frame engine scenarios
//!
//! A scripted host feeds positions one frame at a time and a recording device
//! captures what the engine sends.

use std::sync::Arc;

use approx::assert_relative_eq;
use ff_core::{Color, DeviceKind, FeedbackPreferences, SettingsStore};
use ff_device::{DeviceFactory, FeedbackDevice};
use ff_engine::{
    BodySample, EnginePhase, FeedbackEngine, FeedbackEvent, HostAdapter, PhysicsLimits,
    FIXED_TIMESTEP,
};
use parking_lot::Mutex;

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Punish { intensity: f32, duration: f32, easy_mode: bool },
    Reward { intensity: f32, duration: f32 },
    Test { intensity: f32, duration: f32 },
    Dispose,
}

type CallLog = Arc<Mutex<Vec<Call>>>;

struct RecordingDevice {
    calls: CallLog,
}

impl FeedbackDevice for RecordingDevice {
    fn kind(&self) -> DeviceKind {
        DeviceKind::PiShock
    }

    fn update(&mut self, _delta_secs: f32) {}

    fn punish(&mut self, intensity: f32, duration: f32, easy_mode: bool) {
        self.calls.lock().push(Call::Punish { intensity, duration, easy_mode });
    }

    fn reward(&mut self, intensity: f32, duration: f32) {
        self.calls.lock().push(Call::Reward { intensity, duration });
    }

    fn test(&mut self, intensity: f32, duration: f32) {
        self.calls.lock().push(Call::Test { intensity, duration });
    }

    fn dispose(&mut self) {
        self.calls.lock().push(Call::Dispose);
    }
}

/// Hands out recording devices, or nothing when `available` is false
struct RecordingFactory {
    calls: CallLog,
    created: Arc<Mutex<Vec<DeviceKind>>>,
    available: bool,
}

impl DeviceFactory for RecordingFactory {
    fn create(&self, kind: DeviceKind) -> Option<Box<dyn FeedbackDevice>> {
        self.created.lock().push(kind);
        match kind {
            DeviceKind::PiShock if self.available => Some(Box::new(RecordingDevice {
                calls: Arc::clone(&self.calls),
            })),
            _ => None,
        }
    }
}

struct ScriptedHost {
    body: Option<BodySample>,
    paused: bool,
    test_held: bool,
    physics: PhysicsLimits,
}

impl HostAdapter for ScriptedHost {
    fn body(&self) -> Option<BodySample> {
        self.body
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn physics(&self) -> PhysicsLimits {
        self.physics
    }

    fn test_requested(&self) -> bool {
        self.test_held
    }
}

struct Harness {
    engine: FeedbackEngine,
    host: ScriptedHost,
    settings: SettingsStore<FeedbackPreferences>,
    calls: CallLog,
    created: Arc<Mutex<Vec<DeviceKind>>>,
}

impl Harness {
    fn new(prefs: FeedbackPreferences) -> Self {
        Self::with_factory(prefs, true)
    }

    fn with_factory(prefs: FeedbackPreferences, available: bool) -> Self {
        let settings = SettingsStore::in_memory(prefs);
        let calls = CallLog::default();
        let created = Arc::new(Mutex::new(Vec::new()));
        let factory = RecordingFactory {
            calls: Arc::clone(&calls),
            created: Arc::clone(&created),
            available,
        };
        let engine = FeedbackEngine::new(settings.clone(), Box::new(factory));
        let host = ScriptedHost {
            body: None,
            paused: false,
            test_held: false,
            physics: PhysicsLimits {
                max_rise_speed: 9.0,
                max_fall_speed: 10.0,
            },
        };

        Self {
            engine,
            host,
            settings,
            calls,
            created,
        }
    }

    /// Level already running, player standing at `y`
    fn started_at(prefs: FeedbackPreferences, y: f32) -> Self {
        let mut harness = Self::new(prefs);
        harness.engine.on_level_start();
        harness.stand(y);
        harness.calls.lock().clear();
        harness
    }

    fn frame(&mut self, y: f32, on_ground: bool) -> Option<FeedbackEvent> {
        self.host.body = Some(BodySample {
            y,
            on_ground,
            on_soft_ground: false,
        });
        self.engine.update(&self.host, FIXED_TIMESTEP)
    }

    fn stand(&mut self, y: f32) -> Option<FeedbackEvent> {
        self.frame(y, true)
    }

    /// Airborne frames from `from` to `to`, moving at most `step` per frame
    fn fly(&mut self, from: f32, to: f32, step: f32) -> Vec<FeedbackEvent> {
        let mut events = Vec::new();
        let mut y = from;
        loop {
            let remaining = to - y;
            y = if remaining.abs() <= step {
                to
            } else {
                y + step.copysign(remaining)
            };
            events.extend(self.frame(y, false));
            if y == to {
                return events;
            }
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

fn pishock_prefs() -> FeedbackPreferences {
    FeedbackPreferences {
        feedback_device: DeviceKind::PiShock,
        ..Default::default()
    }
}

fn rewarding_prefs(progress_only: bool) -> FeedbackPreferences {
    let mut prefs = pishock_prefs();
    prefs.reward.enabled = true;
    prefs.reward.progress_only = progress_only;
    prefs
}

// ═══════════════════════════════════════════════════════════════════════════════
// PUNISHMENT
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn fall_of_575_punishes_at_intensity_8() {
    let mut h = Harness::started_at(pishock_prefs(), 0.0);

    assert!(h.fly(0.0, 570.0, 10.0).is_empty());
    let event = h.stand(575.0);

    match event {
        Some(FeedbackEvent::Punishment { result, easy_mode, forced }) => {
            assert_relative_eq!(result.intensity, 8.0, epsilon = 1e-4);
            assert_relative_eq!(result.duration, 1.0);
            assert!(!easy_mode);
            assert!(!forced);
        }
        other => panic!("expected punishment, got {:?}", other),
    }
    assert_eq!(
        h.calls(),
        vec![Call::Punish { intensity: 8.0, duration: 1.0, easy_mode: false }]
    );

    let hud = h.engine.hud();
    assert_eq!(hud.last_action().map(|a| a.text.as_str()), Some("Punishment! (8% x 1s)"));
    assert_eq!(hud.last_action_color(), Some(Color::RED));
}

#[test]
fn short_fall_does_not_punish() {
    let mut h = Harness::started_at(pishock_prefs(), 0.0);
    h.fly(0.0, 140.0, 10.0);
    assert!(h.stand(149.0).is_none());
    assert!(h.calls().is_empty());
    assert_eq!(h.engine.tracking().last_grounded_y, Some(149.0));
}

#[test]
fn easy_mode_punishes_with_lime_text() {
    let mut prefs = pishock_prefs();
    prefs.punishment.easy_mode = true;
    let mut h = Harness::started_at(prefs, 0.0);

    h.fly(0.0, 300.0, 10.0);
    h.stand(310.0);

    assert!(matches!(
        h.calls().as_slice(),
        [Call::Punish { easy_mode: true, .. }]
    ));
    assert_eq!(h.engine.hud().last_action_color(), Some(Color::LIME));
}

#[test]
fn soft_ground_counts_as_landing() {
    let mut h = Harness::started_at(pishock_prefs(), 0.0);
    h.fly(0.0, 400.0, 10.0);

    h.host.body = Some(BodySample {
        y: 405.0,
        on_ground: false,
        on_soft_ground: true,
    });
    let event = h.engine.update(&h.host, FIXED_TIMESTEP);

    assert!(matches!(event, Some(FeedbackEvent::Punishment { .. })));
    assert!(!h.engine.tracking().airborne);
}

#[test]
fn incoming_preview_while_falling() {
    let mut h = Harness::started_at(pishock_prefs(), 0.0);

    h.fly(0.0, 100.0, 10.0);
    assert_eq!(h.engine.hud().incoming(), None);

    h.fly(100.0, 300.0, 10.0);
    assert_eq!(h.engine.hud().incoming(), Some("Incoming punishment (3% x 1s)..."));

    h.stand(305.0);
    assert_eq!(h.engine.hud().incoming(), None);
}

// ═══════════════════════════════════════════════════════════════════════════════
// REWARD
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn progress_only_rewards_new_height_once() {
    let mut h = Harness::started_at(rewarding_prefs(true), 0.0);

    h.fly(0.0, -75.0, 9.0);
    match h.stand(-75.0) {
        Some(FeedbackEvent::Reward { result }) => {
            assert_relative_eq!(result.intensity, 55.0, epsilon = 1e-4);
        }
        other => panic!("expected reward, got {:?}", other),
    }
    assert_eq!(h.engine.tracking().highest_progress_y, Some(-75.0));

    // Drop back down and climb to the same peak again
    h.fly(-75.0, 0.0, 10.0);
    assert!(h.stand(0.0).is_none());
    h.fly(0.0, -75.0, 9.0);
    assert!(h.stand(-75.0).is_none());

    let rewards = h
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Reward { .. }))
        .count();
    assert_eq!(rewards, 1);
}

#[test]
fn unrestricted_rewards_every_climb() {
    let mut h = Harness::started_at(rewarding_prefs(false), 0.0);

    h.fly(0.0, -75.0, 9.0);
    assert!(h.stand(-75.0).is_some());
    h.fly(-75.0, 0.0, 10.0);
    h.stand(0.0);
    h.fly(0.0, -75.0, 9.0);
    assert!(h.stand(-75.0).is_some());

    assert_eq!(h.engine.hud().last_action_color(), Some(Color::LIME));
}

#[test]
fn rewards_disabled_by_default() {
    let mut h = Harness::started_at(pishock_prefs(), 0.0);
    h.fly(0.0, -100.0, 9.0);
    assert!(h.stand(-100.0).is_none());
    assert_eq!(h.engine.tracking().highest_progress_y, Some(-100.0));
}

// ═══════════════════════════════════════════════════════════════════════════════
// TELEPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn teleport_forces_evaluation_at_pre_jump_height() {
    let mut h = Harness::started_at(pishock_prefs(), -200.0);
    h.host.physics = PhysicsLimits {
        max_rise_speed: 9.0,
        max_fall_speed: 8.0,
    };

    assert!(h.fly(-200.0, 100.0, 8.0).is_empty());
    assert_eq!(h.engine.tracking().last_sampled_y, Some(100.0));

    // 400 units in one frame is far beyond 8 * 1.25
    match h.frame(500.0, false) {
        Some(FeedbackEvent::Punishment { result, forced, .. }) => {
            assert!(forced);
            // 300 fallen before the jump
            assert_relative_eq!(result.fraction, 150.0 / 850.0, epsilon = 1e-5);
        }
        other => panic!("expected forced punishment, got {:?}", other),
    }

    let tracking = h.engine.tracking();
    assert!(tracking.suppressed_for > 0.0);
    assert_eq!(tracking.last_grounded_y, None);
    assert_eq!(tracking.last_sampled_y, None);
    assert_eq!(h.engine.phase(), EnginePhase::Suppressed);

    // Landing right after the teleport is ignored
    assert!(h.stand(500.0).is_none());
    for _ in 0..10 {
        h.stand(500.0);
    }
    assert_eq!(h.engine.phase(), EnginePhase::Tracking);
    assert_eq!(h.calls().len(), 1);
}

#[test]
fn upward_teleport_is_detected() {
    let mut h = Harness::started_at(pishock_prefs(), 0.0);
    h.fly(0.0, -20.0, 9.0);
    assert!(h.frame(-400.0, false).is_none());
    assert_eq!(h.engine.phase(), EnginePhase::Suppressed);
}

#[test]
fn teleport_hooks_keep_logical_height_continuous() {
    let mut h = Harness::started_at(pishock_prefs(), 0.0);
    h.fly(0.0, -100.0, 9.0);

    // Screen transition: raw Y wraps from the top of one screen to the bottom of the next
    h.engine.pre_teleport(-100.0);
    h.engine.post_teleport(260.0);

    assert!(h.fly(260.0, 250.0, 9.0).is_empty());
    assert!(h.stand(250.0).is_none());

    assert_eq!(h.engine.phase(), EnginePhase::Tracking);
    assert_relative_eq!(h.engine.tracking().teleport_offset, -360.0);
    assert_eq!(h.engine.tracking().last_grounded_y, Some(-110.0));
    assert!(h.calls().is_empty());
}

#[test]
fn unhooked_screen_wrap_is_treated_as_teleport() {
    let mut h = Harness::started_at(pishock_prefs(), 0.0);
    h.fly(0.0, -100.0, 9.0);

    h.frame(255.0, false);
    assert_eq!(h.engine.phase(), EnginePhase::Suppressed);
    assert!(h.calls().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════════
// SUPPRESSION / PAUSE / LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn pause_freezes_suppression() {
    let mut h = Harness::started_at(pishock_prefs(), 0.0);
    h.engine.reset_tracking(0.1);

    h.host.paused = true;
    for _ in 0..30 {
        h.stand(0.0);
    }
    assert_eq!(h.engine.phase(), EnginePhase::Suppressed);
    assert_relative_eq!(h.engine.tracking().suppressed_for, 0.1);

    h.host.paused = false;
    for _ in 0..7 {
        h.stand(0.0);
    }
    assert_eq!(h.engine.phase(), EnginePhase::Tracking);
}

#[test]
fn paused_frames_do_not_track() {
    let mut h = Harness::started_at(pishock_prefs(), 0.0);
    h.host.paused = true;
    h.fly(0.0, 600.0, 10.0);
    assert!(h.stand(600.0).is_none());
    assert_eq!(h.engine.tracking().last_grounded_y, Some(0.0));
}

#[test]
fn no_feedback_before_level_start() {
    let mut h = Harness::new(pishock_prefs());
    h.stand(0.0);
    h.fly(0.0, 600.0, 10.0);
    assert!(h.stand(600.0).is_none());
    assert_eq!(h.engine.phase(), EnginePhase::Idle);
}

#[test]
fn level_end_stops_tracking() {
    let mut h = Harness::started_at(pishock_prefs(), 0.0);
    h.fly(0.0, 300.0, 10.0);
    h.engine.on_level_end();

    assert!(h.stand(600.0).is_none());
    assert_eq!(h.engine.tracking().last_grounded_y, None);
    assert_eq!(h.engine.phase(), EnginePhase::Idle);
}

#[test]
fn missing_body_is_a_no_op() {
    let mut h = Harness::started_at(pishock_prefs(), 0.0);
    h.host.body = None;
    for _ in 0..5 {
        assert!(h.engine.update(&h.host, FIXED_TIMESTEP).is_none());
    }
    assert_eq!(h.engine.tracking().last_grounded_y, Some(0.0));
    assert_eq!(h.engine.hud().incoming(), None);
}

#[test]
fn disabling_mod_resets_and_goes_idle() {
    let mut h = Harness::started_at(pishock_prefs(), 0.0);
    h.fly(0.0, 300.0, 10.0);

    h.settings.update(|p| p.mod_enabled = false);
    assert!(h.stand(600.0).is_none());
    assert_eq!(h.engine.phase(), EnginePhase::Idle);
    assert_eq!(h.engine.tracking().last_grounded_y, None);

    h.settings.update(|p| p.mod_enabled = true);
    h.stand(600.0);
    assert_eq!(h.engine.phase(), EnginePhase::Tracking);
    assert_eq!(h.engine.tracking().last_grounded_y, Some(600.0));
    assert!(h.calls().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEVICES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn configured_device_gets_test_pulse_on_creation() {
    let h = Harness::new(pishock_prefs());
    assert_eq!(h.engine.device_kind(), Some(DeviceKind::PiShock));
    assert_eq!(h.calls(), vec![Call::Test { intensity: 50.0, duration: 1.0 }]);
}

#[test]
fn device_swap_disposes_old_device() {
    let mut h = Harness::new(FeedbackPreferences::default());
    assert_eq!(h.engine.device_kind(), None);

    h.settings.update(|p| p.feedback_device = DeviceKind::PiShock);
    h.stand(0.0);
    assert_eq!(h.engine.device_kind(), Some(DeviceKind::PiShock));
    assert_eq!(h.calls(), vec![Call::Test { intensity: 50.0, duration: 1.0 }]);

    h.settings.update(|p| p.feedback_device = DeviceKind::None);
    h.stand(0.0);
    assert_eq!(h.engine.device_kind(), None);
    assert_eq!(h.calls().last(), Some(&Call::Dispose));
}

#[test]
fn failed_device_creation_is_not_retried_every_frame() {
    let mut h = Harness::with_factory(pishock_prefs(), false);
    for _ in 0..10 {
        h.stand(0.0);
    }
    assert_eq!(h.engine.device_kind(), None);
    assert_eq!(h.created.lock().as_slice(), &[DeviceKind::PiShock]);
}

#[test]
fn feedback_without_device_still_updates_hud() {
    let mut h = Harness::with_factory(pishock_prefs(), false);
    h.engine.on_level_start();
    h.stand(0.0);
    h.fly(0.0, 570.0, 10.0);

    assert!(h.stand(575.0).is_some());
    assert!(h.engine.hud().last_action().is_some());
    assert!(h.calls().is_empty());
}

#[test]
fn test_request_fires_once_per_press() {
    let mut h = Harness::new(pishock_prefs());
    h.calls.lock().clear();

    h.host.test_held = true;
    for _ in 0..5 {
        h.stand(0.0);
    }
    h.host.test_held = false;
    h.stand(0.0);
    h.host.test_held = true;
    h.stand(0.0);

    assert_eq!(
        h.calls(),
        vec![
            Call::Test { intensity: 50.0, duration: 1.0 },
            Call::Test { intensity: 50.0, duration: 1.0 },
        ]
    );
}

#[test]
fn dropping_engine_disposes_device() {
    let h = Harness::new(pishock_prefs());
    let calls = Arc::clone(&h.calls);
    drop(h);
    assert_eq!(calls.lock().last(), Some(&Call::Dispose));
}
