//! Scripted host driven by a JSON scenario

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ff_engine::{BodySample, FeedbackEngine, FeedbackEvent, HostAdapter, PhysicsLimits, FIXED_TIMESTEP};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelEvent {
    Start,
    End,
}

/// One scripted step. `repeat` expands it into several frames, moving
/// `velocity` units per frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Frame {
    /// Raw player Y; `None` means no player body this frame
    pub y: Option<f32>,
    pub on_ground: bool,
    pub soft_ground: bool,
    pub paused: bool,
    /// Host moves the player to this Y through a level link
    pub teleport_to: Option<f32>,
    pub level: Option<LevelEvent>,
    /// Manual test input held
    pub test: bool,
    pub repeat: u32,
    pub velocity: f32,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            y: None,
            on_ground: false,
            soft_ground: false,
            paused: false,
            teleport_to: None,
            level: None,
            test: false,
            repeat: 1,
            velocity: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub physics: PhysicsLimits,
    pub frames: Vec<Frame>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What a replay produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames: usize,
    pub punishments: usize,
    pub rewards: usize,
    pub teleports_forced: usize,
}

struct ScenarioHost {
    physics: PhysicsLimits,
    body: Option<BodySample>,
    paused: bool,
    test: bool,
}

impl HostAdapter for ScenarioHost {
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
        self.test
    }
}

/// Replay a scenario. `on_frame` runs after every engine update.
pub fn run(scenario: &Scenario, engine: &mut FeedbackEngine, mut on_frame: impl FnMut()) -> RunSummary {
    let mut host = ScenarioHost {
        physics: scenario.physics,
        body: None,
        paused: false,
        test: false,
    };
    let mut summary = RunSummary::default();
    let mut last_hud: Option<String> = None;
    let mut last_incoming: Option<String> = None;

    for step in &scenario.frames {
        match step.level {
            Some(LevelEvent::Start) => engine.on_level_start(),
            Some(LevelEvent::End) => engine.on_level_end(),
            None => {}
        }

        let mut y = step.y;
        if let (Some(from), Some(to)) = (y, step.teleport_to) {
            engine.pre_teleport(from);
            engine.post_teleport(to);
            y = Some(to);
        }

        for i in 0..step.repeat.max(1) {
            host.body = y.map(|y| BodySample {
                y: y + step.velocity * i as f32,
                on_ground: step.on_ground,
                on_soft_ground: step.soft_ground,
            });
            host.paused = step.paused;
            host.test = step.test;

            match engine.update(&host, FIXED_TIMESTEP) {
                Some(FeedbackEvent::Punishment { forced, .. }) => {
                    summary.punishments += 1;
                    if forced {
                        summary.teleports_forced += 1;
                    }
                }
                Some(FeedbackEvent::Reward { .. }) => summary.rewards += 1,
                None => {}
            }
            summary.frames += 1;

            let hud = engine.hud();
            let action = hud.last_action().map(|a| a.text.clone());
            if action.is_some() && action != last_hud {
                log::info!("[Sim] frame {}: {}", summary.frames, action.as_deref().unwrap_or_default());
            }
            last_hud = action;

            let incoming = hud.incoming().map(str::to_owned);
            if incoming != last_incoming {
                if let Some(text) = &incoming {
                    log::debug!("[Sim] frame {}: {}", summary.frames, text);
                }
                last_incoming = incoming;
            }

            on_frame();
        }
    }

    summary
}
