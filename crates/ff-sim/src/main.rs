//! Freefall Simulator
//!
//! Replays a scripted scenario through the trigger engine, one fixed frame
//! at a time, using the same settings files and devices a game would.
//!
//! Usage:
//!   ff-sim scenarios/fall.json
//!   ff-sim scenarios/fall.json --device pishock --realtime
//!   ff-sim scenarios/fall.json --settings-dir ./settings

mod scenario;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use ff_core::{default_dir, DeviceKind, FeedbackPreferences, PiShockPreferences, SettingsStore};
use ff_device::StandardDeviceFactory;
use ff_engine::{FeedbackEngine, FIXED_TIMESTEP};

use crate::scenario::Scenario;

#[derive(Parser)]
#[command(name = "ff-sim", about = "Replay scripted player movement through Freefall")]
struct Cli {
    /// Scenario JSON file
    scenario: PathBuf,

    /// Directory holding feedback.json and pishock.json
    #[arg(long)]
    settings_dir: Option<PathBuf>,

    /// Override the configured device (none, pishock)
    #[arg(long)]
    device: Option<DeviceKind>,

    /// Sleep one host timestep per frame
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let scenario = Scenario::load(&cli.scenario)?;

    let settings_dir = cli.settings_dir.unwrap_or_else(default_dir);
    log::info!("[Sim] Settings from {}", settings_dir.display());

    let mut feedback = SettingsStore::<FeedbackPreferences>::load_in(&settings_dir);
    if let Some(kind) = cli.device {
        // Command line overrides are not written back
        let mut prefs = feedback.snapshot();
        prefs.feedback_device = kind;
        feedback = SettingsStore::in_memory(prefs);
    }
    let pishock = SettingsStore::<PiShockPreferences>::load_in(&settings_dir);

    let factory = StandardDeviceFactory::new(pishock);
    let mut engine = FeedbackEngine::new(feedback, Box::new(factory));

    log::info!("[Sim] Replaying {} scripted steps", scenario.frames.len());
    let frame_time = Duration::from_secs_f32(FIXED_TIMESTEP);
    let summary = scenario::run(&scenario, &mut engine, || {
        if cli.realtime {
            std::thread::sleep(frame_time);
        }
    });

    log::info!(
        "[Sim] {} frames, {} punishments ({} at teleports), {} rewards",
        summary.frames,
        summary.punishments,
        summary.teleports_forced,
        summary.rewards
    );
    Ok(())
}
