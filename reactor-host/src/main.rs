//! Reactor - Laboratory Reactor Recipe Sequencer
//!
//! Host runtime for a jacketed reactor whose thermostat and stirrer are
//! driven over a serial link. Runs the recipe sequencer on the embassy std
//! executor; an operator console on stdin starts, pauses and edits steps.
//!
//! Usage: `reactor-host [config.toml]` (default `reactor.toml`).

use std::path::PathBuf;
use std::thread;

use anyhow::{anyhow, Context};
use embassy_executor::Spawner;
use embassy_sync::mutex::Mutex;
use embassy_time::Instant;
use static_cell::StaticCell;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reactor_core::config::Recipe;
use reactor_core::scheduler::Sequencer;
use reactor_protocol::{TelemetryReport, UnitId};

use crate::channels::{SampleBatch, SAMPLE_SIGNAL};
use crate::config::{HostConfig, TomlSettings};
use crate::controller::Controller;
use crate::tasks::SharedLink;

mod channels;
mod config;
mod console;
mod controller;
mod link;
mod tasks;

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "reactor.toml";

// Link shared by the transmit and refresh tasks (must live forever)
static LINK: StaticCell<SharedLink> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let config = match HostConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("reactor-host: {}: {}", config_path.display(), e);
            std::process::exit(1);
        }
    };
    init_tracing(&config.log.level);

    info!("Reactor host starting...");
    if let Err(e) = start(spawner, config) {
        error!("Startup failed: {:#}", e);
        std::process::exit(1);
    }
    info!("All tasks spawned, sequencer running");
}

/// Install the global subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Console replies own stdout
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Open settings and link, then start threads and tasks
fn start(spawner: Spawner, config: HostConfig) -> anyhow::Result<()> {
    let unit = UnitId::from(config.session.unit);
    info!(?unit, port = %config.serial.port, settings = %config.session.settings.display(), "Configuration");

    let settings = TomlSettings::open(&config.session.settings)
        .with_context(|| format!("opening settings {}", config.session.settings.display()))?;
    let recipe = Recipe::load(unit, &settings);
    info!(
        name = %recipe.name,
        enabled = recipe.steps().filter(|(_, step)| step.enabled).count(),
        auto_mode = recipe.auto_mode,
        "Recipe loaded"
    );
    let controller = Controller::new(Sequencer::new(recipe, settings));

    let (link, reader) = link::open(&config.serial, unit).context("opening thermostat link")?;
    let link: &'static SharedLink = LINK.init(Mutex::new(link));

    thread::Builder::new()
        .name("link-rx".into())
        .spawn(move || link::receive_loop(reader, deliver_report))
        .context("starting link receive thread")?;
    thread::Builder::new()
        .name("console".into())
        .spawn(console::run)
        .context("starting console thread")?;

    spawner
        .spawn(tasks::sequencer_task(controller))
        .map_err(|e| anyhow!("failed to spawn sequencer task: {:?}", e))?;
    spawner
        .spawn(tasks::transmit_task(link))
        .map_err(|e| anyhow!("failed to spawn transmit task: {:?}", e))?;
    spawner
        .spawn(tasks::refresh_task(link))
        .map_err(|e| anyhow!("failed to spawn refresh task: {:?}", e))?;

    Ok(())
}

/// Hand a report to the sequencer task, replacing any unread one
fn deliver_report(report: TelemetryReport) {
    SAMPLE_SIGNAL.signal(SampleBatch {
        report,
        timestamp_ms: Instant::now().as_millis(),
    });
}
