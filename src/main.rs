//! PanelBot simulator: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  ControlServer      HttpBackend / LogEventSink   SystemClock │
//! │  (tiny_http thread) (Telemetry + Session ports)  (Clock)     │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ───────────────────     │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ SimulationService ── SharedRuntime (store · bus · log) │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  SessionSchedule (tick cadence · session length)             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use tracing_subscriber::EnvFilter;

use panelbot::adapters::http_backend::HttpBackend;
use panelbot::adapters::log_sink::LogEventSink;
use panelbot::adapters::time::SystemClock;
use panelbot::app::ports::{SessionPort, TelemetryPort};
use panelbot::app::service::SimulationService;
use panelbot::config::SystemConfig;
use panelbot::control::{ControlApi, ControlServer};
use panelbot::runtime::modes::preset_for;
use panelbot::runtime::{Mode, SharedRuntime};
use panelbot::scheduler::{ScheduleDecision, SessionSchedule};
use panelbot::sensors::Scenario;

#[derive(Parser)]
#[command(name = "panelbot")]
#[command(about = "Solar-panel cleaning robot simulator", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one cleaning session (default)
    Run {
        /// RNG seed for reproducible telemetry
        #[arg(long)]
        seed: Option<u64>,
        /// Scenario key, e.g. degraded_panel
        #[arg(long)]
        scenario: Option<String>,
        /// Initial mode (LIGHT, REGULAR, RIGOROUS, IDLE)
        #[arg(long)]
        mode: Option<String>,
        /// Send to the backend instead of logging
        #[arg(long)]
        live: bool,
    },
    /// Print every mode preset as JSON
    Presets,
    /// List the telemetry scenarios
    Scenarios,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => SystemConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SystemConfig::default(),
    };
    config
        .apply_env(|key| std::env::var(key).ok())
        .context("reading environment overrides")?;

    match cli.command.unwrap_or(Commands::Run {
        seed: None,
        scenario: None,
        mode: None,
        live: false,
    }) {
        Commands::Run {
            seed,
            scenario,
            mode,
            live,
        } => {
            if seed.is_some() {
                config.seed = seed;
            }
            if let Some(key) = scenario {
                config.scenario = match Scenario::from_key(&key) {
                    Some(s) => Some(s),
                    None => bail!("unknown scenario `{key}`"),
                };
            }
            if let Some(raw) = mode {
                config.cleaning_mode = Mode::parse_or_regular(Some(&raw));
            }
            if live {
                config.dry_run = false;
            }
            config.validate().context("invalid configuration")?;
            run(&config)
        }
        Commands::Presets => {
            for mode in Mode::ALL {
                println!("{mode}: {}", serde_json::to_string(&preset_for(mode))?);
            }
            Ok(())
        }
        Commands::Scenarios => {
            for s in Scenario::ALL {
                println!("{:<24} {}", s.key(), s.label());
            }
            Ok(())
        }
    }
}

fn run(config: &SystemConfig) -> Result<()> {
    info!("=== Starting cleaning session simulation ===");
    let runtime = SharedRuntime::new(
        config.cleaning_mode,
        config.actuators,
        Arc::new(SystemClock::new()),
    );

    let api = ControlApi::new(runtime.clone(), config.control_rate_per_sec);
    let control = ControlServer::spawn(&format!("0.0.0.0:{}", config.control_port), api)
        .context("starting control listener")?;

    let mut service = SimulationService::new(config, runtime);
    let schedule = SessionSchedule::new(config.interval_ms, config.session_duration_ms);

    if config.dry_run {
        info!("Dry run: readings are logged, not sent ({})", config.backend_url);
        let mut sink = LogEventSink::new();
        run_session(&mut service, schedule, &mut sink);
        info!(
            "Dry run logged {} readings and {} change events",
            sink.readings_logged(),
            sink.changes_logged()
        );
    } else {
        let mut backend = HttpBackend::new(config).context("building backend client")?;
        run_session(&mut service, schedule, &mut backend);
    }

    control.shutdown();
    Ok(())
}

fn run_session<P>(service: &mut SimulationService, mut schedule: SessionSchedule, port: &mut P)
where
    P: TelemetryPort + SessionPort,
{
    let id = service.start(port).to_owned();
    let epoch = Instant::now();
    schedule.start(0);

    loop {
        let now_ms = u64::try_from(epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
        match schedule.poll(now_ms) {
            ScheduleDecision::Tick { elapsed_ms } => {
                service.tick(elapsed_ms, port);
            }
            ScheduleDecision::Wait(ms) => thread::sleep(Duration::from_millis(ms)),
            ScheduleDecision::Finished => break,
        }
    }

    let stats = service.finish(port);
    info!(
        "Simulation finished, session {id}: {} ticks, {} changes forwarded, {} failed sends",
        stats.ticks,
        stats.changes_forwarded,
        stats.readings_failed + stats.changes_failed
    );
}
