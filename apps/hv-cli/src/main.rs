use clap::{Parser, Subcommand};
use hv_app::{
    AppError, AppResult, RigDrivers, RoomParams, SimulatedRoom, TracingPublisher,
    sink_from_config, start_rig,
};
use hv_config::RigConfig;
use hv_controls::RunState;
use hv_results::TelemetryStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "hv-cli")]
#[command(about = "HVAC rig controller - thermostat loop with safe relay sequencing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the controller against the simulated room
    Run {
        /// Path to the rig YAML file
        config_path: PathBuf,
        /// Enable the system at start
        #[arg(long)]
        enable: bool,
        /// Mode code (0 cool, 1 heat, 2 auto, 3 fan only)
        #[arg(long)]
        mode: Option<i64>,
        /// Desired temperature in °F
        #[arg(long)]
        setpoint: Option<f64>,
        /// Fan speed code (0 low, 1 high, 2 auto)
        #[arg(long)]
        fan: Option<i64>,
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long)]
        duration_s: Option<f64>,
        /// Simulated outdoor temperature in °F (the room starts there too)
        #[arg(long, default_value_t = 80.0)]
        ambient: f64,
    },
    /// Validate a rig configuration file
    Validate {
        /// Path to the rig YAML file
        config_path: PathBuf,
    },
    /// Write a configuration file with default settings
    InitConfig {
        /// Output YAML path
        path: PathBuf,
        /// Rig name
        #[arg(long, default_value = "rig")]
        name: String,
    },
    /// Print persisted cycle records
    Records {
        /// Path to the JSON-lines telemetry file
        path: PathBuf,
        /// Only show the last N records
        #[arg(long)]
        last: Option<usize>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config_path,
            enable,
            mode,
            setpoint,
            fan,
            duration_s,
            ambient,
        } => cmd_run(
            &config_path,
            RunOverrides {
                enable,
                mode,
                setpoint,
                fan,
                duration_s,
                ambient,
            },
        ),
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::InitConfig { path, name } => cmd_init_config(&path, &name),
        Commands::Records { path, last } => cmd_records(&path, last),
    }
}

struct RunOverrides {
    enable: bool,
    mode: Option<i64>,
    setpoint: Option<f64>,
    fan: Option<i64>,
    duration_s: Option<f64>,
    ambient: f64,
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating config: {}", config_path.display());
    let config = hv_config::load_yaml(config_path)?;
    println!("✓ Config is valid: {}", config.name);
    println!(
        "  Control period {:.2} s, hysteresis {:.2}°, dead-band {:.2}°",
        config.control.period_s, config.control.hysteresis, config.control.deadband
    );
    println!(
        "  Fan lead-in {:.0} s, compressor cool-down {:.0} s",
        config.sequencing.fan_lead_in_s, config.sequencing.compressor_cooldown_s
    );
    Ok(())
}

fn cmd_init_config(path: &Path, name: &str) -> AppResult<()> {
    let config = RigConfig::new(name);
    hv_config::save_yaml(path, &config)?;
    println!("✓ Wrote default config to {}", path.display());
    Ok(())
}

fn cmd_records(path: &Path, last: Option<usize>) -> AppResult<()> {
    let store = TelemetryStore::open(path)?;
    let records = match last {
        Some(n) => store.tail(n)?,
        None => store.load_records()?,
    };

    if records.is_empty() {
        println!("No records in {}", path.display());
        return Ok(());
    }

    println!(
        "{:<30} {:>10} {:>8} {:>8} {:>8}",
        "timestamp", "state", "temp", "desired", "humid"
    );
    for record in records {
        let state = RunState::from_code(record.state)
            .map(|s| s.to_string())
            .unwrap_or_else(|| record.state.to_string());
        println!(
            "{:<30} {:>10} {:>8} {:>8.1} {:>8}",
            record.timestamp.to_rfc3339(),
            state,
            fmt_opt(record.instant_temperature),
            record.desired_temperature,
            fmt_opt(record.instant_humidity),
        );
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.1}"))
        .unwrap_or_else(|| "-".to_string())
}

/// `--duration-s` as a [`Duration`]; zero, negative, non-finite and
/// unrepresentable values are rejected.
fn run_duration(secs: f64) -> AppResult<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        _ => Err(AppError::Config(format!(
            "duration must be a positive number of seconds, got {secs}"
        ))),
    }
}

fn cmd_run(config_path: &Path, overrides: RunOverrides) -> AppResult<()> {
    let config = hv_config::load_yaml(config_path)?;
    tracing::info!(config = %config_path.display(), rig = %config.name, "loaded rig config");
    let duration = match overrides.duration_s {
        Some(secs) => Some(run_duration(secs)?),
        None => None,
    };

    println!("Running rig: {}", config.name);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let room = SimulatedRoom::new(
            overrides.ambient,
            RoomParams {
                ambient_f: overrides.ambient,
                ..RoomParams::default()
            },
        );
        let rig = start_rig(
            &config,
            RigDrivers {
                relays: Arc::new(room.relays()),
                sensor: Box::new(room.sensor()),
                publisher: Arc::new(TracingPublisher),
                sink: sink_from_config(&config)?,
            },
        )?;

        let commands = rig.commands();
        if let Some(code) = overrides.mode {
            commands.set_mode_code(code);
        }
        if let Some(code) = overrides.fan {
            commands.set_fan_speed_code(code);
        }
        if let Some(value) = overrides.setpoint {
            commands.set_setpoint(value);
        }
        if overrides.enable {
            commands.enable();
        }

        match duration {
            Some(duration) => {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => {}
                    signal = tokio::signal::ctrl_c() => signal?,
                }
            }
            None => tokio::signal::ctrl_c().await?,
        }

        let status = rig.commands().status();
        rig.shutdown().await?;

        println!("✓ Stopped, relays released");
        println!(
            "  Final state: {} (room {:.1}°F, setpoint {:.1}°F)",
            status.run_state,
            room.temperature_f(),
            status.desired_temp
        );
        Ok::<(), AppError>(())
    })
}
