//! Dawn Station
//!
//! Headless control station for the robot runtime. Keeps the realtime link
//! up, logs robot output and telemetry, and takes operator commands on stdin.
//!
//! Architecture:
//! stdin commands → ConnectionHandle → ConnectionController → robot runtime
//!                                            ↓
//!                                    ConsoleListener → logs / status

mod commands;
mod console;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use config::{RuntimeConfig, StationConfig, TransferConfig};
use network::{ConnectionController, ConnectionHandle, ControllerConfig, TransferTarget};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::{parse_command, OperatorCommand, HELP};
use crate::console::{describe_status, ConsoleListener, Telemetry};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "dawn-station", version, about = "Headless robot control station")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "dawn.toml")]
    config: PathBuf,

    /// Runtime address `host[:port]`, overriding the config file
    #[arg(short, long)]
    target: Option<String>,

    /// Log filter when RUST_LOG is unset (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args.config, std::io::stderr)?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level, args.json_logs || config.logging.json);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let result = runtime.block_on(run(args, config));
    // The stdin reader parks a blocking thread that never finishes on its own
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

/// Load the config file, logging through a bootstrap subscriber since the
/// configured one depends on the file's contents
fn load_config<W>(path: &Path, log_writer: W) -> Result<StationConfig>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(log_writer)
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(bootstrap, || StationConfig::load_or_default(path))
        .with_context(|| format!("Failed to load {}", path.display()))
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(args: Args, config: StationConfig) -> Result<()> {
    info!("Starting Dawn station");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let transfer = transfer_target(&config.transfer);
    info!(
        code_transfer = %transfer.describe(&config.transfer.ssh_address),
        field = %config.field.address,
        station = config.field.station_number,
        "Station configured"
    );

    let (listener, telemetry) = ConsoleListener::new();
    let (controller, handle) =
        ConnectionController::new(controller_config(&config.runtime), listener);
    let controller_task = tokio::spawn(controller.run());

    let target = args.target.unwrap_or(config.runtime.address);
    let addr = handle
        .set_target(&target)
        .with_context(|| format!("Invalid runtime address '{}'", target))?;
    info!(target = %addr, "Runtime target set");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    info!("stdin closed");
                    break;
                };
                if !execute(&line, &handle, &telemetry)? {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Shutdown signal received");
                break;
            }
        }
    }

    handle.shutdown()?;
    controller_task
        .await
        .context("Connection controller panicked")?;
    info!("Station stopped");
    Ok(())
}

/// Run one operator line. Returns `false` when the station should stop.
fn execute(
    line: &str,
    handle: &ConnectionHandle,
    telemetry: &watch::Receiver<Telemetry>,
) -> Result<bool> {
    let command = match parse_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Ok(true),
        Err(err) => {
            warn!("{}", err);
            return Ok(true);
        }
    };

    match command {
        OperatorCommand::Connect(target) => match handle.set_target(&target) {
            Ok(addr) => info!(target = %addr, "Runtime target set"),
            Err(err) => warn!(error = %err, "Rejected runtime address"),
        },
        OperatorCommand::Disconnect => handle.disconnect()?,
        OperatorCommand::Mode(mode) => handle.send_run_mode(mode)?,
        OperatorCommand::Start(pos) => handle.send_start_position(pos)?,
        OperatorCommand::Status => {
            info!("{}", describe_status(handle.state(), &telemetry.borrow()));
        }
        OperatorCommand::Help => println!("{}", HELP),
        OperatorCommand::Quit => return Ok(false),
    }
    Ok(true)
}

fn controller_config(runtime: &RuntimeConfig) -> ControllerConfig {
    ControllerConfig {
        udp_port: runtime.udp_port,
        reconnect_delay: runtime.reconnect_delay(),
        probe_interval: runtime.probe_interval(),
        connect_timeout: runtime.connect_timeout(),
        max_outbound_bytes: runtime.max_outbound_bytes,
        ..ControllerConfig::default()
    }
}

fn transfer_target(transfer: &TransferConfig) -> TransferTarget {
    TransferTarget {
        port: transfer.ssh_port,
        user: transfer.ssh_user.clone(),
        password: transfer.ssh_password.clone(),
        remote_code_path: transfer.remote_code_path.clone(),
    }
}
