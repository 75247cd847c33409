//! contprof - continuous profiler supervisor daemon
//!
//! Keeps async-profiler sampling into rolling JFR dumps and runs the
//! cleaner, archiver and compressor over the output directories until
//! Ctrl+C.

mod logging;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use contprof_core::port::time_provider::SystemTimeProvider;
use contprof_core::{ProfilerConfig, ProfilerSupervisor, SupervisorDeps, VERSION};
use contprof_infra_fs::FsHousekeeping;
use contprof_infra_native::NativeAgentLoader;

use logging::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "contprof", version, about = "Continuous profiler supervisor")]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "CONTPROF_CONFIG", default_value = settings::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[arg(long, env = "CONTPROF_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, env = "CONTPROF_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 1. Logging
    let _log_guard = logging::init(cli.log_format, cli.log_dir.as_deref())?;
    info!("contprof v{} starting...", VERSION);

    // 2. Configuration
    let config_path = settings::expand(&cli.config);
    let config = settings::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    // 3. Supervisor
    let Some(mut supervisor) = start_or_report(&config) else {
        return Ok(ExitCode::FAILURE);
    };

    if supervisor.is_active() {
        info!(
            tasks = supervisor.tasks().len(),
            pool_size = ?supervisor.pool_size(),
            "Continuous profiling running"
        );
    }
    info!("Press Ctrl+C to shutdown");

    // 4. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    supervisor.shutdown();
    info!("Shutdown complete.");

    Ok(ExitCode::SUCCESS)
}

/// Start the supervisor, logging the single fatal line on failure
fn start_or_report(config: &ProfilerConfig) -> Option<ProfilerSupervisor> {
    match start_supervisor(config) {
        Ok(supervisor) => Some(supervisor),
        Err(e) => {
            error!(error = %format!("{e:#}"), "Continuous profiler failed to start");
            None
        }
    }
}

fn start_supervisor(config: &ProfilerConfig) -> Result<ProfilerSupervisor> {
    if !config.enabled {
        info!("Continuous profiling disabled by configuration");
        return Ok(ProfilerSupervisor::disabled());
    }

    let housekeeping = FsHousekeeping::new(config)?;
    let deps = SupervisorDeps {
        agent_loader: Arc::new(NativeAgentLoader::new()),
        housekeeping: Arc::new(housekeeping),
        time_provider: Arc::new(SystemTimeProvider),
    };

    Ok(ProfilerSupervisor::start(config, deps)?)
}
