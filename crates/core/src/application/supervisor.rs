//! Profiler Lifecycle Supervisor
//!
//! Startup:
//! 1. validate the configuration snapshot
//! 2. create both output directories
//! 3. acquire the profiler agent (default library or explicit path)
//! 4. schedule runner, cleaner, archiver and compressor on a 4-thread pool
//!
//! Shutdown cancels the four tasks without waiting for in-flight runs.

use crate::application::jobs::{Archiver, Cleaner, Compressor, DumpRunner};
use crate::application::scheduler::constants::{
    ARCHIVER_PERIOD, CLEANER_PERIOD, COMPRESSOR_PERIOD, INITIAL_DELAY, WORKER_POOL_SIZE,
};
use crate::application::scheduler::{PeriodicJob, PeriodicScheduler, ScheduledTask};
use crate::domain::ProfilerConfig;
use crate::error::{AppError, Result};
use crate::port::{AgentLoader, DumpHousekeeping, ProfilerAgent, TimeProvider};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Collaborators injected by the composition root
pub struct SupervisorDeps {
    pub agent_loader: Arc<dyn AgentLoader>,
    pub housekeeping: Arc<dyn DumpHousekeeping>,
    pub time_provider: Arc<dyn TimeProvider>,
}

/// Owns the agent handle, the worker pool and the four task handles
///
/// Constructing two supervisors yields two independent sets of tasks; the
/// native library itself is shared by the dynamic loader.
pub struct ProfilerSupervisor {
    tasks: Vec<ScheduledTask>,
    scheduler: Option<PeriodicScheduler>,
    agent: Option<Arc<dyn ProfilerAgent>>,
}

impl ProfilerSupervisor {
    /// Start continuous profiling
    ///
    /// A disabled configuration yields an inert supervisor without touching
    /// the filesystem or the loader. Every error is a startup failure; a
    /// directory created before a failed agent acquisition is left in place.
    pub fn start(config: &ProfilerConfig, deps: SupervisorDeps) -> Result<Self> {
        info!(?config, "Starting with configuration");

        if !config.enabled {
            info!("Continuous profiling disabled");
            return Ok(Self::disabled());
        }

        config.validate()?;
        create_output_directories(config)?;
        let agent = acquire_agent(config, deps.agent_loader.as_ref())?;

        let scheduler = PeriodicScheduler::new(WORKER_POOL_SIZE)?;

        info!("Starting continuous profiling threads");
        let runner = DumpRunner::new(Arc::clone(&agent), deps.time_provider.clone(), config);
        let jobs: [(Arc<dyn PeriodicJob>, Duration); 4] = [
            (Arc::new(runner), config.dump_interval()),
            (
                Arc::new(Cleaner::new(
                    deps.housekeeping.clone(),
                    deps.time_provider.clone(),
                )),
                CLEANER_PERIOD,
            ),
            (
                Arc::new(Archiver::new(deps.housekeeping.clone())),
                ARCHIVER_PERIOD,
            ),
            (
                Arc::new(Compressor::new(deps.housekeeping)),
                COMPRESSOR_PERIOD,
            ),
        ];

        let tasks = jobs
            .into_iter()
            .map(|(job, period)| scheduler.schedule_at_fixed_rate(job, INITIAL_DELAY, period))
            .collect();

        Ok(Self {
            tasks,
            scheduler: Some(scheduler),
            agent: Some(agent),
        })
    }

    /// Inert supervisor: no tasks, no agent, no pool
    pub fn disabled() -> Self {
        Self {
            tasks: Vec::new(),
            scheduler: None,
            agent: None,
        }
    }

    /// Cancel every scheduled task and release the pool in the background
    ///
    /// Never fails and never blocks; calling it again is a no-op.
    pub fn shutdown(&mut self) {
        let Some(scheduler) = self.scheduler.take() else {
            return;
        };

        info!("Shutting down continuous profiling threads");
        for task in &self.tasks {
            if task.cancel() {
                debug!(job = task.name(), "Task cancelled");
            }
        }
        scheduler.shutdown_background();
    }

    /// Recorded task handles, in runner/cleaner/archiver/compressor order
    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    /// True between a successful enabled start and shutdown
    pub fn is_active(&self) -> bool {
        self.scheduler.is_some()
    }

    pub fn agent(&self) -> Option<&Arc<dyn ProfilerAgent>> {
        self.agent.as_ref()
    }

    /// Worker threads in the pool, if one is running
    pub fn pool_size(&self) -> Option<usize> {
        self.scheduler.as_ref().map(PeriodicScheduler::worker_threads)
    }
}

impl Drop for ProfilerSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn create_output_directories(config: &ProfilerConfig) -> Result<()> {
    debug!("Checking if output dirs exist");
    create_dir(&config.archive_output_dir)?;
    create_dir(&config.continuous_output_dir)?;
    Ok(())
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| AppError::DirectoryCreation {
        path: path.to_path_buf(),
        source,
    })
}

fn acquire_agent(
    config: &ProfilerConfig,
    loader: &dyn AgentLoader,
) -> Result<Arc<dyn ProfilerAgent>> {
    let agent = match config.profiler_lib_path() {
        None => {
            debug!("Loading bundled profiler library");
            loader.load_default()
        }
        Some(path) => {
            debug!(path = %path.display(), "Loading profiler library");
            loader.load_from(path)
        }
    };
    agent.map_err(AppError::AgentAcquisition)
}
