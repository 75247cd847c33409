// Periodic Scheduler - fixed-rate jobs on a shared worker pool

pub mod constants;
mod panic_guard;

use constants::WORKER_THREAD_NAME;
pub use panic_guard::{execute_guarded, PanicGuardResult};

use crate::cancel::{cancel_channel, CancelSender, CancelToken};
use crate::error::{AppError, Result};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, warn};

/// A unit of periodic work
///
/// `run` executes synchronously on a pool worker. Long bodies should poll
/// `cancel` between steps so shutdown can interrupt them.
pub trait PeriodicJob: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, cancel: &CancelToken) -> Result<()>;
}

/// Shared pool running fixed-rate jobs
///
/// Executions of one job never overlap; ticks missed while a run was still
/// in progress fire back-to-back afterwards (fixed-rate catch-up).
pub struct PeriodicScheduler {
    runtime: Option<Runtime>,
    handle: Handle,
    worker_threads: usize,
}

impl PeriodicScheduler {
    /// Start a pool with `worker_threads` threads
    pub fn new(worker_threads: usize) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .thread_name(WORKER_THREAD_NAME)
            .enable_time()
            .build()
            .map_err(AppError::SchedulerStart)?;
        let handle = runtime.handle().clone();

        debug!(worker_threads, "Scheduler pool started");

        Ok(Self {
            runtime: Some(runtime),
            handle,
            worker_threads,
        })
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Run `job` after `initial_delay`, then every `period`
    ///
    /// Dropping the returned handle cancels the task.
    pub fn schedule_at_fixed_rate(
        &self,
        job: Arc<dyn PeriodicJob>,
        initial_delay: Duration,
        period: Duration,
    ) -> ScheduledTask {
        let name = job.name();
        let period = if period.is_zero() {
            warn!(job = name, "Zero period requested, using 1ms");
            Duration::from_millis(1)
        } else {
            period
        };

        let (cancel, mut token) = cancel_channel();

        let handle = self.handle.spawn(async move {
            let mut tick = interval_at(Instant::now() + initial_delay, period);

            loop {
                tokio::select! {
                    biased;
                    _ = token.wait() => break,
                    _ = tick.tick() => {}
                }
                if token.is_cancelled() {
                    break;
                }

                let outcome = tokio::task::block_in_place(|| {
                    execute_guarded(name, AssertUnwindSafe(|| job.run(&token)))
                });

                match outcome {
                    PanicGuardResult::Completed(Ok(())) => {
                        debug!(job = name, "Scheduled job run finished");
                    }
                    PanicGuardResult::Completed(Err(e)) => {
                        error!(job = name, error = %e, "Scheduled job run failed");
                    }
                    // Already logged by the guard
                    PanicGuardResult::Panicked(_) => {}
                }
            }

            debug!(job = name, "Scheduled job stopped");
        });

        info!(
            job = name,
            initial_delay_secs = initial_delay.as_secs_f64(),
            period_secs = period.as_secs_f64(),
            "Job scheduled"
        );

        ScheduledTask {
            name,
            initial_delay,
            period,
            cancel,
            handle,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Release the pool without waiting for running jobs
    pub fn shutdown_background(mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Drop for PeriodicScheduler {
    fn drop(&mut self) {
        // A blocking runtime drop would panic inside an async context
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Handle to a running periodic job
pub struct ScheduledTask {
    name: &'static str,
    initial_delay: Duration,
    period: Duration,
    cancel: CancelSender,
    handle: JoinHandle<()>,
    cancelled: AtomicBool,
}

impl ScheduledTask {
    /// Request cancellation and interrupt the task at its next await point
    ///
    /// Does not wait for an in-flight run. Returns `false` if the task was
    /// already cancelled.
    pub fn cancel(&self) -> bool {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.cancel.cancel();
        self.handle.abort();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// True once the task's loop has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .field("initial_delay", &self.initial_delay)
            .field("period", &self.period)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
