// Scheduler constants (no magic values)
use std::time::Duration;

/// Worker threads in the shared pool: one per periodic job, so no job
/// ever waits for a free thread
pub const WORKER_POOL_SIZE: usize = 4;

/// Thread name prefix for pool workers
pub const WORKER_THREAD_NAME: &str = "contprof-worker";

/// Every job starts immediately
pub const INITIAL_DELAY: Duration = Duration::ZERO;

/// Cleaner period (1 hour)
pub const CLEANER_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Archiver period (1 day)
pub const ARCHIVER_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Compressor period (10 minutes)
pub const COMPRESSOR_PERIOD: Duration = Duration::from_secs(10 * 60);
