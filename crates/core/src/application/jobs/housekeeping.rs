// Housekeeping jobs - cleanup, archival and compression of dump files
//
// Thin adapters from the scheduler to the DumpHousekeeping port.

use crate::application::scheduler::PeriodicJob;
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::port::{DumpHousekeeping, TimeProvider};
use std::sync::Arc;
use tracing::info;

/// Deletes dumps past their retention (hourly)
pub struct Cleaner {
    housekeeping: Arc<dyn DumpHousekeeping>,
    time_provider: Arc<dyn TimeProvider>,
}

impl Cleaner {
    pub fn new(
        housekeeping: Arc<dyn DumpHousekeeping>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            housekeeping,
            time_provider,
        }
    }
}

impl PeriodicJob for Cleaner {
    fn name(&self) -> &'static str {
        "cleaner"
    }

    fn run(&self, cancel: &CancelToken) -> Result<()> {
        let now = self.time_provider.now();
        let stats = self.housekeeping.remove_expired(now, cancel)?;

        if stats.total() > 0 {
            info!(
                continuous_removed = stats.continuous_removed,
                archive_removed = stats.archive_removed,
                "Expired dumps removed"
            );
        }
        Ok(())
    }
}

/// Copies selected dumps into the archive directory (daily)
pub struct Archiver {
    housekeeping: Arc<dyn DumpHousekeeping>,
}

impl Archiver {
    pub fn new(housekeeping: Arc<dyn DumpHousekeeping>) -> Self {
        Self { housekeeping }
    }
}

impl PeriodicJob for Archiver {
    fn name(&self) -> &'static str {
        "archiver"
    }

    fn run(&self, cancel: &CancelToken) -> Result<()> {
        let copied = self.housekeeping.archive(cancel)?;
        if copied > 0 {
            info!(copied, "Dumps archived");
        }
        Ok(())
    }
}

/// Compresses finished dumps (every 10 minutes)
pub struct Compressor {
    housekeeping: Arc<dyn DumpHousekeeping>,
}

impl Compressor {
    pub fn new(housekeeping: Arc<dyn DumpHousekeeping>) -> Self {
        Self { housekeeping }
    }
}

impl PeriodicJob for Compressor {
    fn name(&self) -> &'static str {
        "compressor"
    }

    fn run(&self, cancel: &CancelToken) -> Result<()> {
        let compressed = self.housekeeping.compress(cancel)?;
        if compressed > 0 {
            info!(compressed, "Dumps compressed");
        }
        Ok(())
    }
}
