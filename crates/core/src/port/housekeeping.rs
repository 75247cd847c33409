// Dump housekeeping port
use crate::cancel::CancelToken;
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Dumps removed by one cleanup pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub continuous_removed: usize,
    pub archive_removed: usize,
}

impl CleanupStats {
    pub fn total(&self) -> usize {
        self.continuous_removed + self.archive_removed
    }
}

/// Lifecycle operations on dumped files
///
/// Every operation checks `cancel` between files and returns early (with
/// the work done so far) once cancellation is requested. Failures on a
/// single file are logged and skipped; an `Err` means the pass as a whole
/// could not run (e.g. an output directory vanished).
pub trait DumpHousekeeping: Send + Sync {
    /// Delete dumps whose window started before their directory's retention cutoff
    ///
    /// # Arguments
    /// * `now` - Reference time for the retention cutoffs
    fn remove_expired(&self, now: DateTime<Utc>, cancel: &CancelToken) -> Result<CleanupStats>;

    /// Copy selected compressed dumps into the archive directory
    ///
    /// # Returns
    /// Number of dumps copied
    fn archive(&self, cancel: &CancelToken) -> Result<usize>;

    /// Gzip finished raw dumps, leaving the live one alone
    ///
    /// # Returns
    /// Number of dumps compressed
    fn compress(&self, cancel: &CancelToken) -> Result<usize>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Counts calls instead of touching the filesystem
    #[derive(Default)]
    pub struct RecordingHousekeeping {
        calls: Mutex<Vec<&'static str>>,
        last_cleanup_at: Mutex<Option<DateTime<Utc>>>,
    }

    impl RecordingHousekeeping {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, op: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
        }

        pub fn last_cleanup_at(&self) -> Option<DateTime<Utc>> {
            *self.last_cleanup_at.lock().unwrap()
        }
    }

    impl DumpHousekeeping for RecordingHousekeeping {
        fn remove_expired(
            &self,
            now: DateTime<Utc>,
            _cancel: &CancelToken,
        ) -> Result<CleanupStats> {
            self.calls.lock().unwrap().push("remove_expired");
            *self.last_cleanup_at.lock().unwrap() = Some(now);
            Ok(CleanupStats::default())
        }

        fn archive(&self, _cancel: &CancelToken) -> Result<usize> {
            self.calls.lock().unwrap().push("archive");
            Ok(0)
        }

        fn compress(&self, _cancel: &CancelToken) -> Result<usize> {
            self.calls.lock().unwrap().push("compress");
            Ok(0)
        }
    }
}
