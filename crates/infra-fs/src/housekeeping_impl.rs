// Filesystem Housekeeping Implementation
use chrono::{DateTime, Duration, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use regex::Regex;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use contprof_core::cancel::CancelToken;
use contprof_core::domain::{ConfigError, ProfilerConfig};
use contprof_core::error::Result;
use contprof_core::port::{CleanupStats, DumpHousekeeping};

use crate::dump_dir::{list_dumps, write_atomically};

/// Housekeeping over the two output directories
pub struct FsHousekeeping {
    continuous_dir: PathBuf,
    archive_dir: PathBuf,
    continuous_retention: Duration,
    archive_retention: Duration,
    archive_pattern: Regex,
}

impl FsHousekeeping {
    /// Fails with `ConfigurationInvalid` if `archive_copy_pattern` is not a valid regex
    pub fn new(config: &ProfilerConfig) -> Result<Self> {
        let archive_pattern = Regex::new(&config.archive_copy_pattern).map_err(|e| {
            ConfigError::InvalidArchivePattern {
                pattern: config.archive_copy_pattern.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            continuous_dir: config.continuous_output_dir.clone(),
            archive_dir: config.archive_output_dir.clone(),
            continuous_retention: config.continuous_retention(),
            archive_retention: config.archive_retention(),
            archive_pattern,
        })
    }
}

impl DumpHousekeeping for FsHousekeeping {
    fn remove_expired(&self, now: DateTime<Utc>, cancel: &CancelToken) -> Result<CleanupStats> {
        // No representable cutoff means nothing is old enough to expire
        let continuous_cutoff = now.checked_sub_signed(self.continuous_retention);
        let archive_cutoff = now.checked_sub_signed(self.archive_retention);

        debug!(
            continuous_cutoff = ?continuous_cutoff,
            archive_cutoff = ?archive_cutoff,
            "Running dump cleanup"
        );

        let continuous_removed = match continuous_cutoff {
            Some(cutoff) => remove_older_than(&self.continuous_dir, cutoff, cancel)?,
            None => 0,
        };
        let archive_removed = match archive_cutoff {
            Some(cutoff) => remove_older_than(&self.archive_dir, cutoff, cancel)?,
            None => 0,
        };

        Ok(CleanupStats {
            continuous_removed,
            archive_removed,
        })
    }

    fn archive(&self, cancel: &CancelToken) -> Result<usize> {
        let mut copied = 0;

        for (path, dump) in list_dumps(&self.continuous_dir)? {
            if cancel.is_cancelled() {
                break;
            }
            // Raw dumps may still be written to
            if !dump.is_compressed() {
                continue;
            }

            let name = dump.file_name();
            if !self.archive_pattern.is_match(&name) {
                continue;
            }

            let target = self.archive_dir.join(&name);
            if target.exists() {
                continue;
            }

            let result = write_atomically(&target, |out| {
                let mut source = File::open(&path)?;
                io::copy(&mut source, out)?;
                Ok(())
            });

            match result {
                Ok(()) => {
                    copied += 1;
                    info!(file = %name, "Dump archived");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to archive dump");
                }
            }
        }

        Ok(copied)
    }

    fn compress(&self, cancel: &CancelToken) -> Result<usize> {
        let raw: Vec<_> = list_dumps(&self.continuous_dir)?
            .into_iter()
            .filter(|(_, dump)| !dump.is_compressed())
            .collect();

        // The newest raw dump belongs to the live session
        let Some((_, finished)) = raw.split_last() else {
            return Ok(0);
        };

        let mut compressed = 0;
        for (path, dump) in finished {
            if cancel.is_cancelled() {
                break;
            }

            let target = self.continuous_dir.join(dump.compressed().file_name());
            match gzip_file(path, &target).and_then(|()| fs::remove_file(path)) {
                Ok(()) => {
                    compressed += 1;
                    debug!(file = %target.display(), "Dump compressed");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to compress dump");
                }
            }
        }

        Ok(compressed)
    }
}

fn remove_older_than(dir: &Path, cutoff: DateTime<Utc>, cancel: &CancelToken) -> Result<usize> {
    let mut removed = 0;

    for (path, dump) in list_dumps(dir)? {
        if cancel.is_cancelled() {
            break;
        }
        // Sorted oldest first
        if !dump.is_older_than(cutoff) {
            break;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                removed += 1;
                debug!(path = %path.display(), "Expired dump removed");
            }
            Err(e) => {
                // Not critical - another job may have moved it already
                warn!(path = %path.display(), error = %e, "Failed to remove expired dump");
            }
        }
    }

    Ok(removed)
}

fn gzip_file(source: &Path, target: &Path) -> io::Result<()> {
    write_atomically(target, |out| {
        let mut input = File::open(source)?;
        let mut encoder = GzEncoder::new(out, Compression::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?;
        Ok(())
    })
}
