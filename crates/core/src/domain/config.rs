// Profiler configuration snapshot

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::ConfigError;

pub const DEFAULT_CONTINUOUS_OUTPUT_DIR: &str = "profiler/continuous";
pub const DEFAULT_ARCHIVE_OUTPUT_DIR: &str = "profiler/archive";
pub const DEFAULT_DUMP_INTERVAL_SECONDS: u64 = 60;
pub const DEFAULT_EVENT: &str = "cpu";
pub const DEFAULT_CONTINUOUS_RETENTION_HOURS: u64 = 24;
pub const DEFAULT_ARCHIVE_RETENTION_DAYS: u64 = 30;

/// Upper bounds keeping retention cutoffs inside the representable date range
pub const MAX_ARCHIVE_RETENTION_DAYS: u64 = 36_500;
pub const MAX_CONTINUOUS_RETENTION_HOURS: u64 = MAX_ARCHIVE_RETENTION_DAYS * 24;

/// Compressed dumps started between 13:00 and 13:09 (UTC)
pub const DEFAULT_ARCHIVE_COPY_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}-13-0\d-\d{2}\.jfr\.gz$";

/// Immutable configuration snapshot
///
/// Loaded once before the supervisor is constructed. Every field has a
/// default so a partial file (or no file at all) deserializes.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Gates all behavior; a disabled supervisor is a no-op
    pub enabled: bool,

    /// Explicit path to `libasyncProfiler.so`; unset or empty selects the
    /// library on the dynamic loader search path
    pub profiler_lib_path: Option<PathBuf>,

    pub archive_output_dir: PathBuf,

    pub continuous_output_dir: PathBuf,

    /// Length of one sampling window
    pub dump_interval_seconds: u64,

    /// async-profiler event (cpu, wall, alloc, lock, itimer, ...)
    pub event: String,

    /// Extra comma-separated arguments appended to the start command
    pub profiler_args: Option<String>,

    pub continuous_retention_hours: u64,

    pub archive_retention_days: u64,

    /// Regex over dump file names selecting what the archiver copies
    pub archive_copy_pattern: String,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            profiler_lib_path: None,
            archive_output_dir: PathBuf::from(DEFAULT_ARCHIVE_OUTPUT_DIR),
            continuous_output_dir: PathBuf::from(DEFAULT_CONTINUOUS_OUTPUT_DIR),
            dump_interval_seconds: DEFAULT_DUMP_INTERVAL_SECONDS,
            event: DEFAULT_EVENT.to_string(),
            profiler_args: None,
            continuous_retention_hours: DEFAULT_CONTINUOUS_RETENTION_HOURS,
            archive_retention_days: DEFAULT_ARCHIVE_RETENTION_DAYS,
            archive_copy_pattern: DEFAULT_ARCHIVE_COPY_PATTERN.to_string(),
        }
    }
}

impl ProfilerConfig {
    /// Validate the snapshot
    ///
    /// Only meaningful for an enabled configuration; the supervisor skips
    /// validation entirely when `enabled` is false.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dump_interval_seconds == 0 {
            return Err(ConfigError::NonPositiveInterval);
        }
        if self.archive_output_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutputDir("archive_output_dir"));
        }
        if self.continuous_output_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutputDir("continuous_output_dir"));
        }
        if self.continuous_retention_hours == 0 {
            return Err(ConfigError::NonPositiveRetention(
                "continuous_retention_hours",
            ));
        }
        if self.archive_retention_days == 0 {
            return Err(ConfigError::NonPositiveRetention("archive_retention_days"));
        }
        if self.continuous_retention_hours > MAX_CONTINUOUS_RETENTION_HOURS {
            return Err(ConfigError::RetentionTooLarge {
                field: "continuous_retention_hours",
                max: MAX_CONTINUOUS_RETENTION_HOURS,
            });
        }
        if self.archive_retention_days > MAX_ARCHIVE_RETENTION_DAYS {
            return Err(ConfigError::RetentionTooLarge {
                field: "archive_retention_days",
                max: MAX_ARCHIVE_RETENTION_DAYS,
            });
        }
        if self.event.trim().is_empty() {
            return Err(ConfigError::EmptyEvent);
        }
        Ok(())
    }

    /// Explicit library path, treating an empty string as unset
    pub fn profiler_lib_path(&self) -> Option<&Path> {
        self.profiler_lib_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    pub fn dump_interval(&self) -> Duration {
        Duration::from_secs(self.dump_interval_seconds)
    }

    /// Saturates at `chrono::Duration::MAX` for unvalidated huge values
    pub fn continuous_retention(&self) -> chrono::Duration {
        i64::try_from(self.continuous_retention_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Saturates at `chrono::Duration::MAX` for unvalidated huge values
    pub fn archive_retention(&self) -> chrono::Duration {
        i64::try_from(self.archive_retention_days)
            .ok()
            .and_then(chrono::Duration::try_days)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Extra start arguments, if any are non-blank
    pub fn profiler_args(&self) -> Option<&str> {
        self.profiler_args
            .as_deref()
            .map(str::trim)
            .filter(|args| !args.is_empty())
    }
}
