// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("dump_interval_seconds must be positive")]
    NonPositiveInterval,

    #[error("{0} must not be empty")]
    EmptyOutputDir(&'static str),

    #[error("{0} must be positive")]
    NonPositiveRetention(&'static str),

    #[error("{field} must be at most {max}")]
    RetentionTooLarge { field: &'static str, max: u64 },

    #[error("sampling event must not be empty")]
    EmptyEvent,

    #[error("invalid archive_copy_pattern {pattern:?}: {reason}")]
    InvalidArchivePattern { pattern: String, reason: String },
}
