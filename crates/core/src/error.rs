// Central Error Type for the Application

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::ConfigError;
use crate::port::AgentError;

/// Application-level error type
///
/// The first four variants are startup failures: they abort supervisor
/// construction and are never retried.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(#[from] ConfigError),

    #[error("Cannot create output directory {}: {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot acquire profiler agent: {0}")]
    AgentAcquisition(#[source] AgentError),

    #[error("Cannot start scheduler pool: {0}")]
    SchedulerStart(#[source] std::io::Error),

    #[error("Profiler agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_error_names_path_and_cause() {
        let err = AppError::DirectoryCreation {
            path: PathBuf::from("/var/lib/contprof/archive"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        let msg = err.to_string();
        assert!(msg.contains("/var/lib/contprof/archive"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_agent_acquisition_is_distinct_from_runtime_agent_error() {
        let load = AgentError::LoadFailed {
            path: "/opt/missing.so".to_string(),
            reason: "not found".to_string(),
        };
        let err = AppError::AgentAcquisition(load);
        assert!(err.to_string().starts_with("Cannot acquire profiler agent"));

        let runtime: AppError = AgentError::CommandFailed {
            command: "stop".to_string(),
            message: "Profiler is not active".to_string(),
        }
        .into();
        assert!(matches!(runtime, AppError::Agent(_)));
    }
}
