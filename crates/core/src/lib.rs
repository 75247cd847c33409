// contprof Core - Domain Logic, Ports & Lifecycle Supervisor
// NO native or filesystem adapters here (hexagonal layout)

pub mod application;
pub mod cancel;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{ProfilerSupervisor, SupervisorDeps};
pub use domain::ProfilerConfig;
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
