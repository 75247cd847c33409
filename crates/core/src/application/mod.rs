// Application Layer - Scheduling, jobs and the lifecycle supervisor

pub mod jobs;
pub mod scheduler;
pub mod supervisor;

// Re-exports
pub use scheduler::{PeriodicJob, PeriodicScheduler, ScheduledTask};
pub use supervisor::{ProfilerSupervisor, SupervisorDeps};
