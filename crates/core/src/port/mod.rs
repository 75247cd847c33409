// Port Layer - Interfaces for external dependencies

pub mod housekeeping;
pub mod profiler_agent;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use housekeeping::{CleanupStats, DumpHousekeeping};
pub use profiler_agent::{AgentError, AgentLoader, ProfilerAgent};
pub use time_provider::TimeProvider;
