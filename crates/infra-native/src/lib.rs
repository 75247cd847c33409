// contprof Infrastructure - Native Agent Adapter
// Implements: ProfilerAgent, AgentLoader on top of async-profiler's C API

pub mod async_profiler;
pub mod loader;

pub use async_profiler::{AsyncProfilerAgent, DEFAULT_LIBRARY_STEM};
pub use loader::NativeAgentLoader;
