// Agent acquisition strategies
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use contprof_core::port::{AgentError, AgentLoader, ProfilerAgent};

use crate::async_profiler::{default_library_name, AsyncProfilerAgent};

/// Loads async-profiler through `dlopen`
///
/// The default strategy resolves the platform library name
/// (`libasyncProfiler.so` / `libasyncProfiler.dylib`) through the dynamic
/// loader search path (RPATH, `LD_LIBRARY_PATH`, system dirs).
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeAgentLoader;

impl NativeAgentLoader {
    pub fn new() -> Self {
        Self
    }
}

impl AgentLoader for NativeAgentLoader {
    fn load_default(&self) -> Result<Arc<dyn ProfilerAgent>, AgentError> {
        let name = default_library_name();
        let agent = AsyncProfilerAgent::open(&name)?;
        info!(library = %agent.path(), "Profiler agent loaded from search path");
        Ok(Arc::new(agent))
    }

    fn load_from(&self, path: &Path) -> Result<Arc<dyn ProfilerAgent>, AgentError> {
        let agent = AsyncProfilerAgent::open(path)?;
        info!(library = %agent.path(), "Profiler agent loaded");
        Ok(Arc::new(agent))
    }
}
