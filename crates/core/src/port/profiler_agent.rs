// Native sampling agent port
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("failed to load profiler library {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("profiler library {path} does not export {symbol}")]
    MissingSymbol { path: String, symbol: String },

    #[error("profiler command `{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("profiler command contains an interior NUL byte: {0:?}")]
    InvalidCommand(String),
}

/// Loaded sampling engine (async-profiler)
///
/// One handle is shared between the supervisor and the dump job.
/// Implementations must tolerate calls from any worker thread.
pub trait ProfilerAgent: Send + Sync {
    /// Execute an async-profiler command (`start,event=cpu,...`, `stop`, `status`)
    ///
    /// # Returns
    /// Whatever the profiler printed while executing the command
    fn execute(&self, command: &str) -> Result<String, AgentError>;
}

/// Strategy for acquiring the agent
pub trait AgentLoader: Send + Sync {
    /// Locate the bundled library through the default search path
    fn load_default(&self) -> Result<Arc<dyn ProfilerAgent>, AgentError>;

    /// Load the library from an explicit path
    fn load_from(&self, path: &Path) -> Result<Arc<dyn ProfilerAgent>, AgentError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Records every command; fails commands starting with `fail_prefix`
    #[derive(Default)]
    pub struct MockProfilerAgent {
        commands: Mutex<Vec<String>>,
        fail_prefix: Mutex<Option<String>>,
    }

    impl MockProfilerAgent {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(prefix: &str) -> Self {
            let agent = Self::default();
            agent.fail_on(Some(prefix));
            agent
        }

        pub fn fail_on(&self, prefix: Option<&str>) {
            *self.fail_prefix.lock().unwrap() = prefix.map(str::to_string);
        }

        pub fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl ProfilerAgent for MockProfilerAgent {
        fn execute(&self, command: &str) -> Result<String, AgentError> {
            self.commands.lock().unwrap().push(command.to_string());

            if let Some(prefix) = self.fail_prefix.lock().unwrap().as_deref() {
                if command.starts_with(prefix) {
                    return Err(AgentError::CommandFailed {
                        command: command.to_string(),
                        message: "mock failure".to_string(),
                    });
                }
            }
            Ok(String::new())
        }
    }

    /// Which acquisition strategy the supervisor used
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum LoadRequest {
        Default,
        Path(PathBuf),
    }

    /// Hands out one shared mock agent, or always fails
    pub struct MockAgentLoader {
        agent: Arc<MockProfilerAgent>,
        fail: bool,
        requests: Mutex<Vec<LoadRequest>>,
    }

    impl MockAgentLoader {
        pub fn new() -> Self {
            Self {
                agent: Arc::new(MockProfilerAgent::new()),
                fail: false,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        pub fn agent(&self) -> Arc<MockProfilerAgent> {
            Arc::clone(&self.agent)
        }

        pub fn requests(&self) -> Vec<LoadRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn acquire(&self, request: LoadRequest) -> Result<Arc<dyn ProfilerAgent>, AgentError> {
            let path = match &request {
                LoadRequest::Default => "libasyncProfiler.so".to_string(),
                LoadRequest::Path(path) => path.display().to_string(),
            };
            self.requests.lock().unwrap().push(request);

            if self.fail {
                return Err(AgentError::LoadFailed {
                    path,
                    reason: "mock loader configured to fail".to_string(),
                });
            }
            let agent: Arc<dyn ProfilerAgent> = self.agent.clone();
            Ok(agent)
        }
    }

    impl Default for MockAgentLoader {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AgentLoader for MockAgentLoader {
        fn load_default(&self) -> Result<Arc<dyn ProfilerAgent>, AgentError> {
            self.acquire(LoadRequest::Default)
        }

        fn load_from(&self, path: &Path) -> Result<Arc<dyn ProfilerAgent>, AgentError> {
            self.acquire(LoadRequest::Path(path.to_path_buf()))
        }
    }
}
