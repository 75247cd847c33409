// Dump Runner - rolls the sampling session into a fresh JFR file each tick

use crate::application::scheduler::PeriodicJob;
use crate::cancel::CancelToken;
use crate::domain::{DumpFile, ProfilerConfig};
use crate::error::Result;
use crate::port::{ProfilerAgent, TimeProvider};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

const STOP_COMMAND: &str = "stop";

/// Dump job
///
/// Each run stops the active session (async-profiler flushes it to the file
/// named at start) and starts a new one targeting a new timestamped file in
/// the continuous output directory.
pub struct DumpRunner {
    agent: Arc<dyn ProfilerAgent>,
    time_provider: Arc<dyn TimeProvider>,
    output_dir: PathBuf,
    event: String,
    extra_args: Option<String>,
    active: Mutex<Option<PathBuf>>,
}

impl DumpRunner {
    pub fn new(
        agent: Arc<dyn ProfilerAgent>,
        time_provider: Arc<dyn TimeProvider>,
        config: &ProfilerConfig,
    ) -> Self {
        Self {
            agent,
            time_provider,
            output_dir: config.continuous_output_dir.clone(),
            event: config.event.trim().to_string(),
            extra_args: config.profiler_args().map(str::to_string),
            active: Mutex::new(None),
        }
    }

    /// `start,event=<event>,jfr,file=<path>[,<extra args>]`
    pub fn start_command(&self, file: &Path) -> String {
        let mut command = format!("start,event={},jfr,file={}", self.event, file.display());
        if let Some(args) = &self.extra_args {
            command.push(',');
            command.push_str(args);
        }
        command
    }

    /// The raw or compressed file already holding this window, if any
    fn existing_dump(&self, dump: DumpFile) -> Option<PathBuf> {
        [dump, dump.compressed()]
            .into_iter()
            .map(|d| self.output_dir.join(d.file_name()))
            .find(|path| path.exists())
    }

    /// File the current session is writing to
    pub fn active_dump(&self) -> Option<PathBuf> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PeriodicJob for DumpRunner {
    fn name(&self) -> &'static str {
        "runner"
    }

    fn run(&self, cancel: &CancelToken) -> Result<()> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);

        let dump = DumpFile::raw(self.time_provider.now());
        let path = self.output_dir.join(dump.file_name());

        // Same-second catch-up tick or a clock stepped back: starting would
        // truncate a finished dump, so the current session keeps running
        if !cancel.is_cancelled() {
            if let Some(taken) = self.existing_dump(dump) {
                warn!(
                    file = %taken.display(),
                    "Dump file already exists, keeping current session"
                );
                return Ok(());
            }
        }

        if let Some(previous) = active.take() {
            match self.agent.execute(STOP_COMMAND) {
                Ok(_) => info!(file = %previous.display(), "Dump finished"),
                // A session stopped behind our back must not block the next one
                Err(e) => warn!(
                    file = %previous.display(),
                    error = %e,
                    "Failed to stop profiling session"
                ),
            }
        }

        if cancel.is_cancelled() {
            return Ok(());
        }

        let command = self.start_command(&path);

        self.agent.execute(&command)?;
        info!(file = %path.display(), event = %self.event, "Profiling session started");

        *active = Some(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancel_channel;
    use crate::error::AppError;
    use crate::port::profiler_agent::mocks::MockProfilerAgent;
    use crate::port::time_provider::mocks::FixedTimeProvider;
    use chrono::{TimeZone, Utc};

    fn setup(agent: MockProfilerAgent) -> (DumpRunner, Arc<MockProfilerAgent>, Arc<FixedTimeProvider>) {
        let agent = Arc::new(agent);
        let clock = Arc::new(FixedTimeProvider::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 13, 5, 0).unwrap(),
        ));
        let config = ProfilerConfig {
            continuous_output_dir: PathBuf::from("/data/continuous"),
            ..Default::default()
        };
        let runner = DumpRunner::new(agent.clone(), clock.clone(), &config);
        (runner, agent, clock)
    }

    #[test]
    fn test_first_run_only_starts() {
        let (runner, agent, _) = setup(MockProfilerAgent::new());

        runner.run(&CancelToken::never()).unwrap();

        assert_eq!(
            agent.commands(),
            vec!["start,event=cpu,jfr,file=/data/continuous/2024-05-01-13-05-00.jfr"]
        );
        assert_eq!(
            runner.active_dump(),
            Some(PathBuf::from("/data/continuous/2024-05-01-13-05-00.jfr"))
        );
    }

    #[test]
    fn test_next_run_rolls_session() {
        let (runner, agent, clock) = setup(MockProfilerAgent::new());
        let token = CancelToken::never();

        runner.run(&token).unwrap();
        clock.advance(chrono::Duration::seconds(60));
        runner.run(&token).unwrap();

        let commands = agent.commands();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[1], "stop");
        assert!(commands[2].ends_with("file=/data/continuous/2024-05-01-13-06-00.jfr"));
    }

    #[test]
    fn test_failed_stop_still_starts() {
        let (runner, agent, _) = setup(MockProfilerAgent::failing_on("stop"));
        let token = CancelToken::never();

        runner.run(&token).unwrap();
        runner.run(&token).unwrap();

        let commands = agent.commands();
        assert_eq!(commands.len(), 3);
        assert!(commands[2].starts_with("start,"));
        assert!(runner.active_dump().is_some());
    }

    #[test]
    fn test_failed_start_is_reported_and_not_stopped_later() {
        let (runner, agent, _) = setup(MockProfilerAgent::failing_on("start"));
        let token = CancelToken::never();

        let err = runner.run(&token).unwrap_err();
        assert!(matches!(err, AppError::Agent(_)));
        assert!(runner.active_dump().is_none());

        agent.fail_on(None);
        runner.run(&token).unwrap();

        // No stop for a session that never started
        assert!(!agent.commands().iter().any(|c| c == "stop"));
    }

    #[test]
    fn test_cancelled_run_stops_without_restart() {
        let (runner, agent, _) = setup(MockProfilerAgent::new());
        runner.run(&CancelToken::never()).unwrap();

        let (tx, token) = cancel_channel();
        tx.cancel();
        runner.run(&token).unwrap();

        assert_eq!(agent.commands().last().map(String::as_str), Some("stop"));
        assert!(runner.active_dump().is_none());
    }

    fn setup_in(dir: &Path) -> (DumpRunner, Arc<MockProfilerAgent>, Arc<FixedTimeProvider>) {
        let agent = Arc::new(MockProfilerAgent::new());
        let clock = Arc::new(FixedTimeProvider::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 13, 5, 0).unwrap(),
        ));
        let config = ProfilerConfig {
            continuous_output_dir: dir.to_path_buf(),
            ..Default::default()
        };
        let runner = DumpRunner::new(agent.clone(), clock.clone(), &config);
        (runner, agent, clock)
    }

    #[test]
    fn test_same_second_tick_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, agent, _) = setup_in(dir.path());
        let token = CancelToken::never();

        runner.run(&token).unwrap();
        let live = runner.active_dump().unwrap();
        // async-profiler creates the file when the session starts
        std::fs::write(&live, b"JFR").unwrap();

        runner.run(&token).unwrap();

        assert_eq!(agent.commands().len(), 1);
        assert_eq!(runner.active_dump(), Some(live.clone()));
        assert_eq!(std::fs::read(&live).unwrap(), b"JFR");
    }

    #[test]
    fn test_clock_stepped_back_onto_compressed_dump() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, agent, clock) = setup_in(dir.path());
        let token = CancelToken::never();
        let earlier = DumpFile::raw(clock.now() - chrono::Duration::minutes(1)).compressed();
        std::fs::write(dir.path().join(earlier.file_name()), b"finished").unwrap();

        runner.run(&token).unwrap();
        clock.advance(chrono::Duration::minutes(-1));
        runner.run(&token).unwrap();

        let commands = agent.commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].starts_with("start,"));
        assert_eq!(
            std::fs::read(dir.path().join(earlier.file_name())).unwrap(),
            b"finished"
        );
    }

    #[test]
    fn test_extra_args_appended() {
        let agent = Arc::new(MockProfilerAgent::new());
        let clock = Arc::new(FixedTimeProvider::new(Utc::now()));
        let config = ProfilerConfig {
            event: "wall".to_string(),
            profiler_args: Some("interval=10ms,threads".to_string()),
            ..Default::default()
        };
        let runner = DumpRunner::new(agent, clock, &config);

        let command = runner.start_command(Path::new("/tmp/x.jfr"));
        assert_eq!(command, "start,event=wall,jfr,file=/tmp/x.jfr,interval=10ms,threads");
    }
}
