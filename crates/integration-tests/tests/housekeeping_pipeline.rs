//! Dump lifecycle end to end
//!
//! An agent stand-in creates the file named in each start command, the
//! way async-profiler does, so the runner, compressor, archiver and
//! cleaner all operate on real files.

use chrono::{Duration as ChronoDuration, Utc};
use contprof_core::domain::DumpFile;
use contprof_core::port::profiler_agent::{AgentError, AgentLoader, ProfilerAgent};
use contprof_core::port::time_provider::SystemTimeProvider;
use contprof_core::{ProfilerConfig, ProfilerSupervisor, SupervisorDeps};
use contprof_infra_fs::{list_dumps, FsHousekeeping};
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[derive(Default)]
struct FileWritingAgent {
    started: Mutex<Vec<PathBuf>>,
}

impl ProfilerAgent for FileWritingAgent {
    fn execute(&self, command: &str) -> Result<String, AgentError> {
        if let Some(file) = command
            .split(',')
            .find_map(|part| part.strip_prefix("file="))
        {
            fs::write(file, b"JFR").map_err(|e| AgentError::CommandFailed {
                command: command.to_string(),
                message: e.to_string(),
            })?;
            self.started.lock().unwrap().push(PathBuf::from(file));
        }
        Ok(String::new())
    }
}

struct FileWritingLoader(Arc<FileWritingAgent>);

impl AgentLoader for FileWritingLoader {
    fn load_default(&self) -> Result<Arc<dyn ProfilerAgent>, AgentError> {
        let agent: Arc<dyn ProfilerAgent> = self.0.clone();
        Ok(agent)
    }

    fn load_from(&self, _path: &Path) -> Result<Arc<dyn ProfilerAgent>, AgentError> {
        self.load_default()
    }
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    condition()
}

fn seed(dir: &Path, dump: DumpFile, content: &[u8]) {
    fs::write(dir.join(dump.file_name()), content).unwrap();
}

#[test]
fn test_first_pass_over_seeded_directories() {
    let root = TempDir::new().unwrap();
    let now = Utc::now();

    let expired = DumpFile::raw(now - ChronoDuration::hours(30)).compressed();
    let finished = DumpFile::raw(now - ChronoDuration::hours(3));
    let archivable = DumpFile::raw(now - ChronoDuration::hours(2)).compressed();
    // Keeps `finished` from being the newest raw dump whichever job runs first
    let previous_live = DumpFile::raw(now - ChronoDuration::minutes(1));
    let old_archive = DumpFile::raw(now - ChronoDuration::days(45)).compressed();

    let config = ProfilerConfig {
        archive_output_dir: root.path().join("archive"),
        continuous_output_dir: root.path().join("continuous"),
        dump_interval_seconds: 3600,
        archive_copy_pattern: format!("^{}$", regex_escape(&archivable.file_name())),
        ..Default::default()
    };
    fs::create_dir_all(&config.archive_output_dir).unwrap();
    fs::create_dir_all(&config.continuous_output_dir).unwrap();
    seed(&config.continuous_output_dir, expired, b"expired");
    seed(&config.continuous_output_dir, finished, b"finished window");
    seed(&config.continuous_output_dir, archivable, b"lunchtime");
    seed(&config.continuous_output_dir, previous_live, b"previous session");
    seed(&config.archive_output_dir, old_archive, b"old");

    let agent = Arc::new(FileWritingAgent::default());
    let deps = SupervisorDeps {
        agent_loader: Arc::new(FileWritingLoader(agent.clone())),
        housekeeping: Arc::new(FsHousekeeping::new(&config).unwrap()),
        time_provider: Arc::new(SystemTimeProvider),
    };

    let supervisor = ProfilerSupervisor::start(&config, deps).unwrap();

    let continuous = config.continuous_output_dir.clone();
    let archive = config.archive_output_dir.clone();
    let settled = wait_until(Duration::from_secs(10), || {
        !continuous.join(expired.file_name()).exists()
            && continuous.join(finished.compressed().file_name()).exists()
            && archive.join(archivable.file_name()).exists()
            && !archive.join(old_archive.file_name()).exists()
            && !agent.started.lock().unwrap().is_empty()
    });
    drop(supervisor);
    assert!(settled, "first housekeeping pass did not complete");

    // Finished raw dump was replaced by its gzip
    assert!(!continuous.join(finished.file_name()).exists());
    let gz = fs::File::open(continuous.join(finished.compressed().file_name())).unwrap();
    let mut content = String::new();
    GzDecoder::new(gz).read_to_string(&mut content).unwrap();
    assert_eq!(content, "finished window");

    // Archive copy is byte-identical and the source stays
    assert_eq!(
        fs::read(archive.join(archivable.file_name())).unwrap(),
        b"lunchtime"
    );
    assert!(continuous.join(archivable.file_name()).exists());

    // The live dump created by the runner exists and is raw
    let live = agent.started.lock().unwrap()[0].clone();
    assert!(live.starts_with(&continuous));
    let live_dump = DumpFile::parse(&live.file_name().unwrap().to_string_lossy()).unwrap();
    assert!(!live_dump.is_compressed());
    assert!(live.exists());
}

#[test]
fn test_runner_rolls_dumps_each_interval() {
    let root = TempDir::new().unwrap();
    let config = ProfilerConfig {
        archive_output_dir: root.path().join("archive"),
        continuous_output_dir: root.path().join("continuous"),
        dump_interval_seconds: 1,
        ..Default::default()
    };
    let agent = Arc::new(FileWritingAgent::default());
    let deps = SupervisorDeps {
        agent_loader: Arc::new(FileWritingLoader(agent.clone())),
        housekeeping: Arc::new(FsHousekeeping::new(&config).unwrap()),
        time_provider: Arc::new(SystemTimeProvider),
    };

    let mut supervisor = ProfilerSupervisor::start(&config, deps).unwrap();
    let rolled = wait_until(Duration::from_secs(10), || {
        agent.started.lock().unwrap().len() >= 3
    });
    supervisor.shutdown();
    assert!(rolled, "runner did not roll sessions");

    let dumps = list_dumps(&config.continuous_output_dir).unwrap();
    assert!(dumps.len() >= 2);
    assert!(dumps.windows(2).all(|w| w[0].1 < w[1].1));
}

fn regex_escape(name: &str) -> String {
    name.replace('.', r"\.")
}
