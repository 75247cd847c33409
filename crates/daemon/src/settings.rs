//! Configuration loading
//!
//! Layers, lowest precedence first:
//! 1. `ProfilerConfig::default()`
//! 2. TOML file (optional)
//! 3. `CONTPROF_*` environment variables

use config::{Config, ConfigError, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

use contprof_core::ProfilerConfig;

pub const DEFAULT_CONFIG_PATH: &str = "~/.contprof/config.toml";
pub const ENV_PREFIX: &str = "CONTPROF";

/// Load from `path` and the process environment
pub fn load(path: &Path) -> Result<ProfilerConfig, ConfigError> {
    load_with(path, Environment::with_prefix(ENV_PREFIX))
}

fn load_with(path: &Path, env: Environment) -> Result<ProfilerConfig, ConfigError> {
    let file = File::new(&path.to_string_lossy(), FileFormat::Toml).required(false);

    let mut config: ProfilerConfig = Config::builder()
        .add_source(file)
        .add_source(env.try_parsing(true))
        .build()?
        .try_deserialize()?;

    config.archive_output_dir = expand(&config.archive_output_dir);
    config.continuous_output_dir = expand(&config.continuous_output_dir);
    config.profiler_lib_path = config.profiler_lib_path.as_deref().map(expand);

    Ok(config)
}

/// Expand a leading `~`
pub fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
