// Domain Layer - Configuration snapshot and dump file naming

pub mod config;
pub mod dump_file;
pub mod error;

pub use config::ProfilerConfig;
pub use dump_file::DumpFile;
pub use error::ConfigError;
