// contprof Infrastructure - Filesystem Adapters
// Implements: DumpHousekeeping (cleanup, archival, compression)

pub mod dump_dir;
pub mod housekeeping_impl;

pub use dump_dir::list_dumps;
pub use housekeeping_impl::FsHousekeeping;
