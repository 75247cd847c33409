// Periodic jobs driven by the supervisor

pub mod housekeeping;
pub mod runner;

pub use housekeeping::{Archiver, Cleaner, Compressor};
pub use runner::DumpRunner;
