// Panic isolation for scheduled jobs
use std::panic::{catch_unwind, UnwindSafe};
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed (successfully or with an error value)
    Completed(T),
    /// Execution panicked
    Panicked(String),
}

/// Execute a closure with panic isolation
///
/// A panicking job only loses that single execution; the scheduler loop
/// keeps ticking.
///
/// # Example
/// ```text
/// let result = execute_guarded("cleaner", || panic!("boom"));
/// assert!(matches!(result, PanicGuardResult::Panicked(_)));
/// ```
pub fn execute_guarded<F, T>(job: &str, f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T + UnwindSafe,
{
    match catch_unwind(f) {
        Ok(result) => PanicGuardResult::Completed(result),
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };

            error!(job = job, panic_msg = %panic_msg, "Scheduled job panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}
