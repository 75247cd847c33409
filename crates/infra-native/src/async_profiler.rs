// async-profiler agent (Linux/macOS)
//
// C API exported by libasyncProfiler (asprof.h, async-profiler >= 3.0):
//   void           asprof_init();
//   const char*    asprof_error_str(asprof_error_t err);
//   asprof_error_t asprof_execute(const char* command, asprof_writer_t output_callback);
// asprof_error_t is a nullable C string pointer; NULL means success.

use libloading::Library;
use std::cell::RefCell;
use std::ffi::{c_char, CStr, CString, OsStr, OsString};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use contprof_core::port::{AgentError, ProfilerAgent};

/// Library stem; the platform prefix and suffix are added at load time
pub const DEFAULT_LIBRARY_STEM: &str = "asyncProfiler";

type AsprofError = *const c_char;
type AsprofWriter = unsafe extern "C" fn(buf: *const c_char, size: usize);
type AsprofInit = unsafe extern "C" fn();
type AsprofErrorStr = unsafe extern "C" fn(err: AsprofError) -> *const c_char;
type AsprofExecute =
    unsafe extern "C" fn(command: *const c_char, output: Option<AsprofWriter>) -> AsprofError;

/// `libasyncProfiler.so` on Linux, `libasyncProfiler.dylib` on macOS
pub fn default_library_name() -> OsString {
    libloading::library_filename(DEFAULT_LIBRARY_STEM)
}

thread_local! {
    // asprof_execute calls the writer synchronously on the calling thread
    static OUTPUT: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

unsafe extern "C" fn collect_output(buf: *const c_char, size: usize) {
    if buf.is_null() || size == 0 {
        return;
    }
    // SAFETY: the profiler hands us `size` readable bytes at `buf` for the
    // duration of the call
    let bytes = unsafe { std::slice::from_raw_parts(buf.cast::<u8>(), size) };
    OUTPUT.with(|out| out.borrow_mut().extend_from_slice(bytes));
}

/// A loaded async-profiler
///
/// Commands are serialized: the profiler's command interpreter is not
/// re-entrant.
pub struct AsyncProfilerAgent {
    path: String,
    execute: AsprofExecute,
    error_str: AsprofErrorStr,
    lock: Mutex<()>,
    // Keeps the function pointers above valid
    _library: Library,
}

impl AsyncProfilerAgent {
    /// `dlopen` the library and run `asprof_init`
    ///
    /// A bare file name is resolved through the dynamic loader search path.
    pub fn open(path: impl AsRef<OsStr>) -> Result<Self, AgentError> {
        let path = path.as_ref();
        let display = path.to_string_lossy().into_owned();

        // SAFETY: loading async-profiler only runs its own initializers
        let library = unsafe { Library::new(path) }.map_err(|e| AgentError::LoadFailed {
            path: display.clone(),
            reason: e.to_string(),
        })?;

        // SAFETY: the signatures match asprof.h
        let (init, execute, error_str) = unsafe {
            (
                symbol::<AsprofInit>(&library, b"asprof_init\0", &display)?,
                symbol::<AsprofExecute>(&library, b"asprof_execute\0", &display)?,
                symbol::<AsprofErrorStr>(&library, b"asprof_error_str\0", &display)?,
            )
        };

        // SAFETY: asprof_init takes no arguments and may be called repeatedly
        unsafe { init() };
        debug!(library = %path.to_string_lossy(), "async-profiler initialized");

        Ok(Self {
            path: display,
            execute,
            error_str,
            lock: Mutex::new(()),
            _library: library,
        })
    }

    /// Path (or bare name) the library was loaded from
    pub fn path(&self) -> &str {
        &self.path
    }

    fn error_message(&self, err: AsprofError) -> String {
        // SAFETY: err came from asprof_execute; asprof_error_str returns a
        // static string or NULL
        let message = unsafe { (self.error_str)(err) };
        if message.is_null() {
            return "unknown error".to_string();
        }
        // SAFETY: non-null, NUL-terminated, owned by the library
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    }
}

impl ProfilerAgent for AsyncProfilerAgent {
    fn execute(&self, command: &str) -> Result<String, AgentError> {
        let c_command =
            CString::new(command).map_err(|_| AgentError::InvalidCommand(command.to_string()))?;

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        OUTPUT.with(|out| out.borrow_mut().clear());
        let writer: AsprofWriter = collect_output;
        // SAFETY: c_command outlives the call; writer matches asprof_writer_t
        let err = unsafe { (self.execute)(c_command.as_ptr(), Some(writer)) };
        let output = OUTPUT.with(|out| std::mem::take(&mut *out.borrow_mut()));
        let output = String::from_utf8_lossy(&output).into_owned();

        if err.is_null() {
            debug!(command, "Profiler command executed");
            return Ok(output);
        }

        Err(AgentError::CommandFailed {
            command: command.to_string(),
            message: self.error_message(err),
        })
    }
}

/// Resolve a NUL-terminated symbol name to a copied function pointer
///
/// # Safety
/// `T` must be the exact function pointer type of the exported symbol.
unsafe fn symbol<T: Copy>(library: &Library, name: &[u8], path: &str) -> Result<T, AgentError> {
    // SAFETY: forwarded to the caller
    unsafe { library.get::<T>(name) }
        .map(|sym| *sym)
        .map_err(|_| AgentError::MissingSymbol {
            path: path.to_string(),
            symbol: String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name))
                .into_owned(),
        })
}
