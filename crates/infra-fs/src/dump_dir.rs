// Dump directory helpers
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use contprof_core::domain::DumpFile;

const PARTIAL_SUFFIX: &str = ".part";

/// Dump files in `dir`, oldest first
///
/// Anything that is not a regular file named after the dump scheme is
/// skipped, including in-progress `.part` files.
pub fn list_dumps(dir: &Path) -> io::Result<Vec<(PathBuf, DumpFile)>> {
    let mut dumps = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let file_name = entry.file_name();
        let Some(dump) = file_name.to_str().and_then(DumpFile::parse) else {
            continue;
        };
        dumps.push((entry.path(), dump));
    }

    dumps.sort_by_key(|(_, dump)| *dump);
    Ok(dumps)
}

/// Write `target` through a `.part` sibling renamed into place on success
///
/// Other jobs never see a half-written dump: the partial name does not
/// parse as a dump file.
pub fn write_atomically<F>(target: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let partial = partial_path(target);

    let result = (|| {
        let mut writer = BufWriter::new(File::create(&partial)?);
        write(&mut writer)?;
        writer.flush()?;
        let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.sync_all()?;
        fs::rename(&partial, target)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}
