// Dump file naming
//
// A dump is named after the UTC start of its sampling window:
// `2024-05-01-13-05-00.jfr`, and `2024-05-01-13-05-00.jfr.gz` once compressed.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

pub const RAW_SUFFIX: &str = ".jfr";
pub const COMPRESSED_SUFFIX: &str = ".jfr.gz";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// A dump file recognized by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DumpFile {
    started_at: NaiveDateTime,
    compressed: bool,
}

impl DumpFile {
    /// Raw dump for a window starting at `started_at` (sub-second part dropped)
    pub fn raw(started_at: DateTime<Utc>) -> Self {
        let started_at = started_at.naive_utc();
        let started_at = started_at.with_nanosecond(0).unwrap_or(started_at);
        Self {
            started_at,
            compressed: false,
        }
    }

    /// Parse a file name; anything not following the naming scheme is `None`
    pub fn parse(file_name: &str) -> Option<Self> {
        let (stem, compressed) = if let Some(stem) = file_name.strip_suffix(COMPRESSED_SUFFIX) {
            (stem, true)
        } else if let Some(stem) = file_name.strip_suffix(RAW_SUFFIX) {
            (stem, false)
        } else {
            return None;
        };

        let started_at = NaiveDateTime::parse_from_str(stem, TIMESTAMP_FORMAT).ok()?;
        Some(Self {
            started_at,
            compressed,
        })
    }

    pub fn file_name(&self) -> String {
        let suffix = if self.compressed {
            COMPRESSED_SUFFIX
        } else {
            RAW_SUFFIX
        };
        format!("{}{}", self.started_at.format(TIMESTAMP_FORMAT), suffix)
    }

    /// The compressed counterpart of this dump
    pub fn compressed(&self) -> Self {
        Self {
            started_at: self.started_at,
            compressed: true,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at.and_utc()
    }

    /// True when the window started strictly before `cutoff`
    pub fn is_older_than(&self, cutoff: DateTime<Utc>) -> bool {
        self.started_at() < cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_raw_file_name() {
        let dump = DumpFile::raw(at(2024, 5, 1, 13, 5, 0));
        assert_eq!(dump.file_name(), "2024-05-01-13-05-00.jfr");
        assert_eq!(dump.compressed().file_name(), "2024-05-01-13-05-00.jfr.gz");
    }

    #[test]
    fn test_parse_both_suffixes() {
        let raw = DumpFile::parse("2024-05-01-13-05-00.jfr").unwrap();
        assert!(!raw.is_compressed());
        assert_eq!(raw.started_at(), at(2024, 5, 1, 13, 5, 0));

        let gz = DumpFile::parse("2024-05-01-13-05-00.jfr.gz").unwrap();
        assert!(gz.is_compressed());
        assert_eq!(gz, raw.compressed());
    }

    #[test]
    fn test_parse_rejects_foreign_files() {
        assert!(DumpFile::parse("notes.txt").is_none());
        assert!(DumpFile::parse("2024-05-01.jfr").is_none());
        assert!(DumpFile::parse("2024-05-01-13-05-00.jfr.gz.part").is_none());
        assert!(DumpFile::parse("heap.jfr").is_none());
    }

    #[test]
    fn test_subsecond_precision_dropped() {
        let with_nanos = at(2024, 5, 1, 13, 5, 0) + chrono::Duration::milliseconds(750);
        let dump = DumpFile::raw(with_nanos);
        assert_eq!(dump.started_at(), at(2024, 5, 1, 13, 5, 0));
    }

    #[test]
    fn test_names_sort_chronologically() {
        let earlier = DumpFile::raw(at(2024, 5, 1, 9, 59, 59));
        let later = DumpFile::raw(at(2024, 5, 1, 10, 0, 0));
        assert!(earlier < later);
        assert!(earlier.file_name() < later.file_name());
    }

    #[test]
    fn test_is_older_than() {
        let dump = DumpFile::raw(at(2024, 5, 1, 12, 0, 0));
        assert!(dump.is_older_than(at(2024, 5, 1, 12, 0, 1)));
        assert!(!dump.is_older_than(at(2024, 5, 1, 12, 0, 0)));
    }
}
