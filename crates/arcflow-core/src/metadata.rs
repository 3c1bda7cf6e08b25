//! Informational per-entry metadata records.
//!
//! The metadata pass produces one [`EntryInfo`] record per archive
//! entry without decoding any data: human-scaled sizes, a file type
//! classification, ISO-8601 timestamps and the entry's exclusion
//! status under the session's filter.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::entry::Entry;
use crate::entry::EntryKind;

/// Mapping from entry path to its metadata record.
pub type ArchiveInfo = BTreeMap<String, EntryInfo>;

/// Nominal block size reported for entries. The container formats do
/// not carry a real block size, so a conventional 512 bytes is used.
const NOMINAL_BLOCK_SIZE: u64 = 512;

/// Metadata record for one archive entry.
///
/// Serializes with PascalCase keys
/// (`{"FileName": .., "FileType": .., ..}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntryInfo {
    /// Entry path for regular files, the final path component
    /// otherwise.
    pub file_name: String,
    /// File type classification (`RegularFile`, `Directory`, ...).
    pub file_type: String,
    /// Exact size in bytes.
    pub raw_size: u64,
    /// Size scaled to `size_unit`.
    pub size: u64,
    /// `None`, `Bytes`, `KiB`, `MiB` or `GiB` (1024-based).
    pub size_unit: String,
    /// Nominal block size in bytes.
    pub block_size: u64,
    /// Unit of `block_size`; always `Bytes`.
    pub block_size_unit: String,
    /// Number of nominal blocks, rounded up.
    pub blocks: u64,
    /// ISO-8601 last access time, or `Unknown`.
    pub last_accessed_time: String,
    /// ISO-8601 last modification time, or `Unknown`.
    pub last_modified_time: String,
    /// ISO-8601 last status change time, or `Unknown`.
    pub last_status_modified_time: String,
    /// Whether the session's filter excludes this entry.
    pub excluded: bool,
}

/// Builds the metadata record for one entry.
#[must_use]
pub fn entry_info(entry: &Entry, excluded: bool) -> EntryInfo {
    let path = entry.path_string();
    let file_name = if entry.kind == EntryKind::RegularFile {
        path
    } else {
        final_component(&path)
    };

    let (size, size_unit) = scaled_size(entry.size);
    let blocks = entry.size.div_ceil(NOMINAL_BLOCK_SIZE);

    EntryInfo {
        file_name,
        file_type: entry.kind.type_name().to_string(),
        raw_size: entry.size,
        size,
        size_unit: size_unit.to_string(),
        block_size: NOMINAL_BLOCK_SIZE,
        block_size_unit: "Bytes".to_string(),
        blocks,
        last_accessed_time: iso8601(entry.atime),
        last_modified_time: iso8601(entry.mtime),
        last_status_modified_time: iso8601(entry.ctime),
        excluded,
    }
}

/// Scales a byte count to a 1024-based unit, truncating.
#[must_use]
pub fn scaled_size(bytes: u64) -> (u64, &'static str) {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    const GIB: u64 = 1024 * 1024 * 1024;

    if bytes == 0 {
        (0, "None")
    } else if bytes < KIB {
        (bytes, "Bytes")
    } else if bytes < MIB {
        (bytes / KIB, "KiB")
    } else if bytes < GIB {
        (bytes / MIB, "MiB")
    } else {
        (bytes / GIB, "GiB")
    }
}

/// Formats unix seconds as an ISO-8601 timestamp, or `Unknown` when
/// the stamp is zero or out of range.
#[must_use]
pub fn iso8601(unix_seconds: u64) -> String {
    if unix_seconds == 0 {
        return "Unknown".to_string();
    }
    i64::try_from(unix_seconds)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map_or_else(
            || "Unknown".to_string(),
            |dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        )
}

fn final_component(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_size_units() {
        assert_eq!(scaled_size(0), (0, "None"));
        assert_eq!(scaled_size(1), (1, "Bytes"));
        assert_eq!(scaled_size(1023), (1023, "Bytes"));
        assert_eq!(scaled_size(1024), (1, "KiB"));
        assert_eq!(scaled_size(10 * 1024), (10, "KiB"));
        assert_eq!(scaled_size(1024 * 1024), (1, "MiB"));
        assert_eq!(scaled_size(5 * 1024 * 1024 * 1024), (5, "GiB"));
    }

    #[test]
    fn test_iso8601() {
        assert_eq!(iso8601(0), "Unknown");
        assert_eq!(iso8601(981_173_106), "2001-02-03T04:05:06");
    }

    #[test]
    fn test_entry_info_regular_file() {
        let mut entry = Entry::file("docs/guide.md", 2048);
        entry.mtime = 981_173_106;
        let info = entry_info(&entry, false);

        assert_eq!(info.file_name, "docs/guide.md");
        assert_eq!(info.file_type, "RegularFile");
        assert_eq!(info.raw_size, 2048);
        assert_eq!(info.size, 2);
        assert_eq!(info.size_unit, "KiB");
        assert_eq!(info.block_size, 512);
        assert_eq!(info.blocks, 4);
        assert_eq!(info.last_modified_time, "2001-02-03T04:05:06");
        assert_eq!(info.last_accessed_time, "Unknown");
        assert!(!info.excluded);
    }

    #[test]
    fn test_entry_info_directory_uses_final_component() {
        let entry = Entry::directory("a/b/c/");
        let info = entry_info(&entry, true);
        assert_eq!(info.file_name, "c");
        assert_eq!(info.file_type, "Directory");
        assert_eq!(info.size_unit, "None");
        assert!(info.excluded);
    }

    #[test]
    fn test_blocks_round_up() {
        let entry = Entry::file("x", 513);
        assert_eq!(entry_info(&entry, false).blocks, 2);
        let entry = Entry::file("x", 512);
        assert_eq!(entry_info(&entry, false).blocks, 1);
    }

    #[test]
    fn test_serializes_pascal_case() {
        let info = entry_info(&Entry::file("f.txt", 10), false);
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("FileName").is_some());
        assert!(json.get("FileType").is_some());
        assert!(json.get("RawSize").is_some());
        assert!(json.get("SizeUnit").is_some());
        assert!(json.get("LastModifiedTime").is_some());
        assert!(json.get("Excluded").is_some());
    }
}
