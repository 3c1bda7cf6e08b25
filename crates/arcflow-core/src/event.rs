//! Caller-facing engine events.
//!
//! Every engine instance exposes a channel of [`Event`] values in
//! place of callback registration: callers iterate (or selectively
//! receive) events to observe session lifecycle, progress, password
//! retry requests and results.

use crate::error::ArchiveError;
use crate::metadata::ArchiveInfo;
use crate::metadata::EntryInfo;

/// One extracted file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFile {
    /// The entry's metadata record.
    pub info: EntryInfo,
    /// The entry's decoded contents.
    pub data: Vec<u8>,
}

/// The product of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Extraction or compression wrote to disk; the bytes are at the
    /// configured paths.
    Disk,
    /// Memory-target extraction: one buffer per included entry.
    Memory(Vec<MemoryFile>),
    /// Memory-target compression: the whole archive as one buffer.
    Buffer(Vec<u8>),
}

/// Engine lifecycle, progress and failure notifications.
///
/// Cancellation and pause arrive as [`Event::Canceled`] and
/// [`Event::Paused`] — they are alternate terminations, distinct from
/// [`Event::Error`].
#[derive(Debug)]
pub enum Event {
    /// A session entered the started state.
    Started,
    /// The session suspended at a block boundary; `resume` continues
    /// it.
    Paused,
    /// A paused session continued.
    Resumed,
    /// The session terminated on a cancel request; partial output is
    /// left as-is.
    Canceled,
    /// The session completed; carries the produced output.
    Finished(Output),
    /// The session failed. Password failures are preceded by
    /// [`Event::PasswordRequired`] when a retry is possible.
    Error(ArchiveError),
    /// Progress snapshot, emitted after every transferred block and
    /// after every entry. Totals are `1` when unknown (no pre-pass).
    Progress {
        /// Path of the entry being transferred.
        entry: String,
        /// Entries fully processed so far.
        processed_entries: u64,
        /// Total entry count, or `1` when unknown.
        total_entries: u64,
        /// Bytes transferred so far.
        processed_bytes: u64,
        /// Total byte count, or `1` when unknown.
        total_bytes: u64,
    },
    /// A password-classified failure occurred; the caller may set a
    /// password and re-invoke the same entry point. `tries` starts at
    /// 0 and increments on every re-entry.
    PasswordRequired {
        /// Attempts made so far.
        tries: u64,
    },
    /// Result of a metadata (`get_info`) pass.
    Info(ArchiveInfo),
}

impl Event {
    /// Returns `true` for events that end the current `start`/`resume`
    /// call: `Finished`, `Canceled` or `Error`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_) | Self::Canceled | Self::Error(_))
    }
}
